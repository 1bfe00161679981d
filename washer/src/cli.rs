//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Reroll equipment until its affixes satisfy a rule.
#[derive(Parser, Debug)]
#[command(name = "washer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Rule/profile store path
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

/// A stored rule by name, or rule text given inline.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct RuleArg {
    /// Name of a stored rule
    #[arg(short, long)]
    pub rule: Option<String>,

    /// Inline rule: keyword, boolean expression or rule JSON
    #[arg(short, long)]
    pub expr: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the reroll loop
    Run {
        /// Calibrated profile to use
        #[arg(short, long)]
        profile: String,

        #[command(flatten)]
        rule: RuleArg,

        /// Post input to the bound window instead of moving the real pointer
        #[arg(long)]
        background: bool,

        /// Override the configured attempt budget
        #[arg(long)]
        max_attempts: Option<u32>,
    },

    /// Record hover, text region and reroll positions into a profile
    Calibrate {
        /// Profile name (overwritten if it exists)
        name: String,

        /// Store coordinates relative to the focused game window
        #[arg(long)]
        bind_window: bool,
    },

    /// Evaluate a rule against recognized text from a file or stdin
    Check {
        #[command(flatten)]
        rule: RuleArg,

        /// Text file (stdin if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Manage stored rules
    Rules {
        #[command(subcommand)]
        action: RuleAction,
    },

    /// Manage calibrated profiles
    Profiles {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum RuleAction {
    /// List rule names
    List,
    /// Print a rule
    Show { name: String },
    /// Add or replace a rule (keyword, expression or JSON)
    Add { name: String, rule: String },
    /// Delete a rule
    Remove { name: String },
    /// Rename a rule
    Rename { from: String, to: String },
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// List profile names
    List,
    /// Print a profile
    Show { name: String },
    /// Delete a profile
    Remove { name: String },
    /// Rename a profile
    Rename { from: String, to: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_requires_exactly_one_rule_source() {
        assert!(Cli::try_parse_from(["washer", "run", "-p", "helm"]).is_err());
        assert!(Cli::try_parse_from(["washer", "run", "-p", "helm", "--rule", "a", "--expr", "b"]).is_err());

        let cli = Cli::try_parse_from(["washer", "run", "-p", "helm", "--expr", "冰霜 && 攻速", "--background"]).unwrap();
        match cli.command {
            Commands::Run { profile, rule, background, max_attempts } => {
                assert_eq!(profile, "helm");
                assert_eq!(rule.expr.as_deref(), Some("冰霜 && 攻速"));
                assert!(background);
                assert_eq!(max_attempts, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["washer", "rules", "list", "-v", "--config", "c.json"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
    }
}
