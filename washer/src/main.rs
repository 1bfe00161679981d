//! washer: OCR-driven equipment reroll automation.

mod cli;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use matcher::{Matcher, Rule};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ProfileAction, RuleAction, RuleArg};
use washer::capture::ScreenReader;
use washer::input::DesktopInput;
use washer::store::Store;
use washer::window::DesktopWindows;
use washer::{Collaborators, Config, InputMode, LoopSettings, RunEvent, RunOutcome, RunPlan, Washer};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the run transcript.
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<ExitCode> {
    let config = Config::load_or_default(cli.config.as_deref());
    let store_path = match cli.store {
        Some(path) => path,
        None => Store::default_path()?,
    };

    match cli.command {
        Commands::Run {
            profile,
            rule,
            background,
            max_attempts,
        } => {
            let store = Store::load(store_path)?;
            run(&config, &store, &profile, &rule, background, max_attempts)
        }
        Commands::Calibrate { name, bind_window } => {
            let mut store = Store::load(store_path)?;
            let profile = washer::calibrate::calibrate(&mut washer::calibrate::ConsoleProbe, bind_window)?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
            store.put_profile(name.clone(), profile);
            store.save()?;
            tracing::info!(profile = %name, path = %store.path().display(), "profile saved");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { rule, file } => {
            let store = Store::load(store_path)?;
            check(&config, &store, &rule, file)
        }
        Commands::Rules { action } => {
            let mut store = Store::load(store_path)?;
            rules(&mut store, action)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Profiles { action } => {
            let mut store = Store::load(store_path)?;
            profiles(&mut store, action)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn resolve_rule(store: &Store, arg: &RuleArg) -> Result<Rule> {
    match (&arg.rule, &arg.expr) {
        (Some(name), _) => Ok(store.rule(name)?.clone()),
        (None, Some(text)) => parse_rule(text),
        (None, None) => anyhow::bail!("either --rule or --expr is required"),
    }
}

fn parse_rule(text: &str) -> Result<Rule> {
    text.parse::<Rule>().with_context(|| format!("invalid rule JSON: {text}"))
}

fn run(
    config: &Config,
    store: &Store,
    profile_name: &str,
    rule: &RuleArg,
    background: bool,
    max_attempts: Option<u32>,
) -> Result<ExitCode> {
    let profile = store.profile(profile_name)?.clone();
    let rule = resolve_rule(store, rule)?;

    let mut settings = LoopSettings::from(config);
    if let Some(max) = max_attempts {
        settings.max_attempts = max;
    }
    let plan = RunPlan {
        profile,
        rule: rule.clone(),
        mode: if background { InputMode::Background } else { config.input_mode },
        settings,
    };
    plan.validate()?;

    let ie = Arc::new(washer::assets::resolve_ocr_assets(&config.ocr_lang)?.load()?);
    let collaborators = Collaborators {
        recognizer: Box::new(ScreenReader::new(ie)),
        injector: Box::new(DesktopInput),
        windows: Box::new(DesktopWindows),
    };

    let washer = Washer::new();
    {
        let washer = washer.clone();
        ctrlc::set_handler(move || washer.request_cancel()).context("install Ctrl-C handler")?;
    }

    let (tx, rx) = mpsc::channel();
    let handle = washer.start(plan, collaborators, Some(tx))?;
    let hotkey = washer::hotkey::spawn_stop_watcher(washer.clone(), config.stop_hotkey, config.poll_granularity());
    tracing::info!(stop_hotkey = config.stop_hotkey, "running; focus the game and keep hands off the mouse");

    // Ends when the worker drops its sender.
    for event in rx {
        match event {
            RunEvent::Started { max_attempts } => println!("rerolling (up to {max_attempts} attempts)"),
            RunEvent::Recognized { attempt, text } => println!("#{attempt}: {}", text.replace('\n', " | ")),
            RunEvent::Verdict { matched: true, attempt } => println!("#{attempt}: rule satisfied"),
            _ => {}
        }
    }

    let report = handle.join()?;
    if let Some(hotkey) = hotkey {
        let _ = hotkey.join();
    }

    println!("{} after {} attempt(s)", report.outcome, report.attempts);
    Ok(match report.outcome {
        RunOutcome::Satisfied => {
            if config.notify_on_success {
                washer::notify::announce_success(&rule.to_string());
            }
            ExitCode::SUCCESS
        }
        RunOutcome::Exhausted => ExitCode::from(2),
        RunOutcome::Cancelled => ExitCode::from(3),
    })
}

fn check(config: &Config, store: &Store, rule: &RuleArg, file: Option<PathBuf>) -> Result<ExitCode> {
    let rule = resolve_rule(store, rule)?;
    anyhow::ensure!(!rule.is_empty(), "rule {rule:?} has nothing to look for");
    let text = match file {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("read {:?}", path))?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).context("read stdin")?;
            text
        }
    };

    let verdict = Matcher::new(config.similarity_threshold).check(&text, &rule);
    tracing::debug!(text = %verdict.text.replace('\n', " | "), "checked");
    println!("{}: {rule}", if verdict.matched { "match" } else { "no match" });
    Ok(if verdict.matched { ExitCode::SUCCESS } else { ExitCode::from(2) })
}

fn rules(store: &mut Store, action: RuleAction) -> Result<()> {
    match action {
        RuleAction::List => {
            for name in store.rule_names() {
                println!("{name}");
            }
            return Ok(());
        }
        RuleAction::Show { name } => {
            let rule = store.rule(&name)?;
            println!("{rule}");
            println!("{}", serde_json::to_string_pretty(rule)?);
            return Ok(());
        }
        RuleAction::Add { name, rule } => {
            let rule = parse_rule(&rule)?;
            anyhow::ensure!(!rule.is_empty(), "rule {name:?} is empty");
            store.put_rule(name, rule);
        }
        RuleAction::Remove { name } => {
            store.remove_rule(&name)?;
        }
        RuleAction::Rename { from, to } => store.rename_rule(&from, &to)?,
    }
    store.save()
}

fn profiles(store: &mut Store, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::List => {
            for name in store.profile_names() {
                println!("{name}");
            }
            return Ok(());
        }
        ProfileAction::Show { name } => {
            println!("{}", serde_json::to_string_pretty(store.profile(&name)?)?);
            return Ok(());
        }
        ProfileAction::Remove { name } => {
            store.remove_profile(&name)?;
        }
        ProfileAction::Rename { from, to } => store.rename_profile(&from, &to)?,
    }
    store.save()
}
