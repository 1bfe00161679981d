//! Decides whether OCR'd item text satisfies a reroll rule.
//!
//! Everything here is pure: no I/O, no shared state, safe to call from any
//! thread. Malformed rules never produce errors, they produce "no match".

mod expr;
mod fuzzy;
mod group;
mod legacy;
mod normalize;
mod numeric;
mod rule;

use std::collections::HashMap;

pub use expr::{looks_like_expression, Expr, ExprError, MAX_DEPTH};
pub use fuzzy::{fuzzy_contains, similarity, DEFAULT_THRESHOLD};
pub use normalize::{normalize, split_lines, LINE_DELIMITERS};
pub use numeric::extract_number_near;
pub use rule::{AffixItem, ConditionGroup, GroupKind, Rule};

/// Outcome of checking one capture against a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
	pub matched: bool,
	/// The recognized text the decision was made on.
	pub text: String,
}

/// Rule evaluator with a tunable fuzzy threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matcher {
	threshold: f64,
}

impl Default for Matcher {
	fn default() -> Self {
		Self { threshold: DEFAULT_THRESHOLD }
	}
}

impl Matcher {
	pub fn new(threshold: f64) -> Self {
		Self { threshold: threshold.clamp(0.0, 1.0) }
	}

	pub fn threshold(&self) -> f64 {
		self.threshold
	}

	/// Fuzzy containment on already-normalized text.
	pub fn contains(&self, normalized: &str, needle: &str) -> bool {
		fuzzy_contains(normalized, needle, self.threshold)
	}

	pub fn check(&self, recognized: &str, rule: &Rule) -> Verdict {
		Verdict {
			matched: self.matches(recognized, rule),
			text: recognized.to_string(),
		}
	}

	/// Whether raw recognized text satisfies `rule`.
	pub fn matches(&self, recognized: &str, rule: &Rule) -> bool {
		let normalized = normalize(recognized);
		match rule {
			Rule::Keyword(keyword) => self.contains(&normalized, &normalize(keyword)),
			Rule::Expression(expression) => self.evaluate_expression(&normalized, expression),
			Rule::Groups(groups) => self.matches_groups(&split_lines(recognized), &normalized, groups),
		}
	}

	/// Evaluates a boolean formula whose atoms are looked up in `normalized`.
	///
	/// A formula that does not parse is logged and evaluates to `false`.
	pub fn evaluate_expression(&self, normalized: &str, expression: &str) -> bool {
		let expr = match Expr::parse(expression) {
			Ok(expr) => expr,
			Err(err) => {
				tracing::warn!(expression, error = %err, "failed to parse rule expression");
				return false;
			}
		};

		let mut seen: HashMap<String, bool> = HashMap::new();
		expr.eval(&mut |atom| {
			*seen
				.entry(atom.to_string())
				.or_insert_with(|| self.contains(normalized, &normalize(atom)))
		})
	}
}

/// [`Matcher::matches`] with the default threshold.
pub fn matches(recognized: &str, rule: &Rule) -> bool {
	Matcher::default().matches(recognized, rule)
}

/// [`Matcher::evaluate_expression`] with the default threshold.
pub fn evaluate_expression(normalized: &str, expression: &str) -> bool {
	Matcher::default().evaluate_expression(normalized, expression)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keyword_rule_is_fuzzy() {
		assert!(matches("冰霜抗性 +37", &Rule::Keyword("冰霜抗性".into())));
		assert!(matches("冰箱抗性 +37", &Rule::Keyword("冰霜抗性".into())));
		assert!(!matches("火焰抗性 +37", &Rule::Keyword("冰霜抗性".into())));
	}

	#[test]
	fn keyword_is_normalized_before_lookup() {
		assert!(matches("Cold Resist: +37%", &Rule::Keyword("COLD-RESIST".into())));
	}

	#[test]
	fn malformed_expression_fails_closed() {
		assert!(!evaluate_expression("a b c", "(a || b"));
		assert!(!evaluate_expression("a b c", "&&"));
		assert!(!matches("anything", &Rule::Expression("()".into())));
	}

	#[test]
	fn deeply_nested_expression_fails_closed() {
		let rule = Rule::Expression(format!("{}a{}", "(".repeat(2000), ")".repeat(2000)));
		let handle = std::thread::Builder::new()
			.stack_size(1024 * 1024)
			.spawn(move || matches("a", &rule))
			.unwrap();
		assert!(!handle.join().unwrap());
	}

	#[test]
	fn expression_rule() {
		let rule = Rule::from_text("冰霜 && (攻速 || 暴击)");
		assert!(matches("冰霜抗性 +30\n攻击速度 +15", &rule));
		assert!(matches("冰霜抗性 +30\n暴击几率 +5", &rule));
		assert!(!matches("冰霜抗性 +30\n力量 +15", &rule));
		assert!(!matches("攻击速度 +15", &rule));
	}

	#[test]
	fn negation() {
		let rule = Rule::from_text("冰霜 && !诅咒");
		assert!(matches("冰霜抗性", &rule));
		assert!(!matches("冰霜抗性\n诅咒光环", &rule));
	}

	#[test]
	fn threshold_is_clamped() {
		assert_eq!(Matcher::new(3.0).threshold(), 1.0);
		assert_eq!(Matcher::new(-1.0).threshold(), 0.0);
		assert!(!Matcher::new(1.0).matches("冰箱抗性", &Rule::Keyword("冰霜抗性".into())));
	}

	#[test]
	fn verdict_carries_text() {
		let verdict = Matcher::default().check("力量 +5", &Rule::Keyword("力量".into()));
		assert_eq!(verdict, Verdict { matched: true, text: "力量 +5".into() });
	}
}
