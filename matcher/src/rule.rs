//! The user's matching intent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::expr::looks_like_expression;
use crate::legacy::{AffixRepr, RuleRepr};
use crate::normalize::normalize;

/// What has to show up on screen for a reroll to be kept.
///
/// Serialized in a tagged shape (`{"keyword": ..}`, `{"expression": ..}`,
/// `{"groups": [..]}`); older stored shapes are lifted on the way in, see
/// [`crate::legacy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RuleRepr", into = "RuleRepr")]
pub enum Rule {
	/// A single keyword, fuzzily searched in the text.
	Keyword(String),
	/// A boolean formula over keywords (`a && (b || !c)`).
	Expression(String),
	/// Condition groups; every group has to pass.
	Groups(Vec<ConditionGroup>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
	/// Every non-blank item must be present.
	#[serde(rename = "ALL", alias = "AND")]
	All,
	/// No item may be present.
	#[serde(rename = "NONE", alias = "NOT")]
	NoneOf,
	/// Between `min` and `max` items must be present.
	#[serde(rename = "COUNT")]
	Count,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
	#[serde(rename = "type")]
	pub kind: GroupKind,
	#[serde(rename = "affixes", alias = "items", default)]
	pub items: Vec<AffixItem>,
	/// Lower bound on matched items, `COUNT` only.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min: Option<u32>,
	/// Upper bound on matched items, `COUNT` only.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max: Option<u32>,
}

/// One affix inside a condition group.
///
/// With a value bound set, the affix only counts when the number printed next
/// to it on the same line lies within the bounds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "AffixRepr", into = "AffixRepr")]
pub struct AffixItem {
	pub name: String,
	pub min_value: Option<f64>,
	pub max_value: Option<f64>,
	/// Require the normalized name verbatim instead of a fuzzy hit.
	pub exact: bool,
}

impl Rule {
	/// Classifies authored text as a keyword or a formula.
	pub fn from_text(text: impl Into<String>) -> Self {
		let text = text.into();
		if looks_like_expression(&text) {
			Rule::Expression(text)
		} else {
			Rule::Keyword(text)
		}
	}

	/// A rule with nothing to look for cannot arm a run.
	///
	/// Text that normalizes to nothing (`"+++"`, `"  "`) is empty, and so is a
	/// group list without a single active item.
	pub fn is_empty(&self) -> bool {
		match self {
			Rule::Keyword(text) | Rule::Expression(text) => normalize(text).is_empty(),
			Rule::Groups(groups) => groups.iter().all(|group| group.active_items().next().is_none()),
		}
	}
}

impl FromStr for Rule {
	type Err = serde_json::Error;

	/// Accepts JSON (modern or legacy shape) or bare rule text.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		if trimmed.starts_with('[') || trimmed.starts_with('{') {
			serde_json::from_str(trimmed)
		} else {
			Ok(Rule::from_text(trimmed))
		}
	}
}

impl ConditionGroup {
	pub fn all(items: impl IntoIterator<Item = AffixItem>) -> Self {
		Self { kind: GroupKind::All, items: items.into_iter().collect(), min: None, max: None }
	}

	pub fn none_of(items: impl IntoIterator<Item = AffixItem>) -> Self {
		Self { kind: GroupKind::NoneOf, items: items.into_iter().collect(), min: None, max: None }
	}

	pub fn count(items: impl IntoIterator<Item = AffixItem>, min: Option<u32>, max: Option<u32>) -> Self {
		Self { kind: GroupKind::Count, items: items.into_iter().collect(), min, max }
	}

	/// Whether `matched` items out of this group satisfy its policy.
	pub fn accepts(&self, matched: usize) -> bool {
		match self.kind {
			GroupKind::All => matched == self.active_items().count(),
			GroupKind::NoneOf => matched == 0,
			GroupKind::Count => {
				self.min.is_none_or(|min| matched >= min as usize)
					&& self.max.is_none_or(|max| matched <= max as usize)
			}
		}
	}

	/// Items with something to look for. Blank rows left over from editing and
	/// names made only of symbols normalize to nothing and are ignored.
	pub fn active_items(&self) -> impl Iterator<Item = &AffixItem> {
		self.items.iter().filter(|item| !normalize(&item.name).is_empty())
	}
}

impl AffixItem {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), ..Default::default() }
	}

	pub fn with_min(mut self, value: f64) -> Self {
		self.min_value = Some(value);
		self
	}

	pub fn with_max(mut self, value: f64) -> Self {
		self.max_value = Some(value);
		self
	}

	pub fn exact(mut self) -> Self {
		self.exact = true;
		self
	}

	pub fn has_bounds(&self) -> bool {
		self.min_value.is_some() || self.max_value.is_some()
	}

	pub fn in_bounds(&self, value: f64) -> bool {
		self.min_value.is_none_or(|min| value >= min) && self.max_value.is_none_or(|max| value <= max)
	}
}

impl From<&str> for AffixItem {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

impl fmt::Display for Rule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Rule::Keyword(text) | Rule::Expression(text) => f.write_str(text),
			Rule::Groups(groups) => {
				for (i, group) in groups.iter().enumerate() {
					if i > 0 {
						f.write_str(" & ")?;
					}
					write!(f, "{group}")?;
				}
				Ok(())
			}
		}
	}
}

impl fmt::Display for ConditionGroup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.kind {
			GroupKind::All => f.write_str("ALL")?,
			GroupKind::NoneOf => f.write_str("NONE")?,
			GroupKind::Count => {
				let min = self.min.map(|v| v.to_string()).unwrap_or_default();
				let max = self.max.map(|v| v.to_string()).unwrap_or_default();
				write!(f, "COUNT({min}..{max})")?;
			}
		}
		f.write_str("[")?;
		for (i, item) in self.active_items().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{item}")?;
		}
		f.write_str("]")
	}
}

impl fmt::Display for AffixItem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.name)?;
		match (self.min_value, self.max_value) {
			(None, None) => Ok(()),
			(Some(min), None) => write!(f, ">={min}"),
			(None, Some(max)) => write!(f, "<={max}"),
			(Some(min), Some(max)) => write!(f, " in {min}..={max}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classifies_authored_text() {
		assert_eq!(Rule::from_text("冰霜抗性"), Rule::Keyword("冰霜抗性".into()));
		assert_eq!(Rule::from_text("冰霜 && 攻速"), Rule::Expression("冰霜 && 攻速".into()));
		assert_eq!(Rule::from_text("(冰霜)"), Rule::Expression("(冰霜)".into()));
	}

	#[test]
	fn parses_text_or_json() {
		assert_eq!("a || b".parse::<Rule>().unwrap(), Rule::Expression("a || b".into()));
		assert_eq!(
			r#"[{"type": "AND", "affixes": ["力量"]}]"#.parse::<Rule>().unwrap(),
			Rule::Groups(vec![ConditionGroup::all([AffixItem::new("力量")])])
		);
		assert!("[{".parse::<Rule>().is_err());
	}

	#[test]
	fn count_bounds_are_inclusive_and_optional() {
		let items = ["a", "b", "c", "d"].map(AffixItem::from);
		let group = ConditionGroup::count(items.clone(), Some(2), Some(3));
		let accepted: Vec<usize> = (0..=4).filter(|&n| group.accepts(n)).collect();
		assert_eq!(accepted, vec![2, 3]);

		let open = ConditionGroup::count(items, Some(1), None);
		assert!(!open.accepts(0));
		assert!(open.accepts(4));
	}

	#[test]
	fn all_ignores_blank_items() {
		let group = ConditionGroup::all(["a", "  ", "b"].map(AffixItem::from));
		assert!(group.accepts(2));
		assert!(!group.accepts(1));
	}

	#[test]
	fn emptiness() {
		assert!(Rule::Keyword("  ".into()).is_empty());
		assert!(Rule::Groups(vec![]).is_empty());
		assert!(!Rule::Keyword("x".into()).is_empty());
	}

	#[test]
	fn text_that_normalizes_to_nothing_is_empty() {
		assert!(Rule::Keyword("+++".into()).is_empty());
		assert!(Rule::Keyword("%".into()).is_empty());
		assert!(Rule::Expression("() && ()".into()).is_empty());
		assert!(!Rule::Keyword("+5%".into()).is_empty());
	}

	#[test]
	fn groups_without_active_items_are_empty() {
		assert!(Rule::Groups(vec![ConditionGroup::all([AffixItem::new("  ")])]).is_empty());
		assert!(Rule::Groups(vec![ConditionGroup::all([AffixItem::new("%")])]).is_empty());
		assert!(Rule::Groups(vec![ConditionGroup::none_of([AffixItem::new("+-")]), ConditionGroup::all([])]).is_empty());
		assert!(!Rule::Groups(vec![ConditionGroup::all([]), ConditionGroup::none_of([AffixItem::new("诅咒")])]).is_empty());
	}

	#[test]
	fn symbol_only_items_are_inactive() {
		let group = ConditionGroup::all(["力量", "%", "  ", "+"].map(AffixItem::from));
		assert_eq!(group.active_items().map(|item| item.name.as_str()).collect::<Vec<_>>(), vec!["力量"]);
		assert!(group.accepts(1));
	}

	#[test]
	fn display_summarizes_groups() {
		let rule = Rule::Groups(vec![
			ConditionGroup::all([AffixItem::new("力量").with_min(10.0)]),
			ConditionGroup::count(["a", "b"].map(AffixItem::from), Some(1), None),
		]);
		assert_eq!(rule.to_string(), "ALL[力量>=10] & COUNT(1..)[a, b]");
	}
}
