//! Storage shapes of [`Rule`] and [`AffixItem`].
//!
//! Rules written by earlier versions were sniffed by shape: a bare string, a
//! list of group objects, or a condition list / `{"AND": [..], "OR": [..]}`
//! dictionary whose entries may nest further lists and dictionaries. They are lifted into the tagged variants here so the evaluator
//! only ever sees [`Rule`].

use serde::{Deserialize, Serialize};

use crate::expr::looks_like_expression;
use crate::rule::{AffixItem, ConditionGroup, Rule};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum RuleRepr {
	Tagged(TaggedRule),
	Text(String),
	Groups(Vec<ConditionGroup>),
	Conditions(Vec<Condition>),
	Connectives(ConnectiveDict),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum TaggedRule {
	Keyword(String),
	Expression(String),
	Groups(Vec<ConditionGroup>),
}

/// One entry of an old condition list: a keyword or formula, a nested list
/// (every entry required) or a connective dictionary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Condition {
	Text(String),
	List(Vec<Condition>),
	Dict(ConnectiveDict),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConnectiveDict {
	#[serde(rename = "AND", default)]
	and: Option<Vec<Condition>>,
	#[serde(rename = "OR", default)]
	or: Option<Vec<Condition>>,
}

impl From<RuleRepr> for Rule {
	fn from(repr: RuleRepr) -> Self {
		match repr {
			RuleRepr::Tagged(TaggedRule::Keyword(text)) => Rule::Keyword(text),
			RuleRepr::Tagged(TaggedRule::Expression(text)) => Rule::Expression(text),
			RuleRepr::Tagged(TaggedRule::Groups(groups)) | RuleRepr::Groups(groups) => Rule::Groups(groups),
			RuleRepr::Text(text) => Rule::from_text(text),
			RuleRepr::Conditions(list) => lift_conditions(list.iter()),
			RuleRepr::Connectives(dict) => lift_conditions(std::iter::once(&Condition::Dict(dict))),
		}
	}
}

/// Lifts conditions that all have to hold into condition groups.
///
/// Required keywords collect into one leading ALL group. An `OR` list of plain
/// keywords becomes a COUNT group with at least one hit; anything nested
/// deeper is rewritten as a formula item.
fn lift_conditions<'a>(conditions: impl Iterator<Item = &'a Condition>) -> Rule {
	let mut required = Vec::new();
	let mut groups = Vec::new();
	for condition in conditions {
		lift_required(condition, &mut required, &mut groups);
	}
	if !required.is_empty() {
		groups.insert(0, ConditionGroup::all(required));
	}
	Rule::Groups(groups)
}

fn lift_required(condition: &Condition, required: &mut Vec<AffixItem>, groups: &mut Vec<ConditionGroup>) {
	match condition {
		Condition::Text(text) => required.push(AffixItem::new(text.as_str())),
		Condition::List(list) => list.iter().for_each(|c| lift_required(c, required, groups)),
		Condition::Dict(dict) => {
			for c in dict.and.iter().flatten() {
				lift_required(c, required, groups);
			}
			if let Some(any) = &dict.or {
				let items = if any.iter().all(|c| matches!(c, Condition::Text(_))) {
					any.iter().map(|c| AffixItem::new(formula(c))).collect()
				} else {
					vec![AffixItem::new(disjunction(any))]
				};
				groups.push(ConditionGroup::count(items, Some(1), None));
			}
		}
	}
}

/// Renders a condition as a boolean formula over its keywords.
fn formula(condition: &Condition) -> String {
	match condition {
		Condition::Text(text) if looks_like_expression(text) => format!("({text})"),
		Condition::Text(text) => text.clone(),
		Condition::List(list) => conjunction(list),
		Condition::Dict(dict) => {
			let mut parts = Vec::new();
			if let Some(all) = &dict.and {
				parts.push(conjunction(all));
			}
			if let Some(any) = &dict.or {
				parts.push(disjunction(any));
			}
			format!("({})", parts.join(" && "))
		}
	}
}

fn conjunction(list: &[Condition]) -> String {
	if list.is_empty() {
		return "true".to_string();
	}
	format!("({})", list.iter().map(formula).collect::<Vec<_>>().join(" && "))
}

fn disjunction(list: &[Condition]) -> String {
	if list.is_empty() {
		return "false".to_string();
	}
	format!("({})", list.iter().map(formula).collect::<Vec<_>>().join(" || "))
}

impl From<Rule> for RuleRepr {
	fn from(rule: Rule) -> Self {
		RuleRepr::Tagged(match rule {
			Rule::Keyword(text) => TaggedRule::Keyword(text),
			Rule::Expression(text) => TaggedRule::Expression(text),
			Rule::Groups(groups) => TaggedRule::Groups(groups),
		})
	}
}

/// An affix is stored as its bare name unless it carries bounds or flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum AffixRepr {
	Name(String),
	Detailed {
		name: String,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		min_value: Option<f64>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		max_value: Option<f64>,
		#[serde(default, skip_serializing_if = "std::ops::Not::not")]
		exact: bool,
	},
}

impl From<AffixRepr> for AffixItem {
	fn from(repr: AffixRepr) -> Self {
		match repr {
			AffixRepr::Name(name) => AffixItem::new(name),
			AffixRepr::Detailed { name, min_value, max_value, exact } => {
				AffixItem { name, min_value, max_value, exact }
			}
		}
	}
}

impl From<AffixItem> for AffixRepr {
	fn from(item: AffixItem) -> Self {
		if !item.has_bounds() && !item.exact {
			return AffixRepr::Name(item.name);
		}
		AffixRepr::Detailed {
			name: item.name,
			min_value: item.min_value,
			max_value: item.max_value,
			exact: item.exact,
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::rule::GroupKind;

	fn lift(value: serde_json::Value) -> Rule {
		serde_json::from_value(value).unwrap()
	}

	#[test]
	fn bare_strings_are_classified() {
		assert_eq!(lift(json!("冰霜抗性")), Rule::Keyword("冰霜抗性".into()));
		assert_eq!(lift(json!("冰霜 && (攻速 || 暴击)")), Rule::Expression("冰霜 && (攻速 || 暴击)".into()));
	}

	#[test]
	fn string_list_becomes_all_group() {
		assert_eq!(
			lift(json!(["冰霜抗性", "攻速"])),
			Rule::Groups(vec![ConditionGroup::all(["冰霜抗性", "攻速"].map(AffixItem::from))])
		);
	}

	#[test]
	fn editor_group_list() {
		let rule = lift(json!([
			{"type": "AND", "affixes": ["冰霜抗性", {"name": "力量", "min_value": 10.0}]},
			{"type": "NOT", "affixes": ["诅咒"]},
			{"type": "COUNT", "affixes": ["a", "b", "c"], "min": 1, "max": 2}
		]));
		let Rule::Groups(groups) = rule else { panic!("expected groups") };
		assert_eq!(groups[0].kind, GroupKind::All);
		assert_eq!(groups[0].items[1], AffixItem::new("力量").with_min(10.0));
		assert_eq!(groups[1].kind, GroupKind::NoneOf);
		assert_eq!((groups[2].kind, groups[2].min, groups[2].max), (GroupKind::Count, Some(1), Some(2)));
	}

	#[test]
	fn connective_dictionary() {
		let rule = lift(json!({"AND": ["a"], "OR": ["b", "c"]}));
		assert_eq!(
			rule,
			Rule::Groups(vec![
				ConditionGroup::all([AffixItem::new("a")]),
				ConditionGroup::count(["b", "c"].map(AffixItem::from), Some(1), None),
			])
		);
	}

	#[test]
	fn mixed_condition_list() {
		let rule = lift(json!(["冰霜抗性", {"OR": ["攻速", "暴击"]}, ["力量"]]));
		assert_eq!(
			rule,
			Rule::Groups(vec![
				ConditionGroup::all(["冰霜抗性", "力量"].map(AffixItem::from)),
				ConditionGroup::count(["攻速", "暴击"].map(AffixItem::from), Some(1), None),
			])
		);
	}

	#[test]
	fn nested_alternatives_become_formulas() {
		let rule = lift(json!({"OR": ["诅咒", ["冰霜", "攻速"], {"AND": ["a"], "OR": ["b", "c"]}]}));
		let Rule::Groups(groups) = &rule else { panic!("expected groups") };
		assert_eq!(groups.len(), 1);
		assert_eq!(groups[0].kind, GroupKind::Count);
		assert_eq!(groups[0].items[0].name, "(诅咒 || (冰霜 && 攻速) || ((a) && (b || c)))");

		assert!(crate::matches("冰霜抗性 +30\n攻击速度 +15", &rule));
		assert!(crate::matches("诅咒光环", &rule));
		assert!(crate::matches("a b", &rule));
		assert!(!crate::matches("冰霜抗性 +30", &rule));
	}

	#[test]
	fn modern_shape_is_tagged() {
		let rule = Rule::Groups(vec![ConditionGroup::none_of([AffixItem::new("x").exact()])]);
		assert_eq!(
			serde_json::to_value(&rule).unwrap(),
			json!({"groups": [{"type": "NONE", "affixes": [{"name": "x", "exact": true}]}]})
		);
		assert_eq!(serde_json::to_value(Rule::Keyword("k".into())).unwrap(), json!({"keyword": "k"}));
	}

	#[test]
	fn round_trips_losslessly() {
		let rules = [
			Rule::Keyword("冰霜抗性".into()),
			// Would be re-classified as an expression if stored bare.
			Rule::Keyword("a && b".into()),
			Rule::Expression("plain".into()),
			Rule::Groups(vec![]),
			Rule::Groups(vec![
				ConditionGroup::all([AffixItem::new("力量").with_min(10.0).with_max(20.5), AffixItem::new("攻速")]),
				ConditionGroup::none_of([AffixItem::new("诅咒").exact()]),
				ConditionGroup::count(["a", "b"].map(AffixItem::from), None, Some(1)),
			]),
		];
		for rule in rules {
			let json = serde_json::to_string(&rule).unwrap();
			let back: Rule = serde_json::from_str(&json).unwrap();
			assert_eq!(back, rule, "{json}");
		}
	}

	#[test]
	fn unknown_shapes_are_rejected() {
		assert!(serde_json::from_value::<Rule>(json!(42)).is_err());
		assert!(serde_json::from_value::<Rule>(json!({"nonsense": 1})).is_err());
	}
}
