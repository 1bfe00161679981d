//! Condition-group evaluation.

use crate::normalize::normalize;
use crate::numeric::extract_number_near;
use crate::rule::{AffixItem, ConditionGroup};
use crate::Matcher;

impl Matcher {
	/// Every group has to pass; an empty list passes trivially.
	///
	/// `lines` are the raw recognized lines, `normalized` the normalized full text.
	pub fn matches_groups(&self, lines: &[&str], normalized: &str, groups: &[ConditionGroup]) -> bool {
		groups.iter().enumerate().all(|(index, group)| {
			let matched = group
				.active_items()
				.filter(|item| self.item_matches(lines, normalized, item))
				.count();
			let pass = group.accepts(matched);
			tracing::debug!(index, %group, matched, pass, "condition group");
			pass
		})
	}

	fn item_matches(&self, lines: &[&str], normalized: &str, item: &AffixItem) -> bool {
		// A formula may combine affixes from different lines.
		if item.name.contains("&&") || item.name.contains("||") {
			return self.evaluate_expression(normalized, &item.name);
		}

		let name = normalize(&item.name);
		if item.has_bounds() {
			return lines.iter().any(|line| self.line_satisfies(line, &name, item));
		}
		self.present(normalized, &name, item.exact)
	}

	/// The value bound is only ever checked against a number on the same line
	/// as the affix, never a neighbouring one.
	fn line_satisfies(&self, line: &str, name: &str, item: &AffixItem) -> bool {
		let normalized_line = normalize(line);
		if !self.present(&normalized_line, name, item.exact) {
			return false;
		}

		let value = extract_number_near(line, item.name.trim())
			.or_else(|| extract_number_near(&line.to_lowercase(), &item.name.trim().to_lowercase()))
			.or_else(|| extract_number_near(&normalized_line, name));
		match value {
			Some(value) => {
				let ok = item.in_bounds(value);
				tracing::debug!(affix = %item, value, ok, line, "affix value");
				ok
			}
			None => false,
		}
	}

	fn present(&self, haystack: &str, needle: &str, exact: bool) -> bool {
		if exact {
			haystack.contains(needle)
		} else {
			self.contains(haystack, needle)
		}
	}
}
