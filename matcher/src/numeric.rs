//! Pulls the value belonging to an affix label out of a single OCR line.
//!
//! OCR renders "label value" pairs in whatever order the game draws them and
//! with unreliable spacing, so three anchors are tried in turn.

use std::sync::LazyLock;

use regex::Regex;

use crate::normalize::is_line_delimiter;

/// How many characters on either side of the keyword are searched.
pub const WINDOW_CHARS: usize = 20;

static AFTER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[\s:+=\-]*(\d+(?:\.\d+)?)").expect("regex"));
static BEFORE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)[%\s+\-]*$").expect("regex"));

/// Extracts the number associated with `keyword` in `line`.
///
/// Returns `None` when `keyword` is not literally present in `line` or when no
/// anchor yields a parseable number.
pub fn extract_number_near(line: &str, keyword: &str) -> Option<f64> {
	let start = line.find(keyword)?;
	let end = start + keyword.len();

	after_keyword(&line[end..])
		.or_else(|| before_keyword(&line[..start]))
		.or_else(|| capture_number(&AFTER, line))
}

fn after_keyword(rest: &str) -> Option<f64> {
	let snippet: String = rest
		.chars()
		.take(WINDOW_CHARS)
		.take_while(|&c| !is_line_delimiter(c))
		.collect();
	capture_number(&AFTER, &snippet)
}

fn before_keyword(head: &str) -> Option<f64> {
	let mut tail: Vec<char> = head.chars().rev().take(WINDOW_CHARS).collect();
	tail.reverse();
	let cut = tail
		.iter()
		.rposition(|&c| is_line_delimiter(c))
		.map_or(0, |i| i + 1);
	let snippet: String = tail[cut..].iter().collect();
	capture_number(&BEFORE, &snippet)
}

fn capture_number(re: &Regex, text: &str) -> Option<f64> {
	re.captures(text)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn number_after_keyword() {
		assert_eq!(extract_number_near("冰霜抗性 +37", "冰霜抗性"), Some(37.0));
		assert_eq!(extract_number_near("Strength: 12.5", "Strength"), Some(12.5));
		assert_eq!(extract_number_near("力量=-4", "力量"), Some(4.0));
	}

	#[test]
	fn number_before_keyword() {
		assert_eq!(extract_number_near("+75% 法术伤害", "法术伤害"), Some(75.0));
		assert_eq!(extract_number_near("+3 to all skills", "to all skills"), Some(3.0));
	}

	#[test]
	fn number_at_line_head() {
		// Keyword sits in the middle, nothing adjacent on either side.
		assert_eq!(extract_number_near("+20 增加 火焰伤害 持续", "火焰伤害"), Some(20.0));
	}

	#[test]
	fn after_window_stops_at_delimiter() {
		assert_eq!(extract_number_near("力量|+15", "力量"), None);
		assert_eq!(extract_number_near("力量\n15", "力量"), None);
	}

	#[test]
	fn before_window_keeps_text_after_last_delimiter() {
		assert_eq!(extract_number_near("a+10|敏捷", "敏捷"), None);
		assert_eq!(extract_number_near("x|+10 敏捷", "敏捷"), Some(10.0));
	}

	#[test]
	fn windows_are_bounded() {
		let far = format!("力量{}15", "·".repeat(WINDOW_CHARS));
		assert_eq!(extract_number_near(&far, "力量"), None);
	}

	#[test]
	fn missing_keyword_or_number() {
		assert_eq!(extract_number_near("冰霜抗性 +37", "火焰抗性"), None);
		assert_eq!(extract_number_near("冰霜抗性", "冰霜抗性"), None);
		assert_eq!(extract_number_near("", "x"), None);
	}
}
