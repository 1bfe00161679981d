use std::sync::LazyLock;

use regex::Regex;

static NON_TEXT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s]").expect("regex"));

/// Characters OCR emits in place of a line break.
pub const LINE_DELIMITERS: [char; 3] = ['\n', '\r', '|'];

/// Canonicalizes recognized text for comparison.
///
/// Lower-cases, turns every symbol into a space (so `a+b` stays two tokens
/// instead of fusing into `ab`), collapses whitespace runs and trims.
/// Normalizing twice yields the same string.
pub fn normalize(text: &str) -> String {
	let lowered = text.to_lowercase();
	NON_TEXT
		.replace_all(&lowered, " ")
		.split_whitespace()
		.collect::<Vec<_>>()
		.join(" ")
}

/// Splits raw recognized text into its non-empty lines.
///
/// Both real newlines and the pipe glyph count as line breaks.
pub fn split_lines(text: &str) -> Vec<&str> {
	text.split(LINE_DELIMITERS)
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.collect()
}

#[inline]
pub(crate) fn is_line_delimiter(c: char) -> bool {
	LINE_DELIMITERS.contains(&c)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_symbols_into_spaces() {
		assert_eq!(normalize("Cold Resist: +37%"), "cold resist 37");
		assert_eq!(normalize("冰霜抗性+30"), "冰霜抗性 30");
		assert_eq!(normalize("  a\t\tb \n c  "), "a b c");
		assert_eq!(normalize(""), "");
		assert_eq!(normalize("+++"), "");
	}

	#[test]
	fn is_idempotent() {
		let corpus = [
			"",
			"   ",
			"冰霜抗性 +37",
			"+75% 法术伤害",
			"Attack Speed | +15%\nStrength +10",
			"İstanbul ǅemal",
			"a_b-c.d,e!f?g",
			"全部技能等级+3 (装备)",
			"\u{3000}全角空格\u{3000}",
			"ÀÉÎÕÜ 123.45",
		];
		for s in corpus {
			let once = normalize(s);
			assert_eq!(normalize(&once), once, "input {s:?}");
		}
	}

	#[test]
	fn splits_on_newline_and_pipe() {
		assert_eq!(
			split_lines("冰霜抗性 +30\n攻击速度 +15|力量 +5\r\n\n"),
			vec!["冰霜抗性 +30", "攻击速度 +15", "力量 +5"]
		);
		assert!(split_lines("").is_empty());
	}
}
