//! Noise-tolerant keyword containment.
//!
//! OCR mistakes are local: one glyph replaced, an extra glyph inserted, a glyph
//! dropped. Instead of aligning the keyword against the whole text, we slide
//! windows of roughly the keyword's own length across the text and accept as
//! soon as one of them is similar enough.

/// Default similarity a window must reach to count as a hit.
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Needles shorter than this are scanned with stride 1, longer ones with stride 2.
const SHORT_NEEDLE: usize = 10;

/// Returns whether `needle` occurs in `haystack`, allowing small edit noise.
///
/// Both inputs are expected to be normalized already.
pub fn fuzzy_contains(haystack: &str, needle: &str, threshold: f64) -> bool {
	if needle.is_empty() || haystack.contains(needle) {
		return true;
	}

	let hay: Vec<char> = haystack.chars().collect();
	let pin_len = needle.chars().count();

	if pin_len > hay.len() {
		return similarity(haystack, needle) >= threshold;
	}

	let stride = if pin_len < SHORT_NEEDLE { 1 } else { 2 };
	let sizes = [pin_len, pin_len + 1, pin_len - 1];

	let mut window = String::new();
	for size in sizes {
		if size == 0 || size > hay.len() {
			continue;
		}
		for start in (0..=hay.len() - size).step_by(stride) {
			window.clear();
			window.extend(&hay[start..start + size]);
			if similarity(&window, needle) >= threshold {
				return true;
			}
		}
	}

	false
}

/// Character-level similarity in `[0, 1]`, built on the Levenshtein distance `d`:
/// `2 * (max(|a|, |b|) - d) / (|a| + |b|)`, lengths in chars.
///
/// `max - d` is at least the number of characters an optimal edit script keeps
/// in place. A glyph inserted into a short keyword (`攻击速` vs `攻速`) scores
/// higher than a replaced one (`攻击` vs `攻速`). For equal lengths this is
/// `1 - d / len`.
pub fn similarity(a: &str, b: &str) -> f64 {
	let (len_a, len_b) = (a.chars().count(), b.chars().count());
	let total = len_a + len_b;
	if total == 0 {
		return 1.0;
	}
	let distance = levenshtein::levenshtein(a, b);
	let kept = len_a.max(len_b).saturating_sub(distance);
	2.0 * kept as f64 / total as f64
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_needle_is_vacuously_present() {
		assert!(fuzzy_contains("", "", DEFAULT_THRESHOLD));
		assert!(fuzzy_contains("anything", "", DEFAULT_THRESHOLD));
	}

	#[test]
	fn exact_substrings_always_match() {
		let hay = "冰霜抗性 30 攻击速度 15";
		for (i, _) in hay.char_indices() {
			for (j, _) in hay[i..].char_indices().skip(1) {
				let needle = &hay[i..i + j];
				assert!(fuzzy_contains(hay, needle, 1.0), "needle {needle:?}");
			}
		}
	}

	#[test]
	fn tolerates_single_glyph_noise() {
		// substitution
		assert!(fuzzy_contains("冰箱抗性 30", "冰霜抗性", DEFAULT_THRESHOLD));
		// insertion
		assert!(fuzzy_contains("攻击速度 15", "攻速", DEFAULT_THRESHOLD));
		// deletion
		assert!(fuzzy_contains("cold resst 30", "cold resist", DEFAULT_THRESHOLD));
	}

	#[test]
	fn rejects_unrelated_text() {
		assert!(!fuzzy_contains("冰霜抗性 30 力量 15", "攻速", DEFAULT_THRESHOLD));
		assert!(!fuzzy_contains("fire resist 30", "cold resist", DEFAULT_THRESHOLD));
		assert!(!fuzzy_contains("abc", "xyz", DEFAULT_THRESHOLD));
	}

	#[test]
	fn long_needle_compares_whole_strings() {
		assert!(fuzzy_contains("attack sped", "attack speed", DEFAULT_THRESHOLD));
		assert!(!fuzzy_contains("str", "strength bonus", DEFAULT_THRESHOLD));
	}

	#[test]
	fn similarity_bounds() {
		assert_eq!(similarity("abc", "abc"), 1.0);
		assert_eq!(similarity("abc", "xyz"), 0.0);
		assert_eq!(similarity("", ""), 1.0);
		assert!((similarity("攻击速", "攻速") - 0.8).abs() < 1e-9);
		assert!((similarity("冰箱抗性", "冰霜抗性") - 0.75).abs() < 1e-9);
	}

	#[test]
	fn inserted_glyph_costs_less_than_replaced_one() {
		assert!(similarity("攻击速", "攻速") >= DEFAULT_THRESHOLD);
		assert!(similarity("攻击", "攻速") < DEFAULT_THRESHOLD);
		assert!(!fuzzy_contains("攻击力 20", "攻速", DEFAULT_THRESHOLD));
	}
}
