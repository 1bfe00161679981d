//! Calibrated coordinates for one piece of equipment.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
	pub x: i32,
	pub y: i32,
}

impl Point {
	pub const fn new(x: i32, y: i32) -> Self {
		Self { x, y }
	}

	pub fn offset(self, dx: i32, dy: i32) -> Self {
		Self::new(self.x + dx, self.y + dy)
	}
}

impl std::fmt::Display for Point {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "({}, {})", self.x, self.y)
	}
}

/// Screen rectangle the affix text is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
	pub x: i32,
	pub y: i32,
	pub width: u32,
	pub height: u32,
}

impl Region {
	/// Region spanned by two opposite corners given in any order.
	pub fn from_corners(a: Point, b: Point) -> Self {
		Self {
			x: a.x.min(b.x),
			y: a.y.min(b.y),
			width: a.x.abs_diff(b.x),
			height: a.y.abs_diff(b.y),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.width == 0 || self.height == 0
	}

	pub fn offset(self, dx: i32, dy: i32) -> Self {
		Self {
			x: self.x + dx,
			y: self.y + dy,
			..self
		}
	}
}

impl std::fmt::Display for Region {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "({}, {}) {}x{}", self.x, self.y, self.width, self.height)
	}
}

/// Identifies the game window coordinates are relative to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBinding {
	pub title: String,
}

/// Coordinate bundle produced by calibration.
///
/// With a window binding every point and the region are offsets from the
/// window's top-left corner; otherwise they are absolute screen coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
	/// Where to park the pointer so the item tooltip shows.
	#[serde(default)]
	pub hover: Option<Point>,
	#[serde(default)]
	pub region: Option<Region>,
	/// The reroll button.
	#[serde(default)]
	pub reroll: Option<Point>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub window: Option<WindowBinding>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn corners_in_any_order() {
		let expected = Region { x: 10, y: 20, width: 90, height: 30 };
		assert_eq!(Region::from_corners(Point::new(10, 20), Point::new(100, 50)), expected);
		assert_eq!(Region::from_corners(Point::new(100, 50), Point::new(10, 20)), expected);
		assert_eq!(Region::from_corners(Point::new(10, 50), Point::new(100, 20)), expected);
	}

	#[test]
	fn degenerate_region_is_empty() {
		assert!(Region::from_corners(Point::new(5, 5), Point::new(5, 40)).is_empty());
		assert!(!Region::from_corners(Point::new(5, 5), Point::new(6, 6)).is_empty());
	}

	#[test]
	fn unbound_profile_omits_window() {
		let profile = Profile {
			hover: Some(Point::new(1, 2)),
			region: None,
			reroll: Some(Point::new(3, 4)),
			window: None,
		};
		let json = serde_json::to_value(&profile).unwrap();
		assert!(json.get("window").is_none());
		assert_eq!(serde_json::from_value::<Profile>(json).unwrap(), profile);
	}
}
