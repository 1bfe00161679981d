use std::sync::Arc;

use anyhow::{Context, Result};
use xcap::image::EncodableLayout;

use crate::profile::Region;

/// Screen capture plus OCR of one region.
pub trait Recognizer {
	/// Read the text inside `region` (absolute screen coordinates).
	fn capture_and_recognize(&mut self, region: Region, options: &ie::ReadOptions) -> Result<String>;
}

/// Captures the monitor under the region with `xcap` and reads it with [`ie::Ie`].
pub struct ScreenReader {
	ie: Arc<ie::Ie>,
}

impl ScreenReader {
	pub fn new(ie: Arc<ie::Ie>) -> Self {
		Self { ie }
	}
}

impl Recognizer for ScreenReader {
	fn capture_and_recognize(&mut self, region: Region, options: &ie::ReadOptions) -> Result<String> {
		let monitor = capture_monitor_at(region.x, region.y)?;
		let crop = monitor.image.as_image().sub_image(
			monitor.to_pixels(region.x - monitor.x),
			monitor.to_pixels(region.y - monitor.y),
			monitor.to_pixels(region.width as i32),
			monitor.to_pixels(region.height as i32),
		);
		anyhow::ensure!(!crop.is_empty(), "region {region} is outside the captured monitor");
		self.ie.read_text(crop, options)
	}
}

struct MonitorCapture {
	x: i32,
	y: i32,
	/// Captured pixels per logical monitor unit.
	scale: f32,
	image: ie::OwnedImage,
}

impl MonitorCapture {
	fn to_pixels(&self, value: i32) -> u32 {
		(value.max(0) as f32 * self.scale).round() as u32
	}
}

fn capture_monitor_at(x: i32, y: i32) -> Result<MonitorCapture> {
	let monitor = xcap::Monitor::from_point(x, y).with_context(|| format!("no monitor at ({x}, {y})"))?;
	let origin_x = monitor.x().context("monitor x")?;
	let origin_y = monitor.y().context("monitor y")?;
	let width = monitor.width().context("monitor width")?;

	let img = monitor.capture_image().context("capture monitor")?;
	let scale = if width == 0 { 1.0 } else { img.width() as f32 / width as f32 };

	Ok(MonitorCapture {
		x: origin_x,
		y: origin_y,
		scale,
		image: ie::OwnedImage::from_rgba(img.width() as usize, img.as_bytes()),
	})
}
