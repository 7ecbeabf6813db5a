use anyhow::Result;

use crate::detect::backend::ClassifierBackend;
use crate::detect::result::{Detection, Region};

/// Label reported by the stub backend.
pub const STUB_LABEL: &str = "rubbish";

const STUB_CONFIDENCE: f32 = 0.99;
const DEFAULT_MIN_PIXELS: usize = 16;

/// Stub backend for tests and demos.
///
/// Treats saturated red pixels as the "rubbish" marker painted by the synthetic
/// source. Reports a single detection covering the marker's bounding box.
pub struct StubBackend {
    min_pixels: usize,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            min_pixels: DEFAULT_MIN_PIXELS,
        }
    }

    /// Minimum marker pixels before the frame counts as cluttered.
    pub fn with_min_pixels(mut self, min_pixels: usize) -> Self {
        self.min_pixels = min_pixels.max(1);
        self
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn is_marker(rgb: &[u8]) -> bool {
    rgb[0] >= 200 && rgb[1] <= 60 && rgb[2] <= 60
}

impl ClassifierBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn classify(&mut self, pixels: &[u8], width: u32, _height: u32) -> Result<Vec<Detection>> {
        if width == 0 {
            return Ok(Vec::new());
        }

        let mut count = 0usize;
        let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
        let (mut max_x, mut max_y) = (0u32, 0u32);
        for (i, rgb) in pixels.chunks_exact(3).enumerate() {
            if !is_marker(rgb) {
                continue;
            }
            let x = (i % width as usize) as u32;
            let y = (i / width as usize) as u32;
            count += 1;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        if count < self.min_pixels {
            return Ok(Vec::new());
        }

        let region = Region {
            x: min_x,
            y: min_y,
            w: max_x - min_x + 1,
            h: max_y - min_y + 1,
        };
        Ok(vec![Detection::new(STUB_LABEL, STUB_CONFIDENCE, region)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paint(width: u32, height: u32, square: Option<(u32, u32, u32)>) -> Vec<u8> {
        let mut pixels = vec![90u8; (width * height * 3) as usize];
        if let Some((sx, sy, side)) = square {
            for y in sy..sy + side {
                for x in sx..sx + side {
                    let idx = ((y * width + x) * 3) as usize;
                    pixels[idx..idx + 3].copy_from_slice(&[255, 0, 0]);
                }
            }
        }
        pixels
    }

    #[test]
    fn stub_backend_finds_marker() {
        let mut backend = StubBackend::new();
        let pixels = paint(32, 32, Some((4, 6, 8)));

        let detections = backend.classify(&pixels, 32, 32).unwrap();
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].label, "rubbish");
        assert!(detections[0].confidence > 0.95);
        assert_eq!(detections[0].region, Region { x: 4, y: 6, w: 8, h: 8 });
    }

    #[test]
    fn stub_backend_ignores_clean_frames() {
        let mut backend = StubBackend::new();
        let pixels = paint(32, 32, None);
        assert!(backend.classify(&pixels, 32, 32).unwrap().is_empty());
    }

    #[test]
    fn stub_backend_ignores_specks() {
        let mut backend = StubBackend::new().with_min_pixels(10);
        let pixels = paint(32, 32, Some((0, 0, 3)));
        assert!(backend.classify(&pixels, 32, 32).unwrap().is_empty());
    }
}
