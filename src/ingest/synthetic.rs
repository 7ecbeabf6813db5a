//! Synthetic bench scene.
//!
//! Produces a textured grey background. During the clutter phase of each cycle a
//! saturated red square (the stub classifier's "rubbish" marker) is painted in
//! the middle of the frame. The schedule is frame-count based, so a run is fully
//! deterministic.

use anyhow::{anyhow, Result};

use super::{FrameSource, SourceStats};
use crate::frame::{rgb_len, Frame};

#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Length of one clean + cluttered cycle, in frames.
    pub cycle_frames: u64,
    /// Frames at the end of each cycle that show clutter.
    pub clutter_frames: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            url: "stub://bench".to_string(),
            width: 240,
            height: 240,
            cycle_frames: 120,
            clutter_frames: 40,
        }
    }
}

pub struct SyntheticSource {
    config: SyntheticConfig,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!("synthetic source needs a non-empty frame size"));
        }
        if config.cycle_frames == 0 || config.clutter_frames > config.cycle_frames {
            return Err(anyhow!(
                "synthetic clutter schedule must satisfy 0 <= clutter_frames <= cycle_frames, cycle_frames > 0"
            ));
        }
        rgb_len(config.width, config.height)?;
        Ok(Self {
            config,
            frame_count: 0,
        })
    }

    /// Whether the frame with this sequence number shows clutter.
    pub fn is_cluttered(&self, sequence: u64) -> bool {
        let phase = (sequence - 1) % self.config.cycle_frames;
        phase >= self.config.cycle_frames - self.config.clutter_frames
    }

    fn generate_pixels(&self, sequence: u64) -> Result<Vec<u8>> {
        let width = self.config.width;
        let height = self.config.height;
        let mut pixels = vec![0u8; rgb_len(width, height)?];
        for (i, rgb) in pixels.chunks_exact_mut(3).enumerate() {
            let shade = 80 + ((i as u64 + sequence) % 48) as u8;
            rgb.copy_from_slice(&[shade, shade, shade]);
        }

        if self.is_cluttered(sequence) {
            let side = (width.min(height) / 4).max(1);
            let x0 = (width - side) / 2;
            let y0 = (height - side) / 2;
            for y in y0..y0 + side {
                for x in x0..x0 + side {
                    let idx = ((y as usize) * (width as usize) + x as usize) * 3;
                    pixels[idx..idx + 3].copy_from_slice(&[230, 20, 20]);
                }
            }
        }
        Ok(pixels)
    }
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> String {
        self.config.url.clone()
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("SyntheticSource: connected to {}", self.config.url);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        self.frame_count += 1;
        let pixels = self.generate_pixels(self.frame_count)?;
        Frame::new(
            pixels,
            self.config.width,
            self.config.height,
            self.frame_count,
        )
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.config.url.clone(),
        }
    }
}
