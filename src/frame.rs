//! Frames handed from ingestion sources to classifier backends.
//!
//! Pixels are packed RGB, row-major, 3 bytes per pixel. A frame lives for one
//! tick of the frame loop and is dropped after classification.

use anyhow::{anyhow, Result};

use crate::detect::{ClassifierBackend, Detection};

/// One captured RGB frame.
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Capture sequence number within the source (1-based).
    pub sequence: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Result<Self> {
        let expected = rgb_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "frame {}x{} expects {} RGB bytes, received {}",
                width,
                height,
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            sequence,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// RGB triple at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 3;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Run a classifier on this frame. Detections are valid for this frame only.
    pub fn classify_with(&self, backend: &mut dyn ClassifierBackend) -> Result<Vec<Detection>> {
        backend.classify(&self.data, self.width, self.height)
    }
}

/// Byte length of a packed RGB frame.
pub fn rgb_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}
