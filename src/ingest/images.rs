//! Still-image directory source.
//!
//! Replays the JPEG/PNG files of a local directory in file-name order, looping
//! forever. Each image is decoded in memory and resized to the configured frame
//! size. Useful for replaying a recorded bench session through the classifier.

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use std::path::{Path, PathBuf};

use super::{FrameSource, SourceStats};
use crate::frame::Frame;

pub struct ImageDirSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    width: u32,
    height: u32,
    frame_count: u64,
}

impl ImageDirSource {
    pub fn new<P: AsRef<Path>>(dir: P, width: u32, height: u32) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if width == 0 || height == 0 {
            return Err(anyhow!("image source needs a non-empty frame size"));
        }
        Ok(Self {
            dir,
            files: Vec::new(),
            width,
            height,
            frame_count: 0,
        })
    }

    fn is_image(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                matches!(
                    ext.to_ascii_lowercase().as_str(),
                    "jpg" | "jpeg" | "png"
                )
            })
            .unwrap_or(false)
    }
}

impl FrameSource for ImageDirSource {
    fn name(&self) -> String {
        format!("dir://{}", self.dir.display())
    }

    fn connect(&mut self) -> Result<()> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read image directory {}", self.dir.display()))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && Self::is_image(&path) {
                files.push(path);
            }
        }
        files.sort();
        if files.is_empty() {
            return Err(anyhow!(
                "image directory {} contains no .jpg/.jpeg/.png files",
                self.dir.display()
            ));
        }
        log::info!(
            "ImageDirSource: {} images from {}",
            files.len(),
            self.dir.display()
        );
        self.files = files;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        if self.files.is_empty() {
            return Err(anyhow!("image source used before connect()"));
        }
        let path = &self.files[(self.frame_count as usize) % self.files.len()];
        let image = image::open(path)
            .with_context(|| format!("failed to decode image {}", path.display()))?;
        let pixels = image
            .resize_exact(self.width, self.height, FilterType::Nearest)
            .to_rgb8()
            .into_raw();
        self.frame_count += 1;
        Frame::new(pixels, self.width, self.height, self.frame_count)
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            url: self.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_fails_on_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = ImageDirSource::new(dir.path(), 16, 16).unwrap();
        let err = source.connect().unwrap_err();
        assert!(err.to_string().contains("no .jpg/.jpeg/.png files"));
    }

    #[test]
    fn replays_images_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbImage::from_pixel(8, 8, image::Rgb([255, 0, 0]))
            .save(dir.path().join("b.png"))
            .unwrap();
        image::RgbImage::from_pixel(8, 8, image::Rgb([0, 0, 255]))
            .save(dir.path().join("a.png"))
            .unwrap();

        let mut source = ImageDirSource::new(dir.path(), 4, 4).unwrap();
        source.connect().unwrap();
        let first = source.next_frame().unwrap();
        assert_eq!(first.pixel(0, 0), Some([0, 0, 255]));
        let second = source.next_frame().unwrap();
        assert_eq!(second.pixel(0, 0), Some([255, 0, 0]));
        let third = source.next_frame().unwrap();
        assert_eq!(third.sequence, 3);
        assert_eq!(third.pixel(0, 0), Some([0, 0, 255]));
    }
}
