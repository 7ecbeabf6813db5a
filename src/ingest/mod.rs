//! Frame ingestion sources.
//!
//! - Synthetic bench scene (`stub://`), for demos and tests
//! - Directory of still images (`dir://`, feature: ingest-images)
//!
//! Sources hand out one `Frame` per call. They do not classify, buffer or
//! store frames; the monitor drops each frame after its tick.

#[cfg(feature = "ingest-images")]
pub mod images;
pub mod synthetic;

use anyhow::{bail, Result};

#[cfg(feature = "ingest-images")]
pub use images::ImageDirSource;
pub use synthetic::{SyntheticConfig, SyntheticSource};

use crate::config::SourceSettings;
use crate::frame::Frame;

/// Statistics for a frame source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub url: String,
}

/// Anything that can deliver frames to the monitor.
pub trait FrameSource: Send {
    /// Human-readable source name (usually the URL).
    fn name(&self) -> String;

    /// Open the underlying device or stream.
    fn connect(&mut self) -> Result<()>;

    /// Capture the next frame. Errors are fatal to the frame loop.
    fn next_frame(&mut self) -> Result<Frame>;

    fn stats(&self) -> SourceStats;
}

/// Open the source named by `settings.url`.
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    let url = settings.url.trim();
    if url.starts_with("stub://") {
        let config = SyntheticConfig {
            url: url.to_string(),
            width: settings.width,
            height: settings.height,
            ..SyntheticConfig::default()
        };
        return Ok(Box::new(SyntheticSource::new(config)?));
    }
    if let Some(path) = url.strip_prefix("dir://") {
        #[cfg(feature = "ingest-images")]
        {
            return Ok(Box::new(ImageDirSource::new(
                path,
                settings.width,
                settings.height,
            )?));
        }
        #[cfg(not(feature = "ingest-images"))]
        {
            let _ = path;
            bail!("image directory ingestion requires the ingest-images feature");
        }
    }
    bail!(
        "unsupported frame source '{}': expected stub:// or dir://",
        url
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> SourceSettings {
        SourceSettings {
            url: url.to_string(),
            target_fps: 10,
            width: 32,
            height: 32,
        }
    }

    #[test]
    fn open_source_accepts_stub_urls() {
        let mut source = open_source(&settings("stub://bench")).expect("stub source");
        source.connect().unwrap();
        let frame = source.next_frame().unwrap();
        assert_eq!((frame.width, frame.height), (32, 32));
        assert_eq!(source.stats().frames_captured, 1);
    }

    #[test]
    fn open_source_rejects_unknown_scheme() {
        let err = open_source(&settings("rtsp://camera")).err().expect("rejected");
        assert!(err.to_string().contains("unsupported frame source"));
    }
}
