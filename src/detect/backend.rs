use anyhow::Result;

use crate::detect::result::Detection;

/// Classifier backend trait.
///
/// A backend looks at one frame and yields zero or more detections for that
/// frame only. Calls are independent; backends may keep internal buffers but
/// must not carry detections across frames.
pub trait ClassifierBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Classify a packed RGB frame.
    fn classify(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
