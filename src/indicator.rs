//! Clutter indicator drivers.
//!
//! The indicator mirrors the raw per-frame detection signal: on while a
//! qualifying detection is in view, off otherwise and after the session ends.
//! Drivers have no error path; hardware failures are logged and swallowed.

use std::path::PathBuf;

/// Binary on/off indicator. Setting the current state again is a no-op.
pub trait Indicator: Send {
    fn set(&mut self, on: bool);
}

/// Indicator that only logs. Used when no LED is configured.
#[derive(Debug, Default)]
pub struct LogIndicator {
    last: Option<bool>,
}

impl LogIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<bool> {
        self.last
    }
}

impl Indicator for LogIndicator {
    fn set(&mut self, on: bool) {
        log::debug!("indicator: {}", if on { "clutter detected" } else { "bench clean" });
        if self.last != Some(on) {
            if on {
                log::info!("clutter detected on bench");
            } else if self.last.is_some() {
                log::info!("bench clear");
            }
            self.last = Some(on);
        }
    }
}

/// Linux LED class device, e.g. `/sys/class/leds/blue/brightness`.
#[derive(Debug)]
pub struct SysfsLedIndicator {
    brightness_path: PathBuf,
    last: Option<bool>,
}

impl SysfsLedIndicator {
    pub fn new(brightness_path: impl Into<PathBuf>) -> Self {
        Self {
            brightness_path: brightness_path.into(),
            last: None,
        }
    }
}

impl Indicator for SysfsLedIndicator {
    fn set(&mut self, on: bool) {
        if self.last == Some(on) {
            return;
        }
        let value = if on { "1" } else { "0" };
        match std::fs::write(&self.brightness_path, value) {
            Ok(()) => self.last = Some(on),
            Err(e) => log::warn!(
                "failed to set LED {} to {}: {}",
                self.brightness_path.display(),
                value,
                e
            ),
        }
    }
}

/// Build the indicator for an optional LED path.
pub fn open_indicator(led_path: Option<&PathBuf>) -> Box<dyn Indicator> {
    match led_path {
        Some(path) => Box::new(SysfsLedIndicator::new(path.clone())),
        None => Box::new(LogIndicator::new()),
    }
}
