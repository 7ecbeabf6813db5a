mod backend;
mod backends;
mod result;

use anyhow::{bail, Result};

pub use backend::ClassifierBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::{load_labels, TractBackend};
pub use result::{first_qualifying, has_qualifying_detection, Detection, Region};

use crate::config::ClassifierSettings;

/// Build the classifier named in the configuration.
///
/// `width`/`height` are the frame size the source will deliver.
pub fn open_backend(
    settings: &ClassifierSettings,
    width: u32,
    height: u32,
) -> Result<Box<dyn ClassifierBackend>> {
    match settings.backend.as_str() {
        "stub" => Ok(Box::new(StubBackend::new())),
        #[cfg(feature = "backend-tract")]
        "tract" => {
            let labels = load_labels(&settings.labels_path)?;
            let backend = TractBackend::new(&settings.model_path, labels, width, height)?
                .with_target_label(settings.target_label.as_deref())?;
            Ok(Box::new(backend))
        }
        #[cfg(not(feature = "backend-tract"))]
        "tract" => {
            let _ = (width, height);
            bail!("classifier backend 'tract' requires the backend-tract feature")
        }
        other => bail!("unknown classifier backend '{}': expected 'stub' or 'tract'", other),
    }
}
