#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::detect::backend::ClassifierBackend;
use crate::detect::result::{Detection, Region};

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Read a labels file: one label per line, in model output order.
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).with_context(|| {
        format!(
            "failed to load labels '{}'; make sure the file was copied to the device",
            path.display()
        )
    })?;
    let labels: Vec<String> = raw
        .lines()
        .map(|line| line.trim_end_matches('\r').to_string())
        .filter(|line| !line.is_empty())
        .collect();
    if labels.is_empty() {
        return Err(anyhow!("labels file '{}' is empty", path.display()));
    }
    Ok(labels)
}

/// Tract-based backend for ONNX image classifiers.
///
/// Classifies the whole frame and reports the score of one target label.
/// Loads the model from local disk once; no network I/O.
pub struct TractBackend {
    model: Plan,
    labels: Vec<String>,
    target: usize,
    width: u32,
    height: u32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        labels: Vec<String>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        if labels.is_empty() {
            return Err(anyhow!("classifier needs at least one label"));
        }
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| {
                format!(
                    "failed to load model '{}'; make sure the file was copied to the device",
                    model_path.display()
                )
            })?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, height as usize, width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            labels,
            target: 0,
            width,
            height,
        })
    }

    /// Select the reported label by name. `None` keeps the first label.
    pub fn with_target_label(mut self, label: Option<&str>) -> Result<Self> {
        if let Some(label) = label {
            self.target = self
                .labels
                .iter()
                .position(|l| l == label)
                .ok_or_else(|| anyhow!("target label '{}' not found in labels", label))?;
        }
        Ok(self)
    }

    pub fn target_label(&self) -> &str {
        &self.labels[self.target]
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        if width != self.width || height != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match model input {}x{}",
                width,
                height,
                self.width,
                self.height
            ));
        }

        let expected_len = crate::frame::rgb_len(width, height)?;
        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }

        let width = width as usize;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, height as usize, width),
            |(_, channel, y, x)| {
                let idx = (y * width + x) * 3 + channel;
                pixels[idx] as f32 / 255.0
            },
        );

        Ok(input.into_tensor())
    }

    fn extract_scores(&self, outputs: TVec<TValue>) -> Result<Vec<f32>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores: Vec<f32> = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .iter()
            .copied()
            .collect();
        if scores.len() != self.labels.len() {
            return Err(anyhow!(
                "model produced {} scores for {} labels",
                scores.len(),
                self.labels.len()
            ));
        }
        Ok(scores)
    }
}

impl ClassifierBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn classify(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let scores = self.extract_scores(outputs)?;
        let confidence = scores[self.target];
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Ok(vec![Detection::new(
            self.target_label(),
            confidence,
            Region::full_frame(width, height),
        )])
    }
}
