//! # Artifact Loading and Inference
//!
//! The service depends on two pre-trained artifacts, loaded once at startup
//! and shared read-only for the process lifetime:
//!
//! - a **scaler**: per-feature standardization parameters (mean and scale)
//! - a **classifier**: a fitted multinomial logistic-regression model
//!   producing one of three class labels
//!
//! Both artifacts are JSON documents carrying a `schema` discriminator so a
//! format revision is detectable at load time:
//!
//! ```json
//! {"schema": "standard-scaler/1", "mean": [...12...], "scale": [...12...]}
//! {"schema": "multinomial-logistic/1", "coefficients": [[...12...]; 3], "intercepts": [...3...]}
//! ```
//!
//! The model file may be fetched from a configured URL when absent on local
//! disk; the scaler is always expected locally. Any failure here is fatal
//! to startup.

use crate::error::{DiascreenError, Result};
use crate::features::{FeatureRecord, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Schema discriminator expected in scaler artifact files
pub const SCALER_SCHEMA: &str = "standard-scaler/1";

/// Schema discriminator expected in model artifact files
pub const MODEL_SCHEMA: &str = "multinomial-logistic/1";

/// Number of output classes the classifier was fitted for
pub const CLASS_COUNT: usize = 3;

/// Timeout for the startup-time model download
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Fitted standardization transform
///
/// Applies `x'[i] = (x[i] - mean[i]) / scale[i]` per feature, in fit order.
/// Immutable after load; shared read-only across all requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scaler {
    /// Schema discriminator, must equal [`SCALER_SCHEMA`]
    pub schema: String,
    /// Per-feature means, fit order
    pub mean: Vec<f64>,
    /// Per-feature scale factors (standard deviations), fit order
    pub scale: Vec<f64>,
}

impl Scaler {
    /// Loads and validates a scaler artifact from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let scaler: Scaler = read_artifact("scaler", path)?;
        scaler.validate()?;
        info!(path = %path.display(), "Scaler artifact loaded");
        Ok(scaler)
    }

    fn validate(&self) -> Result<()> {
        if self.schema != SCALER_SCHEMA {
            return Err(DiascreenError::artifact(
                "scaler",
                format!("unsupported schema '{}', expected '{SCALER_SCHEMA}'", self.schema),
                None,
            ));
        }
        if self.mean.len() != FEATURE_COUNT || self.scale.len() != FEATURE_COUNT {
            return Err(DiascreenError::artifact(
                "scaler",
                format!(
                    "expected {FEATURE_COUNT} mean/scale entries, got {}/{}",
                    self.mean.len(),
                    self.scale.len()
                ),
                None,
            ));
        }
        if self.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            return Err(DiascreenError::artifact(
                "scaler",
                "scale entries must be finite and non-zero",
                None,
            ));
        }
        Ok(())
    }

    /// Standardizes a raw feature record into a normalized vector
    pub fn transform(&self, record: &FeatureRecord) -> [f64; FEATURE_COUNT] {
        let mut scaled = [0.0_f64; FEATURE_COUNT];
        for (i, raw) in record.values().iter().enumerate() {
            scaled[i] = (raw - self.mean[i]) / self.scale[i];
        }
        scaled
    }
}

/// Fitted multinomial logistic-regression classifier
///
/// Holds one coefficient row and one intercept per class. Prediction is the
/// argmax of the per-class linear scores; the softmax normalization is
/// monotonic and therefore skipped. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classifier {
    /// Schema discriminator, must equal [`MODEL_SCHEMA`]
    pub schema: String,
    /// One coefficient row per class, each in feature fit order
    pub coefficients: Vec<Vec<f64>>,
    /// One intercept per class
    pub intercepts: Vec<f64>,
}

impl Classifier {
    /// Loads and validates a model artifact from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let model: Classifier = read_artifact("model", path)?;
        model.validate()?;
        info!(path = %path.display(), classes = CLASS_COUNT, "Model artifact loaded");
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.schema != MODEL_SCHEMA {
            return Err(DiascreenError::artifact(
                "model",
                format!("unsupported schema '{}', expected '{MODEL_SCHEMA}'", self.schema),
                None,
            ));
        }
        if self.coefficients.len() != CLASS_COUNT || self.intercepts.len() != CLASS_COUNT {
            return Err(DiascreenError::artifact(
                "model",
                format!(
                    "expected {CLASS_COUNT} coefficient rows and intercepts, got {}/{}",
                    self.coefficients.len(),
                    self.intercepts.len()
                ),
                None,
            ));
        }
        for (class, row) in self.coefficients.iter().enumerate() {
            if row.len() != FEATURE_COUNT {
                return Err(DiascreenError::artifact(
                    "model",
                    format!(
                        "coefficient row for class {class} has {} entries, expected {FEATURE_COUNT}",
                        row.len()
                    ),
                    None,
                ));
            }
        }
        Ok(())
    }

    /// Classifies a normalized feature vector into a class label
    ///
    /// Returns the index of the highest-scoring class; ties resolve to the
    /// lowest index, so the result is deterministic for identical input.
    pub fn predict(&self, scaled: &[f64; FEATURE_COUNT]) -> Result<usize> {
        let mut best_class = 0;
        let mut best_score = f64::NEG_INFINITY;
        for class in 0..CLASS_COUNT {
            let mut score = self.intercepts[class];
            for (i, x) in scaled.iter().enumerate() {
                score += self.coefficients[class][i] * x;
            }
            if !score.is_finite() {
                return Err(DiascreenError::inference(format!(
                    "non-finite score for class {class}"
                )));
            }
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }
        Ok(best_class)
    }
}

/// Maps a class label to its diagnosis string
///
/// Labels outside the fitted range map to "Unknown".
pub fn diagnosis_label(class: usize) -> &'static str {
    match class {
        0 => "No Diabetes",
        1 => "Prediabetes",
        2 => "Diabetes",
        _ => "Unknown",
    }
}

/// Ensures the model artifact exists on local disk
///
/// When the file is already present this is a no-op. When absent, the file
/// is fetched from `model_url` and written to `path` before loading. With
/// no URL configured a missing file is a configuration error.
///
/// No retries: a failed download is fatal to startup.
pub async fn ensure_model_file(path: &Path, model_url: Option<&str>) -> Result<()> {
    if path.exists() {
        return Ok(());
    }

    let url = model_url.ok_or_else(|| {
        DiascreenError::configuration(
            format!(
                "model file {} does not exist and no --model-url is configured",
                path.display()
            ),
            None,
        )
    })?;

    info!(url = %url, path = %path.display(), "Downloading model artifact");

    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await
        .map_err(|e| {
            DiascreenError::artifact("model", format!("download from {url} failed"), Some(Box::new(e)))
        })?;

    if !response.status().is_success() {
        return Err(DiascreenError::artifact(
            "model",
            format!("download from {url} returned HTTP {}", response.status()),
            None,
        ));
    }

    let bytes = response.bytes().await.map_err(|e| {
        DiascreenError::artifact("model", "failed to read download body", Some(Box::new(e)))
    })?;

    std::fs::write(path, &bytes).map_err(|e| {
        DiascreenError::artifact(
            "model",
            format!("failed to write {}", path.display()),
            Some(Box::new(e)),
        )
    })?;

    info!(path = %path.display(), size_bytes = bytes.len(), "Model artifact downloaded");
    Ok(())
}

fn read_artifact<T: for<'de> Deserialize<'de>>(name: &str, path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        DiascreenError::artifact(
            name,
            format!("failed to read {}", path.display()),
            Some(Box::new(e)),
        )
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        DiascreenError::artifact(
            name,
            format!("failed to deserialize {}", path.display()),
            Some(Box::new(e)),
        )
    })
}
