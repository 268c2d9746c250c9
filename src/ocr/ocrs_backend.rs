//! OCRS OCR backend implementation.
//!
//! Uses the ocrs crate for pure-Rust OCR without external binaries.
//!
//! Models are automatically downloaded on first use from:
//! https://ocrs-models.s3-accelerate.amazonaws.com/

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use super::backend::{OcrBackend, OcrBackendType, OcrConfig, OcrError};
use super::tools::check_binary;

const MODEL_BASE_URL: &str = "https://ocrs-models.s3-accelerate.amazonaws.com";
const DETECTION_MODEL: &str = "text-detection.rten";
const RECOGNITION_MODEL: &str = "text-recognition.rten";

/// Model files with their approximate download size.
const MODELS: [(&str, &str); 2] = [(DETECTION_MODEL, "2.5 MB"), (RECOGNITION_MODEL, "10 MB")];

/// Where downloaded models are kept: `<data dir>/veritext/ocrs`.
fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("veritext")
        .join("ocrs")
}

fn has_models(dir: &Path) -> bool {
    MODELS.iter().all(|(name, _)| dir.join(name).is_file())
}

/// Fetch one model into `dir`, via a `.part` file so an interrupted
/// download is never mistaken for a complete model.
fn download_model(name: &str, size: &str, dir: &Path) -> Result<(), OcrError> {
    let target = dir.join(name);
    if target.is_file() {
        return Ok(());
    }
    let partial = dir.join(format!("{}.part", name));
    let url = format!("{}/{}", MODEL_BASE_URL, name);
    tracing::info!("Downloading OCRS model {} ({})", name, size);

    let mut command = if check_binary("curl") {
        let mut command = Command::new("curl");
        command.args(["-fsSL", "-o"]).arg(&partial).arg(&url);
        command
    } else if check_binary("wget") {
        let mut command = Command::new("wget");
        command.arg("-qO").arg(&partial).arg(&url);
        command
    } else {
        return Err(OcrError::ModelNotFound(format!(
            "{} is missing and neither curl nor wget is installed to fetch {}",
            name, url
        )));
    };

    let status = command.status()?;
    if !status.success() {
        let _ = std::fs::remove_file(&partial);
        return Err(OcrError::ModelNotFound(format!(
            "download of {} failed ({})",
            url, status
        )));
    }
    std::fs::rename(&partial, &target)?;
    Ok(())
}

/// OCRS OCR backend (pure Rust).
///
/// The loaded engine belongs to this instance; `release` drops it.
pub struct OcrsBackend {
    config: OcrConfig,
    engine: Mutex<Option<Arc<ocrs::OcrEngine>>>,
}

impl OcrsBackend {
    /// Create a new OCRS backend with default configuration.
    pub fn new() -> Self {
        Self::with_config(OcrConfig::default())
    }

    /// Create a new OCRS backend with custom configuration.
    pub fn with_config(config: OcrConfig) -> Self {
        Self {
            config,
            engine: Mutex::new(None),
        }
    }

    /// Configured path first, then our data dir, then the ocrs CLI's cache.
    fn candidate_dirs(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        candidates.extend(self.config.model_path.clone());
        candidates.push(default_model_dir());
        if let Some(cache) = dirs::cache_dir() {
            candidates.push(cache.join("ocrs"));
        }
        candidates
    }

    fn find_model_dir(&self) -> Option<PathBuf> {
        self.candidate_dirs().into_iter().find(|dir| has_models(dir))
    }

    fn ensure_models(&self) -> Result<PathBuf, OcrError> {
        if let Some(dir) = self.find_model_dir() {
            return Ok(dir);
        }

        let model_dir = default_model_dir();
        std::fs::create_dir_all(&model_dir)?;
        for (name, size) in MODELS {
            download_model(name, size, &model_dir)?;
        }
        Ok(model_dir)
    }

    fn load_engine(&self) -> Result<ocrs::OcrEngine, OcrError> {
        let model_dir = self.ensure_models()?;

        let detection_path = model_dir.join(DETECTION_MODEL);
        let recognition_path = model_dir.join(RECOGNITION_MODEL);

        let detection_model = rten::Model::load_file(&detection_path)
            .map_err(|e| OcrError::ModelNotFound(format!("detection model: {}", e)))?;
        let recognition_model = rten::Model::load_file(&recognition_path)
            .map_err(|e| OcrError::ModelNotFound(format!("recognition model: {}", e)))?;

        ocrs::OcrEngine::new(ocrs::OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| OcrError::OcrFailed(format!("Failed to create OCR engine: {}", e)))
    }

    /// Get the loaded engine, loading it on first use.
    fn engine(&self) -> Result<Arc<ocrs::OcrEngine>, OcrError> {
        let mut slot = self
            .engine
            .lock()
            .map_err(|_| OcrError::OcrFailed("OCRS engine lock poisoned".to_string()))?;
        if let Some(ref engine) = *slot {
            return Ok(Arc::clone(engine));
        }
        let engine = Arc::new(self.load_engine()?);
        *slot = Some(Arc::clone(&engine));
        Ok(engine)
    }

    /// Run OCR on an image.
    fn run_ocrs(&self, image_path: &Path) -> Result<String, OcrError> {
        let engine = self.engine()?;

        let img = image::open(image_path)
            .map_err(|e| OcrError::ImageError(format!("Failed to load image: {}", e)))?;
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let img_source = ocrs::ImageSource::from_bytes(rgb_img.as_raw(), (width, height))
            .map_err(|e| OcrError::ImageError(format!("Failed to convert image: {}", e)))?;

        let input = engine
            .prepare_input(img_source)
            .map_err(|e| OcrError::OcrFailed(format!("Failed to prepare input: {}", e)))?;

        engine
            .get_text(&input)
            .map_err(|e| OcrError::OcrFailed(format!("Failed to extract text: {}", e)))
    }
}

impl Default for OcrsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrBackend for OcrsBackend {
    fn backend_type(&self) -> OcrBackendType {
        OcrBackendType::Ocrs
    }

    fn is_available(&self) -> bool {
        // Models are downloaded on first use
        true
    }

    fn availability_hint(&self) -> String {
        match self.find_model_dir() {
            Some(path) => format!("OCRS models found at {:?}", path),
            None => format!(
                "OCRS models will be auto-downloaded on first use (~12 MB total) to {:?}",
                default_model_dir()
            ),
        }
    }

    fn run_ocr(&self, image_path: &Path) -> Result<String, OcrError> {
        self.run_ocrs(image_path)
    }

    fn warm_up(&self) -> Result<(), OcrError> {
        self.engine().map(|_| ())
    }

    fn release(&self) {
        if let Ok(mut slot) = self.engine.lock() {
            *slot = None;
        }
    }
}
