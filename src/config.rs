//! Configuration management for veritext using the prefer crate.
//!
//! `Config` mirrors the on-disk file (every field optional); `Settings` is
//! the resolved runtime view with defaults filled in.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ocr::{EngineConfig, OcrBackendType, OcrConfig as BackendOcrConfig};
use crate::services::SimulationConfig;

/// Default OCR escalation threshold in characters.
pub const DEFAULT_MIN_TEXT_CHARS: usize = crate::ocr::DEFAULT_MIN_TEXT_CHARS;

/// Default per-page OCR timeout in seconds.
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 120;

/// Default advisory upload cap (10 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Extraction settings from the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSection {
    /// Trimmed text-layer output at or below this many characters triggers OCR.
    /// This is a heuristic and may treat very short text documents as image-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_text_chars: Option<usize>,
    /// Per-page OCR timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_timeout_secs: Option<u64>,
    /// Advisory size cap for input files, enforced by the CLI only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_bytes: Option<u64>,
}

/// OCR settings from the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrSection {
    /// Backend name ("tesseract" or "ocrs").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Recognition language (e.g. "eng").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Page render scale relative to 72 DPI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_scale: Option<f32>,
    /// Model or tessdata directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
}

/// Simulator settings from the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extraction: ExtractionSection,
    #[serde(default)]
    pub ocr: OcrSection,
    #[serde(default)]
    pub simulation: SimulationSection,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults when no file is found or it fails to parse.
    pub async fn load() -> Self {
        match prefer::load("veritext").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML, and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) -> Result<(), String> {
        let extraction = &self.extraction;
        if let Some(chars) = extraction.min_text_chars {
            settings.min_text_chars = chars;
        }
        if let Some(secs) = extraction.page_timeout_secs {
            if secs == 0 {
                return Err("extraction.page_timeout_secs must be positive".to_string());
            }
            settings.page_timeout = Duration::from_secs(secs);
        }
        if let Some(bytes) = extraction.max_upload_bytes {
            settings.max_upload_bytes = bytes;
        }

        let ocr = &self.ocr;
        if let Some(ref name) = ocr.backend {
            settings.ocr_backend = OcrBackendType::from_str(name)
                .ok_or_else(|| format!("Unknown OCR backend: {}", name))?;
        }
        if let Some(ref language) = ocr.language {
            settings.ocr_language = language.clone();
        }
        if let Some(scale) = ocr.render_scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(format!("ocr.render_scale must be positive, got {}", scale));
            }
            settings.render_scale = scale;
        }
        if let Some(ref model_path) = ocr.model_path {
            settings.model_path = Some(self.resolve_path(model_path, base_dir));
        }

        let simulation = &self.simulation;
        if let Some(ms) = simulation.min_delay_ms {
            settings.min_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = simulation.max_delay_ms {
            settings.max_delay = Duration::from_millis(ms);
        }
        if settings.min_delay > settings.max_delay {
            return Err("simulation.min_delay_ms must not exceed max_delay_ms".to_string());
        }
        if simulation.seed.is_some() {
            settings.seed = simulation.seed;
        }
        Ok(())
    }
}

/// Application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub min_text_chars: usize,
    pub page_timeout: Duration,
    pub max_upload_bytes: u64,
    pub ocr_backend: OcrBackendType,
    pub ocr_language: String,
    pub render_scale: f32,
    pub model_path: Option<PathBuf>,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        let simulation = SimulationConfig::default();
        Self {
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
            page_timeout: Duration::from_secs(DEFAULT_PAGE_TIMEOUT_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ocr_backend: OcrBackendType::Tesseract,
            ocr_language: "eng".to_string(),
            render_scale: 1.0,
            model_path: None,
            min_delay: simulation.min_delay,
            max_delay: simulation.max_delay,
            seed: simulation.seed,
        }
    }
}

impl Settings {
    pub fn backend_config(&self) -> BackendOcrConfig {
        BackendOcrConfig {
            language: self.ocr_language.clone(),
            model_path: self.model_path.clone(),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            render_scale: self.render_scale,
            page_timeout: self.page_timeout,
        }
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            min_delay: self.min_delay,
            max_delay: self.max_delay,
            seed: self.seed,
        }
    }
}

/// Load settings: explicit config file if given, otherwise discovery.
pub async fn load_settings(config_path: Option<&Path>) -> anyhow::Result<(Settings, Config)> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path)
            .await
            .map_err(anyhow::Error::msg)?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let mut settings = Settings::default();
    config
        .apply_to_settings(&mut settings, &base_dir)
        .map_err(anyhow::Error::msg)?;

    if let Some(ref path) = config.source_path {
        tracing::debug!("Loaded config from {}", path.display());
    }
    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml() {
        let contents = r#"
[extraction]
min_text_chars = 50
page_timeout_secs = 30

[ocr]
backend = "tesseract"
language = "deu"
render_scale = 2.0

[simulation]
min_delay_ms = 10
max_delay_ms = 20
seed = 9
"#;
        let config = Config::parse(contents, Path::new("veritext.toml")).unwrap();
        let mut settings = Settings::default();
        config
            .apply_to_settings(&mut settings, Path::new("/etc/veritext"))
            .unwrap();

        assert_eq!(settings.min_text_chars, 50);
        assert_eq!(settings.page_timeout, Duration::from_secs(30));
        assert_eq!(settings.ocr_language, "deu");
        assert_eq!(settings.engine_config().render_dpi(), 144);
        assert_eq!(settings.min_delay, Duration::from_millis(10));
        assert_eq!(settings.seed, Some(9));
        assert_eq!(settings.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = "ocr:\n  language: fra\n";
        let config = Config::parse(yaml, Path::new("veritext.yaml")).unwrap();
        assert_eq!(config.ocr.language.as_deref(), Some("fra"));

        let json = r#"{"extraction": {"min_text_chars": 5}}"#;
        let config = Config::parse(json, Path::new("veritext.json")).unwrap();
        assert_eq!(config.extraction.min_text_chars, Some(5));
    }

    #[test]
    fn test_defaults_match_reference_behavior() {
        let settings = Settings::default();
        assert_eq!(settings.min_text_chars, 20);
        assert_eq!(settings.max_upload_bytes, 10_485_760);
        assert_eq!(settings.min_delay, Duration::from_millis(600));
        assert_eq!(settings.max_delay, Duration::from_millis(1000));
        assert_eq!(settings.engine_config().render_dpi(), 72);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut settings = Settings::default();
        let config = Config {
            ocr: OcrSection {
                backend: Some("paddle".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config
            .apply_to_settings(&mut settings, Path::new("."))
            .is_err());

        let config = Config {
            simulation: SimulationSection {
                min_delay_ms: Some(2000),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config
            .apply_to_settings(&mut Settings::default(), Path::new("."))
            .is_err());
    }

    #[test]
    fn test_model_path_resolves_relative_to_config() {
        let config = Config {
            ocr: OcrSection {
                model_path: Some("models".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut settings = Settings::default();
        config
            .apply_to_settings(&mut settings, Path::new("/srv/veritext"))
            .unwrap();
        assert_eq!(
            settings.model_path,
            Some(PathBuf::from("/srv/veritext/models"))
        );
    }

    #[tokio::test]
    async fn test_load_from_path_records_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("veritext.toml");
        std::fs::write(&path, "[ocr]\nlanguage = \"spa\"\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
        assert_eq!(config.base_dir().as_deref(), Some(dir.path()));
    }
}
