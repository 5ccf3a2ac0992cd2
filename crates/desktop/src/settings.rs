use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use facelens_core::detection::domain::detector_options::DetectorOptions;
use facelens_core::detection::infrastructure::detector_factory::ExpressionModel;
use facelens_core::overlay::domain::overlay_style::OverlayStyle;
use facelens_core::shared::constants::APP_DIR_NAME;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    System,
    Dark,
    Light,
}

impl Appearance {
    pub const ALL: &[Appearance] = &[Appearance::System, Appearance::Dark, Appearance::Light];
}

impl std::fmt::Display for Appearance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Appearance::System => write!(f, "System"),
            Appearance::Dark => write!(f, "Dark"),
            Appearance::Light => write!(f, "Light"),
        }
    }
}

/// Persisted user preferences. Unknown or missing fields fall back to
/// their defaults, so older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Detector confidence threshold, in percent.
    pub confidence: u32,
    /// Run the expression classifier and draw its labels.
    pub expressions: bool,
    pub show_landmarks: bool,
    pub appearance: Appearance,
    pub high_contrast: bool,
    pub font_scale: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confidence: 50,
            expressions: true,
            show_landmarks: true,
            appearance: Appearance::System,
            high_contrast: false,
            font_scale: 1.0,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Err(e) = self.save_to(&path) {
                log::warn!("Failed to save settings to {}: {e}", path.display());
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_default()
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Everything except the threshold stays at its built-in default.
    pub fn detector_options(&self) -> DetectorOptions {
        DetectorOptions {
            score_threshold: self.confidence.min(100) as f64 / 100.0,
            ..DetectorOptions::default()
        }
    }

    pub fn expression_model(&self) -> ExpressionModel {
        if self.expressions {
            ExpressionModel::Default
        } else {
            ExpressionModel::Disabled
        }
    }

    pub fn overlay_style(&self) -> OverlayStyle {
        let base = if self.high_contrast {
            OverlayStyle::high_contrast()
        } else {
            OverlayStyle::default()
        };
        OverlayStyle {
            text_size: base.text_size * self.font_scale,
            show_landmarks: self.show_landmarks,
            show_expressions: self.expressions,
            ..base
        }
    }
}
