//! Render preferences
//!
//! Persisted in LocalStorage. These only change how orbs are drawn; the
//! simulation itself is never saved.

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Canvas backing resolution relative to CSS pixels * DPR
    pub fn render_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.5,
            QualityPreset::Medium => 0.75,
            QualityPreset::High => 1.0,
        }
    }

    /// Edge blur in CSS pixels
    pub fn blur_px(&self) -> f32 {
        match self {
            QualityPreset::Low => 24.0,
            QualityPreset::Medium => 40.0,
            QualityPreset::High => 64.0,
        }
    }

    /// Whether to draw the outer glow halo
    pub fn glow_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Orb render preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Outer glow halo around each orb
    pub glow: bool,
    /// Slow breathing scale oscillation
    pub pulse: bool,
    /// Reduced motion (disables the pulse)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            glow: true,
            pulse: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective pulse (respects reduced_motion)
    pub fn effective_pulse(&self) -> bool {
        self.pulse && !self.reduced_motion
    }

    /// Effective glow (respects the quality preset)
    pub fn effective_glow(&self) -> bool {
        self.glow && self.quality.glow_enabled()
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "orbfield_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded orb settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default orb settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Orb settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parsing() {
        assert_eq!(QualityPreset::from_str("LOW"), Some(QualityPreset::Low));
        assert_eq!(QualityPreset::from_str("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
        assert_eq!(QualityPreset::High.as_str(), "High");
    }

    #[test]
    fn test_reduced_motion_disables_pulse() {
        let mut settings = Settings::default();
        assert!(settings.effective_pulse());
        settings.reduced_motion = true;
        assert!(!settings.effective_pulse());
    }

    #[test]
    fn test_low_preset_drops_glow() {
        let settings = Settings::from_preset(QualityPreset::Low);
        assert!(settings.glow);
        assert!(!settings.effective_glow());
        assert!(Settings::from_preset(QualityPreset::High).effective_glow());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"quality":"High"}"#).unwrap();
        assert_eq!(settings.quality, QualityPreset::High);
        assert!(settings.pulse);
        assert!(!settings.reduced_motion);
    }
}
