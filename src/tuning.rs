//! Device-class tuning
//!
//! Mobile and desktop differ in orb count, tick rate, wander frequency and
//! pulse strength. A `Tuning` is resolved once per device class and handed to
//! the simulation; nothing downstream branches on the class itself.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// User-agent fragments that mark a handheld device
const MOBILE_AGENT_TOKENS: &[&str] = &[
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

/// Coarse device classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceClass {
    Mobile,
    #[default]
    Desktop,
}

impl DeviceClass {
    /// Classify from viewport width (CSS px) and user-agent string
    pub fn detect(viewport_width: f64, user_agent: &str) -> Self {
        if viewport_width < MOBILE_MAX_WIDTH {
            return DeviceClass::Mobile;
        }
        let agent = user_agent.to_lowercase();
        if MOBILE_AGENT_TOKENS.iter().any(|token| agent.contains(token)) {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Desktop => "desktop",
        }
    }
}

/// Simulation and render tuning for one device class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub device: DeviceClass,
    /// Orbs created at mount
    pub orb_count: usize,
    /// Recurring tick interval
    pub tick_ms: u32,
    /// Per-tick chance that a wandering orb picks a new target
    pub retarget_chance: f64,
    /// Pulse oscillation amplitude (render only)
    pub pulse_amplitude: f32,
    /// Step fraction used after re-entry
    pub ambient_speed: f32,
    /// Range for speeds seeded at mount
    pub initial_speed_min: f32,
    pub initial_speed_max: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self::for_device(DeviceClass::Desktop)
    }
}

impl Tuning {
    /// Built-in profile for a device class
    pub fn for_device(device: DeviceClass) -> Self {
        let mobile = device == DeviceClass::Mobile;
        Self {
            device,
            orb_count: if mobile { ORB_COUNT_MOBILE } else { ORB_COUNT_DESKTOP },
            tick_ms: if mobile { TICK_MS_MOBILE } else { TICK_MS_DESKTOP },
            retarget_chance: if mobile {
                RETARGET_CHANCE_MOBILE
            } else {
                RETARGET_CHANCE_DESKTOP
            },
            pulse_amplitude: if mobile {
                PULSE_AMPLITUDE_MOBILE
            } else {
                PULSE_AMPLITUDE_DESKTOP
            },
            ambient_speed: AMBIENT_SPEED,
            initial_speed_min: INITIAL_SPEED_MIN,
            initial_speed_max: INITIAL_SPEED_MAX,
        }
    }

    /// Overlay a partial JSON object onto this tuning
    ///
    /// Unknown keys are ignored; keys present replace the current value.
    pub fn with_overrides_json(&self, json: &str) -> Result<Self, serde_json::Error> {
        let mut base = serde_json::to_value(self)?;
        let overrides: serde_json::Value = serde_json::from_str(json)?;
        if let (Some(fields), serde_json::Value::Object(patch)) = (base.as_object_mut(), overrides)
        {
            for (key, value) in patch {
                if fields.contains_key(&key) {
                    fields.insert(key, value);
                }
            }
        }
        serde_json::from_value(base)
    }

    /// Resolve the profile for a device class, applying deployment overrides
    ///
    /// Invalid overrides are logged and skipped.
    pub fn resolve(device: DeviceClass, overrides: Option<&str>) -> Self {
        let base = Self::for_device(device);
        match overrides {
            Some(json) => match base.with_overrides_json(json) {
                Ok(tuned) => tuned,
                Err(e) => {
                    log::warn!("Ignoring tuning overrides: {}", e);
                    base
                }
            },
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP_UA: &str =
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0";
    const IPHONE_UA: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile";

    #[test]
    fn test_detect_by_width() {
        assert_eq!(DeviceClass::detect(500.0, DESKTOP_UA), DeviceClass::Mobile);
        assert_eq!(DeviceClass::detect(767.9, DESKTOP_UA), DeviceClass::Mobile);
        assert_eq!(DeviceClass::detect(768.0, DESKTOP_UA), DeviceClass::Desktop);
        assert_eq!(DeviceClass::detect(1200.0, DESKTOP_UA), DeviceClass::Desktop);
    }

    #[test]
    fn test_detect_by_agent() {
        assert_eq!(DeviceClass::detect(1200.0, IPHONE_UA), DeviceClass::Mobile);
        assert_eq!(
            DeviceClass::detect(1024.0, "Mozilla/5.0 (Linux; Android 14)"),
            DeviceClass::Mobile
        );
    }

    #[test]
    fn test_profiles() {
        let desktop = Tuning::for_device(DeviceClass::Desktop);
        assert_eq!(desktop.orb_count, 8);
        assert_eq!(desktop.tick_ms, 33);
        assert!((desktop.retarget_chance - 0.015).abs() < 1e-12);

        let mobile = Tuning::for_device(DeviceClass::Mobile);
        assert_eq!(mobile.orb_count, 4);
        assert_eq!(mobile.tick_ms, 50);
        assert!(mobile.retarget_chance < desktop.retarget_chance);
        assert!(mobile.pulse_amplitude < desktop.pulse_amplitude);
    }

    #[test]
    fn test_partial_overrides() {
        let tuned = Tuning::for_device(DeviceClass::Mobile)
            .with_overrides_json(r#"{"orb_count": 6, "bogus": 1}"#)
            .unwrap();
        assert_eq!(tuned.orb_count, 6);
        // Untouched fields keep the mobile values
        assert_eq!(tuned.tick_ms, TICK_MS_MOBILE);
        assert_eq!(tuned.device, DeviceClass::Mobile);
    }

    #[test]
    fn test_invalid_overrides_fall_back() {
        assert!(Tuning::default().with_overrides_json("not json").is_err());
        let resolved = Tuning::resolve(DeviceClass::Desktop, Some(r#"{"tick_ms": "fast"}"#));
        assert_eq!(resolved, Tuning::for_device(DeviceClass::Desktop));
    }
}
