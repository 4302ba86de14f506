//! Scene settings and preferences
//!
//! Persisted in LocalStorage, separate from tasks and experience.

use serde::{Deserialize, Serialize};

/// Backdrop detail levels
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

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Fraction of the full arm star population to generate
    pub fn backdrop_density(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.25,
            QualityPreset::Medium | QualityPreset::High => 1.0,
        }
    }

    /// Multiplier on the outer ring of background stars
    pub fn background_density(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.25,
            QualityPreset::Medium => 1.0,
            QualityPreset::High => 2.5,
        }
    }

    /// Whether arm branches are drawn
    pub fn branches_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Scene settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backdrop detail
    pub quality: QualityPreset,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
    /// Play a pop when a bubble or mini is popped
    pub pop_sound: bool,

    // === Feedback ===
    /// Floating "+N XP" text over popped bubbles
    pub show_notifications: bool,

    // === Accessibility ===
    /// Freeze backdrop rotation
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            master_volume: 0.5,
            sfx_volume: 1.0,
            muted: false,
            pop_sound: true,

            show_notifications: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Apply overrides from a page query string such as
    /// `?quality=high&muted=1&motion=reduced`
    ///
    /// Unknown keys and unparsable values are skipped. Returns true when
    /// anything changed.
    pub fn apply_query(&mut self, query: &str) -> bool {
        let before = self.clone();
        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "quality" => match QualityPreset::parse(value) {
                    Some(preset) => self.quality = preset,
                    None => log::warn!("Unknown quality preset '{}'", value),
                },
                "muted" => match parse_flag(value) {
                    Some(muted) => self.muted = muted,
                    None => log::warn!("Unreadable muted flag '{}'", value),
                },
                "motion" => match value {
                    "reduced" => self.reduced_motion = true,
                    "full" => self.reduced_motion = false,
                    _ => log::warn!("Unknown motion setting '{}'", value),
                },
                _ => {}
            }
        }
        let changed = *self != before;
        if changed {
            log::info!("Settings overridden from URL (quality {})", self.quality.as_str());
        }
        changed
    }

    /// Volume a pop should play at (0 when muted or disabled)
    pub fn effective_volume(&self) -> f32 {
        if self.muted || !self.pop_sound {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Backdrop clock for a given elapsed time (frozen under reduced motion)
    pub fn backdrop_time(&self, elapsed_secs: f32) -> f32 {
        if self.reduced_motion { 0.0 } else { elapsed_secs }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "bubble_galaxy_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring unreadable settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match serde_json::to_string(self) {
                Ok(json) => match storage.set_item(Self::STORAGE_KEY, &json) {
                    Ok(()) => log::info!("Settings saved"),
                    Err(e) => log::warn!("Could not persist settings: {:?}", e),
                },
                Err(e) => log::warn!("Could not encode settings: {}", e),
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
