use std::path::Path;

use serde::Deserialize;

/// Font sizes, in points. Label fitting scans from `MAX` down to `MIN`.
pub mod font {
    pub const HEAD: f32 = 24.0;
    pub const MAX: u32 = 36;
    pub const MIN: u32 = 8;
    pub const STEP: u32 = 2;
    /// Padding, in pixels, between a label and its bubble rim.
    pub const PAD: f32 = 8.0;
}

pub mod color {
    pub const BACK: [u8; 3] = [230, 230, 250];
    pub const TEXT: [u8; 3] = [0, 102, 153];
    pub const BALL: [u8; 3] = [250, 250, 250];
    pub const HOVER_TEXT: [u8; 3] = [100, 0, 0];
    pub const HOVER_BALL: [u8; 3] = [255, 228, 225];
    pub const TIP: [u8; 3] = [252, 240, 173];
}

pub mod visual {
    pub const WORLD_MARGIN: f32 = 10.0;
    /// Bigger number means a thinner rim.
    pub const RIM_FRACTION: f32 = 20.0;
    pub const DOUBLE_CLICK_MS: u64 = 500;
    /// How much small bubbles fade relative to the biggest one.
    pub const ALPHA_DEPTH: f32 = 0.60;
    /// Share of world area the bubbles occupy together. PI/4 is the
    /// square-to-circle ratio.
    pub const CROWDEDNESS: f32 = 0.70;
    pub const FRAME_RATE: u32 = 50;
    /// Radius drift that triggers a label refit.
    pub const FONT_RECALC: f32 = 10.0;
    /// Labels with more words than this get a warning, as their arrangement
    /// count doubles per word.
    pub const LABEL_WORDS_WARN: usize = 12;
}

pub mod tooltip {
    pub const WANTED: bool = true;
    pub const OFFSET: f32 = 15.0;
    pub const MARGIN: f32 = 4.0;
    pub const DELAY_MS: u64 = 1500;
    pub const POINT_SIZE: f32 = 14.0;
}

pub mod physics {
    /// Velocity kept, inverted, on the axis that hit something.
    pub const REBOUND: f32 = 0.75;
    /// Velocity kept on the axis parallel to a wall that was hit.
    pub const FRICTION: f32 = 0.80;
    pub const BIRTH_SPEED: f32 = 4.00;
    pub const REST_JIGGLE: f32 = 0.02;
    /// Overlap, in pixels, tolerated before two bubbles collide.
    pub const COLLISION_SLOP: f32 = 1.0;
}

/// The occurrence count of the largest dataset item is scaled to this.
pub const OCCURRENCE_SCALE: f64 = 1000.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("frame rate must be positive")]
    FrameRate,
    #[error("{name} must be within 0..=1, got {value}")]
    Coefficient { name: &'static str, value: f32 },
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("font range {min}..={max} step {step} is empty")]
    FontRange { min: u32, max: u32, step: u32 },
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Font sizes tried while fitting labels, largest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FontRange {
    pub max: u32,
    pub min: u32,
    pub step: u32,
}

impl Default for FontRange {
    fn default() -> Self {
        Self {
            max: font::MAX,
            min: font::MIN,
            step: font::STEP,
        }
    }
}

impl FontRange {
    pub fn sizes(self) -> impl Iterator<Item = u32> {
        let step = self.step.max(1) as usize;
        (self.min..=self.max).rev().step_by(step)
    }
}

/// User tunable simulation settings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fonts: FontRange,
    pub font_pad: f32,
    pub world_margin: f32,
    pub rim_fraction: f32,
    pub double_click_ms: u64,
    pub alpha_depth: f32,
    pub crowdedness: f32,
    pub frame_rate: u32,
    pub font_recalc: f32,
    pub tips_wanted: bool,
    pub tip_delay_ms: u64,
    pub rebound: f32,
    pub friction: f32,
    pub birth_speed: f32,
    pub rest_jiggle: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fonts: FontRange::default(),
            font_pad: font::PAD,
            world_margin: visual::WORLD_MARGIN,
            rim_fraction: visual::RIM_FRACTION,
            double_click_ms: visual::DOUBLE_CLICK_MS,
            alpha_depth: visual::ALPHA_DEPTH,
            crowdedness: visual::CROWDEDNESS,
            frame_rate: visual::FRAME_RATE,
            font_recalc: visual::FONT_RECALC,
            tips_wanted: tooltip::WANTED,
            tip_delay_ms: tooltip::DELAY_MS,
            rebound: physics::REBOUND,
            friction: physics::FRICTION,
            birth_speed: physics::BIRTH_SPEED,
            rest_jiggle: physics::REST_JIGGLE,
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file. Missing fields take their defaults.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate == 0 {
            return Err(ConfigError::FrameRate);
        }
        for (name, value) in [
            ("rebound", self.rebound),
            ("friction", self.friction),
            ("alpha_depth", self.alpha_depth),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Coefficient { name, value });
            }
        }
        for (name, value) in [
            ("crowdedness", self.crowdedness),
            ("rim_fraction", self.rim_fraction),
        ] {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NotPositive { name, value });
            }
        }
        if self.birth_speed < 0.0 || self.rest_jiggle < 0.0 || self.font_recalc < 0.0 {
            return Err(ConfigError::NotPositive {
                name: "birth_speed, rest_jiggle and font_recalc",
                value: self.birth_speed.min(self.rest_jiggle).min(self.font_recalc),
            });
        }
        let fonts = self.fonts;
        if fonts.step == 0 || fonts.min == 0 || fonts.min > fonts.max {
            return Err(ConfigError::FontRange {
                min: fonts.min,
                max: fonts.max,
                step: fonts.step,
            });
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f32(1.0 / self.frame_rate.max(1) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod font_range_sizes {
        use super::*;

        #[test]
        fn default_range_descends_in_steps() {
            let sizes: Vec<u32> = FontRange::default().sizes().collect();
            assert_eq!(sizes.first(), Some(&36));
            assert_eq!(sizes.last(), Some(&8));
            assert_eq!(sizes.len(), 15);
            assert!(sizes.windows(2).all(|w| w[0] - w[1] == 2));
        }

        #[test]
        fn single_size_range() {
            let range = FontRange {
                max: 12,
                min: 12,
                step: 4,
            };
            assert_eq!(range.sizes().collect::<Vec<_>>(), vec![12]);
        }
    }

    mod settings_validate {
        use super::*;

        #[test]
        fn defaults_are_valid() {
            assert!(Settings::default().validate().is_ok());
        }

        #[test]
        fn rejects_zero_frame_rate() {
            let settings = Settings {
                frame_rate: 0,
                ..Settings::default()
            };
            assert!(matches!(settings.validate(), Err(ConfigError::FrameRate)));
        }

        #[test]
        fn rejects_rebound_above_one() {
            let settings = Settings {
                rebound: 1.5,
                ..Settings::default()
            };
            assert!(matches!(
                settings.validate(),
                Err(ConfigError::Coefficient { name: "rebound", .. })
            ));
        }

        #[test]
        fn rejects_inverted_font_range() {
            let settings = Settings {
                fonts: FontRange {
                    max: 8,
                    min: 36,
                    step: 2,
                },
                ..Settings::default()
            };
            assert!(matches!(
                settings.validate(),
                Err(ConfigError::FontRange { .. })
            ));
        }

        #[test]
        fn rejects_nan_crowdedness() {
            let settings = Settings {
                crowdedness: f32::NAN,
                ..Settings::default()
            };
            assert!(settings.validate().is_err());
        }
    }

    mod settings_deserialize {
        use super::*;

        #[test]
        fn missing_fields_take_defaults() {
            let settings: Settings =
                serde_json::from_str(r#"{ "crowdedness": 0.5, "fonts": { "max": 20 } }"#)
                    .expect("valid settings json");
            assert_eq!(settings.crowdedness, 0.5);
            assert_eq!(settings.fonts.max, 20);
            assert_eq!(settings.fonts.min, font::MIN);
            assert_eq!(settings.rebound, physics::REBOUND);
        }
    }
}
