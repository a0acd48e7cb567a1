//! Level metering: RMS measurement and meter normalization

use crate::domain::error::ConfigError;

use super::format::AudioBuffer;

/// Default lower bound of the meter range
pub const DEFAULT_LEVEL_FLOOR: f32 = 0.0;

/// Default RMS value that maps to a full-scale meter before gain
pub const DEFAULT_LEVEL_CEILING: f32 = 0.3;

/// Default gain applied after normalization
pub const DEFAULT_GAIN: f32 = 3.0;

/// Normalized levels below this are shown as silence
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 0.01;

/// Root-mean-square of the first channel of a buffer, clamped to [0, 1].
pub fn rms(buffer: &AudioBuffer<'_>) -> f32 {
    let frames = buffer.frames();
    if frames == 0 {
        return 0.0;
    }

    let sum: f32 = buffer.channel(0).take(frames).map(|s| s * s).sum();
    let value = (sum / frames as f32).sqrt();
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Meter normalization settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSettings {
    pub floor: f32,
    pub ceiling: f32,
    pub gain: f32,
    pub silence_threshold: f32,
}

impl Default for LevelSettings {
    fn default() -> Self {
        Self {
            floor: DEFAULT_LEVEL_FLOOR,
            ceiling: DEFAULT_LEVEL_CEILING,
            gain: DEFAULT_GAIN,
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
        }
    }
}

impl LevelSettings {
    /// Check that the settings describe a usable meter range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.floor.is_finite() || !self.ceiling.is_finite() {
            return Err(ConfigError::ValidationError {
                key: "level_ceiling".to_string(),
                message: "Floor and ceiling must be finite numbers".to_string(),
            });
        }
        if self.ceiling <= self.floor {
            return Err(ConfigError::ValidationError {
                key: "level_ceiling".to_string(),
                message: format!(
                    "Ceiling ({}) must be greater than floor ({})",
                    self.ceiling, self.floor
                ),
            });
        }
        if !self.gain.is_finite() || self.gain <= 0.0 {
            return Err(ConfigError::ValidationError {
                key: "gain".to_string(),
                message: "Gain must be a positive number".to_string(),
            });
        }
        Ok(())
    }

    /// Map a raw RMS value onto the meter scale [0, 1].
    ///
    /// Monotonic non-decreasing in `raw`. Inputs at or below the floor give 0,
    /// inputs at or above the ceiling give 1.
    pub fn normalize(&self, raw: f32) -> f32 {
        let span = self.ceiling - self.floor;
        if span <= 0.0 || raw.is_nan() {
            return 0.0;
        }

        let normalized = ((raw - self.floor) / span).clamp(0.0, 1.0);
        if normalized < self.silence_threshold {
            return 0.0;
        }
        (normalized * self.gain).min(1.0)
    }

    /// Build a reading carrying both the raw and the processed value
    pub fn reading(&self, raw: f32) -> LevelReading {
        LevelReading {
            raw: raw.clamp(0.0, 1.0),
            level: self.normalize(raw),
        }
    }
}

/// A published level sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LevelReading {
    /// RMS of the original buffer
    pub raw: f32,
    /// Normalized, gained and clamped meter value
    pub level: f32,
}

impl LevelReading {
    pub const SILENT: Self = Self {
        raw: 0.0,
        level: 0.0,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::AudioFormat;

    fn mono(samples: &[f32]) -> AudioBuffer<'_> {
        AudioBuffer::new(AudioFormat::new(44_100, 1), samples)
    }

    #[test]
    fn rms_of_empty_buffer_is_zero() {
        assert_eq!(rms(&mono(&[])), 0.0);
    }

    #[test]
    fn rms_of_constant_signal() {
        let samples = [0.5f32; 64];
        assert!((rms(&mono(&samples)) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rms_of_square_wave() {
        let samples: Vec<f32> = (0..100).map(|i| if i % 2 == 0 { 0.25 } else { -0.25 }).collect();
        assert!((rms(&mono(&samples)) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn rms_uses_first_channel_only() {
        let samples = [0.5f32, 1.0, 0.5, 1.0];
        let buffer = AudioBuffer::new(AudioFormat::new(48_000, 2), &samples);
        assert!((rms(&buffer) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn rms_is_clamped_to_one() {
        let samples = [4.0f32; 8];
        assert_eq!(rms(&mono(&samples)), 1.0);
    }

    #[test]
    fn normalize_at_and_below_floor_is_zero() {
        let settings = LevelSettings {
            floor: 0.1,
            ..Default::default()
        };
        assert_eq!(settings.normalize(0.1), 0.0);
        assert_eq!(settings.normalize(0.0), 0.0);
        assert_eq!(settings.normalize(-5.0), 0.0);
    }

    #[test]
    fn normalize_at_and_above_ceiling_is_one() {
        let settings = LevelSettings::default();
        assert_eq!(settings.normalize(0.3), 1.0);
        assert_eq!(settings.normalize(0.9), 1.0);
        assert_eq!(settings.normalize(100.0), 1.0);
    }

    #[test]
    fn normalize_applies_gain() {
        let settings = LevelSettings::default();
        // 0.03 / 0.3 = 0.1, times gain 3.0
        assert!((settings.normalize(0.03) - 0.3).abs() < 1e-5);
    }

    #[test]
    fn normalize_squelches_below_threshold() {
        let settings = LevelSettings::default();
        // 0.0015 / 0.3 = 0.005 < 0.01
        assert_eq!(settings.normalize(0.0015), 0.0);
    }

    #[test]
    fn normalize_is_monotonic_and_bounded() {
        let settings = LevelSettings::default();
        let mut previous = settings.normalize(-1.0);
        for step in 0..=2000 {
            let raw = -0.5 + step as f32 * 0.001;
            let value = settings.normalize(raw);
            assert!((0.0..=1.0).contains(&value), "out of range at {}", raw);
            assert!(value >= previous, "not monotonic at {}", raw);
            previous = value;
        }
    }

    #[test]
    fn normalize_nan_is_zero() {
        assert_eq!(LevelSettings::default().normalize(f32::NAN), 0.0);
    }

    #[test]
    fn reading_keeps_raw_and_level() {
        let reading = LevelSettings::default().reading(0.15);
        assert!((reading.raw - 0.15).abs() < 1e-6);
        assert_eq!(reading.level, 1.0);
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let settings = LevelSettings {
            floor: 0.5,
            ceiling: 0.3,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_positive_gain() {
        let settings = LevelSettings {
            gain: 0.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(LevelSettings::default().validate().is_ok());
    }
}
