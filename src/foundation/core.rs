use crate::foundation::error::{PlayoutError, PlayoutResult};

/// Default audio sample rate of a playout channel.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Default audio channel count of a playout channel.
pub const DEFAULT_AUDIO_CHANNELS: u16 = 2;

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> PlayoutResult<Self> {
        if den == 0 {
            return Err(PlayoutError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(PlayoutError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }
}

/// Field order of a video format.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldMode {
    /// Whole frames.
    #[default]
    Progressive,
    /// Interlaced, upper (top) field first.
    Upper,
    /// Interlaced, lower (bottom) field first.
    Lower,
}

impl FieldMode {
    /// Stable lowercase name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldMode::Progressive => "progressive",
            FieldMode::Upper => "upper",
            FieldMode::Lower => "lower",
        }
    }
}

/// Output format of one playout channel.
///
/// Every layer contribution of a tick is reconciled to this single format.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VideoFormatDesc {
    /// Human readable format name, for example `1080i5000`.
    #[serde(default)]
    pub name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Frame rate (frames, not fields).
    pub fps: Fps,
    /// Field order.
    #[serde(default)]
    pub field_mode: FieldMode,
    /// Audio sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub audio_sample_rate: u32,
    /// Interleaved audio channel count.
    #[serde(default = "default_audio_channels")]
    pub audio_channels: u16,
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

fn default_audio_channels() -> u16 {
    DEFAULT_AUDIO_CHANNELS
}

impl VideoFormatDesc {
    /// Create a format with the default audio layout.
    pub fn new(width: u32, height: u32, fps: Fps, field_mode: FieldMode) -> Self {
        Self {
            name: format!("{width}x{height}@{}/{}", fps.num, fps.den),
            width,
            height,
            fps,
            field_mode,
            audio_sample_rate: DEFAULT_SAMPLE_RATE,
            audio_channels: DEFAULT_AUDIO_CHANNELS,
        }
    }

    /// Look up a well-known broadcast format by name.
    pub fn preset(name: &str) -> PlayoutResult<Self> {
        let (width, height, num, den, field_mode) = match name {
            "pal" => (720, 576, 25, 1, FieldMode::Upper),
            "ntsc" => (720, 486, 30000, 1001, FieldMode::Lower),
            "720p5000" => (1280, 720, 50, 1, FieldMode::Progressive),
            "720p5994" => (1280, 720, 60000, 1001, FieldMode::Progressive),
            "1080i5000" => (1920, 1080, 25, 1, FieldMode::Upper),
            "1080i5994" => (1920, 1080, 30000, 1001, FieldMode::Upper),
            "1080p2500" => (1920, 1080, 25, 1, FieldMode::Progressive),
            "1080p5000" => (1920, 1080, 50, 1, FieldMode::Progressive),
            "1080p5994" => (1920, 1080, 60000, 1001, FieldMode::Progressive),
            other => {
                return Err(PlayoutError::validation(format!(
                    "unknown video format '{other}'"
                )));
            }
        };
        Ok(Self {
            name: name.to_string(),
            ..Self::new(width, height, Fps::new(num, den)?, field_mode)
        })
    }

    /// Validate dimensions, rate and audio layout.
    pub fn validate(&self) -> PlayoutResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PlayoutError::validation(
                "video format width/height must be non-zero",
            ));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if self.audio_sample_rate == 0 {
            return Err(PlayoutError::validation(
                "video format audio_sample_rate must be non-zero",
            ));
        }
        if self.audio_channels == 0 {
            return Err(PlayoutError::validation(
                "video format audio_channels must be non-zero",
            ));
        }
        Ok(())
    }

    /// Frame interval in seconds.
    pub fn frame_interval_secs(&self) -> f64 {
        self.fps.frame_duration_secs()
    }

    /// Byte size of one packed 4-channel frame.
    pub fn packed_size(&self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }

    /// Number of audio sample frames (per channel) belonging to tick `tick`.
    ///
    /// Rounds on absolute sample positions, so fractional rates follow the usual cadence
    /// (1602, 1601, 1602, ... at 29.97 / 48 kHz) and never drift.
    pub fn audio_samples_for_tick(&self, tick: u64) -> usize {
        let start = frame_to_sample(tick, self.fps, self.audio_sample_rate);
        let end = frame_to_sample(tick + 1, self.fps, self.audio_sample_rate);
        (end - start) as usize
    }
}

/// Convert a frame count into a rounded sample count at `sample_rate`.
///
/// A zero frame rate maps every frame to sample 0.
pub fn frame_to_sample(frame_delta: u64, fps: Fps, sample_rate: u32) -> u64 {
    if fps.num == 0 {
        return 0;
    }
    let num = u128::from(frame_delta) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
