use std::path::Path;

use crate::foundation::core::VideoFormatDesc;
use crate::foundation::error::{PlayoutError, PlayoutResult};

/// Default allowed difference between the codec's and the channel's frame interval, in
/// seconds.
pub const DEFAULT_FRAME_INTERVAL_TOLERANCE: f64 = 0.0001;

/// Frame mixer options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MixerOpts {
    /// Name of the executor thread owning the mixer state.
    pub thread_name: String,
}

impl Default for MixerOpts {
    fn default() -> Self {
        Self {
            thread_name: "mixer".to_string(),
        }
    }
}

/// Video decode stage options.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DecoderOpts {
    /// Largest accepted `|codec interval - channel interval|`, in seconds.
    pub frame_interval_tolerance: f64,
    /// Copy planes with rayon row parallelism.
    pub parallel_copy: bool,
}

impl Default for DecoderOpts {
    fn default() -> Self {
        Self {
            frame_interval_tolerance: DEFAULT_FRAME_INTERVAL_TOLERANCE,
            parallel_copy: true,
        }
    }
}

/// Everything one playout channel needs, loadable from JSON.
///
/// ```json
/// { "format": { "name": "1080i5000", "width": 1920, "height": 1080,
///               "fps": { "num": 25, "den": 1 }, "field_mode": "upper" },
///   "mixer": { "thread_name": "mixer-1" } }
/// ```
///
/// `format` may also be a preset name string such as `"720p5000"`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChannelConfig {
    /// Output format.
    #[serde(deserialize_with = "format_or_preset")]
    pub format: VideoFormatDesc,
    /// Mixer options.
    #[serde(default)]
    pub mixer: MixerOpts,
    /// Decoder options.
    #[serde(default)]
    pub decoder: DecoderOpts,
}

impl ChannelConfig {
    /// Configuration for `format` with default options.
    pub fn new(format: VideoFormatDesc) -> Self {
        Self {
            format,
            mixer: MixerOpts::default(),
            decoder: DecoderOpts::default(),
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> PlayoutResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| PlayoutError::configuration(format!("invalid channel config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> PlayoutResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PlayoutError::configuration(format!("read channel config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> PlayoutResult<()> {
        self.format.validate()?;
        if self.mixer.thread_name.trim().is_empty() {
            return Err(PlayoutError::configuration(
                "mixer.thread_name must not be empty",
            ));
        }
        let tol = self.decoder.frame_interval_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(PlayoutError::configuration(
                "decoder.frame_interval_tolerance must be a finite, non-negative number",
            ));
        }
        Ok(())
    }
}

fn format_or_preset<'de, D>(de: D) -> Result<VideoFormatDesc, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Preset(String),
        Full(VideoFormatDesc),
    }

    match <Repr as serde::Deserialize>::deserialize(de)? {
        Repr::Preset(name) => VideoFormatDesc::preset(&name).map_err(serde::de::Error::custom),
        Repr::Full(desc) => Ok(desc),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
