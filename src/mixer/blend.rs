use std::collections::HashMap;

use crate::foundation::error::PlayoutError;
use crate::foundation::math::{clamp_u8, mul_div255_u8, unpremul_u8};

/// Premultiplied 8-bit pixel in B, G, R, A order.
pub type PremulBgra8 = [u8; 4];

/// Operator used to combine a layer's pixels into the running composite.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Source over destination.
    #[default]
    Normal,
    /// Linear dodge.
    Add,
    /// Destination minus source.
    Subtract,
    /// Product of both colours.
    Multiply,
    /// Inverted product of inverted colours.
    Screen,
    /// Multiply or screen depending on the destination.
    Overlay,
    /// Per-channel minimum.
    Darken,
    /// Per-channel maximum.
    Lighten,
    /// Absolute difference.
    Difference,
    /// Low-contrast difference.
    Exclusion,
    /// Brighten destination by source.
    ColorDodge,
    /// Darken destination by source.
    ColorBurn,
    /// Multiply or screen depending on the source.
    HardLight,
    /// Soft variant of hard light.
    SoftLight,
}

impl BlendMode {
    /// Every supported mode, in declaration order.
    pub const ALL: [BlendMode; 14] = [
        BlendMode::Normal,
        BlendMode::Add,
        BlendMode::Subtract,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::Difference,
        BlendMode::Exclusion,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::HardLight,
        BlendMode::SoftLight,
    ];

    /// Stable snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Add => "add",
            BlendMode::Subtract => "subtract",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
            BlendMode::ColorDodge => "color_dodge",
            BlendMode::ColorBurn => "color_burn",
            BlendMode::HardLight => "hard_light",
            BlendMode::SoftLight => "soft_light",
        }
    }

    /// Blend one straight-alpha channel, both inputs in `0..=1`.
    pub fn blend_channel(self, dst: f32, src: f32) -> f32 {
        let (d, s) = (dst, src);
        match self {
            BlendMode::Normal => s,
            BlendMode::Add => (d + s).min(1.0),
            BlendMode::Subtract => (d - s).max(0.0),
            BlendMode::Multiply => d * s,
            BlendMode::Screen => 1.0 - (1.0 - d) * (1.0 - s),
            BlendMode::Overlay => hard_light(s, d),
            BlendMode::Darken => d.min(s),
            BlendMode::Lighten => d.max(s),
            BlendMode::Difference => (d - s).abs(),
            BlendMode::Exclusion => d + s - 2.0 * d * s,
            BlendMode::ColorDodge => {
                if s >= 1.0 {
                    1.0
                } else {
                    (d / (1.0 - s)).min(1.0)
                }
            }
            BlendMode::ColorBurn => {
                if s <= 0.0 {
                    if d >= 1.0 { 1.0 } else { 0.0 }
                } else {
                    1.0 - ((1.0 - d) / s).min(1.0)
                }
            }
            BlendMode::HardLight => hard_light(d, s),
            BlendMode::SoftLight => (1.0 - 2.0 * s) * d * d + 2.0 * s * d,
        }
    }
}

fn hard_light(d: f32, s: f32) -> f32 {
    if s <= 0.5 {
        2.0 * d * s
    } else {
        1.0 - 2.0 * (1.0 - d) * (1.0 - s)
    }
}

impl std::fmt::Display for BlendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BlendMode {
    type Err = PlayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        BlendMode::ALL
            .into_iter()
            .find(|m| m.as_str() == key)
            .ok_or_else(|| PlayoutError::validation(format!("unknown blend mode '{s}'")))
    }
}

/// Source-over for premultiplied pixels, scaling the source by `opacity`.
pub fn over(dst: PremulBgra8, src: PremulBgra8, opacity: f32) -> PremulBgra8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Combine a premultiplied source pixel into `dst` with `mode`.
///
/// Uses the separable compositing formula
/// `co = cs * (1 - ab) + cb * (1 - as) + as * ab * B(Cb, Cs)`.
pub fn composite_pixel(
    mode: BlendMode,
    dst: PremulBgra8,
    src: PremulBgra8,
    opacity: f32,
) -> PremulBgra8 {
    if mode == BlendMode::Normal || dst[3] == 0 {
        return over(dst, src, opacity);
    }
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let sa = f32::from(src[3]) / 255.0 * opacity;
    let da = f32::from(dst[3]) / 255.0;
    let mut out = [0u8; 4];
    for i in 0..3 {
        let cs = f32::from(unpremul_u8(src[i], src[3])) / 255.0;
        let cb = f32::from(unpremul_u8(dst[i], dst[3])) / 255.0;
        let b = mode.blend_channel(cb, cs);
        let co = cs * sa * (1.0 - da) + cb * da * (1.0 - sa) + sa * da * b;
        out[i] = clamp_u8(co * 255.0);
    }
    out[3] = clamp_u8((sa + da * (1.0 - sa)) * 255.0);
    out
}

/// Layer index to blend mode mapping; absent layers blend normally.
#[derive(Clone, Debug, Default)]
pub struct BlendModeRegistry {
    modes: HashMap<i32, BlendMode>,
}

impl BlendModeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mode for `layer`, [`BlendMode::Normal`] when unset.
    pub fn get(&self, layer: i32) -> BlendMode {
        self.modes.get(&layer).copied().unwrap_or_default()
    }

    /// Insert or overwrite the mode of `layer`.
    pub fn set(&mut self, layer: i32, mode: BlendMode) {
        self.modes.insert(layer, mode);
    }

    /// Forget every explicit assignment.
    pub fn clear(&mut self) {
        self.modes.clear();
    }

    /// Explicit assignments in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, BlendMode)> + '_ {
        self.modes.iter().map(|(&k, &v)| (k, v))
    }

    /// Explicit assignments sorted by layer index.
    pub fn entries(&self) -> Vec<(i32, BlendMode)> {
        let mut out: Vec<_> = self.iter().collect();
        out.sort_unstable_by_key(|(k, _)| *k);
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mixer/blend.rs"]
mod tests;
