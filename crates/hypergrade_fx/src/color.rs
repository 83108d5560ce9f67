// SPDX-License-Identifier: MIT OR Apache-2.0
//! Color math used by the grading recipes.
//!
//! All values are linear floats in `0.0..=1.0`; hue is a fraction of a turn.

use crate::{variant_key, UnknownVariant};
use std::str::FromStr;

/// RGB triple
pub type Rgb = [f32; 3];

/// Convert RGB to HSV
pub fn rgb_to_hsv([r, g, b]: Rgb) -> [f32; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let v = max;
    if max == min {
        return [0.0, 0.0, v];
    }

    let delta = max - min;
    let s = delta / max;
    let rc = (max - r) / delta;
    let gc = (max - g) / delta;
    let bc = (max - b) / delta;

    let h = if r == max {
        bc - gc
    } else if g == max {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    [(h / 6.0).rem_euclid(1.0), s, v]
}

/// Convert HSV to RGB
pub fn hsv_to_rgb([h, s, v]: [f32; 3]) -> Rgb {
    if s == 0.0 {
        return [v, v, v];
    }

    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match (sector as i32).rem_euclid(6) {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

/// Rotate the hue of a color by `degrees`
pub fn adjust_hue(rgb: Rgb, degrees: f32) -> Rgb {
    let [h, s, v] = rgb_to_hsv(rgb);
    hsv_to_rgb([(h + degrees / 360.0).rem_euclid(1.0), s, v])
}

/// Color wheel relationship used to derive accent colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HarmonyMode {
    /// Opposite hue
    #[default]
    Complementary,
    /// Neighbors at +/-30 degrees
    Analogous,
    /// Neighbors of the complement at +/-150 degrees
    SplitComplementary,
    /// Thirds of the wheel at +/-120 degrees
    Triadic,
}

impl HarmonyMode {
    /// All modes
    pub const ALL: [HarmonyMode; 4] = [
        Self::Complementary,
        Self::Analogous,
        Self::SplitComplementary,
        Self::Triadic,
    ];

    /// Hue offset in degrees
    pub fn angle(&self) -> f32 {
        match self {
            Self::Complementary => 180.0,
            Self::Analogous => 30.0,
            Self::SplitComplementary => 150.0,
            Self::Triadic => 120.0,
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Complementary => "Complementary",
            Self::Analogous => "Analogous",
            Self::SplitComplementary => "Split-Complementary",
            Self::Triadic => "Triadic",
        }
    }
}

impl FromStr for HarmonyMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match variant_key(s).as_str() {
            "COMPLEMENTARY" => Ok(Self::Complementary),
            "ANALOGOUS" => Ok(Self::Analogous),
            "SPLIT_COMPLEMENTARY" => Ok(Self::SplitComplementary),
            "TRIADIC" => Ok(Self::Triadic),
            _ => Err(UnknownVariant::new("harmony mode", s)),
        }
    }
}

/// Accent colors for `base`: one for complementary, two for the others
pub fn harmony_colors(base: Rgb, mode: HarmonyMode) -> Vec<Rgb> {
    let angle = mode.angle();
    match mode {
        HarmonyMode::Complementary => vec![adjust_hue(base, angle)],
        _ => vec![adjust_hue(base, angle), adjust_hue(base, -angle)],
    }
}

/// Linear blend from `a` (factor 0) to `b` (factor 1)
pub fn mix_colors(a: Rgb, b: Rgb, factor: f32) -> Rgb {
    [0, 1, 2].map(|i| a[i] * (1.0 - factor) + b[i] * factor)
}

/// Clamp a value into `min..=max`
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Opaque RGBA from RGB
pub fn to_rgba([r, g, b]: Rgb) -> [f32; 4] {
    [r, g, b, 1.0]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Rgb, b: Rgb) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < 1e-4, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn test_hsv_round_trip() {
        for rgb in [[0.8, 0.4, 0.2], [0.1, 0.9, 0.3], [0.2, 0.3, 0.5], [0.5, 0.5, 0.5]] {
            assert_close(hsv_to_rgb(rgb_to_hsv(rgb)), rgb);
        }
    }

    #[test]
    fn test_primary_hues() {
        assert_eq!(rgb_to_hsv([1.0, 0.0, 0.0]), [0.0, 1.0, 1.0]);
        let [h, _, _] = rgb_to_hsv([0.0, 0.0, 1.0]);
        assert!((h - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(rgb_to_hsv([0.0, 0.0, 0.0]), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_complement_of_red_is_cyan() {
        assert_close(adjust_hue([1.0, 0.0, 0.0], 180.0), [0.0, 1.0, 1.0]);
        assert_close(adjust_hue([1.0, 0.0, 0.0], -120.0), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_harmony_counts() {
        let base = [0.8, 0.4, 0.2];
        assert_eq!(harmony_colors(base, HarmonyMode::Complementary).len(), 1);
        for mode in [HarmonyMode::Analogous, HarmonyMode::SplitComplementary, HarmonyMode::Triadic] {
            assert_eq!(harmony_colors(base, mode).len(), 2);
        }
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("split-complementary".parse::<HarmonyMode>(), Ok(HarmonyMode::SplitComplementary));
        assert_eq!("Triadic".parse::<HarmonyMode>(), Ok(HarmonyMode::Triadic));
        assert!("tetradic".parse::<HarmonyMode>().is_err());
    }

    #[test]
    fn test_mix_and_clamp() {
        assert_close(mix_colors([0.0, 0.0, 0.0], [1.0, 0.5, 0.0], 0.5), [0.5, 0.25, 0.0]);
        assert_eq!(clamp(1.4, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-0.1, 0.0, 1.0), 0.0);
        assert_eq!(to_rgba([0.1, 0.2, 0.3]), [0.1, 0.2, 0.3, 1.0]);
    }
}
