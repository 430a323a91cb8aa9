/// Heatmap shading bucket for a density intensity (or a marker probability).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DensityTier {
    None,
    Low,
    Medium,
    High,
}

impl DensityTier {
    /// `<0.1` none, `<0.3` low, `<0.6` medium, otherwise high.
    pub fn from_intensity(intensity: f64) -> Self {
        if intensity.is_nan() || intensity < 0.1 {
            DensityTier::None
        } else if intensity < 0.3 {
            DensityTier::Low
        } else if intensity < 0.6 {
            DensityTier::Medium
        } else {
            DensityTier::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DensityTier::None => "none",
            DensityTier::Low => "low",
            DensityTier::Medium => "medium",
            DensityTier::High => "high",
        }
    }

    /// One-character glyph for text renderings of the grid.
    pub fn glyph(self) -> char {
        match self {
            DensityTier::None => '.',
            DensityTier::Low => '-',
            DensityTier::Medium => '+',
            DensityTier::High => '#',
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TierPalette {
    pub low: [f32; 4],
    pub medium: [f32; 4],
    pub high: [f32; 4],
}

impl TierPalette {
    pub fn color(&self, tier: DensityTier) -> [f32; 4] {
        match tier {
            DensityTier::None => [0.0, 0.0, 0.0, 0.0],
            DensityTier::Low => self.low,
            DensityTier::Medium => self.medium,
            DensityTier::High => self.high,
        }
    }
}

impl Default for TierPalette {
    fn default() -> Self {
        Self {
            low: [0.23, 0.51, 0.96, 0.35],
            medium: [0.96, 0.62, 0.04, 0.5],
            high: [0.94, 0.27, 0.27, 0.65],
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerStyle {
    pub visible: bool,
    pub palette: TierPalette,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            visible: true,
            palette: TierPalette::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DensityTier, TierPalette};

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(DensityTier::from_intensity(0.0), DensityTier::None);
        assert_eq!(DensityTier::from_intensity(0.0999), DensityTier::None);
        assert_eq!(DensityTier::from_intensity(0.1), DensityTier::Low);
        assert_eq!(DensityTier::from_intensity(0.3), DensityTier::Medium);
        assert_eq!(DensityTier::from_intensity(0.6), DensityTier::High);
        assert_eq!(DensityTier::from_intensity(1.0), DensityTier::High);
        assert_eq!(DensityTier::from_intensity(f64::NAN), DensityTier::None);
    }

    #[test]
    fn none_tier_is_transparent() {
        let palette = TierPalette::default();
        assert_eq!(palette.color(DensityTier::None)[3], 0.0);
        assert!(palette.color(DensityTier::High)[3] > 0.0);
    }
}
