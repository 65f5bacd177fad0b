use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Continuous rainbow scale
// ---------------------------------------------------------------------------

/// Hue at the low end of the scale (violet); the high end is red.
const LOW_HUE: f32 = 270.0;

/// Rainbow colour for a position `t` in [0, 1].
pub fn rainbow(t: f64) -> Color32 {
    let t = t.clamp(0.0, 1.0) as f32;
    let hsl = Hsl::new(LOW_HUE * (1.0 - t), 0.85, 0.5);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Colour used for points and lines without a colouring value.
pub const MISSING_COLOR: Color32 = Color32::GRAY;

/// Maps a value range onto a fixed number of rainbow bins.
#[derive(Debug, Clone)]
pub struct ColorScale {
    min: f64,
    max: f64,
    palette: Vec<Color32>,
}

impl ColorScale {
    pub fn new((min, max): (f64, f64), bins: usize) -> Self {
        let bins = bins.max(2);
        let palette = (0..bins)
            .map(|i| rainbow(i as f64 / (bins - 1) as f64))
            .collect();
        ColorScale { min, max, palette }
    }

    pub fn bins(&self) -> usize {
        self.palette.len()
    }

    /// Bin index for a value; values outside the range clamp to the ends.
    pub fn bin_for(&self, value: f64) -> usize {
        let span = self.max - self.min;
        if span <= f64::EPSILON || !value.is_finite() {
            return 0;
        }
        let t = ((value - self.min) / span).clamp(0.0, 1.0);
        ((t * (self.bins() - 1) as f64).round() as usize).min(self.bins() - 1)
    }

    pub fn bin_color(&self, bin: usize) -> Color32 {
        self.palette.get(bin).copied().unwrap_or(MISSING_COLOR)
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        self.bin_color(self.bin_for(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rainbow_ends() {
        let low = rainbow(0.0);
        let high = rainbow(1.0);
        // Violet has more blue than red; red has no blue.
        assert!(low.b() > low.g());
        assert!(high.r() > high.b());
        assert_eq!(rainbow(-3.0), low);
        assert_eq!(rainbow(7.0), high);
    }

    #[test]
    fn test_bins_clamp() {
        let scale = ColorScale::new((10.0, 20.0), 11);
        assert_eq!(scale.bin_for(10.0), 0);
        assert_eq!(scale.bin_for(15.0), 5);
        assert_eq!(scale.bin_for(20.0), 10);
        assert_eq!(scale.bin_for(-100.0), 0);
        assert_eq!(scale.bin_for(100.0), 10);
    }

    #[test]
    fn test_flat_range() {
        let scale = ColorScale::new((3.0, 3.0), 8);
        assert_eq!(scale.bin_for(3.0), 0);
        assert_eq!(scale.bin_color(99), MISSING_COLOR);
    }
}
