use image::{Rgb, RgbImage};
use palette::Srgb;

use crate::depth::model::DepthArray;

// ---------------------------------------------------------------------------
// Viridis colour map
// ---------------------------------------------------------------------------

/// Viridis sampled at nine evenly spaced stops (sRGB, 0..1).
const VIRIDIS_STOPS: [(f32, f32, f32); 9] = [
    (0.267004, 0.004874, 0.329415),
    (0.282623, 0.140926, 0.457517),
    (0.229739, 0.322361, 0.545706),
    (0.172719, 0.448791, 0.557885),
    (0.127568, 0.566949, 0.550556),
    (0.157851, 0.683765, 0.501686),
    (0.369214, 0.788888, 0.382914),
    (0.678489, 0.863742, 0.189503),
    (0.993248, 0.906157, 0.143936),
];

/// A 256-entry lookup table from 8-bit intensity to RGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMap {
    lut: [[u8; 3]; 256],
}

impl ColorMap {
    /// Viridis, linearly interpolated between its stops in sRGB.
    pub fn viridis() -> Self {
        let stops: Vec<Srgb> = VIRIDIS_STOPS
            .iter()
            .map(|&(r, g, b)| Srgb::new(r, g, b))
            .collect();
        let segments = (stops.len() - 1) as f32;

        let mut lut = [[0u8; 3]; 256];
        for (i, entry) in lut.iter_mut().enumerate() {
            let t = i as f32 / 255.0 * segments;
            let lo = (t.floor() as usize).min(stops.len() - 2);
            let rgb: Srgb<u8> = lerp(stops[lo], stops[lo + 1], t - lo as f32).into_format();
            *entry = [rgb.red, rgb.green, rgb.blue];
        }
        ColorMap { lut }
    }

    /// Look up the colour for an 8-bit intensity.
    pub fn color_for(&self, value: u8) -> Rgb<u8> {
        Rgb(self.lut[value as usize])
    }

    /// Colourize a depth array after min-max scaling it to `0..=255`.
    ///
    /// The scale is computed from this array alone, so two visualizations are
    /// not comparable in brightness. A constant array maps to intensity 0.
    pub fn colorize(&self, depth: &DepthArray) -> RgbImage {
        let (min, max) = depth.min_max().unwrap_or((0.0, 0.0));
        let range = max - min;
        RgbImage::from_fn(depth.width(), depth.height(), |x, y| {
            let v = depth.get(x, y).unwrap_or(min);
            self.color_for(scale_to_u8(v, min, range))
        })
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::viridis()
    }
}

// Interpolates the encoded sRGB values, matching how the reference map is built.
fn lerp(a: Srgb, b: Srgb, t: f32) -> Srgb {
    Srgb::new(
        a.red + (b.red - a.red) * t,
        a.green + (b.green - a.green) * t,
        a.blue + (b.blue - a.blue) * t,
    )
}

/// Min-max rescale into `0..=255`, truncating toward zero.
pub fn scale_to_u8(v: f32, min: f32, range: f32) -> u8 {
    if !range.is_finite() || range.abs() < f32::EPSILON {
        return 0;
    }
    ((v - min) / range * 255.0).clamp(0.0, 255.0) as u8
}
