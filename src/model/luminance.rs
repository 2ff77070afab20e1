use image::RgbImage;

use super::DepthModel;
use crate::depth::model::DepthArray;
use crate::error::InferenceError;

/// Reference model that treats darker pixels as farther away.
///
/// Depth is `max_depth * (1 - luma)` with Rec.601 luma scaled to `[0, 1]`.
/// It has no weights, so it is useful for exercising the pipeline end to end.
#[derive(Debug, Clone)]
pub struct LuminanceDepthModel {
    max_depth: f32,
}

impl LuminanceDepthModel {
    pub fn new(max_depth: f32) -> Self {
        Self { max_depth }
    }
}

impl DepthModel for LuminanceDepthModel {
    fn name(&self) -> &str {
        "luminance"
    }

    fn infer(&self, image: &RgbImage) -> Result<DepthArray, InferenceError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(InferenceError::Rejected(format!(
                "image has no pixels ({}x{})",
                image.width(),
                image.height()
            )));
        }
        Ok(DepthArray::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b] = image.get_pixel(x, y).0;
            let luma = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0;
            self.max_depth * (1.0 - luma.clamp(0.0, 1.0))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn black_is_far_and_white_is_near() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([0, 0, 0]));
        img.put_pixel(1, 0, Rgb([255, 255, 255]));
        let depth = LuminanceDepthModel::new(10.0).infer(&img).unwrap();
        assert_eq!(depth.dimensions(), (2, 1));
        assert_eq!(depth.get(0, 0), Some(10.0));
        assert!(depth.get(1, 0).unwrap().abs() < 1e-4);
    }

    #[test]
    fn rejects_empty_images() {
        let img = RgbImage::new(0, 0);
        assert!(LuminanceDepthModel::new(10.0).infer(&img).is_err());
    }
}
