use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::{Array2, Array4, ArrayView2};

use super::PATCH_SIZE;
use crate::depth::model::DepthArray;
use crate::error::InferenceError;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

// ---------------------------------------------------------------------------
// Input side
// ---------------------------------------------------------------------------

/// Network input size for an image of `width × height`.
///
/// Scales so both sides reach at least `input_size` while keeping the aspect
/// ratio, then snaps each side to a multiple of the patch size, rounding up
/// whenever rounding to nearest would fall below `input_size`.
pub fn target_size(width: u32, height: u32, input_size: u32) -> (u32, u32) {
    let scale = (input_size as f64 / width as f64).max(input_size as f64 / height as f64);
    let snap = |v: f64| -> u32 {
        let patch = PATCH_SIZE as f64;
        let mut y = (v / patch).round() * patch;
        if y < input_size as f64 {
            y = (v / patch).ceil() * patch;
        }
        y as u32
    };
    (snap(width as f64 * scale), snap(height as f64 * scale))
}

/// Resize, normalize and lay out `image` as a `[1, 3, H, W]` tensor.
pub fn prepare_input(image: &RgbImage, input_size: u32) -> Array4<f32> {
    let (w, h) = target_size(image.width(), image.height(), input_size);
    let resized = imageops::resize(image, w, h, FilterType::CatmullRom);

    let mut tensor = Array4::<f32>::zeros((1, 3, h as usize, w as usize));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            let v = pixel.0[c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (v - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }
    tensor
}

// ---------------------------------------------------------------------------
// Output side
// ---------------------------------------------------------------------------

/// Turn a raw network output into a depth array of the source size.
///
/// Accepts `[H, W]`, `[1, H, W]` or `[1, 1, H, W]` shapes. Non-finite values
/// are rejected; the rest are clamped to `[0, max_depth]`.
pub fn finalize_output(
    shape: &[i64],
    data: &[f32],
    width: u32,
    height: u32,
    max_depth: f32,
) -> Result<DepthArray, InferenceError> {
    let malformed = || {
        InferenceError::MalformedOutput(format!(
            "expected a single-channel depth map, got shape {shape:?}"
        ))
    };
    let rank = shape.len();
    if !(2..=4).contains(&rank) || shape[..rank - 2].iter().any(|&d| d != 1) {
        return Err(malformed());
    }
    let out_h = usize::try_from(shape[rank - 2]).map_err(|_| malformed())?;
    let out_w = usize::try_from(shape[rank - 1]).map_err(|_| malformed())?;
    let grid = ArrayView2::from_shape((out_h, out_w), data).map_err(|_| {
        InferenceError::MalformedOutput(format!(
            "{} values do not match shape {shape:?}",
            data.len()
        ))
    })?;
    if let Some(bad) = grid.iter().find(|v| !v.is_finite()) {
        return Err(InferenceError::MalformedOutput(format!(
            "depth map contains non-finite value {bad}"
        )));
    }

    let mut resized = resize_bilinear(grid, height as usize, width as usize);
    resized.mapv_inplace(|v| v.clamp(0.0, max_depth));
    Ok(DepthArray::from_array(resized))
}

/// Bilinear resize with corner pixels aligned.
pub fn resize_bilinear(src: ArrayView2<f32>, out_h: usize, out_w: usize) -> Array2<f32> {
    let (in_h, in_w) = src.dim();
    if in_h == 0 || in_w == 0 {
        return Array2::zeros((out_h, out_w));
    }
    let ratio = |inp: usize, out: usize| {
        if out > 1 {
            (inp - 1) as f32 / (out - 1) as f32
        } else {
            0.0
        }
    };
    let ry = ratio(in_h, out_h);
    let rx = ratio(in_w, out_w);

    Array2::from_shape_fn((out_h, out_w), |(y, x)| {
        let sy = y as f32 * ry;
        let sx = x as f32 * rx;
        let y0 = (sy.floor() as usize).min(in_h - 1);
        let x0 = (sx.floor() as usize).min(in_w - 1);
        let y1 = (y0 + 1).min(in_h - 1);
        let x1 = (x0 + 1).min(in_w - 1);
        let fy = sy - y0 as f32;
        let fx = sx - x0 as f32;
        let top = src[[y0, x0]] * (1.0 - fx) + src[[y0, x1]] * fx;
        let bottom = src[[y1, x0]] * (1.0 - fx) + src[[y1, x1]] * fx;
        top * (1.0 - fy) + bottom * fy
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn target_size_keeps_both_sides_above_input() {
        assert_eq!(target_size(100, 80, 518), (644, 518));
        assert_eq!(target_size(518, 518, 518), (518, 518));
        let (w, h) = target_size(1920, 1080, 518);
        assert_eq!(h, 518);
        assert_eq!(w % 14, 0);
        assert!(w >= 518);
    }

    #[test]
    fn prepare_input_normalizes_channels() {
        let img = RgbImage::from_pixel(20, 20, Rgb([255, 0, 128]));
        let tensor = prepare_input(&img, 28);
        assert_eq!(tensor.shape(), &[1, 3, 28, 28]);
        let r = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let g = (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        assert!((tensor[[0, 0, 5, 5]] - r).abs() < 1e-5);
        assert!((tensor[[0, 1, 5, 5]] - g).abs() < 1e-5);
    }

    #[test]
    fn bilinear_keeps_corners_and_interpolates() {
        let src = Array2::from_shape_vec((2, 2), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let out = resize_bilinear(src.view(), 3, 3);
        assert_eq!(out[[0, 0]], 0.0);
        assert_eq!(out[[0, 2]], 1.0);
        assert_eq!(out[[2, 0]], 2.0);
        assert_eq!(out[[2, 2]], 3.0);
        assert!((out[[1, 1]] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn finalize_accepts_batched_shapes_and_clamps() {
        let data = vec![-1.0, 5.0, 30.0, 10.0];
        let depth = finalize_output(&[1, 2, 2], &data, 2, 2, 20.0).unwrap();
        assert_eq!(depth.get(0, 0), Some(0.0));
        assert_eq!(depth.get(0, 1), Some(20.0));

        let depth = finalize_output(&[1, 1, 2, 2], &data, 4, 3, 20.0).unwrap();
        assert_eq!(depth.dimensions(), (4, 3));
    }

    #[test]
    fn finalize_rejects_bad_outputs() {
        assert!(finalize_output(&[1, 3, 2, 2], &[0.0; 12], 2, 2, 20.0).is_err());
        assert!(finalize_output(&[1, 2, 2], &[0.0; 3], 2, 2, 20.0).is_err());
        assert!(finalize_output(&[1, 2, 2], &[0.0, f32::NAN, 0.0, 0.0], 2, 2, 20.0).is_err());
    }
}
