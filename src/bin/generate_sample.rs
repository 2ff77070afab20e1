use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use image::{ImageFormat, Rgb, RgbImage};

#[derive(Parser, Debug)]
#[command(
    name = "generate_sample",
    about = "Write a small synthetic image tree for trying out depth-batch"
)]
struct Args {
    /// Folder to create the sample tree in.
    #[arg(long, default_value = "sample_images")]
    output: PathBuf,
    /// PRNG seed; the same seed always produces the same images.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// Sky-to-ground gradient with a few bright "near" blobs and mild noise.
fn synthetic_scene(width: u32, height: u32, rng: &mut SimpleRng) -> RgbImage {
    let blobs: Vec<(f64, f64, f64)> = (0..3)
        .map(|_| {
            (
                rng.range(0.0, width as f64),
                rng.range(0.0, height as f64),
                rng.range(4.0, width as f64 / 4.0),
            )
        })
        .collect();
    let tint = [rng.range(0.6, 1.0), rng.range(0.6, 1.0), rng.range(0.6, 1.0)];

    let mut img = RgbImage::new(width, height);
    for (x, y, px) in img.enumerate_pixels_mut() {
        let base = 40.0 + 160.0 * (y as f64 / height.max(1) as f64);
        let glow: f64 = blobs
            .iter()
            .map(|&(cx, cy, r)| {
                let d2 = (x as f64 - cx).powi(2) + (y as f64 - cy).powi(2);
                80.0 * (-d2 / (2.0 * r * r)).exp()
            })
            .sum();
        let noise = rng.range(-6.0, 6.0);
        let v = base + glow + noise;
        *px = Rgb(tint.map(|t| (v * t).clamp(0.0, 255.0) as u8));
    }
    img
}

fn write_image(path: &Path, img: &RgbImage, format: ImageFormat) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    img.save_with_format(path, format)
        .with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);
    let root = &args.output;

    let scenes: [(&str, u32, u32, ImageFormat); 6] = [
        ("street.png", 160, 120, ImageFormat::Png),
        ("indoor/kitchen.jpg", 128, 96, ImageFormat::Jpeg),
        ("indoor/hallway.BMP", 64, 96, ImageFormat::Bmp),
        ("aerial/field.tiff", 120, 80, ImageFormat::Tiff),
        // Same stem as the first scene, exercising collision handling.
        ("aerial/street.jpeg", 100, 80, ImageFormat::Jpeg),
        ("indoor/nested/stairs.png", 90, 140, ImageFormat::Png),
    ];
    for (name, w, h, format) in scenes {
        let img = synthetic_scene(w, h, &mut rng);
        write_image(&root.join(name), &img, format)?;
    }

    // Inputs the pipeline should skip or report.
    fs::write(root.join("notes.txt"), "not an image\n").context("writing notes.txt")?;
    fs::write(root.join("indoor/corrupt.jpg"), b"").context("writing corrupt.jpg")?;
    fs::write(root.join("aerial/animation.gif"), b"GIF89a").context("writing animation.gif")?;

    println!(
        "Wrote {} sample image(s) plus 3 decoy files to {}",
        scenes.len(),
        root.display()
    );
    Ok(())
}
