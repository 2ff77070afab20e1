use std::fs;

use depth_batch::artifacts::ArtifactPaths;
use depth_batch::{ArtifactWriter, DepthArray, compute};
use ndarray::Array2;
use tempfile::tempdir;

fn ramp(width: u32, height: u32) -> DepthArray {
    DepthArray::from_fn(width, height, |x, y| 0.25 + x as f32 * 0.01 + y as f32 * 0.37)
}

#[test]
fn visualization_matches_depth_dimensions() {
    let tmp = tempdir().unwrap();
    let writer = ArtifactWriter::default();
    for (w, h) in [(1, 1), (100, 80), (33, 7)] {
        let stem = format!("img_{w}x{h}");
        let vis = writer.persist(tmp.path(), &stem, &ramp(w, h)).unwrap();
        let decoded = image::open(&vis).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (w, h));
    }
}

#[test]
fn raw_array_keeps_full_precision() {
    let tmp = tempdir().unwrap();
    let depth = ramp(9, 5);
    ArtifactWriter::default()
        .persist(tmp.path(), "scene", &depth)
        .unwrap();

    let paths = ArtifactPaths::new(tmp.path(), "scene");
    let restored: Array2<f32> = ndarray_npy::read_npy(&paths.array).unwrap();
    assert_eq!(&restored, depth.as_array());
    assert_eq!(compute(&DepthArray::from_array(restored)), compute(&depth));
}

#[test]
fn persisting_twice_gives_identical_files() {
    let tmp = tempdir().unwrap();
    let writer = ArtifactWriter::default();
    let depth = ramp(40, 30);
    let paths = ArtifactPaths::new(tmp.path(), "again");

    writer.persist(tmp.path(), "again", &depth).unwrap();
    let vis_first = fs::read(&paths.visualization).unwrap();
    let arr_first = fs::read(&paths.array).unwrap();

    writer.persist(tmp.path(), "again", &depth).unwrap();
    assert_eq!(fs::read(&paths.visualization).unwrap(), vis_first);
    assert_eq!(fs::read(&paths.array).unwrap(), arr_first);
    assert!(!vis_first.is_empty());
    assert!(!arr_first.is_empty());
}

#[test]
fn flat_depth_renders_as_the_lowest_colour() {
    let tmp = tempdir().unwrap();
    let depth = DepthArray::from_fn(4, 4, |_, _| 3.0);
    let vis = ArtifactWriter::default()
        .persist(tmp.path(), "flat", &depth)
        .unwrap();

    let img = image::open(&vis).unwrap().to_rgb8();
    let expected = depth_batch::color::ColorMap::viridis().color_for(0);
    assert!(img.pixels().all(|p| *p == expected));
}
