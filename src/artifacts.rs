use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use log::debug;

use crate::color::ColorMap;
use crate::depth::model::DepthArray;
use crate::error::PersistenceError;

pub const IMAGES_DIR: &str = "images";
pub const ARRAYS_DIR: &str = "arrays";
pub const ARTIFACT_SUFFIX: &str = "_depth";
pub const IMAGE_EXT: &str = "png";
pub const ARRAY_EXT: &str = "npy";

const PARTIAL_EXT: &str = "partial";

// ---------------------------------------------------------------------------
// Artifact paths
// ---------------------------------------------------------------------------

/// Where the two artifacts for one image live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub visualization: PathBuf,
    pub array: PathBuf,
}

impl ArtifactPaths {
    /// `<root>/images/<stem>_depth.png` and `<root>/arrays/<stem>_depth.npy`.
    pub fn new(output_root: &Path, stem: &str) -> Self {
        ArtifactPaths {
            visualization: output_root
                .join(IMAGES_DIR)
                .join(format!("{stem}{ARTIFACT_SUFFIX}.{IMAGE_EXT}")),
            array: output_root
                .join(ARRAYS_DIR)
                .join(format!("{stem}{ARTIFACT_SUFFIX}.{ARRAY_EXT}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Persists depth arrays as a colourized PNG plus a raw `.npy` file.
#[derive(Debug, Clone, Default)]
pub struct ArtifactWriter {
    color_map: ColorMap,
}

impl ArtifactWriter {
    /// Write both artifacts for `stem` and return the visualization path.
    ///
    /// Each file is written under a `.partial` name and renamed into place, so
    /// a failure never leaves a truncated file under an artifact name. The
    /// array is committed first; if the visualization then fails to commit,
    /// the new array is removed again so no half-updated pair is left behind.
    pub fn persist(
        &self,
        output_root: &Path,
        stem: &str,
        depth: &DepthArray,
    ) -> Result<PathBuf, PersistenceError> {
        let paths = ArtifactPaths::new(output_root, stem);
        for dir in [output_root.join(IMAGES_DIR), output_root.join(ARRAYS_DIR)] {
            fs::create_dir_all(&dir).map_err(|e| PersistenceError::io(&dir, e))?;
        }

        let vis_tmp = partial_path(&paths.visualization);
        let arr_tmp = partial_path(&paths.array);
        let written = self
            .write_visualization(&vis_tmp, depth)
            .and_then(|()| write_array(&arr_tmp, depth))
            .and_then(|()| commit(&arr_tmp, &paths.array))
            .and_then(|()| {
                commit(&vis_tmp, &paths.visualization).map_err(|e| {
                    let _ = fs::remove_file(&paths.array);
                    e
                })
            });
        if let Err(e) = written {
            let _ = fs::remove_file(&vis_tmp);
            let _ = fs::remove_file(&arr_tmp);
            return Err(e);
        }

        debug!(
            "wrote {} and {}",
            paths.visualization.display(),
            paths.array.display()
        );
        Ok(paths.visualization)
    }

    fn write_visualization(&self, path: &Path, depth: &DepthArray) -> Result<(), PersistenceError> {
        self.color_map
            .colorize(depth)
            .save_with_format(path, ImageFormat::Png)
            .map_err(|source| PersistenceError::Image {
                path: path.to_path_buf(),
                source,
            })
    }
}

fn write_array(path: &Path, depth: &DepthArray) -> Result<(), PersistenceError> {
    ndarray_npy::write_npy(path, depth.as_array()).map_err(|source| PersistenceError::Array {
        path: path.to_path_buf(),
        source,
    })
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(PARTIAL_EXT);
    path.with_file_name(name)
}

// Rename into place once the file is known to be non-empty.
fn commit(tmp: &Path, dest: &Path) -> Result<(), PersistenceError> {
    let len = fs::metadata(tmp)
        .map_err(|e| PersistenceError::io(tmp, e))?
        .len();
    if len == 0 {
        return Err(PersistenceError::EmptyArtifact(tmp.to_path_buf()));
    }
    fs::rename(tmp, dest).map_err(|e| PersistenceError::io(dest, e))
}
