use std::collections::HashMap;
use std::fs::{self, FileType};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::model::SourceImage;
use crate::config::CollisionPolicy;
use crate::error::PipelineError;

/// Raster extensions accepted as input, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

// ---------------------------------------------------------------------------
// Enumeration
// ---------------------------------------------------------------------------

/// Whether `path` carries a whitelisted raster extension.
pub fn is_supported(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Recursively collect every supported image under `root`.
///
/// Entries are visited in sorted order so results are reproducible.
/// Symlinked directories are not followed. An unreadable `root` is an error;
/// an unreadable folder below it is logged and skipped.
pub fn discover(root: &Path) -> Result<Vec<SourceImage>, PipelineError> {
    let mut found = Vec::new();
    walk(root, root, &mut found)?;
    debug!("discovered {} image(s) under {}", found.len(), root.display());
    Ok(found)
}

fn walk(root: &Path, dir: &Path, found: &mut Vec<SourceImage>) -> Result<(), PipelineError> {
    let entries = match read_sorted(dir) {
        Ok(entries) => entries,
        Err(source) if dir != root => {
            warn!("skipping unreadable folder {}: {source}", dir.display());
            return Ok(());
        }
        Err(source) => {
            return Err(PipelineError::Discovery {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    for (path, file_type) in entries {
        if file_type.is_dir() {
            walk(root, &path, found)?;
        } else if is_supported(&path) && path.is_file() {
            found.push(SourceImage::new(root, path));
        }
    }
    Ok(())
}

fn read_sorted(dir: &Path) -> io::Result<Vec<(PathBuf, FileType)>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| {
            let entry = entry?;
            Ok((entry.path(), entry.file_type()?))
        })
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Artifact stem planning
// ---------------------------------------------------------------------------

/// A discovered image paired with the stem its artifacts will be written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedImage {
    pub source: SourceImage,
    pub artifact_stem: String,
}

/// Assign artifact stems, resolving images that share a stem per `policy`.
///
/// Stems are compared ignoring case, since `IMG_depth.png` and
/// `img_depth.png` name the same file on case-insensitive filesystems.
pub fn plan(
    images: Vec<SourceImage>,
    policy: CollisionPolicy,
) -> Result<Vec<PlannedImage>, PipelineError> {
    // lowercased artifact stem -> first image that claimed it
    let mut owners: HashMap<String, PathBuf> = HashMap::new();
    let mut planned = Vec::with_capacity(images.len());

    for source in images {
        let stem = source.stem.clone();
        let artifact_stem = match owners.get(&stem.to_lowercase()) {
            None => stem,
            Some(first) => match policy {
                CollisionPolicy::Fail => {
                    return Err(PipelineError::StemCollision {
                        stem,
                        first: first.clone(),
                        second: source.path,
                    });
                }
                CollisionPolicy::Overwrite => {
                    warn!(
                        "{} will overwrite the artifacts of {} (stem '{stem}')",
                        source.path.display(),
                        first.display()
                    );
                    stem
                }
                CollisionPolicy::Suffix => {
                    let renamed = (1..)
                        .map(|n| format!("{stem}_{n}"))
                        .find(|candidate| !owners.contains_key(&candidate.to_lowercase()))
                        .unwrap_or_else(|| stem.clone());
                    warn!(
                        "{} shares stem '{stem}' with {}; writing artifacts as '{renamed}'",
                        source.path.display(),
                        first.display()
                    );
                    renamed
                }
            },
        };
        owners
            .entry(artifact_stem.to_lowercase())
            .or_insert_with(|| source.path.clone());
        planned.push(PlannedImage {
            source,
            artifact_stem,
        });
    }

    Ok(planned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(path: &str) -> SourceImage {
        SourceImage::new(Path::new("/in"), PathBuf::from(path))
    }

    #[test]
    fn extension_whitelist_is_case_insensitive() {
        assert!(is_supported(Path::new("a.JPG")));
        assert!(is_supported(Path::new("a.Tiff")));
        assert!(is_supported(Path::new("dir/b.bmp")));
        assert!(!is_supported(Path::new("a.gif")));
        assert!(!is_supported(Path::new("a.txt")));
        assert!(!is_supported(Path::new("jpg")));
    }

    #[test]
    fn distinct_stems_are_kept() {
        let planned = plan(
            vec![image("/in/a.jpg"), image("/in/b.png")],
            CollisionPolicy::Suffix,
        )
        .unwrap();
        let stems: Vec<_> = planned.iter().map(|p| p.artifact_stem.as_str()).collect();
        assert_eq!(stems, ["a", "b"]);
    }

    #[test]
    fn suffix_policy_skips_taken_names() {
        let planned = plan(
            vec![
                image("/in/a/img.jpg"),
                image("/in/b/img.png"),
                image("/in/c/img_1.png"),
                image("/in/d/img.bmp"),
            ],
            CollisionPolicy::Suffix,
        )
        .unwrap();
        let stems: Vec<_> = planned.iter().map(|p| p.artifact_stem.as_str()).collect();
        assert_eq!(stems, ["img", "img_1", "img_1_1", "img_2"]);
    }

    #[test]
    fn overwrite_policy_reuses_the_stem() {
        let planned = plan(
            vec![image("/in/a/img.jpg"), image("/in/b/img.png")],
            CollisionPolicy::Overwrite,
        )
        .unwrap();
        assert_eq!(planned[0].artifact_stem, planned[1].artifact_stem);
    }

    #[test]
    fn fail_policy_names_both_sources() {
        let err = plan(
            vec![image("/in/a/img.jpg"), image("/in/b/img.png")],
            CollisionPolicy::Fail,
        )
        .unwrap_err();
        match err {
            PipelineError::StemCollision {
                stem,
                first,
                second,
            } => {
                assert_eq!(stem, "img");
                assert_eq!(first, PathBuf::from("/in/a/img.jpg"));
                assert_eq!(second, PathBuf::from("/in/b/img.png"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stems_differing_only_in_case_collide() {
        let images = || vec![image("/in/a/IMG.png"), image("/in/b/img.png")];

        let err = plan(images(), CollisionPolicy::Fail).unwrap_err();
        assert!(matches!(err, PipelineError::StemCollision { ref stem, .. } if stem == "img"));

        let planned = plan(images(), CollisionPolicy::Suffix).unwrap();
        let stems: Vec<_> = planned.iter().map(|p| p.artifact_stem.as_str()).collect();
        assert_eq!(stems, ["IMG", "img_1"]);
    }

    #[test]
    fn suffix_candidates_are_compared_ignoring_case() {
        let planned = plan(
            vec![
                image("/in/a/img.png"),
                image("/in/b/IMG_1.png"),
                image("/in/c/Img.png"),
            ],
            CollisionPolicy::Suffix,
        )
        .unwrap();
        let stems: Vec<_> = planned.iter().map(|p| p.artifact_stem.as_str()).collect();
        assert_eq!(stems, ["img", "IMG_1", "Img_2"]);
    }

    #[test]
    fn unreadable_subfolder_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut found = Vec::new();
        walk(dir.path(), &dir.path().join("vanished"), &mut found).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn unreadable_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("vanished");
        let err = discover(&missing).unwrap_err();
        assert!(matches!(err, PipelineError::Discovery { ref path, .. } if *path == missing));
    }
}
