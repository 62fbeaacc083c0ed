//! Bounded extraction of the `model.tar.gz` training artifact.

use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;

use super::EvaluateError;

const MAX_ARCHIVE_ENTRIES: usize = 1_000;
const MAX_TOTAL_UNCOMPRESSED_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Extract a gzipped tar archive into `dest_dir`.
///
/// Entry paths must stay inside the destination; absolute paths and `..`
/// components are rejected. Entry count and total uncompressed size are
/// capped so a malformed artifact cannot exhaust the disk.
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<(), EvaluateError> {
    let open_err = |source: std::io::Error| EvaluateError::Archive {
        path: archive_path.to_path_buf(),
        message: source.to_string(),
    };
    let file = File::open(archive_path).map_err(open_err)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let mut entry_count = 0usize;
    let mut total_bytes = 0u64;
    let entries = archive.entries().map_err(open_err)?;
    for entry in entries {
        let mut entry = entry.map_err(open_err)?;
        entry_count += 1;
        if entry_count > MAX_ARCHIVE_ENTRIES {
            return Err(EvaluateError::Archive {
                path: archive_path.to_path_buf(),
                message: format!("more than {MAX_ARCHIVE_ENTRIES} entries"),
            });
        }
        total_bytes = total_bytes.saturating_add(entry.size());
        if total_bytes > MAX_TOTAL_UNCOMPRESSED_BYTES {
            return Err(EvaluateError::Archive {
                path: archive_path.to_path_buf(),
                message: format!(
                    "uncompressed size exceeds {MAX_TOTAL_UNCOMPRESSED_BYTES} bytes"
                ),
            });
        }
        let entry_path = entry.path().map_err(open_err)?.into_owned();
        let relative = sanitize_entry_path(&entry_path).ok_or_else(|| EvaluateError::Archive {
            path: archive_path.to_path_buf(),
            message: format!("entry escapes destination: {}", entry_path.display()),
        })?;
        let dest = dest_dir.join(relative);
        if entry.header().entry_type().is_dir() {
            std::fs::create_dir_all(&dest).map_err(open_err)?;
            continue;
        }
        if !entry.header().entry_type().is_file() {
            // Links and special files are not part of the artifact contract.
            continue;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(open_err)?;
        }
        let mut out = File::create(&dest).map_err(open_err)?;
        let mut reader = (&mut entry).take(MAX_TOTAL_UNCOMPRESSED_BYTES);
        std::io::copy(&mut reader, &mut out).map_err(open_err)?;
    }
    Ok(())
}

fn sanitize_entry_path(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if out.as_os_str().is_empty() { None } else { Some(out) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::tempdir;

    fn build_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, bytes) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(bytes.len() as u64);
            header.set_mode(0o644);
            // Write the name bytes directly: `append_data` refuses `..`
            // paths, but the escape test needs to build exactly that.
            header.as_gnu_mut().unwrap().name[..name.len()].copy_from_slice(name.as_bytes());
            header.set_cksum();
            builder.append(&header, *bytes).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn extracts_files_into_destination() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("model.tar.gz");
        build_archive(&archive, &[("xgboost-model", b"{}"), ("meta/info.txt", b"hi")]);
        let dest = dir.path().join("work");
        std::fs::create_dir_all(&dest).unwrap();
        extract_tar_gz(&archive, &dest).unwrap();
        assert_eq!(std::fs::read(dest.join("xgboost-model")).unwrap(), b"{}");
        assert_eq!(std::fs::read(dest.join("meta/info.txt")).unwrap(), b"hi");
    }

    #[test]
    fn rejects_escaping_entry_paths() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("model.tar.gz");
        build_archive(&archive, &[("../outside", b"x")]);
        let dest = dir.path().join("work");
        std::fs::create_dir_all(&dest).unwrap();
        let err = extract_tar_gz(&archive, &dest).unwrap_err();
        assert!(err.to_string().contains("escapes destination"));
    }

    #[test]
    fn missing_archive_is_an_error() {
        let dir = tempdir().unwrap();
        let err = extract_tar_gz(&dir.path().join("absent.tar.gz"), dir.path()).unwrap_err();
        assert!(matches!(err, EvaluateError::Archive { .. }));
    }

    #[test]
    fn corrupt_archive_is_an_error() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("model.tar.gz");
        std::fs::write(&archive, b"not a gzip stream").unwrap();
        assert!(extract_tar_gz(&archive, dir.path()).is_err());
    }
}
