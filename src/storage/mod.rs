//! Package Store (component B): the filesystem area holding uploaded
//! archives and their extracted trees.
//!
//! Archive extraction follows the same `zip::ZipArchive` + `by_index` +
//! `std::io::copy` walk used by game-package downloaders in the wild; see
//! `other_examples/…onboard-backend-src-api-mod.rs.rs`'s `download_game` for
//! the pattern this is grounded on.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::protocol::messages::GameConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to write archive to disk: {0}")]
    Write(#[source] std::io::Error),
    #[error("archive is not a valid zip file: {0}")]
    InvalidArchive(#[source] zip::result::ZipError),
    #[error("failed to extract archive: {0}")]
    Extract(#[source] std::io::Error),
}

/// Writes `bytes` to `<game_dir>/<filename>`, overwriting any prior archive.
pub fn store_archive(game_dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
    std::fs::create_dir_all(game_dir).map_err(StorageError::Write)?;
    let path = game_dir.join(filename);
    std::fs::write(&path, bytes).map_err(StorageError::Write)?;
    Ok(path)
}

/// Path to the extraction target for a game, `<game_dir>/extracted/`.
pub fn extracted_dir(game_dir: &Path) -> PathBuf {
    game_dir.join("extracted")
}

/// Removes any previous extraction and unpacks `archive_bytes` into a fresh
/// `extracted/` directory under `game_dir`. On any failure the previous
/// `extracted/` directory is left removed rather than half-overwritten — the
/// caller's metadata record is only updated once this returns `Ok`.
pub fn extract_archive(game_dir: &Path, archive_bytes: &[u8]) -> Result<PathBuf, StorageError> {
    let target = extracted_dir(game_dir);
    let _ = std::fs::remove_dir_all(&target);
    std::fs::create_dir_all(&target).map_err(StorageError::Write)?;

    let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes)).map_err(StorageError::InvalidArchive)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(StorageError::InvalidArchive)?;
        let out_path = match entry.enclosed_name() {
            Some(name) => target.join(name),
            None => continue,
        };

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(StorageError::Extract)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::Extract)?;
        }
        let mut out_file = std::fs::File::create(&out_path).map_err(StorageError::Extract)?;
        std::io::copy(&mut entry, &mut out_file).map_err(StorageError::Extract)?;
    }

    Ok(target)
}

/// Reads `game_config.json` from an extracted package, if present.
pub fn read_game_config(extracted_path: &Path) -> Option<GameConfig> {
    let text = std::fs::read_to_string(extracted_path.join("game_config.json")).ok()?;
    serde_json::from_str(&text).ok()
}

/// Resolves the room-server entry point for a game package: the executable
/// named by `game_config.json`'s `entry_room_server`, if present and it
/// exists on disk under `extracted_path`.
pub fn resolve_room_server_entry(extracted_path: &Path) -> Option<PathBuf> {
    let config = read_game_config(extracted_path)?;
    let name = config.entry_room_server?;
    let candidate = extracted_path.join(&name);
    candidate.exists().then_some(candidate)
}

/// Removes the entire `<storage>/<game_name>/` tree.
pub fn remove_game_dir(game_dir: &Path) -> std::io::Result<()> {
    if game_dir.exists() {
        std::fs::remove_dir_all(game_dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
            for (name, contents) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn extracts_files_and_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        let game_dir = dir.path().join("mygame");
        let zip_bytes = make_zip(&[
            ("game_config.json", br#"{"description":"a game","entry_room_server":"server_bin"}"#),
            ("server_bin", b"#!/bin/sh\necho hi"),
        ]);

        let extracted = extract_archive(&game_dir, &zip_bytes).unwrap();
        assert!(extracted.join("game_config.json").exists());
        assert!(extracted.join("server_bin").exists());

        let config = read_game_config(&extracted).unwrap();
        assert_eq!(config.description.as_deref(), Some("a game"));

        let entry = resolve_room_server_entry(&extracted).unwrap();
        assert_eq!(entry, extracted.join("server_bin"));
    }

    #[test]
    fn re_extraction_clears_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let game_dir = dir.path().join("mygame");

        extract_archive(&game_dir, &make_zip(&[("old.txt", b"x")])).unwrap();
        let extracted = extract_archive(&game_dir, &make_zip(&[("new.txt", b"y")])).unwrap();

        assert!(!extracted.join("old.txt").exists());
        assert!(extracted.join("new.txt").exists());
    }

    #[test]
    fn invalid_archive_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let game_dir = dir.path().join("mygame");
        let err = extract_archive(&game_dir, b"not a zip").unwrap_err();
        assert!(matches!(err, StorageError::InvalidArchive(_)));
    }
}
