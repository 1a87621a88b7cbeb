//! Filesystem commands - stamp, delete-file, recursive-mirror

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Create or truncate a stamp file
pub fn stamp(path: &Path) -> Result<i32> {
    File::create(path).with_context(|| format!("Failed to stamp {}", path.display()))?;
    Ok(0)
}

/// Delete a file; a missing file is success
pub fn delete_file(path: &Path) -> Result<i32> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to delete {}", path.display()))?;
    }
    Ok(0)
}

/// Replace `dest` with a copy of `source` (`rm -rf dest && cp -a source dest`)
pub fn recursive_mirror(source: &Path, dest: &Path) -> Result<i32> {
    if dest.is_dir() {
        remove_tree_forced(dest)
            .with_context(|| format!("Failed to remove {}", dest.display()))?;
    } else if dest.exists() {
        remove_file_forced(dest)
            .with_context(|| format!("Failed to remove {}", dest.display()))?;
    }

    if source.is_dir() {
        copy_tree(source, dest)?;
    } else {
        fs::copy(source, dest).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                source.display(),
                dest.display()
            )
        })?;
    }
    Ok(0)
}

/// Remove a file, clearing the read-only bit if removal is refused
fn remove_file_forced(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(_) => {
            clear_readonly(path)?;
            fs::remove_file(path)
        }
    }
}

/// Remove a tree, clearing read-only bits if removal is refused
fn remove_tree_forced(dir: &Path) -> io::Result<()> {
    if fs::remove_dir_all(dir).is_ok() {
        return Ok(());
    }
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        clear_readonly(entry.path())?;
    }
    fs::remove_dir_all(dir)
}

#[allow(clippy::permissions_set_readonly_false)]
fn clear_readonly(path: &Path) -> io::Result<()> {
    let mut perm = fs::metadata(path)?.permissions();
    perm.set_readonly(false);
    fs::set_permissions(path, perm)
}

fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("Failed to relativize {}", entry.path().display()))?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stamp_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.stamp");
        assert_eq!(stamp(&path).unwrap(), 0);
        assert_eq!(fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn test_stamp_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build.stamp");
        fs::write(&path, "stale contents").unwrap();
        stamp(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn test_delete_file_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obj.pdb");
        fs::write(&path, "x").unwrap();
        assert_eq!(delete_file(&path).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_delete_file_missing_is_success() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(delete_file(&dir.path().join("never-existed")).unwrap(), 0);
    }

    #[test]
    fn test_mirror_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.txt");
        let dest = dir.path().join("b.txt");
        fs::write(&source, "payload").unwrap();
        fs::write(&dest, "stale").unwrap();

        assert_eq!(recursive_mirror(&source, &dest).unwrap(), 0);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "payload");
    }

    #[test]
    fn test_mirror_tree_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("src");
        let dest = dir.path().join("dst");
        fs::create_dir_all(source.join("nested")).unwrap();
        fs::write(source.join("top.txt"), "top").unwrap();
        fs::write(source.join("nested/deep.txt"), "deep").unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("leftover.txt"), "stale").unwrap();

        assert_eq!(recursive_mirror(&source, &dest).unwrap(), 0);
        assert_eq!(fs::read_to_string(dest.join("top.txt")).unwrap(), "top");
        assert_eq!(
            fs::read_to_string(dest.join("nested/deep.txt")).unwrap(),
            "deep"
        );
        assert!(!dest.join("leftover.txt").exists());
    }

    #[test]
    fn test_mirror_replaces_readonly_destination() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.txt");
        let dest = dir.path().join("b.txt");
        fs::write(&source, "fresh").unwrap();
        fs::write(&dest, "stale").unwrap();
        let mut perm = fs::metadata(&dest).unwrap().permissions();
        perm.set_readonly(true);
        fs::set_permissions(&dest, perm).unwrap();

        assert_eq!(recursive_mirror(&source, &dest).unwrap(), 0);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "fresh");
    }

    #[test]
    fn test_mirror_file_over_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.txt");
        let dest = dir.path().join("dst");
        fs::write(&source, "file now").unwrap();
        fs::create_dir_all(dest.join("sub")).unwrap();

        assert_eq!(recursive_mirror(&source, &dest).unwrap(), 0);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "file now");
    }
}
