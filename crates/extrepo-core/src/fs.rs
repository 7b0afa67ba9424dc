//! Filesystem helpers shared by every phase.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

/// Remove a directory and everything below it.
///
/// Does nothing when the path does not exist.
pub fn delete_tree(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}

/// Recursively copy the contents of `src` into `dst`.
///
/// Missing intermediate directories are created. A missing `src` is not an
/// error since modules without assets are legal.
pub fn copy_tree(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> Result<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if !src.is_dir() {
        return Ok(());
    }

    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }

    // An empty source directory still yields a destination.
    fs::create_dir_all(dst)?;

    Ok(())
}

/// A directory entry considered by the scanning phases.
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// File name of the entry.
    pub name: String,

    /// Full path of the entry.
    pub path: PathBuf,

    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// List the entries of a directory, sorted by name.
///
/// A missing directory yields an empty list.
pub fn list_entries(dir: impl AsRef<Path>) -> Result<Vec<DirEntry>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: path.is_dir(),
            path,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_delete_tree_missing_path() {
        let temp = TempDir::new().unwrap();
        delete_tree(temp.path().join("never-existed")).expect("should be a no-op");
    }

    #[test]
    fn test_delete_tree_removes_contents() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("out");
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/file.txt"), "x").unwrap();

        delete_tree(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_copy_tree_nested() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("nested/deeper")).unwrap();
        fs::write(src.join("icon.png"), "png").unwrap();
        fs::write(src.join("nested/deeper/data.json"), "{}").unwrap();

        let dst = temp.path().join("dst/includes");
        copy_tree(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("icon.png")).unwrap(), "png");
        assert_eq!(
            fs::read_to_string(dst.join("nested/deeper/data.json")).unwrap(),
            "{}"
        );
    }

    #[test]
    fn test_copy_tree_missing_source() {
        let temp = TempDir::new().unwrap();
        let dst = temp.path().join("dst");

        copy_tree(temp.path().join("missing"), &dst).unwrap();
        assert!(!dst.exists());
    }

    #[test]
    fn test_list_entries_sorted() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("Beta")).unwrap();
        fs::create_dir(temp.path().join("Alpha")).unwrap();
        fs::write(temp.path().join("notes.txt"), "").unwrap();

        let entries = list_entries(temp.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Beta", "notes.txt"]);
        assert!(entries[0].is_dir);
        assert!(!entries[2].is_dir);
    }

    #[test]
    fn test_list_entries_missing_dir() {
        let temp = TempDir::new().unwrap();
        assert!(list_entries(temp.path().join("nope")).unwrap().is_empty());
    }
}
