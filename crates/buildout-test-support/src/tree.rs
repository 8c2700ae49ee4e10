//! Directory snapshots used to compare copied output against its source.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use walkdir::WalkDir;

/// Relative file paths (with `/` separators) mapped to file contents.
pub type TreeSnapshot = BTreeMap<String, Vec<u8>>;

/// Capture every regular file below `root`.
///
/// # Errors
///
/// Returns an error when the tree cannot be walked or a file cannot be read.
pub fn snapshot(root: &Path) -> Result<TreeSnapshot> {
    let mut files = TreeSnapshot::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .with_context(|| format!("{} outside {}", entry.path().display(), root.display()))?;
        let key = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let contents = fs::read(entry.path())
            .with_context(|| format!("failed to read {}", entry.path().display()))?;
        files.insert(key, contents);
    }
    Ok(files)
}

/// Relative file paths below `root`, sorted.
///
/// # Errors
///
/// Returns an error when the tree cannot be walked.
pub fn file_names(root: &Path) -> Result<Vec<String>> {
    Ok(snapshot(root)?.into_keys().collect())
}

/// Fail unless `left` and `right` hold the same files with the same bytes.
///
/// # Errors
///
/// Returns an error naming the first differing path.
pub fn assert_same_tree(left: &Path, right: &Path) -> Result<()> {
    let left_files = snapshot(left)?;
    let right_files = snapshot(right)?;
    for (path, contents) in &left_files {
        match right_files.get(path) {
            None => bail!("{path} missing from {}", right.display()),
            Some(other) if other != contents => bail!("{path} differs"),
            Some(_) => {}
        }
    }
    if let Some(extra) = right_files.keys().find(|path| !left_files.contains_key(*path)) {
        bail!("{extra} only present in {}", right.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::write_file;

    #[test]
    fn identical_trees_compare_equal() -> Result<()> {
        let base = std::env::temp_dir().join(format!("buildout-tree-{}", std::process::id()));
        let left = base.join("left");
        let right = base.join("right");
        for root in [&left, &right] {
            write_file(root, "a.txt", b"a")?;
            write_file(root, "nested/b.txt", b"b")?;
        }
        assert_same_tree(&left, &right)?;
        assert_eq!(file_names(&left)?, vec!["a.txt", "nested/b.txt"]);

        write_file(&right, "nested/b.txt", b"changed")?;
        assert!(assert_same_tree(&left, &right).is_err());
        fs::remove_dir_all(&base)?;
        Ok(())
    }
}
