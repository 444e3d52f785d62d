//! Input file discovery and ordering.

use std::collections::BTreeMap;
use std::path::Path;

use super::fs::FileSystem;

/// How [`list_files`] orders its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Alphabetical.
    Alphabetical,
    /// Alphabetical, reversed.
    Reversed,
    /// By the number trailing the basename, after the last `.`, `;`, `-` or
    /// `_` separator. Only works when every found file ends with a number;
    /// otherwise the alphabetical list is returned unchanged.
    TrailingNumber,
}

/// List files under `dirname` through the filesystem capability, filtered by
/// suffix (case-insensitive) and sorted per `sort`.
pub fn list_files(
    fs: &dyn FileSystem,
    dirname: &str,
    suffixes: &[&str],
    sort: SortMode,
    recursive: bool,
) -> Vec<String> {
    let mut dirname = dirname.replace('\\', "/");
    if dirname.ends_with('/') {
        dirname.pop();
    }

    let mut files: Vec<String> = fs
        .list(&dirname, recursive)
        .into_iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.canonical_path().to_string())
        .collect();

    if !suffixes.is_empty() {
        files.retain(|f| match Path::new(f).extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy();
                suffixes.iter().any(|s| s.eq_ignore_ascii_case(&ext))
            }
            None => false,
        });
    }

    files.sort();
    match sort {
        SortMode::Alphabetical => files,
        SortMode::Reversed => {
            files.reverse();
            files
        }
        SortMode::TrailingNumber => {
            let mut numbered: BTreeMap<i64, String> = BTreeMap::new();
            for f in &files {
                let start = f.rfind('/').map(|i| i + 1).unwrap_or(0);
                let basename = match f.rfind('.') {
                    Some(p) if p >= start => &f[start..p],
                    _ => &f[start..],
                };
                let normalized = basename.replace([';', '.', '-'], "_");
                let Some(last) = normalized.split('_').filter(|s| !s.is_empty()).last() else {
                    continue;
                };
                match last.parse::<i64>() {
                    Ok(value) => {
                        numbered.insert(value, f.clone());
                    }
                    // Fail closed: one unnumbered file degrades the whole
                    // listing to alphabetical order.
                    Err(_) => return files,
                }
            }
            numbered.into_values().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::PhysicalFileSystem;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    fn names(files: &[String]) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                Path::new(f)
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn trailing_number_sort_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "shot_2.dat");
        touch(dir.path(), "shot_10.dat");
        touch(dir.path(), "frame-1.dat");
        touch(dir.path(), "notes.txt");

        let files = list_files(
            &PhysicalFileSystem,
            dir.path().to_str().unwrap(),
            &["dat"],
            SortMode::TrailingNumber,
            false,
        );
        assert_eq!(names(&files), vec!["frame-1.dat", "shot_2.dat", "shot_10.dat"]);
    }

    #[test]
    fn alphabetical_and_reversed() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "shot_2.dat");
        touch(dir.path(), "shot_10.dat");

        let sorted = list_files(
            &PhysicalFileSystem,
            dir.path().to_str().unwrap(),
            &["dat"],
            SortMode::Alphabetical,
            false,
        );
        // Alphabetically "shot_10" sorts before "shot_2".
        assert_eq!(names(&sorted), vec!["shot_10.dat", "shot_2.dat"]);

        let reversed = list_files(
            &PhysicalFileSystem,
            dir.path().to_str().unwrap(),
            &["dat"],
            SortMode::Reversed,
            false,
        );
        assert_eq!(names(&reversed), vec!["shot_2.dat", "shot_10.dat"]);
    }

    #[test]
    fn trailing_number_fails_closed() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "shot_2.dat");
        touch(dir.path(), "calibration.dat");

        let files = list_files(
            &PhysicalFileSystem,
            dir.path().to_str().unwrap(),
            &["dat"],
            SortMode::TrailingNumber,
            false,
        );
        // One unnumbered file: alphabetical order is returned instead.
        assert_eq!(names(&files), vec!["calibration.dat", "shot_2.dat"]);
    }

    #[test]
    fn suffix_filter_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "upper.DAT");
        touch(dir.path(), "plain.dat");
        touch(dir.path(), "other.txt");

        let files = list_files(
            &PhysicalFileSystem,
            dir.path().to_str().unwrap(),
            &["dat"],
            SortMode::Alphabetical,
            false,
        );
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn recursive_listing_descends_into_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        touch(dir.path(), "top.dat");
        touch(&dir.path().join("sub"), "nested.dat");

        let flat = list_files(
            &PhysicalFileSystem,
            dir.path().to_str().unwrap(),
            &["dat"],
            SortMode::Alphabetical,
            false,
        );
        assert_eq!(names(&flat), vec!["top.dat"]);

        let deep = list_files(
            &PhysicalFileSystem,
            dir.path().to_str().unwrap(),
            &["dat"],
            SortMode::Alphabetical,
            true,
        );
        assert_eq!(deep.len(), 2);
    }
}
