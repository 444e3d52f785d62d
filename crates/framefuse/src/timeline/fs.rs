//! Filesystem capability used for file discovery.

use std::path::Path;

/// One listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub path: String,
    pub is_dir: bool,
}

impl FsEntry {
    pub fn canonical_path(&self) -> &str {
        &self.path
    }
}

/// Abstract directory listing; lets the engine browse remote or archived
/// file trees the same way as the local disk.
pub trait FileSystem: Send + Sync {
    fn list(&self, path: &str, recursive: bool) -> Vec<FsEntry>;
}

/// The local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct PhysicalFileSystem;

impl PhysicalFileSystem {
    fn walk(dir: &Path, recursive: bool, out: &mut Vec<FsEntry>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let is_dir = path.is_dir();
            let canonical = path
                .canonicalize()
                .unwrap_or_else(|_| path.clone())
                .to_string_lossy()
                .replace('\\', "/");
            out.push(FsEntry {
                path: canonical,
                is_dir,
            });
            if is_dir && recursive {
                Self::walk(&path, recursive, out);
            }
        }
    }
}

impl FileSystem for PhysicalFileSystem {
    fn list(&self, path: &str, recursive: bool) -> Vec<FsEntry> {
        let mut out = Vec::new();
        Self::walk(Path::new(path), recursive, &mut out);
        out
    }
}
