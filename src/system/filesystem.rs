// src/system/filesystem.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use walkdir::WalkDir;

/// The narrow filesystem surface the bootstrapper reads user files through.
pub trait Filesystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Lists the files directly inside `dir`, sorted by file name. Directories are not returned.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Writes a file, creating missing parent directories.
    fn put(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Resolves symlinks and relative components. Filesystems without links return the path as is.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        String::from_utf8(self.read(path)?).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))
    }
}

/// The real, disk-backed filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            // Follows symlinks. Where a link points is checked by the evaluator.
            if entry.path().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        dunce::canonicalize(path)
    }

    fn put(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)
    }
}

#[derive(Debug, Default)]
struct MemoryTree {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryTree {
    fn add_ancestors(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

/// An in-memory filesystem. Used by the test suites and by embedders that
/// assemble a userland tree programmatically.
#[derive(Debug, Default)]
pub struct MemoryFilesystem {
    tree: Mutex<MemoryTree>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> MutexGuard<'_, MemoryTree> {
        self.tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Filesystem for MemoryFilesystem {
    fn exists(&self, path: &Path) -> bool {
        let tree = self.tree();
        tree.files.contains_key(path) || tree.dirs.contains(path)
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let tree = self.tree();
        if !tree.dirs.contains(dir) {
            return Err(io::Error::new(
                ErrorKind::NotFound,
                format!("directory '{}' not found", dir.display()),
            ));
        }
        Ok(tree
            .files
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.tree().files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                ErrorKind::NotFound,
                format!("file '{}' not found", path.display()),
            )
        })
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        let mut tree = self.tree();
        tree.add_ancestors(path);
        tree.dirs.insert(path.to_path_buf());
        Ok(())
    }

    fn put(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut tree = self.tree();
        if tree.dirs.contains(path) {
            return Err(io::Error::new(
                ErrorKind::AlreadyExists,
                format!("'{}' is a directory", path.display()),
            ));
        }
        tree.add_ancestors(path);
        tree.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_lists_only_direct_files_in_name_order() {
        let dir = TempDir::new().unwrap();
        let fs = LocalFilesystem;
        fs.put(&dir.path().join("b.toml"), b"b").unwrap();
        fs.put(&dir.path().join("a.toml"), b"a").unwrap();
        fs.put(&dir.path().join("nested").join("c.toml"), b"c").unwrap();

        let files = fs.list_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.toml", "b.toml"]);
        assert_eq!(fs.read_to_string(&files[0]).unwrap(), "a");
    }

    #[test]
    fn test_memory_put_creates_parent_directories() {
        let fs = MemoryFilesystem::new();
        fs.put(Path::new("/src/.rocketeer/events/deploy.toml"), b"")
            .unwrap();

        assert!(fs.exists(Path::new("/src/.rocketeer/events")));
        assert!(fs.exists(Path::new("/src/.rocketeer")));
        assert!(!fs.exists(Path::new("/src/.rocketeer/tasks.toml")));
    }

    #[test]
    fn test_memory_lists_direct_children_sorted() {
        let fs = MemoryFilesystem::new();
        fs.put(Path::new("/dir/z.toml"), b"").unwrap();
        fs.put(Path::new("/dir/a.toml"), b"").unwrap();
        fs.put(Path::new("/dir/sub/m.toml"), b"").unwrap();

        let files = fs.list_files(Path::new("/dir")).unwrap();
        assert_eq!(
            files,
            vec![PathBuf::from("/dir/a.toml"), PathBuf::from("/dir/z.toml")]
        );
        assert!(fs.list_files(Path::new("/missing")).is_err());
    }

    #[test]
    fn test_memory_read_missing_file_is_not_found() {
        let fs = MemoryFilesystem::new();
        let err = fs.read(Path::new("/nope.toml")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
