use std::{
    collections::{BTreeMap, BTreeSet},
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use crate::BatchError;

/// Minimal filesystem used for staging artifacts.
///
/// Implementations must be usable from several workers at once.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem: Send + Sync {
    /// Creates `path` and its parents. An existing directory is not an error.
    fn create_dir_all(&self, path: &Path) -> Result<(), BatchError>;

    /// Lists the files directly inside `dir`, sorted by path.
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, BatchError>;

    fn read(&self, path: &Path) -> Result<Vec<u8>, BatchError>;

    /// Writes `contents` to a new file at `path`, replacing any existing one.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), BatchError>;

    /// Removes `path` and everything below it. A missing path is not an error.
    fn remove_dir_all(&self, path: &Path) -> Result<(), BatchError>;

    fn exists(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn create_dir_all(&self, path: &Path) -> Result<(), BatchError> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, BatchError> {
        Ok(fs::read(path)?)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), BatchError> {
        let mut file = File::create(path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), BatchError> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BatchError::Io(e)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[derive(Debug, Default)]
struct MemoryTree {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

/// [`FileSystem`] held in memory.
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    tree: Mutex<MemoryTree>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> Result<MutexGuard<'_, MemoryTree>, BatchError> {
        self.tree
            .lock()
            .map_err(|e| BatchError::Io(io::Error::other(format!("lock poisoned: {}", e))))
    }
}

impl FileSystem for InMemoryFileSystem {
    fn create_dir_all(&self, path: &Path) -> Result<(), BatchError> {
        let mut tree = self.tree()?;
        if tree.files.contains_key(path) {
            return Err(BatchError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is a file", path.display()),
            )));
        }
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                tree.dirs.insert(ancestor.to_path_buf());
            }
        }
        Ok(())
    }

    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
        let tree = self.tree()?;
        if !tree.dirs.contains(dir) {
            return Err(BatchError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", dir.display()),
            )));
        }
        Ok(tree
            .files
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, BatchError> {
        self.tree()?.files.get(path).cloned().ok_or_else(|| {
            BatchError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            ))
        })
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<(), BatchError> {
        let mut tree = self.tree()?;
        let parent_exists = path.parent().is_none_or(|p| tree.dirs.contains(p));
        if !parent_exists {
            return Err(BatchError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("parent of {} does not exist", path.display()),
            )));
        }
        tree.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), BatchError> {
        let mut tree = self.tree()?;
        tree.dirs.retain(|dir| !dir.starts_with(path));
        tree.files.retain(|file, _| !file.starts_with(path));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.tree()
            .map(|tree| tree.dirs.contains(path) || tree.files.contains_key(path))
            .unwrap_or(false)
    }
}
