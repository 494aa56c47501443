//! Persistent store capability and a directory-backed implementation.
//!
//! The store is a flat namespace of named entries with byte-level quota
//! accounting, the shape of a small flash filesystem partition. Stages read
//! and write entries through ordinary paths obtained from [`Store::path`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Capacity snapshot of a store, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub total: u64,
    pub used: u64,
}

impl Quota {
    pub fn new(total: u64, used: u64) -> Self {
        Self { total, used }
    }

    pub fn free(&self) -> u64 {
        self.total.saturating_sub(self.used)
    }

    /// Fraction of the capacity that is free; 0 for an empty store.
    pub fn free_ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.free() as f64 / self.total as f64
    }

    /// True when the free fraction is strictly below `min_ratio`.
    pub fn is_low(&self, min_ratio: f64) -> bool {
        (self.free() as f64) < self.total as f64 * min_ratio
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// One directory entry at the top level of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

impl Entry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Dir,
        }
    }
}

/// Persistent store used by the storage guard and the result writer.
pub trait Store {
    /// Make the store available. Mounting a mounted store is a no-op.
    fn mount(&mut self) -> io::Result<()>;

    /// Erase every entry. The store must be mounted again afterwards.
    fn format(&mut self) -> io::Result<()>;

    /// Current capacity snapshot.
    fn quota(&self) -> io::Result<Quota>;

    /// Top-level entries.
    fn entries(&self) -> io::Result<Vec<Entry>>;

    /// Delete one regular file.
    fn remove(&mut self, name: &str) -> io::Result<()>;

    /// Filesystem path of entry `name`.
    fn path(&self, name: &str) -> PathBuf;
}

/// A store backed by a host directory with a fixed byte capacity.
///
/// `used` is the total size of all regular files below the root, so quota
/// reflects what the stages actually wrote.
///
/// # Example
/// ```no_run
/// use sonagram::store::{DirStore, Store};
///
/// let mut store = DirStore::new("/tmp/spiffs", 1 << 20);
/// store.mount().unwrap();
/// let quota = store.quota().unwrap();
/// println!("free: {} of {} bytes", quota.free(), quota.total);
/// ```
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
    capacity: u64,
    mounted: bool,
}

impl DirStore {
    pub fn new<P: Into<PathBuf>>(root: P, capacity: u64) -> Self {
        Self {
            root: root.into(),
            capacity,
            mounted: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn ensure_mounted(&self) -> io::Result<()> {
        if self.mounted {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("store at {} is not mounted", self.root.display()),
            ))
        }
    }
}

fn tree_size(dir: &Path) -> io::Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            total += tree_size(&entry.path())?;
        } else if file_type.is_file() {
            total += entry.metadata()?.len();
        }
    }
    Ok(total)
}

impl Store for DirStore {
    fn mount(&mut self) -> io::Result<()> {
        if self.mounted {
            return Ok(());
        }
        fs::create_dir_all(&self.root)?;
        if !self.root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", self.root.display()),
            ));
        }
        self.mounted = true;
        Ok(())
    }

    fn format(&mut self) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        self.mounted = false;
        Ok(())
    }

    fn quota(&self) -> io::Result<Quota> {
        self.ensure_mounted()?;
        Ok(Quota::new(self.capacity, tree_size(&self.root)?))
    }

    fn entries(&self) -> io::Result<Vec<Entry>> {
        self.ensure_mounted()?;
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let kind = if file_type.is_file() {
                EntryKind::File
            } else if file_type.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::Other
            };
            entries.push(Entry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn remove(&mut self, name: &str) -> io::Result<()> {
        self.ensure_mounted()?;
        fs::remove_file(self.path(name))
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_math() {
        let q = Quota::new(1000, 850);
        assert_eq!(q.free(), 150);
        assert!((q.free_ratio() - 0.15).abs() < 1e-12);
        assert!(q.is_low(0.2));
        assert!(!Quota::new(1000, 800).is_low(0.2));
        assert_eq!(Quota::new(100, 150).free(), 0);
        assert_eq!(Quota::new(0, 0).free_ratio(), 0.0);
    }

    #[test]
    fn test_dir_store_accounting() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirStore::new(dir.path().join("spiffs"), 4096);
        assert!(store.quota().is_err());

        store.mount().unwrap();
        assert_eq!(store.quota().unwrap(), Quota::new(4096, 0));

        fs::write(store.path("a.bin"), [0u8; 100]).unwrap();
        fs::create_dir(store.path("sub")).unwrap();
        fs::write(store.path("sub").join("b.bin"), [0u8; 28]).unwrap();
        assert_eq!(store.quota().unwrap().used, 128);

        let entries = store.entries().unwrap();
        assert_eq!(entries, vec![Entry::file("a.bin"), Entry::dir("sub")]);

        store.remove("a.bin").unwrap();
        assert_eq!(store.quota().unwrap().used, 28);
        assert!(store.remove("a.bin").is_err());
    }

    #[test]
    fn test_format_erases_and_unmounts() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DirStore::new(dir.path(), 4096);
        store.mount().unwrap();
        fs::write(store.path("a.bin"), b"data").unwrap();
        fs::create_dir(store.path("sub")).unwrap();

        store.format().unwrap();
        assert!(!store.is_mounted());
        store.mount().unwrap();
        assert!(store.entries().unwrap().is_empty());
        assert_eq!(store.quota().unwrap().used, 0);
    }

    #[test]
    fn test_mount_rejects_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not_a_dir");
        fs::write(&file, b"x").unwrap();
        assert!(DirStore::new(&file, 10).mount().is_err());
    }
}
