/*!
 * Local Filesystem Backend
 * Wraps std::fs for the directory tree under a scope root
 */

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};

use super::traits::{Backend, OpenFile, WritableFile};
use super::types::*;

/// Host directory tree rooted at `root`
///
/// Performs no containment checks of its own beyond clamping `..` at the
/// root; callers validate names first. Names are normalized lexically the
/// same way the validator does, so the entry touched here is the entry
/// that was validated.
#[derive(Debug, Clone)]
pub struct LocalFS {
    root: PathBuf,
    readonly: bool,
}

impl LocalFS {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            readonly: false,
        }
    }

    pub fn readonly<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            readonly: true,
        }
    }

    /// Resolve a relative name against the root by component processing
    fn resolve(&self, name: &Path) -> PathBuf {
        let mut components = Vec::with_capacity(8);

        for component in name.components() {
            match component {
                Component::Normal(part) => components.push(part),
                Component::ParentDir => {
                    // `..` at the root boundary is dropped
                    components.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        let mut result = self.root.clone();
        for component in components {
            result.push(component);
        }
        result
    }

    fn check_write(&self) -> VfsResult<()> {
        if self.readonly {
            return Err(VfsError::ReadOnly);
        }
        Ok(())
    }
}

/// Final component of a relative name, `.` for the root itself
pub(crate) fn display_name(name: &Path) -> String {
    name.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .last()
        .unwrap_or_else(|| ".".to_string())
}

impl Backend for LocalFS {
    fn open(&self, name: &Path) -> VfsResult<Box<dyn OpenFile>> {
        let full_path = self.resolve(name);
        let file = fs::File::open(&full_path)
            .map_err(|e| VfsError::from_io(e, format!("open {}", name.display())))?;
        Ok(Box::new(LocalFile {
            file,
            name: display_name(name),
        }))
    }

    fn read_file(&self, name: &Path) -> VfsResult<Vec<u8>> {
        fs::read(self.resolve(name))
            .map_err(|e| VfsError::from_io(e, format!("read {}", name.display())))
    }

    fn read_dir(&self, name: &Path) -> VfsResult<Vec<Entry>> {
        let full_path = self.resolve(name);
        let entries = fs::read_dir(&full_path)
            .map_err(|e| VfsError::from_io(e, format!("read_dir {}", name.display())))?;

        let mut result = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                VfsError::from_io(e, format!("read dir entry in {}", name.display()))
            })?;
            // Non-UTF-8 names are listed lossily rather than failing the listing
            let entry_name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry
                .file_type()
                .map_err(|e| VfsError::from_io(e, format!("file type of {}", entry_name)))?;

            result.push(Entry::new_unchecked(entry_name, file_type.into()));
        }

        result.sort();
        Ok(result)
    }

    fn stat(&self, name: &Path) -> VfsResult<Metadata> {
        let md = fs::metadata(self.resolve(name))
            .map_err(|e| VfsError::from_io(e, format!("stat {}", name.display())))?;
        Ok(Metadata::from_std(display_name(name), &md))
    }

    fn create(&self, name: &Path) -> VfsResult<Box<dyn WritableFile>> {
        self.check_write()?;
        let file = fs::File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.resolve(name))
            .map_err(|e| VfsError::from_io(e, format!("create {}", name.display())))?;
        Ok(Box::new(LocalFile {
            file,
            name: display_name(name),
        }))
    }
}

/// Local file handle
struct LocalFile {
    file: fs::File,
    name: String,
}

impl Read for LocalFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for LocalFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

impl Seek for LocalFile {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.file.seek(pos)
    }
}

impl OpenFile for LocalFile {
    fn metadata(&self) -> VfsResult<Metadata> {
        let md = self
            .file
            .metadata()
            .map_err(|e| VfsError::from_io(e, format!("metadata {}", self.name)))?;
        Ok(Metadata::from_std(self.name.clone(), &md))
    }
}

impl WritableFile for LocalFile {
    fn sync(&mut self) -> VfsResult<()> {
        self.file
            .flush()
            .and_then(|_| self.file.sync_all())
            .map_err(|e| VfsError::from_io(e, format!("sync {}", self.name)))
    }
}
