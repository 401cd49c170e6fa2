use std::fs::OpenOptions;
use std::ops::Range;
use std::path::Path;

use bytes::Bytes;
use memmap2::{Mmap, MmapOptions};

use crate::error::UploadError;

enum Backing {
    Mapped(Mmap),
    Memory(Bytes),
}

/// Read-only view of the file being uploaded.
///
/// On-disk files are memory mapped so a chunk payload is sliced straight
/// from the page cache on every attempt and nothing is held between
/// attempts. Empty files cannot be mapped and use an empty buffer instead.
pub struct SourceFile {
    name: String,
    size: u64,
    backing: Backing,
}

impl SourceFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, UploadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(UploadError::FileNotFound(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                UploadError::InvalidInput(format!("{} has no file name", path.display()))
            })?;

        let file = OpenOptions::new().read(true).open(path)?;
        let size = file.metadata()?.len();

        let backing = if size == 0 {
            Backing::Memory(Bytes::new())
        } else {
            // The mapping is read-only; the file must not be truncated while an upload runs.
            let mmap = unsafe { MmapOptions::new().map(&file)? };
            Backing::Mapped(mmap)
        };

        Ok(Self { name, size, backing })
    }

    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            backing: Backing::Memory(data),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn read_range(&self, range: Range<u64>) -> Result<Bytes, UploadError> {
        if range.start > range.end || range.end > self.size {
            return Err(UploadError::InvalidInput(format!(
                "range {}..{} outside file of {} bytes",
                range.start, range.end, self.size
            )));
        }

        let (start, end) = (range.start as usize, range.end as usize);
        match &self.backing {
            Backing::Mapped(mmap) => Ok(Bytes::copy_from_slice(&mmap[start..end])),
            Backing::Memory(data) => Ok(data.slice(start..end)),
        }
    }
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish()
    }
}
