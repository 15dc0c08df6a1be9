// src/utils/fs.rs
//! Filesystem helpers shared by the key and certificate stores.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Writes `data` to `path` through a uniquely named temp file in the same
/// directory, then renames it into place. Readers observe either the old
/// content or the new content, never a torn write.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let temp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4()));
    {
        let mut temp_file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)?;
        temp_file.write_all(data)?;
        temp_file.sync_all()?;
    }
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        e
    })
}
