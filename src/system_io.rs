// This file is part of hwoverlay, an application to resolve FPGA fabric designs into device-tree overlays.
//
// Copyright 2025 Canonical Ltd.
//
// SPDX-License-Identifier: GPL-3.0-only
//
// hwoverlay is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License version 3, as published by the Free Software Foundation.
//
// hwoverlay is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranties of MERCHANTABILITY, SATISFACTORY QUALITY, or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with this program.  If not, see http://www.gnu.org/licenses/.

//! Error Wrapping File System I/O Helpers
//!
//! Thin wrappers around the standard library file operations used by the pipeline. Every
//! helper logs at `trace` level and converts `std::io::Error` into the matching
//! [`HwOverlayError`] IO variant, carrying the offending path.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use hwoverlay::system_io::{fs_read, fs_write};
//! # use std::path::Path;
//! # fn example() -> Result<(), hwoverlay::error::HwOverlayError> {
//! let interrupts = fs_read(Path::new("/proc/interrupts"))?;
//! fs_write(Path::new("/tmp/overlay.dts"), true, "/dts-v1/;")?;
//! # Ok(())
//! # }
//! ```

use crate::error::HwOverlayError;
use log::trace;
use std::fs::{File, OpenOptions, create_dir_all, remove_dir};
use std::io::{Read, Write};
use std::path::Path;

/// Read the contents of a file to a String.
///
/// # Returns: `Result<String, HwOverlayError>`
/// * `Ok(String)` - The complete contents of the file
/// * `Err(HwOverlayError::IORead)` - If the file cannot be read (doesn't exist, permissions, etc.)
pub fn fs_read(file_path: &Path) -> Result<String, HwOverlayError> {
    trace!("Attempting to read from {file_path:?}");
    let mut buf: String = String::new();
    let result = OpenOptions::new()
        .read(true)
        .open(file_path)
        .and_then(|mut f| f.read_to_string(&mut buf));

    match result {
        Ok(_) => {
            trace!("Reading done");
            Ok(buf)
        }
        Err(e) => Err(HwOverlayError::IORead {
            file: file_path.into(),
            e,
        }),
    }
}

/// Open a file for reading, for consumers that need a `Read + Seek` handle such as archive
/// readers.
pub fn fs_open(file_path: &Path) -> Result<File, HwOverlayError> {
    trace!("Opening {file_path:?}");
    File::open(file_path).map_err(|e| HwOverlayError::IORead {
        file: file_path.into(),
        e,
    })
}

/// Write a string value to a file, truncating anything already there.
///
/// # Arguments
///
/// * `file_path` - Path to the file to write
/// * `create` - If `true`, create the file if it doesn't exist; if `false`, file must already exist
/// * `value` - The string value to write
///
/// # Returns: `Result<(), HwOverlayError>`
/// * `Ok(())` - Write succeeded
/// * `Err(HwOverlayError::IOWrite)` - If the write fails
pub fn fs_write(
    file_path: &Path,
    create: bool,
    value: impl AsRef<str>,
) -> Result<(), HwOverlayError> {
    trace!(
        "Attempting to write {} bytes to {:?}",
        value.as_ref().len(),
        file_path
    );
    let result = OpenOptions::new()
        .create(create)
        .write(true)
        .truncate(true)
        .open(file_path)
        .and_then(|mut f| write!(f, "{}", value.as_ref()));
    match result {
        Ok(_) => {
            trace!("Write done.");
            Ok(())
        }
        Err(e) => Err(HwOverlayError::IOWrite {
            file: file_path.into(),
            e,
        }),
    }
}

/// Write binary data to a file.
///
/// Configfs attributes such as an overlay's `dtbo` must receive the whole blob in one
/// `write_all`, so the data is never chunked here.
pub fn fs_write_bytes(file_path: &Path, create: bool, data: &[u8]) -> Result<(), HwOverlayError> {
    trace!("Attempting to write {} bytes to {file_path:?}", data.len());
    let result = OpenOptions::new()
        .create(create)
        .write(true)
        .truncate(true)
        .open(file_path)
        .and_then(|mut f| f.write_all(data));

    match result {
        Ok(_) => {
            trace!("Write done.");
            Ok(())
        }
        Err(e) => Err(HwOverlayError::IOWrite {
            file: file_path.into(),
            e,
        }),
    }
}

/// Read a file into a byte vector.
pub fn fs_read_bytes(file_path: &Path) -> Result<Vec<u8>, HwOverlayError> {
    trace!("Attempting to read bytes from {file_path:?}");
    std::fs::read(file_path).map_err(|e| HwOverlayError::IORead {
        file: file_path.into(),
        e,
    })
}

/// Recursively create directories up to the specified path.
///
/// # Returns: `Result<(), HwOverlayError>`
/// * `Ok(())` - Directory created (or already existed)
/// * `Err(HwOverlayError::IOCreate)` - If directory creation fails (permissions, etc.)
pub fn fs_create_dir(path: &Path) -> Result<(), HwOverlayError> {
    trace!("Attempting to Create '{path:?}'");
    let result = create_dir_all(path);
    match result {
        Ok(_) => {
            trace!("Directory created at {path:?}.");
            Ok(())
        }
        Err(e) => Err(HwOverlayError::IOCreate {
            file: path.into(),
            e,
        }),
    }
}

/// Remove an empty directory.
///
/// Configfs overlay directories are removed with a plain `rmdir`; the kernel tears down the
/// attribute files itself, so this must not recurse.
pub fn fs_remove_dir(path: &Path) -> Result<(), HwOverlayError> {
    trace!("Attempting to delete '{path:?}'");
    let result = remove_dir(path);
    match result {
        Ok(_) => {
            trace!("Deleted {path:?}");
            Ok(())
        }
        Err(e) => Err(HwOverlayError::IODelete {
            file: path.into(),
            e,
        }),
    }
}

/// Read the contents of a directory and return entry names (not full paths), sorted so that
/// callers picking "the first match" behave the same on every filesystem.
///
/// Entries that cannot be read are silently skipped.
pub fn fs_read_dir(dir: &Path) -> Result<Vec<String>, HwOverlayError> {
    trace!("Attempting to read directory '{dir:?}'");
    std::fs::read_dir(dir).map_or_else(
        |e| {
            Err(HwOverlayError::IOReadDir {
                dir: dir.to_owned(),
                e,
            })
        },
        |iter| {
            let mut ret: Vec<String> = iter
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            ret.sort();
            trace!("Dir reading done.");
            Ok(ret)
        },
    )
}
