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

//! Overlay installation through the Linux configfs device-tree interface.
//!
//! # Configfs Interface
//!
//! Each applied overlay is a directory under the overlay control directory:
//! ```text
//! /sys/kernel/config/device-tree/overlays/hwoverlay/
//! ├── dtbo       # Write the compiled blob here to apply it
//! ├── path       # Unused here; the blob is written directly
//! └── status     # Reads "applied" once the kernel accepted the overlay
//! ```
//! The kernel creates the attribute files as soon as the directory is made, and removing the
//! directory reverts the overlay.
//!
//! # Installation Flow
//!
//! 1. Check that the effective uid is 0
//! 2. Remove the overlay directory if one with the same name exists
//! 3. Create the directory and write the blob to `dtbo`
//! 4. Verify `status` reports `applied`
//!
//! Step 2 means installing always replaces the previous overlay. There is no way to get it
//! back afterwards.

use crate::config::ToolConfig;
use crate::error::HwOverlayError;
use crate::install::OverlayInstaller;
use crate::system_io::{fs_create_dir, fs_read, fs_remove_dir, fs_write_bytes};
use log::{info, trace};
use std::path::{Path, PathBuf};

/// Effective uid from the text of a process status file.
///
/// The `Uid:` line lists real, effective, saved and filesystem uids in that order.
pub fn effective_uid(process_status: &str) -> Option<u32> {
    process_status
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))
        .and_then(|ids| ids.split_whitespace().nth(1))
        .and_then(|uid| uid.parse().ok())
}

/// Installs into one named slot under the configfs overlay directory.
#[derive(Debug, Clone)]
pub struct ConfigfsInstaller {
    /// The overlay's own directory, e.g. `/sys/kernel/config/device-tree/overlays/hwoverlay`.
    overlay_fs_path: PathBuf,
    process_status_path: PathBuf,
}

impl ConfigfsInstaller {
    pub fn new(overlay_fs_path: &Path, process_status_path: &Path) -> Self {
        ConfigfsInstaller {
            overlay_fs_path: overlay_fs_path.to_path_buf(),
            process_status_path: process_status_path.to_path_buf(),
        }
    }

    /// Installer for the configured overlay name and control directory.
    pub fn from_config(config: &ToolConfig) -> Self {
        let overlay_fs_path = config.overlay_control_dir.join(&config.overlay_name);
        trace!("overlay_fs_path will be {overlay_fs_path:?}");
        Self::new(&overlay_fs_path, &config.process_status_path)
    }

    pub fn overlay_fs_path(&self) -> &Path {
        &self.overlay_fs_path
    }

    /// Current content of the `status` file, or "not present" when there is no overlay.
    ///
    /// # Returns: `Result<String, HwOverlayError>`
    /// * `Ok(String)` - Status string (typically "applied" or empty)
    /// * `Err(HwOverlayError::IORead)` - The directory exists but `status` could not be read
    pub fn status(&self) -> Result<String, HwOverlayError> {
        if !self.overlay_fs_path.exists() {
            return Ok("not present".into());
        }
        let status_path = self.overlay_fs_path.join("status");
        trace!("Reading from {status_path:?}");
        fs_read(&status_path).map(|s| s.trim_end_matches('\n').to_string())
    }

    fn check_applied(&self) -> Result<(), HwOverlayError> {
        let status = self.status()?;
        match status.contains("applied") {
            true => {
                info!("overlay status is 'applied'");
                Ok(())
            }
            false => Err(HwOverlayError::OverlayStatus(format!(
                "After writing to configfs, overlay status does not show 'applied'. Instead it is '{status}'"
            ))),
        }
    }
}

impl OverlayInstaller for ConfigfsInstaller {
    /// # Returns: `Result<(), HwOverlayError>`
    /// * `Ok(())` - The effective uid is 0
    /// * `Err(HwOverlayError::Permission)` - Any other uid, or none could be found
    /// * `Err(HwOverlayError::IORead)` - The process status file could not be read
    fn check_permitted(&self) -> Result<(), HwOverlayError> {
        let status = fs_read(&self.process_status_path)?;
        match effective_uid(&status) {
            Some(0) => Ok(()),
            Some(uid) => Err(HwOverlayError::Permission(format!(
                "installing an overlay requires root, but the effective uid is {uid}"
            ))),
            None => Err(HwOverlayError::Permission(format!(
                "no effective uid found in {:?}",
                self.process_status_path
            ))),
        }
    }

    /// # Returns: `Result<(), HwOverlayError>`
    /// * `Ok(())` - Overlay applied and verified
    /// * `Err(HwOverlayError::IODelete)` - The previous overlay could not be removed
    /// * `Err(HwOverlayError::IOCreate)` - The overlay directory could not be created
    /// * `Err(HwOverlayError::IOWrite)` - The blob could not be written
    /// * `Err(HwOverlayError::OverlayStatus)` - The kernel did not apply the overlay
    fn install(&self, blob: &[u8]) -> Result<(), HwOverlayError> {
        if self.overlay_fs_path.exists() {
            info!("Replacing existing overlay at {:?}", self.overlay_fs_path);
            fs_remove_dir(&self.overlay_fs_path)?;
        }

        fs_create_dir(&self.overlay_fs_path)?;
        trace!("Created dir {:?}", self.overlay_fs_path);

        fs_write_bytes(&self.overlay_fs_path.join("dtbo"), true, blob)?;
        self.check_applied()
    }
}
