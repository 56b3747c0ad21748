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

//! Compiling overlay source and loading the result into the running kernel.
//!
//! Both steps sit behind a trait so that the rest of the pipeline does not care which tool
//! compiles or which kernel interface applies:
//!
//! - [`OverlayCompiler`]: overlay source file to blob file, see [`dtc::DtcCompiler`]
//! - [`OverlayInstaller`]: blob bytes to an applied overlay, see
//!   [`configfs::ConfigfsInstaller`]
//!
//! [`compile_and_install`] chains them. The privilege check runs before anything is written,
//! so an unprivileged run leaves no trace behind.

pub mod configfs;
pub mod dtc;

use crate::error::HwOverlayError;
use crate::system_io::{fs_read_bytes, fs_write};
use log::{info, trace};
use std::path::{Path, PathBuf};

/// Turns overlay source into a loadable blob.
pub trait OverlayCompiler {
    /// Compile the source file at `source` and write the blob to `output`.
    ///
    /// # Returns: `Result<(), HwOverlayError>`
    /// * `Ok(())` - The blob was written
    /// * `Err(HwOverlayError::ExternalToolFailure)` - The compiler could not be run or rejected
    ///   the source
    fn compile(&self, source: &Path, output: &Path) -> Result<(), HwOverlayError>;
}

/// Applies a compiled overlay to the running system.
pub trait OverlayInstaller {
    /// Fail early when the caller lacks the privilege to install.
    fn check_permitted(&self) -> Result<(), HwOverlayError>;

    /// Replace whatever occupies the overlay slot with `blob` and confirm it applied.
    fn install(&self, blob: &[u8]) -> Result<(), HwOverlayError>;
}

/// Write `source` into `work_dir`, compile it and install the blob.
///
/// The source is written as `<name>.dts` and the blob as `<name>.dtbo`, both left in place
/// afterwards for inspection.
///
/// # Returns: `Result<PathBuf, HwOverlayError>`
/// * `Ok(PathBuf)` - Path of the installed blob
/// * `Err(HwOverlayError::Permission)` - The installer refused before any work was done
/// * `Err(HwOverlayError::ExternalToolFailure)` - Compilation failed
/// * `Err(HwOverlayError::OverlayStatus)` - The kernel did not report the overlay applied
/// * `Err(HwOverlayError::IOWrite)` etc. - Reading or writing one of the files failed
pub fn compile_and_install(
    source: &str,
    name: &str,
    work_dir: &Path,
    compiler: &dyn OverlayCompiler,
    installer: &dyn OverlayInstaller,
) -> Result<PathBuf, HwOverlayError> {
    installer.check_permitted()?;

    let source_path = work_dir.join(format!("{name}.dts"));
    let blob_path = work_dir.join(format!("{name}.dtbo"));
    fs_write(&source_path, true, source)?;
    trace!("Overlay source written to {source_path:?}");

    compiler.compile(&source_path, &blob_path)?;
    info!("Compiled {source_path:?} to {blob_path:?}");

    let blob = fs_read_bytes(&blob_path)?;
    installer.install(&blob)?;
    info!("Installed overlay '{name}' ({} bytes)", blob.len());
    Ok(blob_path)
}
