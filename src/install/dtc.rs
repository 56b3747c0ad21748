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

//! The device-tree compiler as an [`OverlayCompiler`].

use crate::config::ToolConfig;
use crate::error::HwOverlayError;
use crate::install::OverlayCompiler;
use log::trace;
use std::path::Path;
use std::process::Command;

/// Runs `dtc -@ -I dts -O dtb -o <output> <source>`.
///
/// `-@` keeps the symbol table, which the kernel needs to resolve `&label` references
/// in the overlay against the live tree.
#[derive(Debug, Clone)]
pub struct DtcCompiler {
    binary: String,
}

impl DtcCompiler {
    pub fn new(binary: &str) -> Self {
        DtcCompiler {
            binary: binary.to_string(),
        }
    }

    pub fn from_config(config: &ToolConfig) -> Self {
        Self::new(&config.dtc_binary)
    }
}

impl OverlayCompiler for DtcCompiler {
    fn compile(&self, source: &Path, output: &Path) -> Result<(), HwOverlayError> {
        trace!("Running {} on {source:?}", self.binary);
        let result = Command::new(&self.binary)
            .args(["-@", "-I", "dts", "-O", "dtb", "-o"])
            .arg(output)
            .arg(source)
            .output()
            .map_err(|e| HwOverlayError::ExternalToolFailure {
                tool: self.binary.clone(),
                message: e.to_string(),
            })?;
        if result.status.success() {
            Ok(())
        } else {
            Err(HwOverlayError::ExternalToolFailure {
                tool: self.binary.clone(),
                message: format!(
                    "{}: {}",
                    result.status,
                    String::from_utf8_lossy(&result.stderr).trim_end()
                ),
            })
        }
    }
}
