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

use hwoverlay::config::tool_config;
use hwoverlay::error::HwOverlayError;
use hwoverlay::install::configfs::ConfigfsInstaller;
use hwoverlay::install::dtc::DtcCompiler;
use hwoverlay::interrupts::ProcInterrupts;
use hwoverlay::pipeline::install_overlay;
use std::path::Path;

/// Generates, compiles and installs the overlay for `path`. The source and blob are left in
/// the system temporary directory.
pub fn install_handler(path: &Path) -> Result<String, HwOverlayError> {
    let config = tool_config();
    let blob = install_overlay(
        path,
        config,
        &ProcInterrupts::new(&config.interrupts_path),
        &DtcCompiler::from_config(config),
        &ConfigfsInstaller::from_config(config),
        &std::env::temp_dir(),
    )?;
    Ok(format!(
        "{blob:?} installed as overlay '{}'\n",
        config.overlay_name
    ))
}
