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

use hwoverlay::error::HwOverlayError;
use hwoverlay::pipeline::resolve_user_config;
use log::info;
use std::path::Path;

/// Resolves the module list at `config` and formats the resolved YAML followed by the
/// connection annotations.
pub fn resolve_handler(config: &Path) -> Result<String, HwOverlayError> {
    let design = resolve_user_config(config)?;
    info!(
        "{} DMA engines and {} accelerators resolved",
        design.graph.dma_modules().count(),
        design.graph.accelerators().count()
    );
    Ok(format!(
        "{}\n# connection annotations\n{}",
        design.yaml, design.annotations
    ))
}
