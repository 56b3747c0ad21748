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

//! The end-to-end flows behind each entry point.
//!
//! Every stage consumes the whole output of the one before it and the first error ends the
//! run. Nothing reaches the kernel unless every earlier stage succeeded.
//!
//! ```text
//! resolve:  module list -> parse -> resolve -> YAML + annotations
//! generate: hand-off    -> locate -> parse -> sanity check -> interrupts -> overlay source
//! install:  generate    -> compile -> install
//! ```

use crate::config::ToolConfig;
use crate::error::HwOverlayError;
use crate::hardware::HardwareGraph;
use crate::install::{OverlayCompiler, OverlayInstaller, compile_and_install};
use crate::interrupts::{IrqSource, assign_interrupts};
use crate::overlay::{emit_annotations, emit_overlay};
use crate::parsers::handoff::{parse_handoff_str, sanity_check};
use crate::parsers::handoff_locator::locate_handoff;
use crate::parsers::user_config::{parse_module_list, to_module_list_yaml};
use crate::resolver::resolve;
use log::info;
use std::path::{Path, PathBuf};

/// Everything produced from a hand written module list.
#[derive(Debug, Clone)]
pub struct ResolvedDesign {
    pub graph: HardwareGraph,
    /// The resolved module list, readable by [`parse_module_list`] again.
    pub yaml: String,
    /// Connection annotations for the accelerator driver.
    pub annotations: String,
}

/// Parse and resolve the module list at `path`.
///
/// # Returns: `Result<ResolvedDesign, HwOverlayError>`
/// * `Ok(ResolvedDesign)` - The resolved graph with its YAML and annotation renderings
/// * `Err(HwOverlayError::MalformedDescriptor)` - The list or an interface descriptor is
///   incomplete
/// * `Err(HwOverlayError::ConnectionMismatch)` - Connections do not line up
/// * `Err(HwOverlayError::IncompleteResolution)` - A DMA width could not be derived
pub fn resolve_user_config(path: &Path) -> Result<ResolvedDesign, HwOverlayError> {
    let parsed = parse_module_list(path)?;
    info!("Parsed {} modules from {path:?}", parsed.modules().len());
    let graph = resolve(&parsed)?;
    info!("Resolved {} connections", graph.connections().len());
    Ok(ResolvedDesign {
        yaml: to_module_list_yaml(&graph)?,
        annotations: emit_annotations(&graph),
        graph,
    })
}

/// Find and parse the hand-off design under `path`, logging any deviation from the reference
/// platform.
pub fn load_handoff(path: &Path) -> Result<HardwareGraph, HwOverlayError> {
    let source = locate_handoff(path)?;
    let graph = parse_handoff_str(&source.text, &source.origin)?;
    info!(
        "Parsed {} modules from {:?}",
        graph.modules().len(),
        source.origin
    );
    sanity_check(&graph);
    Ok(graph)
}

/// Overlay source for the hand-off design under `path`.
///
/// # Returns: `Result<String, HwOverlayError>`
/// * `Ok(String)` - Complete overlay source
/// * `Err(HwOverlayError::Argument)` - `path` holds no hand-off design
/// * `Err(HwOverlayError::MalformedDescriptor)` - A module record is incomplete
/// * `Err(HwOverlayError::ResourceExhausted)` - Not enough free interrupt numbers
pub fn generate_overlay(
    path: &Path,
    config: &ToolConfig,
    irqs: &dyn IrqSource,
) -> Result<String, HwOverlayError> {
    let graph = load_handoff(path)?;
    let interrupts = assign_interrupts(&graph, irqs)?;
    info!("Assigned {} DMA channel interrupts", interrupts.len());
    emit_overlay(&graph, &interrupts, config)
}

/// Generate the overlay for `path`, compile it in `work_dir` and install it.
///
/// # Returns: `Result<PathBuf, HwOverlayError>`
/// * `Ok(PathBuf)` - The installed blob
/// * `Err(HwOverlayError::Permission)` - Not running as root
/// * `Err(HwOverlayError::ExternalToolFailure)` - The compiler failed
/// * `Err(HwOverlayError::OverlayStatus)` - The kernel did not apply the overlay
/// * Any error of [`generate_overlay`]
pub fn install_overlay(
    path: &Path,
    config: &ToolConfig,
    irqs: &dyn IrqSource,
    compiler: &dyn OverlayCompiler,
    installer: &dyn OverlayInstaller,
    work_dir: &Path,
) -> Result<PathBuf, HwOverlayError> {
    installer.check_permitted()?;
    let source = generate_overlay(path, config, irqs)?;
    compile_and_install(&source, &config.overlay_name, work_dir, compiler, installer)
}
