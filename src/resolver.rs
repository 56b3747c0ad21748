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

//! Connection resolution for hand written module lists.
//!
//! [`resolve`] runs three passes, each computing a patch set from the graph it is given:
//! 1. [`connections::check_targets`] and [`connections::assign_streams`] give every source an
//!    exact accelerator input stream.
//! 2. [`widths::derive_dma_patches`] marks which DMA engines receive accelerator output and
//!    derives their bus widths from stream depths.
//! 3. [`check_loading_order`] reports the default channel loading order and rejects graphs
//!    where it cannot hold.
//!
//! The stream assignment is a default wiring only. Tools consuming the resolved list may rewire
//! it, but this crate always applies the same order.

pub mod connections;
pub mod widths;

use crate::error::HwOverlayError;
use crate::hardware::{HardwareGraph, ModuleKind, Target};
use connections::{StreamAssignment, assign_streams, check_targets};
use log::{debug, info};
use widths::{DmaPatch, derive_dma_patches};

fn apply_assignment(
    graph: &mut HardwareGraph,
    assignment: StreamAssignment,
) -> Result<(), HwOverlayError> {
    let module = graph.module_mut(&assignment.source).ok_or_else(|| {
        HwOverlayError::Internal(format!(
            "stream assignment for unknown module {}",
            assignment.source
        ))
    })?;
    let target: Target = assignment.target;
    match &mut module.kind {
        ModuleKind::Dma(dma) => dma.output_to = Some(target),
        ModuleKind::Csi(source) => source.output_to = Some(target),
        ModuleKind::Hls(_) | ModuleKind::Gpio(_) => {
            return Err(HwOverlayError::Internal(format!(
                "{} is not a stream source but was assigned {target}",
                module.name
            )));
        }
    }
    Ok(())
}

fn apply_dma_patch(graph: &mut HardwareGraph, patch: DmaPatch) -> Result<(), HwOverlayError> {
    let dma = graph
        .module_mut(&patch.module)
        .and_then(|m| m.as_dma_mut())
        .ok_or_else(|| {
            HwOverlayError::Internal(format!("DMA patch for unknown module {}", patch.module))
        })?;
    dma.out_connected = patch.out_connected;
    dma.mm2s_data_width = patch.mm2s_data_width;
    dma.s2mm_data_width = patch.s2mm_data_width;
    Ok(())
}

/// DMA module names in declaration order, the order the driver loads channels in unless told
/// otherwise.
pub fn loading_order(graph: &HardwareGraph) -> Vec<&str> {
    graph.dma_modules().map(|(m, _)| m.name.as_str()).collect()
}

/// Log the default loading order and check that the first engine is the one receiving
/// accelerator output whenever any engine does.
pub fn check_loading_order(graph: &HardwareGraph) -> Result<(), HwOverlayError> {
    let order = loading_order(graph);
    info!(
        "Default DMA channel loading order: [{}]; adjust the driver configuration by hand if it differs",
        order.join(", ")
    );
    let receivers: Vec<&str> = graph
        .dma_modules()
        .filter(|(_, dma)| dma.out_connected)
        .map(|(m, _)| m.name.as_str())
        .collect();
    let first_receives = graph
        .dma_modules()
        .next()
        .is_some_and(|(_, dma)| dma.out_connected);
    if !receivers.is_empty() && !first_receives {
        return Err(HwOverlayError::ConnectionMismatch(format!(
            "the first declared DMA ({}) must be the one receiving accelerator output, but that is [{}]",
            order.first().copied().unwrap_or("none"),
            receivers.join(", ")
        )));
    }
    Ok(())
}

/// Resolve every connection of a parsed module list.
///
/// The input graph is left untouched. Resolving an already resolved graph returns an equal
/// graph.
///
/// # Returns: `Result<HardwareGraph, HwOverlayError>`
/// * `Ok(HardwareGraph)` - Every input of an accelerator with sources fed by exactly one of
///   them, every DMA with its connectivity and in-use widths filled in
/// * `Err(HwOverlayError::ConnectionMismatch)` - Sources and inputs do not line up
/// * `Err(HwOverlayError::IncompleteResolution)` - A required width could not be derived
pub fn resolve(graph: &HardwareGraph) -> Result<HardwareGraph, HwOverlayError> {
    check_targets(graph)?;
    let mut resolved = graph.clone();

    let assignments = assign_streams(graph)?;
    debug!("Assigning {} implicit connections", assignments.len());
    for assignment in assignments {
        apply_assignment(&mut resolved, assignment)?;
    }

    for patch in derive_dma_patches(&resolved)? {
        apply_dma_patch(&mut resolved, patch)?;
    }

    check_loading_order(&resolved)?;
    Ok(resolved)
}
