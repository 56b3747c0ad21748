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

//! Assigning accelerator input streams to the sources that feed them.

use crate::error::HwOverlayError;
use crate::hardware::{HardwareGraph, ModuleKind, StreamDirection, Target};
use log::{debug, trace, warn};
use std::collections::HashSet;

/// A source whose target must be rewritten to name an exact stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamAssignment {
    pub source: String,
    pub target: Target,
}

/// Every source target must name an accelerator, and every accelerator target must name a
/// module that exists.
pub fn check_targets(graph: &HardwareGraph) -> Result<(), HwOverlayError> {
    for connection in graph.connections() {
        match graph.module(&connection.target.module).map(|m| &m.kind) {
            Some(ModuleKind::Hls(_)) => {}
            Some(other) => {
                return Err(HwOverlayError::ConnectionMismatch(format!(
                    "{} outputs to '{}', which is a {} module rather than an accelerator",
                    connection.source,
                    connection.target,
                    other.type_tag()
                )));
            }
            None => {
                return Err(HwOverlayError::ConnectionMismatch(format!(
                    "{} outputs to '{}', which is not a declared module",
                    connection.source, connection.target
                )));
            }
        }
    }
    for accelerator in graph.accelerators() {
        let Some(target) = accelerator.output_to() else {
            continue;
        };
        match graph.module(&target.module) {
            Some(module) if module.as_dma().is_some() => {}
            Some(module) => warn!(
                "{} outputs to '{target}', a {} module; only DMA targets are wired, ignoring it",
                accelerator.name,
                module.kind.type_tag()
            ),
            None => {
                return Err(HwOverlayError::ConnectionMismatch(format!(
                    "{} outputs to '{target}', which is not a declared module",
                    accelerator.name
                )));
            }
        }
    }
    Ok(())
}

/// Work out which input stream each implicit source of each accelerator takes.
///
/// Sources naming an exact stream keep it. The others take the remaining input streams, both
/// lists walked in declaration order. Explicit targets are not re-emitted, so resolving an
/// already resolved graph yields no assignments. An accelerator no source outputs to keeps its
/// inputs unconnected.
///
/// # Returns: `Result<Vec<StreamAssignment>, HwOverlayError>`
/// * `Ok(Vec<StreamAssignment>)` - New explicit targets for the implicit sources
/// * `Err(HwOverlayError::ConnectionMismatch)` - An accelerator has sources but not one per
///   input stream, or an explicit target is not a free input stream
pub fn assign_streams(graph: &HardwareGraph) -> Result<Vec<StreamAssignment>, HwOverlayError> {
    let mut assignments = Vec::new();
    for module in graph.accelerators() {
        let Some(accelerator) = module.as_accelerator() else {
            continue;
        };
        let inputs: Vec<&str> = accelerator
            .interface
            .streams_in(StreamDirection::Input)
            .map(|s| s.name.as_str())
            .collect();
        let sources = graph.sources_of(&module.name);
        if sources.is_empty() {
            debug!(
                "{} has no sources; its {} input streams stay unconnected",
                module.name,
                inputs.len()
            );
            continue;
        }
        if sources.len() != inputs.len() {
            return Err(HwOverlayError::ConnectionMismatch(format!(
                "{} has {} input streams but {} sources output to it",
                module.name,
                inputs.len(),
                sources.len()
            )));
        }

        let (explicit, implicit): (Vec<_>, Vec<_>) =
            sources.into_iter().partition(|c| c.is_explicit());
        let mut claimed = HashSet::new();
        for connection in &explicit {
            let Some(stream) = connection.target.stream.as_deref() else {
                continue;
            };
            if !inputs.contains(&stream) {
                return Err(HwOverlayError::ConnectionMismatch(format!(
                    "{} outputs to '{}', which is not an input stream of {}",
                    connection.source, connection.target, module.name
                )));
            }
            if !claimed.insert(stream) {
                return Err(HwOverlayError::ConnectionMismatch(format!(
                    "{} outputs to '{}', which another source already feeds",
                    connection.source, connection.target
                )));
            }
        }

        debug!(
            "{}: {} explicit and {} implicit sources",
            module.name,
            explicit.len(),
            implicit.len()
        );
        let free = inputs.iter().filter(|s| !claimed.contains(*s));
        for (connection, stream) in implicit.into_iter().zip(free) {
            trace!("{} takes {}.{stream}", connection.source, module.name);
            assignments.push(StreamAssignment {
                source: connection.source,
                target: Target::stream(module.name.clone(), *stream),
            });
        }
    }
    Ok(assignments)
}
