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

//! Connection annotations for the accelerator driver.
//!
//! Extends the nodes of a hand written design with how its DMA engines and accelerators are
//! wired together:
//! ```text
//! &acc0 {
//!     hw-name = "acc0";
//!     compatible = "hls-target";
//!     dmas = <&dma0>, <&dma1>;
//! };
//! &dma0 {
//!     hw-name = "dma0";
//!     compatible = "hls-dma";
//!     direction = <1>;
//!     hls-node = <&acc0>;
//! };
//! ```

use crate::hardware::{HardwareGraph, Module, ModuleKind};
use crate::overlay::document::{DtNode, PropertyValue, reference};

pub static DMA_ANNOTATION_COMPATIBLE: &str = "hls-dma";
pub static ACCELERATOR_ANNOTATION_COMPATIBLE: &str = "hls-target";

/// `direction` bit set on an engine feeding an accelerator.
pub static FEEDS_ACCELERATOR: u32 = 1;
/// `direction` bit set on an engine receiving accelerator output.
pub static RECEIVES_ACCELERATOR: u32 = 2;

fn is_dma(graph: &HardwareGraph, name: &str) -> bool {
    graph.module(name).is_some_and(|m| m.as_dma().is_some())
}

/// Accelerator that `dma` feeds, or failing that, the one writing into it.
fn accelerator_of<'a>(graph: &'a HardwareGraph, dma: &'a Module) -> Option<&'a str> {
    if let Some(target) = dma.output_to() {
        return Some(target.module.as_str());
    }
    graph
        .accelerators()
        .find(|acc| acc.output_to().is_some_and(|t| t.module == dma.name))
        .map(|acc| acc.name.as_str())
}

fn dma_annotation(graph: &HardwareGraph, module: &Module) -> DtNode {
    let mut direction = 0;
    if module.output_to().is_some() {
        direction |= FEEDS_ACCELERATOR;
    }
    if module.as_dma().is_some_and(|dma| dma.out_connected) {
        direction |= RECEIVES_ACCELERATOR;
    }
    let node = DtNode::new(reference(&module.name))
        .property("hw-name", PropertyValue::string(&module.name))
        .property("compatible", PropertyValue::string(DMA_ANNOTATION_COMPATIBLE))
        .property("direction", PropertyValue::cell(direction.to_string()));
    match accelerator_of(graph, module) {
        Some(accelerator) => node.property("hls-node", PropertyValue::references(&[accelerator])),
        None => node,
    }
}

fn accelerator_annotation(graph: &HardwareGraph, module: &Module) -> DtNode {
    let mut dmas: Vec<&str> = graph
        .sources_of(&module.name)
        .into_iter()
        .filter(|c| is_dma(graph, &c.source))
        .filter_map(|c| graph.module(&c.source).map(|m| m.name.as_str()))
        .collect();
    if let Some(target) = module.output_to().filter(|t| is_dma(graph, &t.module)) {
        if !dmas.contains(&target.module.as_str()) {
            dmas.push(target.module.as_str());
        }
    }

    let mut node = DtNode::new(reference(&module.name))
        .property("hw-name", PropertyValue::string(&module.name))
        .property(
            "compatible",
            PropertyValue::string(ACCELERATOR_ANNOTATION_COMPATIBLE),
        );
    if let Some(gpio) = graph.gpio_modules().next() {
        node = node.property("gpio", PropertyValue::references(&[gpio.name.as_str()]));
    }
    if dmas.is_empty() {
        node.property("dmas", PropertyValue::cell("empty"))
    } else {
        node.property("dmas", PropertyValue::references(&dmas))
    }
}

/// Annotation nodes for every DMA and accelerator of a resolved graph, sorted by name.
pub fn annotation_nodes(graph: &HardwareGraph) -> Vec<DtNode> {
    let mut modules: Vec<&Module> = graph
        .modules()
        .iter()
        .filter(|m| matches!(m.kind, ModuleKind::Dma(_) | ModuleKind::Hls(_)))
        .collect();
    modules.sort_by(|a, b| a.name.cmp(&b.name));
    modules
        .into_iter()
        .map(|module| match module.kind {
            ModuleKind::Dma(_) => dma_annotation(graph, module),
            _ => accelerator_annotation(graph, module),
        })
        .collect()
}

/// Render the annotations as device-tree source, one node after another.
pub fn emit_annotations(graph: &HardwareGraph) -> String {
    annotation_nodes(graph)
        .iter()
        .map(DtNode::to_string)
        .collect()
}
