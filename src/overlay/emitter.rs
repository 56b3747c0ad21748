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

//! Rendering a resolved graph as an overlay for the programmable-logic bus.
//!
//! ```text
//! /dts-v1/;
//! /plugin/;
//!
//! / {
//!     fragment@0 {
//!         target = <&amba_pl>;
//!         #address-cells = <2>;
//!         #size-cells = <2>;
//!         __overlay__ {
//!             #address-cells = <2>;
//!             #size-cells = <2>;
//!             axi_dma_0: dma@0x40400000 {
//!                 ...
//!                 dma-channel@40400000 {
//!                     ...
//!                 };
//!             };
//!             hls_target_0: hls_target@a0000000 {
//!                 ...
//!             };
//!         };
//!     };
//! };
//! ```
//!
//! Any module missing a field the parser or resolver should have filled in is reported as
//! [`HwOverlayError::Internal`]: it points at a defect upstream, not at bad input.

use crate::config::ToolConfig;
use crate::error::HwOverlayError;
use crate::hardware::{DmaModule, GpioModule, HardwareGraph, Module, ModuleKind, RegisterWindow};
use crate::interrupts::InterruptAssignment;
use crate::overlay::document::{DtNode, OverlayDocument, PropertyValue, hex_cell, reference};
use log::debug;

pub static DMA_COMPATIBLE: &str = "xlnx,axi-dma-1.00.a";
pub static HLS_COMPATIBLE: &str = "xlnx,hls-target-1.0";
pub static GPIO_COMPATIBLE: &str = "xlnx,xps-gpio-1.00.a";
/// Address width of every DMA engine.
static DMA_ADDRESS_WIDTH: u64 = 32;
/// Frequency of the fabric clock every DMA clock input is tied to.
static FABRIC_CLOCK_HZ: u64 = 100_000_000;
static MAILBOX_BUFFER_BASE: u64 = 0x3ed8_0000;
static MAILBOX_BUFFER_SIZE: u64 = 0x1_0000;
static TTC_BASE: u64 = 0xff11_0000;
static TTC_SIZE: u64 = 0x1000;

/// The four cells of a two-cell address and two-cell size register window.
fn reg_cells(base: u64, size: u64) -> PropertyValue {
    PropertyValue::Cells(vec![
        hex_cell(base >> 32),
        format!("0x{:08x}", base & 0xffff_ffff),
        hex_cell(size >> 32),
        hex_cell(size & 0xffff_ffff),
    ])
}

fn interrupt_triplet(number: u32) -> [String; 3] {
    ["0".to_string(), number.to_string(), "4".to_string()]
}

fn window_of(module: &Module) -> Result<RegisterWindow, HwOverlayError> {
    module.window.ok_or_else(|| {
        HwOverlayError::Internal(format!("{} has no register window to emit", module.name))
    })
}

fn dma_node(
    module: &Module,
    dma: &DmaModule,
    interrupts: &InterruptAssignment,
    config: &ToolConfig,
) -> Result<DtNode, HwOverlayError> {
    let window = window_of(module)?;
    let base = window.base_address();

    let mut channel_numbers = Vec::with_capacity(dma.channels.len());
    for index in 0..dma.channels.len() {
        let number = interrupts.get(&module.name, index).ok_or_else(|| {
            HwOverlayError::Internal(format!(
                "no interrupt assigned to channel {index} of {}",
                module.name
            ))
        })?;
        channel_numbers.push(number);
    }

    let mut channels = Vec::with_capacity(dma.channels.len());
    for (channel, number) in dma.channels.iter().zip(&channel_numbers) {
        let width = dma.data_width(channel.direction).ok_or_else(|| {
            HwOverlayError::Internal(format!(
                "{} has no data width for its {} channel",
                module.name,
                channel.direction.compatible()
            ))
        })?;
        let address = window.offset_address(&module.name, channel.register_offset)?;
        channels.push(
            DtNode::new(format!("dma-channel@{address:08x}"))
            .property("compatible", PropertyValue::string(channel.direction.compatible()))
            .property("dma-channels", PropertyValue::cell(hex_cell(1)))
            .property(
                "interrupts",
                PropertyValue::Cells(interrupt_triplet(*number).to_vec()),
            )
            .property("xlnx,datawidth", PropertyValue::cell(hex_cell(width.into())))
            .property("xlnx,device-id", PropertyValue::cell(hex_cell(0))),
        );
    }

    let clock_labels = vec![config.clock_label.as_str(); dma.clock_names.len()];
    Ok(DtNode::new(format!("dma@0x{base:08x}"))
        .labelled(&module.name)
        .property("#dma-cells", PropertyValue::cell("1"))
        .property("clock-names", PropertyValue::Strings(dma.clock_names.clone()))
        .property("clocks", PropertyValue::references(&clock_labels))
        .property("compatible", PropertyValue::string(DMA_COMPATIBLE))
        .property(
            "interrupt-parent",
            PropertyValue::cell(reference(&config.interrupt_parent_label)),
        )
        .property(
            "interrupts",
            PropertyValue::Cells(
                channel_numbers
                    .iter()
                    .flat_map(|n| interrupt_triplet(*n))
                    .collect(),
            ),
        )
        .property("reg", reg_cells(base, window.size()))
        .property("xlnx,addrwidth", PropertyValue::cell(hex_cell(DMA_ADDRESS_WIDTH)))
        .flag("xlnx,include-sg")
        .flag("xlnx,multichannel-dma")
        .children(channels))
}

fn accelerator_node(module: &Module) -> Result<DtNode, HwOverlayError> {
    let window = window_of(module)?;
    Ok(DtNode::new(format!("hls_target@{:08x}", window.base_address()))
        .labelled(&module.name)
        .property("compatible", PropertyValue::string(HLS_COMPATIBLE))
        .property("reg", reg_cells(window.base_address(), window.size())))
}

fn gpio_node(module: &Module, gpio: &GpioModule) -> Result<DtNode, HwOverlayError> {
    let window = window_of(module)?;
    let params = gpio.params.ok_or_else(|| {
        HwOverlayError::Internal(format!("{} has no GPIO parameters to emit", module.name))
    })?;
    let cell = |value: u32| PropertyValue::cell(format!("0x{value:x}"));
    Ok(DtNode::new(format!("gpio@{:08x}", window.base_address()))
        .labelled(&module.name)
        .property("#gpio-cells", PropertyValue::cell("2"))
        .property("compatible", PropertyValue::string(GPIO_COMPATIBLE))
        .flag("gpio-controller")
        .property("reg", reg_cells(window.base_address(), window.size()))
        .property("xlnx,all-inputs", cell(params.all_inputs))
        .property("xlnx,all-inputs-2", cell(params.all_inputs_2))
        .property("xlnx,all-outputs", cell(params.all_outputs))
        .property("xlnx,all-outputs-2", cell(params.all_outputs_2))
        .property("xlnx,dout-default", cell(params.dout_default))
        .property("xlnx,dout-default-2", cell(params.dout_default_2))
        .property("xlnx,gpio-width", cell(params.gpio_width))
        .property("xlnx,gpio2-width", cell(params.gpio2_width))
        .property("xlnx,interrupt-present", cell(0))
        .property("xlnx,is-dual", cell(params.is_dual))
        .property("xlnx,tri-default", cell(params.tri_default))
        .property("xlnx,tri-default-2", cell(params.tri_default_2)))
}

/// Platform nodes emitted with every overlay: the fabric clock the DMA engines reference, the
/// real-time core's message buffer and the triple timer counter it timestamps with.
fn auxiliary_nodes(config: &ToolConfig) -> Vec<DtNode> {
    vec![
        DtNode::new(config.clock_label.clone())
            .labelled(&config.clock_label)
            .property("#clock-cells", PropertyValue::cell("0"))
            .property("clock-frequency", PropertyValue::cell(FABRIC_CLOCK_HZ.to_string()))
            .property("compatible", PropertyValue::string("fixed-clock")),
        DtNode::new(format!("mailbox@{MAILBOX_BUFFER_BASE:08x}"))
            .labelled("r5_mailbox")
            .property("compatible", PropertyValue::string("generic-uio"))
            .property("reg", reg_cells(MAILBOX_BUFFER_BASE, MAILBOX_BUFFER_SIZE)),
        DtNode::new(format!("timer@{TTC_BASE:08x}"))
            .labelled("ttc_control")
            .property("compatible", PropertyValue::string("generic-uio"))
            .property("reg", reg_cells(TTC_BASE, TTC_SIZE)),
    ]
}

/// Build the overlay tree for `graph`.
///
/// Nodes appear in module declaration order, followed by the platform nodes. Passthrough
/// sources have no node of their own.
pub fn build_overlay(
    graph: &HardwareGraph,
    interrupts: &InterruptAssignment,
    config: &ToolConfig,
) -> Result<OverlayDocument, HwOverlayError> {
    let mut nodes = Vec::with_capacity(graph.modules().len());
    for module in graph.modules() {
        match &module.kind {
            ModuleKind::Dma(dma) => nodes.push(dma_node(module, dma, interrupts, config)?),
            ModuleKind::Hls(_) => nodes.push(accelerator_node(module)?),
            ModuleKind::Gpio(gpio) => nodes.push(gpio_node(module, gpio)?),
            ModuleKind::Csi(_) => {}
        }
    }
    debug!("Emitting {} module nodes", nodes.len());
    nodes.extend(auxiliary_nodes(config));

    let two_cells = |node: DtNode| {
        node.property("#address-cells", PropertyValue::cell("2"))
            .property("#size-cells", PropertyValue::cell("2"))
    };
    let overlay = two_cells(DtNode::new("__overlay__")).children(nodes);
    let fragment = two_cells(
        DtNode::new("fragment@0")
            .property("target", PropertyValue::cell(reference(&config.target_label))),
    )
    .child(overlay);
    Ok(OverlayDocument {
        root: DtNode::new("/").child(fragment),
    })
}

/// Render `graph` as overlay source text.
pub fn emit_overlay(
    graph: &HardwareGraph,
    interrupts: &InterruptAssignment,
    config: &ToolConfig,
) -> Result<String, HwOverlayError> {
    build_overlay(graph, interrupts, config).map(|doc| doc.to_string())
}
