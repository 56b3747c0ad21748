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

//! Hardware hand-off (`.hwh`) parser.
//!
//! The hand-off file lists every block of the as-built design as a `MODULE` record tagged
//! with `MODTYPE`. Three types are picked up, all others are ignored:
//!
//! | `MODTYPE`    | becomes            | required                                              |
//! |--------------|--------------------|-------------------------------------------------------|
//! | `axi_dma`    | [`ModuleKind::Dma`]  | both data widths, address range, a control register per direction, clock ports |
//! | `hls_target` | [`ModuleKind::Hls`]  | address range                                         |
//! | `axi_gpio`   | [`ModuleKind::Gpio`] | exactly the thirteen parameters in [`GPIO_PARAMETERS`] |
//!
//! ```xml
//! <MODULE INSTANCE="axi_dma_0" MODTYPE="axi_dma">
//!   <PARAMETERS>
//!     <PARAMETER NAME="c_m_axis_mm2s_tdata_width" VALUE="32"/>
//!     <PARAMETER NAME="C_BASEADDR" VALUE="0x80000000"/>
//!   </PARAMETERS>
//!   <REGISTERS>
//!     <REGISTER NAME="MM2S_DMACR"><PROPERTY NAME="ADDRESS_OFFSET" VALUE="0x00"/></REGISTER>
//!   </REGISTERS>
//!   <PORTS><PORT NAME="s_axi_lite_aclk" SIGIS="clk"/></PORTS>
//! </MODULE>
//! ```

use crate::error::HwOverlayError;
use crate::hardware::{
    AcceleratorModule, ChannelDirection, DmaChannel, DmaModule, GpioModule, GpioParams,
    HardwareGraph, Module, ModuleKind, RegisterWindow,
};
use crate::parsers::{attribute, is_element, parse_hex, parse_integer, parse_xml};
use log::{debug, trace, warn};
use roxmltree::Node;
use std::collections::HashMap;
use std::path::Path;

pub static DMA_MODTYPE: &str = "axi_dma";
pub static HLS_MODTYPE: &str = "hls_target";
pub static GPIO_MODTYPE: &str = "axi_gpio";

/// Parameters an `axi_gpio` record must declare, each exactly once.
pub static GPIO_PARAMETERS: [&str; 13] = [
    "C_BASEADDR",
    "C_HIGHADDR",
    "C_ALL_INPUTS",
    "C_ALL_INPUTS_2",
    "C_ALL_OUTPUTS",
    "C_ALL_OUTPUTS_2",
    "C_DOUT_DEFAULT",
    "C_DOUT_DEFAULT_2",
    "C_TRI_DEFAULT",
    "C_TRI_DEFAULT_2",
    "C_GPIO_WIDTH",
    "C_GPIO2_WIDTH",
    "C_IS_DUAL",
];

/// Parse the text of a hand-off file into a graph of DMA, accelerator and GPIO modules in
/// document order.
///
/// # Returns: `Result<HardwareGraph, HwOverlayError>`
/// * `Ok(HardwareGraph)` - All recognised modules, fully specified
/// * `Err(HwOverlayError::MalformedDescriptor)` - A recognised module lacks a required field
/// * `Err(HwOverlayError::Xml)` - The file is not well formed
pub fn parse_handoff_str(text: &str, file: &Path) -> Result<HardwareGraph, HwOverlayError> {
    let doc = parse_xml(text, file)?;
    let mut modules = Vec::new();
    for record in doc.descendants().filter(|n| is_element(n, "MODULE")) {
        let Some(modtype) = attribute(record, "MODTYPE") else {
            continue;
        };
        let module = if modtype == DMA_MODTYPE {
            parse_dma(record)?
        } else if modtype == HLS_MODTYPE {
            parse_hls(record)?
        } else if modtype == GPIO_MODTYPE {
            parse_gpio(record)?
        } else {
            trace!("Ignoring module of type {modtype}");
            continue;
        };
        debug!(
            "Found {} module {} in {file:?}",
            module.kind.type_tag(),
            module.name
        );
        modules.push(module);
    }
    HardwareGraph::new(modules)
}

fn instance_name(record: Node, modtype: &str) -> Result<String, HwOverlayError> {
    attribute(record, "INSTANCE")
        .map(str::to_string)
        .ok_or_else(|| {
            HwOverlayError::malformed(
                format!("<unnamed {modtype}>"),
                "INSTANCE",
                "module record has no instance name",
            )
        })
}

/// Every `PARAMETER` of a record, keeping repeats so they can be detected.
fn parameters<'a>(record: Node<'a, '_>) -> Vec<(&'a str, &'a str)> {
    record
        .descendants()
        .filter(|n| is_element(n, "PARAMETER"))
        .filter_map(|p| Some((attribute(p, "NAME")?, attribute(p, "VALUE")?)))
        .collect()
}

fn required<'a>(
    params: &[(&str, &'a str)],
    module: &str,
    parameter: &str,
    field: &str,
) -> Result<&'a str, HwOverlayError> {
    params
        .iter()
        .find(|(name, _)| *name == parameter)
        .map(|(_, value)| *value)
        .ok_or_else(|| {
            HwOverlayError::malformed(module, field, format!("parameter {parameter} not found"))
        })
}

fn window(
    params: &[(&str, &str)],
    module: &str,
    base_parameter: &str,
    high_parameter: &str,
) -> Result<RegisterWindow, HwOverlayError> {
    let base = parse_hex(
        module,
        "base_address",
        required(params, module, base_parameter, "base_address")?,
    )?;
    let high = parse_hex(
        module,
        "high_address",
        required(params, module, high_parameter, "high_address")?,
    )?;
    RegisterWindow::new(module, base, high)
}

fn dma_channels(
    record: Node,
    module: &str,
    window: &RegisterWindow,
) -> Result<Vec<DmaChannel>, HwOverlayError> {
    let mut channels = Vec::new();
    for register in record.descendants().filter(|n| is_element(n, "REGISTER")) {
        let Some(direction) =
            attribute(register, "NAME").and_then(ChannelDirection::from_control_register)
        else {
            continue;
        };
        let offset = register
            .descendants()
            .filter(|n| is_element(n, "PROPERTY"))
            .find(|p| attribute(*p, "NAME") == Some("ADDRESS_OFFSET"))
            .and_then(|p| attribute(p, "VALUE"))
            .ok_or_else(|| {
                HwOverlayError::malformed(
                    module,
                    "address_offset",
                    format!(
                        "register {} has no ADDRESS_OFFSET",
                        direction.control_register()
                    ),
                )
            })?;
        let register_offset = parse_hex(module, "address_offset", offset)?;
        window.offset_address(module, register_offset)?;
        channels.push(DmaChannel {
            direction,
            register_offset,
        });
    }
    for direction in [ChannelDirection::Mm2sOut, ChannelDirection::S2mmIn] {
        if !channels.iter().any(|c| c.direction == direction) {
            return Err(HwOverlayError::malformed(
                module,
                direction.control_register(),
                "no control register offset for this direction",
            ));
        }
    }
    Ok(channels)
}

fn clock_names(record: Node) -> Vec<String> {
    record
        .descendants()
        .filter(|n| is_element(n, "PORT") && attribute(*n, "SIGIS") == Some("clk"))
        .filter_map(|port| attribute(port, "NAME").map(str::to_string))
        .collect()
}

fn parse_dma(record: Node) -> Result<Module, HwOverlayError> {
    let name = instance_name(record, DMA_MODTYPE)?;
    let params = parameters(record);

    let window = window(&params, &name, "C_BASEADDR", "C_HIGHADDR")?;
    let channels = dma_channels(record, &name, &window)?;
    let s2mm_width = parse_integer(
        &name,
        "s2mm_datawidth",
        required(&params, &name, "c_s_axis_s2mm_tdata_width", "s2mm_datawidth")?,
    )?;
    let mm2s_width = parse_integer(
        &name,
        "mm2s_datawidth",
        required(&params, &name, "c_m_axis_mm2s_tdata_width", "mm2s_datawidth")?,
    )?;
    let clocks = clock_names(record);
    if clocks.is_empty() {
        return Err(HwOverlayError::malformed(
            &name,
            "clock_names",
            "no clock ports found",
        ));
    }

    Ok(Module::new(
        name,
        ModuleKind::Dma(DmaModule {
            channels,
            mm2s_data_width: Some(mm2s_width),
            s2mm_data_width: Some(s2mm_width),
            clock_names: clocks,
            output_to: None,
            out_connected: false,
        }),
    )
    .with_window(window))
}

fn parse_hls(record: Node) -> Result<Module, HwOverlayError> {
    let name = instance_name(record, HLS_MODTYPE)?;
    let params = parameters(record);
    let window = window(
        &params,
        &name,
        "C_S_AXI_CONFIG_BASEADDR",
        "C_S_AXI_CONFIG_HIGHADDR",
    )?;
    Ok(Module::new(name, ModuleKind::Hls(AcceleratorModule::default())).with_window(window))
}

fn parse_gpio(record: Node) -> Result<Module, HwOverlayError> {
    let name = instance_name(record, GPIO_MODTYPE)?;
    let mut values: HashMap<&str, Vec<&str>> = HashMap::new();
    for (param, value) in parameters(record) {
        if GPIO_PARAMETERS.contains(&param) {
            values.entry(param).or_default().push(value);
        }
    }
    for param in GPIO_PARAMETERS {
        match values.get(param).map(Vec::len).unwrap_or(0) {
            1 => {}
            0 => {
                return Err(HwOverlayError::malformed(
                    &name,
                    param,
                    "required GPIO parameter not found",
                ));
            }
            n => {
                return Err(HwOverlayError::malformed(
                    &name,
                    param,
                    format!("GPIO parameter declared {n} times"),
                ));
            }
        }
    }
    let value = |param: &str| -> Result<u32, HwOverlayError> {
        let text = values.get(param).and_then(|v| v.first()).ok_or_else(|| {
            HwOverlayError::Internal(format!("{name}: {param} vanished after validation"))
        })?;
        parse_integer(&name, param, text)
    };

    let params = GpioParams {
        all_inputs: value("C_ALL_INPUTS")?,
        all_inputs_2: value("C_ALL_INPUTS_2")?,
        all_outputs: value("C_ALL_OUTPUTS")?,
        all_outputs_2: value("C_ALL_OUTPUTS_2")?,
        dout_default: value("C_DOUT_DEFAULT")?,
        dout_default_2: value("C_DOUT_DEFAULT_2")?,
        tri_default: value("C_TRI_DEFAULT")?,
        tri_default_2: value("C_TRI_DEFAULT_2")?,
        gpio_width: value("C_GPIO_WIDTH")?,
        gpio2_width: value("C_GPIO2_WIDTH")?,
        is_dual: value("C_IS_DUAL")?,
    };
    let base = values
        .get("C_BASEADDR")
        .and_then(|v| v.first())
        .map(|text| parse_hex(&name, "C_BASEADDR", text))
        .transpose()?;
    let high = values
        .get("C_HIGHADDR")
        .and_then(|v| v.first())
        .map(|text| parse_hex(&name, "C_HIGHADDR", text))
        .transpose()?;
    let (Some(base), Some(high)) = (base, high) else {
        return Err(HwOverlayError::Internal(format!(
            "{name}: address range vanished after validation"
        )));
    };
    let window = RegisterWindow::new(&name, base, high)?;

    Ok(Module::new(
        name,
        ModuleKind::Gpio(GpioModule {
            interface: Default::default(),
            params: Some(params),
        }),
    )
    .with_window(window))
}

/// Log where the parsed design departs from the reference platform the generated overlay
/// was written for, and return the same messages. None of these stop generation.
pub fn sanity_check(graph: &HardwareGraph) -> Vec<String> {
    let mut deviations = Vec::new();
    for (module, dma) in graph.dma_modules() {
        for (label, width) in [
            ("mm2s", dma.mm2s_data_width),
            ("s2mm", dma.s2mm_data_width),
        ] {
            if width != Some(16) {
                deviations.push(format!(
                    "{}: {label} data width is {width:?}, expecting Some(16)",
                    module.name
                ));
            }
        }
        if dma.clock_names.len() != 4 {
            deviations.push(format!(
                "{}: clock list has {} entries, expecting 4",
                module.name,
                dma.clock_names.len()
            ));
        }
    }
    let accelerators = graph.accelerators().count();
    if accelerators != 1 {
        deviations.push(format!("found {accelerators} accelerator modules, expecting 1"));
    }
    for deviation in &deviations {
        warn!("{deviation}");
    }
    deviations
}
