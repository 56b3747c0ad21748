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

//! Hand written module list.
//!
//! ```yaml
//! hw:
//!   - type: dma
//!     name: dma0
//!   - type: dma
//!     name: dma1
//!     outputto: acc0.arg_0
//!   - type: hls
//!     name: acc0
//!     path: ip/hls_target
//!     outputto: dma0
//! ```
//!
//! The engine receiving accelerator output is listed first, since the driver loads channels
//! in declaration order.
//!
//! Relative descriptor paths are taken from the directory holding the list. A record that
//! already carries `streams` (as written by [`to_module_list_yaml`]) is not re-read from its
//! descriptor, so a resolved list can be fed back in unchanged.

use crate::error::HwOverlayError;
use crate::hardware::{
    AcceleratorModule, DmaModule, GpioModule, HardwareGraph, IpInterface, Module, ModuleKind,
    Stream, Target,
};
use crate::parsers::ip_descriptor::parse_ip_descriptor;
use crate::system_io::fs_read;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct ModuleList {
    hw: Option<Vec<ModuleRecord>>,
}

/// One entry of the `hw` list. Everything is optional here so that a missing field is
/// reported against its module rather than as a YAML syntax error.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ModuleRecord {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    outputto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vlnv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    streams: Option<Vec<Stream>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mm2s_datawidth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    s2mm_datawidth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    out_connected: Option<bool>,
}

/// Read the module list at `path` and the interface descriptor of every non-DMA module.
///
/// # Returns: `Result<HardwareGraph, HwOverlayError>`
/// * `Ok(HardwareGraph)` - Modules in list order, connections still unresolved
/// * `Err(HwOverlayError::MalformedDescriptor)` - A record lacks `type`, `name` or `path`,
///   or names an unknown type
/// * `Err(HwOverlayError::Yaml)` - The file is not valid YAML
pub fn parse_module_list(path: &Path) -> Result<HardwareGraph, HwOverlayError> {
    let text = fs_read(path)?;
    let base_dir = path.parent().unwrap_or(Path::new("."));
    parse_module_list_str(&text, path, base_dir)
}

pub fn parse_module_list_str(
    text: &str,
    file: &Path,
    base_dir: &Path,
) -> Result<HardwareGraph, HwOverlayError> {
    let list: ModuleList = serde_yaml::from_str(text).map_err(|e| HwOverlayError::Yaml {
        file: file.into(),
        e,
    })?;
    let Some(records) = list.hw else {
        return Err(HwOverlayError::malformed(
            file.display().to_string(),
            "hw",
            "the 'hw' list was not found in the module list",
        ));
    };
    let modules = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| module_from_record(index, record, base_dir))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Parsed {} modules from {file:?}", modules.len());
    HardwareGraph::new(modules)
}

fn module_from_record(
    index: usize,
    record: ModuleRecord,
    base_dir: &Path,
) -> Result<Module, HwOverlayError> {
    let Some(name) = record.name.clone() else {
        return Err(HwOverlayError::malformed(
            format!("hw[{index}]"),
            "name",
            "every module needs a name",
        ));
    };
    let Some(kind) = record.kind.as_deref() else {
        return Err(HwOverlayError::malformed(name, "type", "missing module type"));
    };
    trace!("Building {kind} module {name}");
    let output_to = record.outputto.as_deref().map(Target::parse);

    let kind = match kind {
        "dma" => ModuleKind::Dma(DmaModule {
            mm2s_data_width: record.mm2s_datawidth,
            s2mm_data_width: record.s2mm_datawidth,
            output_to,
            out_connected: record.out_connected.unwrap_or(false),
            ..Default::default()
        }),
        "hls" => ModuleKind::Hls(AcceleratorModule {
            interface: interface_for(&name, &record, base_dir)?,
            output_to,
        }),
        "csi" => ModuleKind::Csi(AcceleratorModule {
            interface: interface_for(&name, &record, base_dir)?,
            output_to,
        }),
        "gpio" => ModuleKind::Gpio(GpioModule {
            interface: interface_for(&name, &record, base_dir)?,
            params: None,
        }),
        other => {
            return Err(HwOverlayError::malformed(
                name,
                "type",
                format!("unknown module type '{other}', expected one of dma, hls, gpio, csi"),
            ));
        }
    };
    Ok(Module::new(name, kind))
}

fn interface_for(
    name: &str,
    record: &ModuleRecord,
    base_dir: &Path,
) -> Result<IpInterface, HwOverlayError> {
    if let Some(streams) = &record.streams {
        trace!("{name}: using {} streams already present in the list", streams.len());
        return Ok(IpInterface {
            streams: streams.clone(),
            vlnv: record.vlnv.clone(),
            descriptor: record.path.clone(),
        });
    }
    let Some(path) = &record.path else {
        return Err(HwOverlayError::malformed(
            name,
            "path",
            "non-DMA modules need the path of their interface descriptor",
        ));
    };
    let mut interface = parse_ip_descriptor(name, &base_dir.join(path))?;
    interface.descriptor = Some(path.clone());
    Ok(interface)
}

fn record_from_module(module: &Module) -> ModuleRecord {
    let mut record = ModuleRecord {
        kind: Some(module.kind.type_tag().to_string()),
        name: Some(module.name.clone()),
        outputto: module.output_to().map(Target::to_string),
        ..Default::default()
    };
    if let Some(interface) = module.interface() {
        record.path = interface.descriptor.clone();
        record.vlnv = interface.vlnv.clone();
        record.streams = Some(interface.streams.clone());
    }
    if let Some(dma) = module.as_dma() {
        record.mm2s_datawidth = dma.mm2s_data_width;
        record.s2mm_datawidth = dma.s2mm_data_width;
        record.out_connected = Some(dma.out_connected);
    }
    record
}

/// Serialise a graph back into module list form, with every derived field filled in.
pub fn to_module_list_yaml(graph: &HardwareGraph) -> Result<String, HwOverlayError> {
    let list = ModuleList {
        hw: Some(graph.modules().iter().map(record_from_module).collect()),
    };
    serde_yaml::to_string(&list).map_err(|e| HwOverlayError::Yaml {
        file: PathBuf::from("<resolved module list>"),
        e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::StreamDirection;
    use googletest::prelude::*;
    use rstest::*;

    fn parse(text: &str) -> Result<HardwareGraph, HwOverlayError> {
        parse_module_list_str(text, Path::new("hwconfig.user"), Path::new("."))
    }

    #[gtest]
    fn reads_modules_with_inline_streams() {
        let graph = parse(
            "hw:
  - type: dma
    name: dma0
    outputto: acc0.in0
  - type: hls
    name: acc0
    outputto: dma0
    streams:
      - {name: in0, type: input, depth: 4}
      - {name: out0, type: output, depth: 2}
",
        )
        .unwrap();

        let dma = graph.module("dma0").and_then(Module::as_dma).unwrap();
        expect_that!(dma.output_to, some(eq(&Target::stream("acc0", "in0"))));
        let acc = graph.module("acc0").and_then(Module::as_accelerator).unwrap();
        expect_that!(acc.output_to, some(eq(&Target::module("dma0"))));
        expect_that!(
            acc.interface.streams[1],
            eq(&Stream::new("out0", StreamDirection::Output, Some(2)))
        );
    }

    #[gtest]
    fn receiving_engine_first_resolves() {
        let graph = parse(
            "hw:
  - type: dma
    name: dma0
  - type: dma
    name: dma1
    outputto: acc0.arg_0
  - type: hls
    name: acc0
    path: ip/hls_target
    outputto: dma0
    streams:
      - {name: arg_0, type: input, depth: 4}
      - {name: arg_1, type: output, depth: 4}
",
        )
        .unwrap();

        let resolved = crate::resolver::resolve(&graph).unwrap();
        let dma0 = resolved.module("dma0").and_then(Module::as_dma).unwrap();
        expect_that!(dma0.out_connected, eq(true));
        expect_that!(dma0.s2mm_data_width, some(eq(32)));
    }

    #[gtest]
    #[rstest]
    #[case::no_hw_key("modules: []\n", "field 'hw'")]
    #[case::no_name("hw:\n  - type: dma\n", "module 'hw[0]' field 'name'")]
    #[case::no_type("hw:\n  - name: dma0\n", "module 'dma0' field 'type'")]
    #[case::bad_type("hw:\n  - {type: fifo, name: f0}\n", "unknown module type 'fifo'")]
    #[case::no_path("hw:\n  - {type: hls, name: acc0}\n", "module 'acc0' field 'path'")]
    #[case::duplicate(
        "hw:\n  - {type: dma, name: d}\n  - {type: dma, name: d}\n",
        "declared more than once"
    )]
    fn malformed_lists(#[case] text: &str, #[case] message: &str) {
        expect_that!(parse(text), err(displays_as(contains_substring(message))));
    }

    #[gtest]
    fn invalid_yaml_is_reported() {
        expect_that!(
            parse("hw: [\n"),
            err(displays_as(contains_substring("HwOverlayError::Yaml")))
        );
    }

    #[gtest]
    fn written_list_reads_back_to_the_same_graph() {
        let graph = parse(
            "hw:
  - {type: dma, name: dma0, outputto: acc0.in0, mm2s_datawidth: 32}
  - type: hls
    name: acc0
    path: ip/acc0
    vlnv: xilinx.com:hls:hls_target:1.0
    streams:
      - {name: in0, type: input, depth: 4}
",
        )
        .unwrap();

        let yaml = to_module_list_yaml(&graph).unwrap();
        expect_that!(yaml, contains_substring("outputto: acc0.in0"));
        expect_that!(parse(&yaml), ok(eq(&graph)));
    }
}
