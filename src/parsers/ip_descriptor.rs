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

//! IP-XACT interface descriptor (`component.xml`) parser.
//!
//! Only AXI-stream bus interfaces are of interest. A `master` interface is an output of the
//! IP, a `slave` interface an input. The stream depth comes from the interface's
//! `TDATA_NUM_BYTES` parameter:
//!
//! ```xml
//! <spirit:busInterface>
//!   <spirit:name>arg_0</spirit:name>
//!   <spirit:busType spirit:vendor="xilinx.com" spirit:library="interface" spirit:name="axis" spirit:version="1.0"/>
//!   <spirit:slave/>
//!   <spirit:parameters>
//!     <spirit:parameter>
//!       <spirit:name>TDATA_NUM_BYTES</spirit:name>
//!       <spirit:value spirit:format="long">4</spirit:value>
//!     </spirit:parameter>
//!   </spirit:parameters>
//! </spirit:busInterface>
//! ```

use crate::error::HwOverlayError;
use crate::hardware::{IpInterface, Stream, StreamDirection};
use crate::parsers::{attribute, child_text, is_element, parse_xml};
use crate::system_io::fs_read;
use log::{debug, warn};
use roxmltree::Node;
use std::path::{Path, PathBuf};

pub static DESCRIPTOR_FILE_NAME: &str = "component.xml";
static STREAM_BUS_TYPE: &str = "axis";
static DEPTH_PARAMETER: &str = "TDATA_NUM_BYTES";

/// A configured descriptor path may name the IP directory or the descriptor itself.
pub fn descriptor_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(DESCRIPTOR_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// Read and parse the interface descriptor of `module` found at `path`.
///
/// # Returns: `Result<IpInterface, HwOverlayError>`
/// * `Ok(IpInterface)` - Streams in declaration order and the VLNV, if complete
/// * `Err(HwOverlayError::MalformedDescriptor)` - `path` does not lead to a descriptor file
/// * `Err(HwOverlayError::Xml)` - The descriptor is not well formed
pub fn parse_ip_descriptor(module: &str, path: &Path) -> Result<IpInterface, HwOverlayError> {
    let file = descriptor_file(path);
    if !file.is_file() {
        return Err(HwOverlayError::malformed(
            module,
            "path",
            format!("interface descriptor {file:?} does not exist"),
        ));
    }
    let text = fs_read(&file)?;
    parse_ip_descriptor_str(module, &text, &file)
}

pub fn parse_ip_descriptor_str(
    module: &str,
    text: &str,
    file: &Path,
) -> Result<IpInterface, HwOverlayError> {
    let doc = parse_xml(text, file)?;
    let component = doc.root_element();

    let streams: Vec<Stream> = component
        .descendants()
        .filter(|n| is_element(n, "busInterface") && is_stream_interface(*n))
        .filter_map(|iface| stream_from_interface(module, iface))
        .collect();
    debug!("{module}: found {} stream interfaces in {file:?}", streams.len());

    Ok(IpInterface {
        streams,
        vlnv: vlnv(module, component),
        descriptor: None,
    })
}

fn is_stream_interface(iface: Node) -> bool {
    iface
        .children()
        .find(|c| is_element(c, "busType"))
        .and_then(|bus| attribute(bus, "name"))
        == Some(STREAM_BUS_TYPE)
}

fn stream_from_interface(module: &str, iface: Node) -> Option<Stream> {
    let Some(name) = child_text(iface, "name") else {
        warn!("{module}: skipping a stream interface without a name");
        return None;
    };
    let direction = if iface.children().any(|c| is_element(&c, "master")) {
        StreamDirection::Output
    } else if iface.children().any(|c| is_element(&c, "slave")) {
        StreamDirection::Input
    } else {
        warn!("{module}: stream '{name}' is neither master nor slave");
        StreamDirection::Unknown
    };
    Some(Stream::new(name, direction, stream_depth(module, name, iface)))
}

/// The depth is optional: a missing, repeated or unparsable parameter leaves it unset and
/// whichever stage needs it reports the failure.
fn stream_depth(module: &str, stream: &str, iface: Node) -> Option<u32> {
    let values: Vec<&str> = iface
        .descendants()
        .filter(|n| is_element(n, "parameter") && child_text(*n, "name") == Some(DEPTH_PARAMETER))
        .filter_map(|param| child_text(param, "value"))
        .collect();
    match values.as_slice() {
        [value] => match value.parse::<u32>() {
            Ok(depth) => Some(depth),
            Err(e) => {
                warn!("{module}: stream '{stream}' has unparsable {DEPTH_PARAMETER} '{value}': {e}");
                None
            }
        },
        [] => {
            warn!("{module}: stream '{stream}' declares no {DEPTH_PARAMETER}; depth left unset");
            None
        }
        _ => {
            warn!(
                "{module}: stream '{stream}' declares {DEPTH_PARAMETER} {} times; depth left unset",
                values.len()
            );
            None
        }
    }
}

fn vlnv(module: &str, component: Node) -> Option<String> {
    let parts: Vec<Option<&str>> = ["vendor", "library", "name", "version"]
        .iter()
        .map(|field| child_text(component, field))
        .collect();
    match parts.iter().copied().collect::<Option<Vec<&str>>>() {
        Some(parts) => Some(parts.join(":")),
        None => {
            warn!("{module}: interface descriptor has an incomplete VLNV identifier");
            None
        }
    }
}
