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

//! Device-tree source tree and its text form.
//!
//! Rendering is fixed: four spaces per nesting level, one property per line, every property
//! and node closed with `;`. Values render as:
//!
//! | [`PropertyValue`]          | text                  |
//! |----------------------------|-----------------------|
//! | `Flag`                     | `name;`               |
//! | `Strings(["a", "b"])`      | `name = "a", "b";`    |
//! | `Cells(["0x0", "0x1"])`    | `name = <0x0 0x1>;`   |
//! | `CellGroups([["&a"], ["&b"]])` | `name = <&a>, <&b>;` |

use std::fmt;

static INDENT: &str = "    ";

/// Format an integer as a single hex cell, e.g. `0x20`.
pub fn hex_cell(value: u64) -> String {
    format!("0x{value:x}")
}

/// A phandle reference cell, e.g. `&gic`.
pub fn reference(label: &str) -> String {
    format!("&{label}")
}

/// The value side of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Flag,
    Strings(Vec<String>),
    Cells(Vec<String>),
    CellGroups(Vec<Vec<String>>),
}

impl PropertyValue {
    pub fn string(value: &str) -> Self {
        PropertyValue::Strings(vec![value.to_string()])
    }

    pub fn cell(value: impl Into<String>) -> Self {
        PropertyValue::Cells(vec![value.into()])
    }

    /// One `<&label>` group per label.
    pub fn references<S: AsRef<str>>(labels: &[S]) -> Self {
        PropertyValue::CellGroups(
            labels
                .iter()
                .map(|l| vec![reference(l.as_ref())])
                .collect(),
        )
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Flag => Ok(()),
            PropertyValue::Strings(values) => {
                let quoted: Vec<String> = values.iter().map(|v| format!("\"{v}\"")).collect();
                write!(f, " = {}", quoted.join(", "))
            }
            PropertyValue::Cells(cells) => write!(f, " = <{}>", cells.join(" ")),
            PropertyValue::CellGroups(groups) => {
                let groups: Vec<String> = groups
                    .iter()
                    .map(|cells| format!("<{}>", cells.join(" ")))
                    .collect();
                write!(f, " = {}", groups.join(", "))
            }
        }
    }
}

/// A node with its label, ordered properties and ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DtNode {
    pub label: Option<String>,
    /// Full node name including any unit address, e.g. `dma@0x40400000`, or a `&label`
    /// reference for nodes extending an existing one.
    pub name: String,
    pub properties: Vec<(String, PropertyValue)>,
    pub children: Vec<DtNode>,
}

impl DtNode {
    pub fn new(name: impl Into<String>) -> Self {
        DtNode {
            label: None,
            name: name.into(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn property(mut self, name: &str, value: PropertyValue) -> Self {
        self.properties.push((name.to_string(), value));
        self
    }

    pub fn flag(self, name: &str) -> Self {
        self.property(name, PropertyValue::Flag)
    }

    pub fn child(mut self, node: DtNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = DtNode>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = INDENT.repeat(depth);
        match &self.label {
            Some(label) => writeln!(f, "{indent}{label}: {} {{", self.name)?,
            None => writeln!(f, "{indent}{} {{", self.name)?,
        }
        for (name, value) in &self.properties {
            writeln!(f, "{indent}{INDENT}{name}{value};")?;
        }
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        writeln!(f, "{indent}}};")
    }
}

impl fmt::Display for DtNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// A complete overlay source file: header directives followed by the root node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayDocument {
    pub root: DtNode,
}

impl fmt::Display for OverlayDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "/dts-v1/;")?;
        writeln!(f, "/plugin/;")?;
        writeln!(f)?;
        self.root.write_indented(f, 0)
    }
}
