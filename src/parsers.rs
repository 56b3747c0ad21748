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

//! Descriptor parsers.
//!
//! Two entry paths produce a [`HardwareGraph`](crate::hardware::HardwareGraph):
//! - [`user_config`]: a hand written YAML module list, each accelerator enriched from its
//!   IP-XACT interface descriptor ([`ip_descriptor`]). Connections are left for the
//!   [`resolver`](crate::resolver).
//! - [`handoff`]: the hardware hand-off (`.hwh`) file generated by the design tool, located
//!   inside a project directory or `.hdf` archive by [`handoff_locator`].
//!
//! Required fields are validated eagerly. A missing one fails the whole parse with
//! [`HwOverlayError::MalformedDescriptor`] naming the module and the field.

pub mod handoff;
pub mod handoff_locator;
pub mod ip_descriptor;
pub mod user_config;

use crate::error::HwOverlayError;
use roxmltree::{Document, Node};
use std::path::Path;

/// Parse a hexadecimal field, with or without a `0x` prefix.
pub(crate) fn parse_hex(module: &str, field: &str, value: &str) -> Result<u64, HwOverlayError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(digits, 16).map_err(|e| {
        HwOverlayError::malformed(
            module,
            field,
            format!("'{value}' is not a hexadecimal value: {e}"),
        )
    })
}

/// Parse an integer field that may be written in decimal or, with a `0x` prefix, in hex.
pub(crate) fn parse_integer(module: &str, field: &str, value: &str) -> Result<u32, HwOverlayError> {
    let trimmed = value.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => trimmed.parse::<u32>(),
    };
    parsed.map_err(|e| {
        HwOverlayError::malformed(
            module,
            field,
            format!("'{value}' is not an integer value: {e}"),
        )
    })
}

pub(crate) fn parse_xml<'input>(
    text: &'input str,
    file: &Path,
) -> Result<Document<'input>, HwOverlayError> {
    Document::parse(text).map_err(|e| HwOverlayError::Xml {
        file: file.into(),
        e,
    })
}

/// Look up an attribute by local name, ignoring any namespace prefix.
pub(crate) fn attribute<'a>(node: Node<'a, '_>, local_name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|a| a.name() == local_name)
        .map(|a| a.value())
}

pub(crate) fn is_element(node: &Node, local_name: &str) -> bool {
    node.is_element() && node.tag_name().name() == local_name
}

/// Trimmed text of the first child element called `local_name`.
pub(crate) fn child_text<'a>(node: Node<'a, '_>, local_name: &str) -> Option<&'a str> {
    node.children()
        .find(|c| is_element(c, local_name))
        .and_then(|c| c.text())
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use rstest::*;

    #[gtest]
    #[rstest]
    #[case::prefixed("0x80000000", 0x8000_0000)]
    #[case::upper_prefix("0XA0000FFF", 0xa000_0fff)]
    #[case::bare("43c0ffff", 0x43c0_ffff)]
    #[case::padded(" 0x10 ", 0x10)]
    fn hex_values(#[case] text: &str, #[case] expected: u64) {
        expect_that!(parse_hex("m", "C_BASEADDR", text), ok(eq(&expected)));
    }

    #[gtest]
    fn bad_hex_names_module_and_field() {
        expect_that!(
            parse_hex("axi_dma_0", "C_HIGHADDR", "0xZZ"),
            err(displays_as(contains_substring(
                "module 'axi_dma_0' field 'C_HIGHADDR'"
            )))
        );
    }

    #[gtest]
    #[rstest]
    #[case::decimal("32", 32)]
    #[case::hex("0xFFFFFFFF", 0xffff_ffff)]
    #[case::zero("0", 0)]
    fn integer_values(#[case] text: &str, #[case] expected: u32) {
        expect_that!(parse_integer("m", "f", text), ok(eq(&expected)));
    }

    #[gtest]
    fn attributes_match_by_local_name() {
        let doc = Document::parse(
            r#"<a:root xmlns:a="urn:a"><a:child a:name="axis">text</a:child></a:root>"#,
        )
        .unwrap();
        let root = doc.root_element();
        let child = root.first_element_child().unwrap();
        expect_that!(attribute(child, "name"), some(eq("axis")));
        expect_that!(child_text(root, "child"), some(eq("text")));
    }
}
