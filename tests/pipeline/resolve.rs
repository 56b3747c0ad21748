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

use crate::common::test_functions::{compare_result, init_logging, test_data};
use googletest::prelude::*;
use hwoverlay::hardware::{Module, Target};
use hwoverlay::parsers::user_config::parse_module_list;
use hwoverlay::pipeline::resolve_user_config;
use hwoverlay::resolver::resolve;
use rstest::*;
use std::fs;
use tempfile::TempDir;

#[gtest]
fn loopback_design_resolves() {
    init_logging();
    let design = resolve_user_config(&test_data("user/hwconfig.user")).unwrap();
    let graph = &design.graph;

    let dma0 = graph.module("dma0").and_then(Module::as_dma).unwrap();
    expect_that!(dma0.out_connected, eq(true));
    expect_that!(dma0.s2mm_data_width, some(eq(64)));
    // dma0 feeds nothing, so its read side follows acc0's first input
    expect_that!(dma0.mm2s_data_width, some(eq(32)));

    let dma1 = graph.module("dma1").and_then(Module::as_dma).unwrap();
    expect_that!(dma1.output_to, some(eq(&Target::stream("acc0", "arg_0"))));
    expect_that!(dma1.mm2s_data_width, some(eq(32)));
    expect_that!(dma1.out_connected, eq(false));

    // arg_1 is three bytes deep, which falls back to the default width
    let dma2 = graph.module("dma2").and_then(Module::as_dma).unwrap();
    expect_that!(dma2.output_to, some(eq(&Target::stream("acc0", "arg_1"))));
    expect_that!(dma2.mm2s_data_width, some(eq(16)));

    let acc0 = graph.module("acc0").and_then(Module::as_accelerator).unwrap();
    expect_that!(
        acc0.interface.vlnv,
        some(eq("xilinx.com:hls:hls_target:1.0"))
    );
    expect_that!(graph.sources_of("acc0").len(), eq(2));
}

#[gtest]
fn accelerator_without_sources_still_drains() {
    init_logging();
    let design = resolve_user_config(&test_data("user/drain_only.user")).unwrap();
    let graph = &design.graph;

    let dma0 = graph.module("dma0").and_then(Module::as_dma).unwrap();
    expect_that!(dma0.out_connected, eq(true));
    expect_that!(dma0.mm2s_data_width, some(eq(32)));
    expect_that!(dma0.s2mm_data_width, some(eq(64)));
    expect_that!(graph.sources_of("acc0"), is_empty());
}

#[gtest]
fn annotations_describe_the_loop() {
    let design = resolve_user_config(&test_data("user/hwconfig.user")).unwrap();
    let annotations = &design.annotations;

    expect_that!(
        annotations,
        contains_substring("dmas = <&dma1>, <&dma2>, <&dma0>;")
    );
    expect_that!(
        annotations,
        contains_substring(
            "&dma0 {\n    hw-name = \"dma0\";\n    compatible = \"hls-dma\";\n    direction = <2>;\n    hls-node = <&acc0>;\n};"
        )
    );
    expect_that!(
        annotations,
        contains_substring(
            "&dma1 {\n    hw-name = \"dma1\";\n    compatible = \"hls-dma\";\n    direction = <1>;\n    hls-node = <&acc0>;\n};"
        )
    );
    let acc = annotations.find("&acc0 {").unwrap();
    let dma0 = annotations.find("&dma0 {").unwrap();
    expect_that!(acc, lt(dma0));
}

#[gtest]
fn resolved_list_reads_back_and_resolves_to_itself() {
    let design = resolve_user_config(&test_data("user/hwconfig.user")).unwrap();
    expect_that!(design.yaml, contains_substring("outputto: acc0.arg_0"));
    expect_that!(design.yaml, contains_substring("out_connected: true"));

    // Streams are carried in the list itself, so the descriptors need not be next to it.
    let dir = TempDir::new().unwrap();
    let resolved_path = dir.path().join("hwconfig.resolved");
    fs::write(&resolved_path, &design.yaml).unwrap();

    let reread = parse_module_list(&resolved_path).unwrap();
    expect_that!(reread, eq(&design.graph));
    expect_that!(resolve(&reread), ok(eq(&design.graph)));
}

#[gtest]
#[rstest]
#[case::stream_count(
    "user/mismatch.user",
    Err("HwOverlayError::ConnectionMismatch: acc0 has 2 input streams but 1 sources output to it")
)]
#[case::loading_order(
    "user/wrong_order.user",
    Err("the first declared DMA (dma1) must be the one receiving accelerator output")
)]
#[case::missing_file("user/absent.user", Err("HwOverlayError::IORead"))]
fn broken_lists_are_rejected(#[case] file: &str, #[case] expected: Result<&str, &str>) {
    init_logging();
    let result = resolve_user_config(&test_data(file)).map(|design| design.yaml);
    compare_result(&result, &expected);
}
