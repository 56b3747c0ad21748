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

use crate::common::test_functions::{
    compare_result, init_logging, test_data, used_irqs, write_handoff_archive,
};
use googletest::prelude::*;
use hwoverlay::config::ToolConfig;
use hwoverlay::pipeline::{generate_overlay, load_handoff};
use rstest::*;
use std::collections::BTreeSet;
use std::path::Path;
use tempfile::TempDir;

fn generate(path: &Path) -> String {
    generate_overlay(path, &ToolConfig::default(), &used_irqs()).unwrap()
}

#[gtest]
fn handoff_file_becomes_an_overlay() {
    init_logging();
    let overlay = generate(&test_data("handoff/design_1.hwh"));

    expect_that!(
        overlay,
        starts_with("/dts-v1/;\n/plugin/;\n\n/ {\n    fragment@0 {\n        target = <&amba_pl>;\n")
    );
    let dma = [
        "            axi_dma_0: dma@0xa0010000 {",
        "                #dma-cells = <1>;",
        "                clock-names = \"s_axi_lite_aclk\", \"m_axi_sg_aclk\", \"m_axi_mm2s_aclk\", \"m_axi_s2mm_aclk\";",
        "                clocks = <&misc_clk_0>, <&misc_clk_0>, <&misc_clk_0>, <&misc_clk_0>;",
        "                compatible = \"xlnx,axi-dma-1.00.a\";",
        "                interrupt-parent = <&gic>;",
        "                interrupts = <0 91 4 0 92 4>;",
        "                reg = <0x0 0xa0010000 0x0 0x10000>;",
        "                xlnx,addrwidth = <0x20>;",
        "                xlnx,include-sg;",
        "                xlnx,multichannel-dma;",
        "                dma-channel@a0010000 {",
        "                    compatible = \"xlnx,axi-dma-mm2s-channel\";",
        "                    dma-channels = <0x1>;",
        "                    interrupts = <0 91 4>;",
        "                    xlnx,datawidth = <0x10>;",
        "                    xlnx,device-id = <0x0>;",
        "                };",
        "                dma-channel@a0010030 {",
        "                    compatible = \"xlnx,axi-dma-s2mm-channel\";",
        "                    dma-channels = <0x1>;",
        "                    interrupts = <0 92 4>;",
    ]
    .join("\n");
    expect_that!(overlay, contains_substring(dma));
    expect_that!(
        overlay,
        contains_substring(
            "            hls_target_0: hls_target@a0000000 {\n                compatible = \"xlnx,hls-target-1.0\";\n                reg = <0x0 0xa0000000 0x0 0x10000>;\n            };"
        )
    );
    expect_that!(
        overlay,
        contains_substring("            axi_gpio_0: gpio@a0020000 {")
    );
    expect_that!(overlay, contains_substring("xlnx,all-outputs = <0x1>;"));
    expect_that!(overlay, contains_substring("xlnx,tri-default = <0xffffffff>;"));
    expect_that!(overlay, not(contains_substring("zynq_ultra_ps_e")));
    expect_that!(
        overlay.matches('{').count(),
        eq(overlay.matches("};").count())
    );
}

#[gtest]
fn every_accepted_input_yields_the_same_overlay() {
    let expected = generate(&test_data("handoff/design_1.hwh"));

    expect_that!(generate(&test_data("handoff")), eq(&expected));

    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("design_1_wrapper.hdf");
    write_handoff_archive(&archive);
    expect_that!(generate(&archive), eq(&expected));
    expect_that!(generate(dir.path()), eq(&expected));
}

#[gtest]
fn archive_is_parsed_without_extraction() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("design_1_wrapper.hdf");
    write_handoff_archive(&archive);
    let graph = load_handoff(&archive).unwrap();
    expect_that!(graph.modules().len(), eq(3));
    expect_that!(graph.dma_channel_count(), eq(2));
}

#[gtest]
fn configured_labels_are_used() {
    let config = ToolConfig {
        target_label: "fpga_full".into(),
        clock_label: "pl_clk0".into(),
        interrupt_parent_label: "gic_v2".into(),
        ..Default::default()
    };
    let overlay =
        generate_overlay(&test_data("handoff/design_1.hwh"), &config, &used_irqs()).unwrap();
    expect_that!(overlay, contains_substring("target = <&fpga_full>;"));
    expect_that!(overlay, contains_substring("clocks = <&pl_clk0>,"));
    expect_that!(overlay, contains_substring("interrupt-parent = <&gic_v2>;"));
    expect_that!(overlay, not(contains_substring("misc_clk_0")));
}

#[gtest]
#[rstest]
#[case::no_design("user", Err("HwOverlayError::Argument"))]
#[case::wrong_extension("user/hwconfig.user", Err("HwOverlayError::Argument"))]
#[case::missing("handoff/absent.hwh", Err("HwOverlayError::Argument"))]
fn unusable_inputs_are_rejected(#[case] path: &str, #[case] expected: Result<&str, &str>) {
    let result = generate_overlay(&test_data(path), &ToolConfig::default(), &used_irqs());
    compare_result(&result, &expected);
}

#[gtest]
fn full_interrupt_table_stops_generation() {
    let everything: BTreeSet<u32> = (0..256).collect();
    let result = generate_overlay(
        &test_data("handoff/design_1.hwh"),
        &ToolConfig::default(),
        &everything,
    );
    compare_result(
        &result,
        &Err("cannot find 2 free interrupt numbers, only 0 available"),
    );
}
