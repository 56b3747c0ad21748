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

use crate::common::test_functions::{compare_result, init_logging, test_data, used_irqs};
use googletest::prelude::*;
use hwoverlay::config::ToolConfig;
use hwoverlay::error::HwOverlayError;
use hwoverlay::install::configfs::ConfigfsInstaller;
use hwoverlay::install::dtc::DtcCompiler;
use hwoverlay::install::{OverlayCompiler, OverlayInstaller};
use hwoverlay::pipeline::{generate_overlay, install_overlay};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

static ROOT_STATUS: &str = "Name:\thwoverlay\nUid:\t0\t0\t0\t0\n";
static USER_STATUS: &str = "Name:\thwoverlay\nUid:\t1000\t1000\t1000\t1000\n";

/// Copies the source through unchanged, standing in for dtc.
struct CopyCompiler;

impl OverlayCompiler for CopyCompiler {
    fn compile(&self, source: &Path, output: &Path) -> Result<(), HwOverlayError> {
        fs::copy(source, output).unwrap();
        Ok(())
    }
}

#[derive(Default)]
struct RecordingInstaller {
    blob: RefCell<Option<Vec<u8>>>,
}

impl OverlayInstaller for RecordingInstaller {
    fn check_permitted(&self) -> Result<(), HwOverlayError> {
        Ok(())
    }

    fn install(&self, blob: &[u8]) -> Result<(), HwOverlayError> {
        *self.blob.borrow_mut() = Some(blob.to_vec());
        Ok(())
    }
}

fn config_in(dir: &TempDir, process_status: &str) -> ToolConfig {
    let status_path = dir.path().join("status");
    fs::write(&status_path, process_status).unwrap();
    let overlays = dir.path().join("overlays");
    fs::create_dir_all(&overlays).unwrap();
    ToolConfig {
        overlay_control_dir: overlays,
        process_status_path: status_path,
        ..Default::default()
    }
}

#[gtest]
fn generated_source_is_compiled_and_installed() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, ROOT_STATUS);
    let installer = RecordingInstaller::default();
    let design = test_data("handoff/design_1.hwh");

    let blob = install_overlay(
        &design,
        &config,
        &used_irqs(),
        &CopyCompiler,
        &installer,
        dir.path(),
    )
    .unwrap();

    let expected = generate_overlay(&design, &config, &used_irqs()).unwrap();
    expect_that!(blob, eq(&dir.path().join("hwoverlay.dtbo")));
    expect_that!(
        fs::read_to_string(dir.path().join("hwoverlay.dts")).unwrap(),
        eq(&expected)
    );
    expect_that!(
        *installer.blob.borrow(),
        some(eq(&expected.into_bytes()))
    );
}

#[gtest]
fn unprivileged_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, USER_STATUS);
    let work = TempDir::new().unwrap();

    let result = install_overlay(
        &test_data("handoff/design_1.hwh"),
        &config,
        &used_irqs(),
        &CopyCompiler,
        &ConfigfsInstaller::from_config(&config),
        work.path(),
    )
    .map(|blob| blob.display().to_string());

    compare_result(
        &result,
        &Err("HwOverlayError::Permission: installing an overlay requires root"),
    );
    expect_that!(fs::read_dir(work.path()).unwrap().count(), eq(0));
    expect_that!(config.overlay_control_dir.join("hwoverlay").exists(), eq(false));
}

#[gtest]
fn compiler_failure_leaves_the_overlay_slot_alone() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, ROOT_STATUS);

    let result = install_overlay(
        &test_data("handoff/design_1.hwh"),
        &config,
        &used_irqs(),
        &DtcCompiler::new("false"),
        &ConfigfsInstaller::from_config(&config),
        dir.path(),
    )
    .map(|blob| blob.display().to_string());

    compare_result(&result, &Err("HwOverlayError::ExternalToolFailure"));
    expect_that!(config.overlay_control_dir.join("hwoverlay").exists(), eq(false));
}

#[gtest]
fn blob_lands_in_the_configfs_slot() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir, ROOT_STATUS);
    let installer = ConfigfsInstaller::from_config(&config);

    // A plain directory has no kernel behind it to fill in `status`.
    let result = install_overlay(
        &test_data("handoff/design_1.hwh"),
        &config,
        &used_irqs(),
        &CopyCompiler,
        &installer,
        dir.path(),
    )
    .map(|blob| blob.display().to_string());

    compare_result(&result, &Err("HwOverlayError::IORead"));
    expect_that!(
        fs::read(installer.overlay_fs_path().join("dtbo")).unwrap(),
        eq(&fs::read(dir.path().join("hwoverlay.dtbo")).unwrap())
    );
}
