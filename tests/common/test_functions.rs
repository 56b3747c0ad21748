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

use googletest::prelude::*;
use hwoverlay::error::HwOverlayError;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;

pub fn test_data(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/test_data")
        .join(relative)
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Interrupt numbers an imaginary board has already handed out above the search start.
pub fn used_irqs() -> BTreeSet<u32> {
    [27, 48, 121, 122].into_iter().collect()
}

/// Pack the extracted hand-off bundle into a `.hdf` archive at `path`.
pub fn write_handoff_archive(path: &Path) {
    let mut writer = zip::ZipWriter::new(fs::File::create(path).unwrap());
    for name in ["sysdef.xml", "design_1.hwh"] {
        let text = fs::read(test_data("handoff").join(name)).unwrap();
        writer
            .start_file(name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(&text).unwrap();
    }
    writer.finish().unwrap();
}

pub fn compare_result(res: &Result<String, HwOverlayError>, exp: &Result<&str, &str>) {
    match (res, exp) {
        (Ok(res_s), Ok(exp_s)) => {
            assert_that!(
                res_s.to_string(),
                contains_substring(*exp_s),
                "Mismatched output"
            );
        }
        (Err(res_err), Err(exp_err)) => {
            assert_that!(
                res_err.to_string(),
                contains_substring(*exp_err),
                "Mismatched error signature"
            );
        }
        (res, exp) => {
            panic!("Result mismatch: got {res:?}, expected {exp:?}");
        }
    }
}
