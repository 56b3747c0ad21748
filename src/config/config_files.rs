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

use crate::error::HwOverlayError;
use crate::system_io::fs_read;
use serde::Deserialize;
use std::path::Path;

/// This is the top level struct which holds all sections
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TomlConfig {
    system_paths: Option<SystemPaths>,
    overlay: Option<OverlaySettings>,
}

/// The `[system_paths]` section: where live kernel state is read from and written to.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SystemPaths {
    pub(crate) overlay_control_dir: Option<String>,
    pub(crate) interrupts_path: Option<String>,
    pub(crate) process_status_path: Option<String>,
}

/// The `[overlay]` section: names baked into the generated overlay and the tools used on it.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct OverlaySettings {
    pub(crate) overlay_name: Option<String>,
    pub(crate) dtc_binary: Option<String>,
    pub(crate) target_label: Option<String>,
    pub(crate) clock_label: Option<String>,
    pub(crate) interrupt_parent_label: Option<String>,
}

impl SystemPaths {
    pub(crate) fn merge(self, fallback: SystemPaths) -> SystemPaths {
        SystemPaths {
            overlay_control_dir: self.overlay_control_dir.or(fallback.overlay_control_dir),
            interrupts_path: self.interrupts_path.or(fallback.interrupts_path),
            process_status_path: self.process_status_path.or(fallback.process_status_path),
        }
    }
}

impl OverlaySettings {
    pub(crate) fn merge(self, fallback: OverlaySettings) -> OverlaySettings {
        OverlaySettings {
            overlay_name: self.overlay_name.or(fallback.overlay_name),
            dtc_binary: self.dtc_binary.or(fallback.dtc_binary),
            target_label: self.target_label.or(fallback.target_label),
            clock_label: self.clock_label.or(fallback.clock_label),
            interrupt_parent_label: self
                .interrupt_parent_label
                .or(fallback.interrupt_parent_label),
        }
    }
}

impl TomlConfig {
    pub(crate) fn merge(self, fallback: TomlConfig) -> TomlConfig {
        TomlConfig {
            system_paths: Some(
                self.system_paths
                    .unwrap_or_default()
                    .merge(fallback.system_paths.unwrap_or_default()),
            ),
            overlay: Some(
                self.overlay
                    .unwrap_or_default()
                    .merge(fallback.overlay.unwrap_or_default()),
            ),
        }
    }

    pub(crate) fn into_sections(self) -> (SystemPaths, OverlaySettings) {
        (
            self.system_paths.unwrap_or_default(),
            self.overlay.unwrap_or_default(),
        )
    }
}

pub(crate) fn toml_str_to_config(
    toml_string: &str,
    file_path: &Path,
) -> Result<TomlConfig, HwOverlayError> {
    toml::from_str(toml_string).map_err(|e| HwOverlayError::TomlDe {
        file: file_path.into(),
        e,
    })
}

pub(crate) fn config_from_file(file_path: &Path) -> Result<TomlConfig, HwOverlayError> {
    if !file_path.is_file() {
        return Err(HwOverlayError::Internal(format!(
            "Config file not found in {file_path:?}"
        )));
    }
    toml_str_to_config(&fs_read(file_path)?, file_path)
}
