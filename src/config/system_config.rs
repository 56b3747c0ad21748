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

use crate::config::config_files::{OverlaySettings, SystemPaths, TomlConfig, config_from_file};
use log::{trace, warn};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// These are hardcoded backups used whenever neither config file provides a value
pub static OVERLAY_CONTROL_DIR: &str = "/sys/kernel/config/device-tree/overlays/";
pub static INTERRUPTS_PATH: &str = "/proc/interrupts";
pub static PROCESS_STATUS_PATH: &str = "/proc/self/status";
pub static OVERLAY_NAME: &str = "hwoverlay";
pub static DTC_BINARY: &str = "dtc";
pub static TARGET_LABEL: &str = "amba_pl";
pub static CLOCK_LABEL: &str = "misc_clk_0";
pub static INTERRUPT_PARENT_LABEL: &str = "gic";

pub static VENDOR_CONFIG_PATH: &str = "/usr/lib/hwoverlay/config.toml";
pub static USER_CONFIG_PATH: &str = "/etc/hwoverlay/config.toml";

/// Fully resolved configuration. Every field has a value once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Configfs directory holding one sub-directory per applied overlay.
    pub overlay_control_dir: PathBuf,
    /// Line oriented interrupt table of the running kernel.
    pub interrupts_path: PathBuf,
    /// Status file of the current process, used for the privilege check.
    pub process_status_path: PathBuf,
    /// Name of the single overlay slot this tool installs into.
    pub overlay_name: String,
    pub dtc_binary: String,
    /// Label of the programmable-logic bus node the fragment targets.
    pub target_label: String,
    pub clock_label: String,
    pub interrupt_parent_label: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        (SystemPaths::default(), OverlaySettings::default()).into()
    }
}

impl From<(SystemPaths, OverlaySettings)> for ToolConfig {
    fn from((paths, overlay): (SystemPaths, OverlaySettings)) -> Self {
        trace!("Creating ToolConfig from {paths:?} and {overlay:?}");
        ToolConfig {
            overlay_control_dir: PathBuf::from(
                paths
                    .overlay_control_dir
                    .unwrap_or_else(|| OVERLAY_CONTROL_DIR.to_string()),
            ),
            interrupts_path: PathBuf::from(
                paths
                    .interrupts_path
                    .unwrap_or_else(|| INTERRUPTS_PATH.to_string()),
            ),
            process_status_path: PathBuf::from(
                paths
                    .process_status_path
                    .unwrap_or_else(|| PROCESS_STATUS_PATH.to_string()),
            ),
            overlay_name: overlay
                .overlay_name
                .unwrap_or_else(|| OVERLAY_NAME.to_string()),
            dtc_binary: overlay.dtc_binary.unwrap_or_else(|| DTC_BINARY.to_string()),
            target_label: overlay
                .target_label
                .unwrap_or_else(|| TARGET_LABEL.to_string()),
            clock_label: overlay
                .clock_label
                .unwrap_or_else(|| CLOCK_LABEL.to_string()),
            interrupt_parent_label: overlay
                .interrupt_parent_label
                .unwrap_or_else(|| INTERRUPT_PARENT_LABEL.to_string()),
        }
    }
}

impl ToolConfig {
    /// User config overrides vendor config and vendor config overrides hardcoded defaults.
    /// A file that is missing or fails to parse is skipped with a warning.
    pub fn from_files(user_path: &Path, vendor_path: &Path) -> ToolConfig {
        let vendor_config = config_from_file(vendor_path).unwrap_or_else(|e| {
            warn!("Using hardcoded values for vendor config because loading config failed: {e}");
            TomlConfig::default()
        });
        let user_config = config_from_file(user_path).unwrap_or_else(|e| {
            warn!("Using hardcoded values for user config because loading config failed: {e}");
            TomlConfig::default()
        });
        trace!("Merging user_config: {user_config:?} with vendor_config {vendor_config:?}");
        let ret: ToolConfig = user_config.merge(vendor_config).into_sections().into();
        trace!("Resulting config: {ret:?}");
        ret
    }
}

static CONFIG: OnceLock<ToolConfig> = OnceLock::new();

/// The process-wide configuration, loaded from the standard locations on first use.
pub fn tool_config() -> &'static ToolConfig {
    CONFIG.get_or_init(|| {
        ToolConfig::from_files(Path::new(USER_CONFIG_PATH), Path::new(VENDOR_CONFIG_PATH))
    })
}
