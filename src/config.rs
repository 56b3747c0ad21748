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

//! Tool configuration.
//!
//! Values come from two optional TOML files, merged field by field: the user file
//! (`/etc/hwoverlay/config.toml`) wins over the vendor file
//! (`/usr/lib/hwoverlay/config.toml`), which wins over the hardcoded defaults in
//! [`system_config`].
//!
//! ```toml
//! [system_paths]
//! overlay_control_dir = "/config/device-tree/overlays/"
//! interrupts_path = "/proc/interrupts"
//!
//! [overlay]
//! overlay_name = "fabric"
//! dtc_binary = "/usr/bin/dtc"
//! ```

pub mod config_files;
pub mod system_config;

pub use system_config::{ToolConfig, tool_config};
