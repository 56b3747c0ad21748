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

//! Resolution of FPGA fabric designs into device-tree overlays.
//!
//! Two inputs are understood. A hand written module list ([`parsers::user_config`]) is
//! resolved into a fully connected [`hardware::HardwareGraph`] by [`resolver`]. A vendor
//! hand-off design ([`parsers::handoff`]) is already complete and goes straight to
//! [`interrupts`] allocation and [`overlay`] generation. [`install`] compiles the overlay and
//! applies it to the running kernel. [`pipeline`] chains the stages for each entry point.

pub mod config;
pub mod error;
pub mod hardware;
pub mod install;
pub mod interrupts;
pub mod overlay;
pub mod parsers;
pub mod pipeline;
pub mod resolver;
pub mod system_io;
