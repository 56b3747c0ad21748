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

//! The in-memory description of a fabric design.
//!
//! Both descriptor formats are parsed into a [`HardwareGraph`]: an ordered set of
//! [`Module`]s, each one of a closed set of kinds ([`ModuleKind`]). The graph is the only
//! value handed between pipeline stages.
//!
//! ```text
//!   dma0 ──mm2s──▶ acc0.arg_0   (DmaModule::output_to = "acc0.arg_0")
//!   acc0 ──s2mm──▶ dma1         (AcceleratorModule::output_to = "dma1", dma1.out_connected)
//! ```

pub mod graph;
pub mod module;

pub use graph::{Connection, HardwareGraph};
pub use module::{
    AcceleratorModule, ChannelDirection, DmaChannel, DmaModule, GpioModule, GpioParams,
    IpInterface, Module, ModuleKind, RegisterWindow, Stream, StreamDirection, Target,
};
