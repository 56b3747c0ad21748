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

//! Device-tree overlay source generation.
//!
//! - [`document`]: the node tree and its exact text form
//! - [`emitter`]: the loadable overlay for a hand-off design
//! - [`annotations`]: connection annotations for a hand written design

pub mod annotations;
pub mod document;
pub mod emitter;

pub use annotations::emit_annotations;
pub use emitter::{build_overlay, emit_overlay};
