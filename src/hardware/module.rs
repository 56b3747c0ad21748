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
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Role of a streaming port as seen from the module that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamDirection {
    /// The port receives data (streaming slave).
    Input,
    /// The port initiates transfers (streaming master).
    Output,
    /// The descriptor declared neither role.
    Unknown,
}

/// A named streaming port on an accelerator or source module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    pub name: String,
    #[serde(rename = "type")]
    pub direction: StreamDirection,
    /// Transfer unit width in bytes, as declared by the interface descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

impl Stream {
    pub fn new(name: impl Into<String>, direction: StreamDirection, depth: Option<u32>) -> Self {
        Stream {
            name: name.into(),
            direction,
            depth,
        }
    }
}

/// Register window of a memory mapped module. `high_address` is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWindow {
    base_address: u64,
    high_address: u64,
}

impl RegisterWindow {
    /// Build a window, rejecting one whose size would not be positive or would not fit in 64
    /// bits.
    pub fn new(module: &str, base_address: u64, high_address: u64) -> Result<Self, HwOverlayError> {
        if high_address < base_address {
            return Err(HwOverlayError::malformed(
                module,
                "high_address",
                format!(
                    "high address 0x{high_address:08x} is below base address 0x{base_address:08x}"
                ),
            ));
        }
        if (high_address - base_address).checked_add(1).is_none() {
            return Err(HwOverlayError::malformed(
                module,
                "high_address",
                format!(
                    "window 0x{base_address:08x}..=0x{high_address:08x} covers the whole address space"
                ),
            ));
        }
        Ok(RegisterWindow {
            base_address,
            high_address,
        })
    }

    pub fn base_address(&self) -> u64 {
        self.base_address
    }

    pub fn high_address(&self) -> u64 {
        self.high_address
    }

    /// Inclusive size; [`RegisterWindow::new`] guarantees it is at least 1 and does not overflow.
    pub fn size(&self) -> u64 {
        self.high_address - self.base_address + 1
    }

    /// Absolute address of `offset` past the base.
    pub fn offset_address(&self, module: &str, offset: u64) -> Result<u64, HwOverlayError> {
        self.base_address.checked_add(offset).ok_or_else(|| {
            HwOverlayError::malformed(
                module,
                "address_offset",
                format!(
                    "offset 0x{offset:x} past base address 0x{:08x} overflows 64 bits",
                    self.base_address
                ),
            )
        })
    }
}

/// A connection target as written in a module list: `module` or `module.stream`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub module: String,
    pub stream: Option<String>,
}

impl Target {
    pub fn module(module: impl Into<String>) -> Self {
        Target {
            module: module.into(),
            stream: None,
        }
    }

    pub fn stream(module: impl Into<String>, stream: impl Into<String>) -> Self {
        Target {
            module: module.into(),
            stream: Some(stream.into()),
        }
    }

    /// Split on the first `.`; anything after it names the stream.
    pub fn parse(text: &str) -> Self {
        match text.split_once('.') {
            Some((module, stream)) => Target::stream(module.trim(), stream.trim()),
            None => Target::module(text.trim()),
        }
    }

    pub fn is_explicit(&self) -> bool {
        self.stream.is_some()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.stream {
            Some(stream) => write!(f, "{}.{}", self.module, stream),
            None => write!(f, "{}", self.module),
        }
    }
}

/// Data direction of a DMA channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelDirection {
    /// Memory to fabric.
    Mm2sOut,
    /// Fabric to memory.
    S2mmIn,
}

impl ChannelDirection {
    /// Device-tree compatible string of a channel node in this direction.
    pub fn compatible(&self) -> &'static str {
        match self {
            ChannelDirection::Mm2sOut => "xlnx,axi-dma-mm2s-channel",
            ChannelDirection::S2mmIn => "xlnx,axi-dma-s2mm-channel",
        }
    }

    /// Name of the control register that marks a channel in a hand-off descriptor.
    pub fn control_register(&self) -> &'static str {
        match self {
            ChannelDirection::Mm2sOut => "MM2S_DMACR",
            ChannelDirection::S2mmIn => "S2MM_DMACR",
        }
    }

    pub fn from_control_register(name: &str) -> Option<Self> {
        match name {
            "MM2S_DMACR" => Some(ChannelDirection::Mm2sOut),
            "S2MM_DMACR" => Some(ChannelDirection::S2mmIn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaChannel {
    pub direction: ChannelDirection,
    /// Offset of the channel's control register from the module base address.
    pub register_offset: u64,
}

/// An AXI DMA engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DmaModule {
    pub channels: Vec<DmaChannel>,
    /// Width in bits of the memory-to-fabric stream.
    pub mm2s_data_width: Option<u32>,
    /// Width in bits of the fabric-to-memory stream.
    pub s2mm_data_width: Option<u32>,
    pub clock_names: Vec<String>,
    /// The accelerator input this engine feeds. Resolution makes the stream explicit.
    pub output_to: Option<Target>,
    /// Some accelerator's output is written to memory by this engine.
    pub out_connected: bool,
}

impl DmaModule {
    /// Data width of the channel in `direction`, if resolved.
    pub fn data_width(&self, direction: ChannelDirection) -> Option<u32> {
        match direction {
            ChannelDirection::Mm2sOut => self.mm2s_data_width,
            ChannelDirection::S2mmIn => self.s2mm_data_width,
        }
    }
}

/// Streaming ports and identity read from a module's interface descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IpInterface {
    pub streams: Vec<Stream>,
    /// `vendor:library:name:version`
    pub vlnv: Option<String>,
    pub descriptor: Option<PathBuf>,
}

impl IpInterface {
    pub fn streams_in(&self, direction: StreamDirection) -> impl Iterator<Item = &Stream> {
        self.streams.iter().filter(move |s| s.direction == direction)
    }

    pub fn stream(&self, name: &str) -> Option<&Stream> {
        self.streams.iter().find(|s| s.name == name)
    }
}

/// An accelerator core, or a passthrough streaming source such as a camera interface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AcceleratorModule {
    pub interface: IpInterface,
    /// For accelerators, the DMA engine receiving this module's output. For sources, the
    /// accelerator input they feed.
    pub output_to: Option<Target>,
}

/// The eleven configuration parameters of an AXI GPIO block. Together with the register
/// window they make up the thirteen values a hand-off record must declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioParams {
    pub all_inputs: u32,
    pub all_inputs_2: u32,
    pub all_outputs: u32,
    pub all_outputs_2: u32,
    pub dout_default: u32,
    pub dout_default_2: u32,
    pub tri_default: u32,
    pub tri_default_2: u32,
    pub gpio_width: u32,
    pub gpio2_width: u32,
    pub is_dual: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GpioModule {
    pub interface: IpInterface,
    /// Present for modules read from a hand-off descriptor.
    pub params: Option<GpioParams>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleKind {
    Dma(DmaModule),
    Hls(AcceleratorModule),
    Gpio(GpioModule),
    Csi(AcceleratorModule),
}

impl ModuleKind {
    /// The lowercase type tag used in module lists.
    pub fn type_tag(&self) -> &'static str {
        match self {
            ModuleKind::Dma(_) => "dma",
            ModuleKind::Hls(_) => "hls",
            ModuleKind::Gpio(_) => "gpio",
            ModuleKind::Csi(_) => "csi",
        }
    }
}

/// A block instantiated on the programmable logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    /// Known for modules read from a hand-off descriptor.
    pub window: Option<RegisterWindow>,
    pub kind: ModuleKind,
}

impl Module {
    pub fn new(name: impl Into<String>, kind: ModuleKind) -> Self {
        Module {
            name: name.into(),
            window: None,
            kind,
        }
    }

    pub fn with_window(mut self, window: RegisterWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn as_dma(&self) -> Option<&DmaModule> {
        match &self.kind {
            ModuleKind::Dma(dma) => Some(dma),
            _ => None,
        }
    }

    pub fn as_dma_mut(&mut self) -> Option<&mut DmaModule> {
        match &mut self.kind {
            ModuleKind::Dma(dma) => Some(dma),
            _ => None,
        }
    }

    pub fn as_accelerator(&self) -> Option<&AcceleratorModule> {
        match &self.kind {
            ModuleKind::Hls(hls) => Some(hls),
            _ => None,
        }
    }

    /// The module's declared downstream target, whatever its kind.
    pub fn output_to(&self) -> Option<&Target> {
        match &self.kind {
            ModuleKind::Dma(dma) => dma.output_to.as_ref(),
            ModuleKind::Hls(acc) | ModuleKind::Csi(acc) => acc.output_to.as_ref(),
            ModuleKind::Gpio(_) => None,
        }
    }

    /// DMA engines and passthrough sources can feed accelerator inputs.
    pub fn is_stream_source(&self) -> bool {
        matches!(self.kind, ModuleKind::Dma(_) | ModuleKind::Csi(_))
    }

    pub fn interface(&self) -> Option<&IpInterface> {
        match &self.kind {
            ModuleKind::Hls(acc) | ModuleKind::Csi(acc) => Some(&acc.interface),
            ModuleKind::Gpio(gpio) => Some(&gpio.interface),
            ModuleKind::Dma(_) => None,
        }
    }
}
