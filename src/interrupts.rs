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

//! Interrupt number allocation for DMA channels.
//!
//! Free numbers are picked from the live interrupt table, which on Linux is
//! `/proc/interrupts`:
//! ```text
//!            CPU0       CPU1
//!  11:      12345      23456     GICv2  30 Level     arch_timer
//! 121:          0          0     GICv2 121 Level     xilinx-dma-controller
//! IPI0:        22         31       Rescheduling interrupts
//! ```
//! Only rows whose first column is a plain number count. Numbers are searched from
//! [`SEARCH_FROM`] up to, not including, [`SEARCH_LIMIT`].
//!
//! The result is a snapshot. Nothing stops another driver from claiming a number between
//! allocation and installation, so only one generation run should happen at a time.
//!
//! The overlay does not carry the system numbers directly. Shared peripheral interrupts are
//! numbered from zero in device-tree cells, so every number is lowered by [`SPI_BASE`] before
//! it lands in an [`InterruptAssignment`].

use crate::error::HwOverlayError;
use crate::hardware::HardwareGraph;
use crate::system_io::fs_read;
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// First system interrupt number handed out.
pub static SEARCH_FROM: u32 = 121;
/// One past the last system interrupt number handed out.
pub static SEARCH_LIMIT: u32 = 256;
/// System number of shared peripheral interrupt zero.
pub static SPI_BASE: u32 = 32;

/// Anything that can report which interrupt numbers are already taken.
pub trait IrqSource {
    fn used_irqs(&self) -> Result<BTreeSet<u32>, HwOverlayError>;
}

/// The kernel's interrupt table.
#[derive(Debug, Clone)]
pub struct ProcInterrupts {
    path: PathBuf,
}

impl ProcInterrupts {
    pub fn new(path: &Path) -> Self {
        ProcInterrupts {
            path: path.to_path_buf(),
        }
    }
}

/// Numbers from the first column of an interrupt table. Header and named rows are skipped.
pub fn parse_interrupt_table(text: &str) -> BTreeSet<u32> {
    text.lines()
        .filter_map(|line| line.split(':').next())
        .map(str::trim)
        .filter(|first| !first.is_empty() && first.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|first| first.parse().ok())
        .collect()
}

impl IrqSource for ProcInterrupts {
    fn used_irqs(&self) -> Result<BTreeSet<u32>, HwOverlayError> {
        let used = parse_interrupt_table(&fs_read(&self.path)?);
        trace!("{} interrupt numbers in use according to {:?}", used.len(), self.path);
        Ok(used)
    }
}

/// A fixed set of used numbers.
impl IrqSource for BTreeSet<u32> {
    fn used_irqs(&self) -> Result<BTreeSet<u32>, HwOverlayError> {
        Ok(self.clone())
    }
}

/// Pick `count` distinct system interrupt numbers not currently in use.
///
/// # Returns: `Result<Vec<u32>, HwOverlayError>`
/// * `Ok(Vec<u32>)` - Exactly `count` ascending system numbers
/// * `Err(HwOverlayError::ResourceExhausted)` - Fewer than `count` free numbers in range
/// * `Err(HwOverlayError::IORead)` - The interrupt table could not be read
pub fn allocate_irqs(count: usize, source: &dyn IrqSource) -> Result<Vec<u32>, HwOverlayError> {
    let used = source.used_irqs()?;
    let free: Vec<u32> = (SEARCH_FROM..SEARCH_LIMIT)
        .filter(|irq| !used.contains(irq))
        .take(count)
        .collect();
    if free.len() < count {
        return Err(HwOverlayError::ResourceExhausted {
            requested: count,
            found: free.len(),
        });
    }
    debug!("Allocated interrupts {free:?}");
    Ok(free)
}

/// Overlay interrupt number for each DMA channel, keyed by module name and channel index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterruptAssignment {
    numbers: BTreeMap<(String, usize), u32>,
}

impl InterruptAssignment {
    /// Pair overlay numbers with the DMA channels of `graph`, walking modules and their
    /// channels in declaration order.
    pub fn from_overlay_numbers(
        graph: &HardwareGraph,
        numbers: &[u32],
    ) -> Result<Self, HwOverlayError> {
        if numbers.len() != graph.dma_channel_count() {
            return Err(HwOverlayError::Internal(format!(
                "{} interrupt numbers for {} DMA channels",
                numbers.len(),
                graph.dma_channel_count()
            )));
        }
        let channels = graph.dma_modules().flat_map(|(module, dma)| {
            (0..dma.channels.len()).map(move |index| (module.name.clone(), index))
        });
        Ok(InterruptAssignment {
            numbers: channels.zip(numbers.iter().copied()).collect(),
        })
    }

    /// As [`InterruptAssignment::from_overlay_numbers`], from system numbers.
    pub fn from_system_numbers(
        graph: &HardwareGraph,
        system_numbers: &[u32],
    ) -> Result<Self, HwOverlayError> {
        let overlay_numbers = system_numbers
            .iter()
            .map(|irq| {
                irq.checked_sub(SPI_BASE).ok_or_else(|| {
                    HwOverlayError::Internal(format!(
                        "interrupt {irq} is below the shared peripheral base {SPI_BASE}"
                    ))
                })
            })
            .collect::<Result<Vec<u32>, _>>()?;
        Self::from_overlay_numbers(graph, &overlay_numbers)
    }

    pub fn get(&self, module: &str, channel: usize) -> Option<u32> {
        self.numbers.get(&(module.to_string(), channel)).copied()
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}

/// Allocate one interrupt per DMA channel of `graph`.
pub fn assign_interrupts(
    graph: &HardwareGraph,
    source: &dyn IrqSource,
) -> Result<InterruptAssignment, HwOverlayError> {
    let system_numbers = allocate_irqs(graph.dma_channel_count(), source)?;
    InterruptAssignment::from_system_numbers(graph, &system_numbers)
}
