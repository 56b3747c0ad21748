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

//! DMA connectivity flags and bus widths derived from the streams each engine touches.

use crate::error::HwOverlayError;
use crate::hardware::{HardwareGraph, Module, StreamDirection, Target};
use log::{trace, warn};

/// Width used for any stream whose depth is not a power of two: two bytes.
pub static FALLBACK_WIDTH_BITS: u32 = 16;

/// Bus width in bits for a stream `depth_bytes` wide.
///
/// A power of two converts directly. Anything else, including zero, is clamped to
/// [`FALLBACK_WIDTH_BITS`].
pub fn derive_width_bits(depth_bytes: u32) -> u32 {
    match depth_bytes.checked_mul(8) {
        Some(bits) if depth_bytes.is_power_of_two() => bits,
        _ => FALLBACK_WIDTH_BITS,
    }
}

/// Derived state of one DMA module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmaPatch {
    pub module: String,
    pub out_connected: bool,
    pub mm2s_data_width: Option<u32>,
    pub s2mm_data_width: Option<u32>,
}

fn width_from_depth(module: &str, stream: &str, depth: Option<u32>) -> Option<u32> {
    let depth = depth?;
    let bits = derive_width_bits(depth);
    if !depth.is_power_of_two() {
        warn!("{module}: stream '{stream}' is {depth} bytes deep, not a power of two; using {bits} bits");
    }
    Some(bits)
}

/// Depth of the accelerator input stream a DMA feeds, once the target names it.
fn fed_stream_width(graph: &HardwareGraph, target: &Target) -> Option<u32> {
    let stream = target.stream.as_deref()?;
    let accelerator = graph.module(&target.module)?.as_accelerator()?;
    let depth = accelerator.interface.stream(stream)?.depth;
    width_from_depth(&target.module, stream, depth)
}

/// Depth of the first stream in `direction` of the accelerator writing into a DMA.
///
/// `None` when the writer declares no such stream. `Some(None)` when it does but the width
/// cannot be derived.
fn writer_stream_width(writer: &Module, direction: StreamDirection) -> Option<Option<u32>> {
    let stream = writer
        .as_accelerator()?
        .interface
        .streams_in(direction)
        .next()?;
    Some(width_from_depth(&writer.name, &stream.name, stream.depth))
}

/// Compute `out_connected` and both data widths for every DMA module.
///
/// Widths derived from a connected stream replace any declared value. A width that cannot be
/// derived keeps its declared value, and must then be present if the direction is in use:
/// `mm2s` for an engine that feeds an accelerator or receives one's output, `s2mm` for an
/// engine whose writer declares an output stream.
///
/// # Returns: `Result<Vec<DmaPatch>, HwOverlayError>`
/// * `Ok(Vec<DmaPatch>)` - One patch per DMA module, in declaration order
/// * `Err(HwOverlayError::ConnectionMismatch)` - Two accelerators write into one DMA
/// * `Err(HwOverlayError::IncompleteResolution)` - A used direction has no width
pub fn derive_dma_patches(graph: &HardwareGraph) -> Result<Vec<DmaPatch>, HwOverlayError> {
    let mut patches = Vec::new();
    for (module, dma) in graph.dma_modules() {
        let writers: Vec<&Module> = graph
            .accelerators()
            .filter(|acc| acc.output_to().is_some_and(|t| t.module == module.name))
            .collect();
        if writers.len() > 1 {
            let names: Vec<&str> = writers.iter().map(|w| w.name.as_str()).collect();
            return Err(HwOverlayError::ConnectionMismatch(format!(
                "{} receives the output of more than one accelerator: {}",
                module.name,
                names.join(", ")
            )));
        }
        let writer = writers.first().copied();
        if writer.is_none() && dma.output_to.is_none() {
            warn!("{} is not connected to any accelerator", module.name);
        }

        // An engine that feeds nothing itself takes its memory-to-fabric width from the input
        // side of the accelerator it drains.
        let mm2s_data_width = match &dma.output_to {
            Some(target) => fed_stream_width(graph, target),
            None => writer
                .and_then(|w| writer_stream_width(w, StreamDirection::Input))
                .flatten(),
        }
        .or(dma.mm2s_data_width);
        let written = writer.and_then(|w| writer_stream_width(w, StreamDirection::Output));
        let s2mm_data_width = written.flatten().or(dma.s2mm_data_width);

        if (dma.output_to.is_some() || writer.is_some()) && mm2s_data_width.is_none() {
            return Err(HwOverlayError::incomplete(&module.name, "mm2s_datawidth"));
        }
        if written.is_some() && s2mm_data_width.is_none() {
            return Err(HwOverlayError::incomplete(&module.name, "s2mm_datawidth"));
        }
        trace!(
            "{}: out_connected {}, mm2s {mm2s_data_width:?}, s2mm {s2mm_data_width:?}",
            module.name,
            writer.is_some()
        );
        patches.push(DmaPatch {
            module: module.name.clone(),
            out_connected: writer.is_some(),
            mm2s_data_width,
            s2mm_data_width,
        });
    }
    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{AcceleratorModule, DmaModule, IpInterface, ModuleKind, Stream};
    use googletest::prelude::*;
    use rstest::*;

    #[gtest]
    #[rstest]
    #[case::one_byte(1, 8)]
    #[case::two_bytes(2, 16)]
    #[case::four_bytes(4, 32)]
    #[case::eight_bytes(8, 64)]
    #[case::three_bytes(3, 16)]
    #[case::six_bytes(6, 16)]
    #[case::twelve_bytes(12, 16)]
    #[case::zero(0, 16)]
    #[case::too_wide(1 << 30, 16)]
    fn width_is_eight_times_depth_or_clamped(#[case] depth: u32, #[case] bits: u32) {
        expect_that!(derive_width_bits(depth), eq(bits));
    }

    #[test]
    fn power_of_two_depths_always_convert_exactly() {
        for shift in 0..29 {
            let depth = 1u32 << shift;
            assert_eq!(derive_width_bits(depth), depth * 8);
            if depth > 2 {
                assert_eq!(derive_width_bits(depth + 1), FALLBACK_WIDTH_BITS);
            }
        }
    }

    fn dma(name: &str, output_to: Option<Target>) -> Module {
        Module::new(
            name,
            ModuleKind::Dma(DmaModule {
                output_to,
                ..Default::default()
            }),
        )
    }

    fn accelerator(name: &str, streams: Vec<Stream>, output_to: Option<&str>) -> Module {
        Module::new(
            name,
            ModuleKind::Hls(AcceleratorModule {
                interface: IpInterface {
                    streams,
                    ..Default::default()
                },
                output_to: output_to.map(Target::parse),
            }),
        )
    }

    #[gtest]
    fn widths_follow_the_streams_on_both_sides() {
        let graph = HardwareGraph::new(vec![
            dma("dma0", Some(Target::stream("acc0", "in0"))),
            accelerator(
                "acc0",
                vec![
                    Stream::new("in0", StreamDirection::Input, Some(4)),
                    Stream::new("out0", StreamDirection::Output, Some(3)),
                ],
                Some("dma0"),
            ),
        ])
        .unwrap();

        expect_that!(
            derive_dma_patches(&graph),
            ok(elements_are![eq(&DmaPatch {
                module: "dma0".into(),
                out_connected: true,
                mm2s_data_width: Some(32),
                s2mm_data_width: Some(16),
            })])
        );
    }

    #[gtest]
    fn unconnected_dma_keeps_declared_widths() {
        let mut module = dma("dma0", None);
        if let Some(dma) = module.as_dma_mut() {
            dma.mm2s_data_width = Some(64);
        }
        let graph = HardwareGraph::new(vec![module]).unwrap();
        let patches = derive_dma_patches(&graph).unwrap();
        expect_that!(patches[0].out_connected, eq(false));
        expect_that!(patches[0].mm2s_data_width, some(eq(64)));
        expect_that!(patches[0].s2mm_data_width, none());
    }

    #[gtest]
    #[rstest]
    #[case::fed_stream_without_depth(
        vec![Stream::new("in0", StreamDirection::Input, None)],
        None,
        "'mm2s_datawidth'"
    )]
    #[case::written_stream_without_depth(
        vec![
            Stream::new("in0", StreamDirection::Input, Some(4)),
            Stream::new("out0", StreamDirection::Output, None),
        ],
        Some("dma0"),
        "'s2mm_datawidth'"
    )]
    fn missing_widths_are_incomplete(
        #[case] streams: Vec<Stream>,
        #[case] output_to: Option<&str>,
        #[case] field: &str,
    ) {
        let graph = HardwareGraph::new(vec![
            dma("dma0", Some(Target::stream("acc0", "in0"))),
            accelerator("acc0", streams, output_to),
        ])
        .unwrap();
        expect_that!(
            derive_dma_patches(&graph),
            err(all![
                displays_as(contains_substring("IncompleteResolution")),
                displays_as(contains_substring(field)),
            ])
        );
    }

    #[gtest]
    fn receiving_engine_takes_mm2s_from_the_writer_inputs() {
        let graph = HardwareGraph::new(vec![
            dma("dma0", None),
            accelerator(
                "acc0",
                vec![Stream::new("in0", StreamDirection::Input, Some(4))],
                Some("dma0"),
            ),
        ])
        .unwrap();

        expect_that!(
            derive_dma_patches(&graph),
            ok(elements_are![eq(&DmaPatch {
                module: "dma0".into(),
                out_connected: true,
                mm2s_data_width: Some(32),
                s2mm_data_width: None,
            })])
        );
    }

    #[gtest]
    fn writer_with_nothing_to_derive_from_is_incomplete() {
        let graph = HardwareGraph::new(vec![
            dma("dma0", None),
            accelerator("acc0", vec![], Some("dma0")),
        ])
        .unwrap();
        expect_that!(
            derive_dma_patches(&graph),
            err(displays_as(contains_substring("'mm2s_datawidth'")))
        );
    }

    #[gtest]
    fn two_writers_into_one_dma_is_a_mismatch() {
        let graph = HardwareGraph::new(vec![
            dma("dma0", None),
            accelerator("acc0", vec![], Some("dma0")),
            accelerator("acc1", vec![], Some("dma0")),
        ])
        .unwrap();
        expect_that!(
            derive_dma_patches(&graph),
            err(displays_as(contains_substring("acc0, acc1")))
        );
    }
}
