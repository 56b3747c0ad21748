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
use crate::hardware::module::{DmaModule, Module, ModuleKind, Target};
use std::collections::HashSet;

/// A directed edge from a stream source to an accelerator port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub source: String,
    pub target: Target,
}

impl Connection {
    /// The source named the exact stream rather than only the module.
    pub fn is_explicit(&self) -> bool {
        self.target.is_explicit()
    }
}

/// The set of fabric modules, in declaration order, with unique names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HardwareGraph {
    modules: Vec<Module>,
}

impl HardwareGraph {
    pub fn new(modules: Vec<Module>) -> Result<Self, HwOverlayError> {
        let mut seen = HashSet::new();
        for module in &modules {
            if !seen.insert(module.name.as_str()) {
                return Err(HwOverlayError::malformed(
                    &module.name,
                    "name",
                    "module name is declared more than once",
                ));
            }
        }
        Ok(HardwareGraph { modules })
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub(crate) fn module_mut(&mut self, name: &str) -> Option<&mut Module> {
        self.modules.iter_mut().find(|m| m.name == name)
    }

    pub fn dma_modules(&self) -> impl Iterator<Item = (&Module, &DmaModule)> {
        self.modules
            .iter()
            .filter_map(|m| m.as_dma().map(|dma| (m, dma)))
    }

    pub fn accelerators(&self) -> impl Iterator<Item = &Module> {
        self.modules
            .iter()
            .filter(|m| matches!(m.kind, ModuleKind::Hls(_)))
    }

    pub fn gpio_modules(&self) -> impl Iterator<Item = &Module> {
        self.modules
            .iter()
            .filter(|m| matches!(m.kind, ModuleKind::Gpio(_)))
    }

    /// Every source-to-accelerator edge currently declared, in source declaration order.
    pub fn connections(&self) -> Vec<Connection> {
        self.modules
            .iter()
            .filter(|m| m.is_stream_source())
            .filter_map(|m| {
                m.output_to().map(|target| Connection {
                    source: m.name.clone(),
                    target: target.clone(),
                })
            })
            .collect()
    }

    /// Sources whose declared target names `accelerator`, explicitly or not.
    pub fn sources_of(&self, accelerator: &str) -> Vec<Connection> {
        self.connections()
            .into_iter()
            .filter(|c| c.target.module == accelerator)
            .collect()
    }

    /// Total number of DMA channels across every DMA module.
    pub fn dma_channel_count(&self) -> usize {
        self.dma_modules().map(|(_, dma)| dma.channels.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::module::{AcceleratorModule, Target};
    use googletest::prelude::*;

    fn dma(name: &str, output_to: Option<Target>) -> Module {
        Module::new(
            name,
            ModuleKind::Dma(DmaModule {
                output_to,
                ..Default::default()
            }),
        )
    }

    #[gtest]
    fn duplicate_names_are_rejected() {
        let result = HardwareGraph::new(vec![dma("dma0", None), dma("dma0", None)]);
        expect_that!(
            result,
            err(displays_as(contains_substring("declared more than once")))
        );
    }

    #[gtest]
    fn sources_are_listed_in_declaration_order() {
        let graph = HardwareGraph::new(vec![
            dma("dmaB", Some(Target::stream("acc0", "s1"))),
            Module::new("acc0", ModuleKind::Hls(AcceleratorModule::default())),
            dma("dmaA", Some(Target::module("acc0"))),
            dma("dmaC", None),
        ])
        .unwrap();

        let sources: Vec<String> = graph
            .sources_of("acc0")
            .into_iter()
            .map(|c| c.source)
            .collect();
        expect_that!(sources, elements_are![eq("dmaB"), eq("dmaA")]);
        expect_that!(graph.connections().len(), eq(2));
    }
}
