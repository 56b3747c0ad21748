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

//! The single error type shared by every stage of the pipeline.
//!
//! Each message begins with `HwOverlayError::<Variant>:` so that a diagnostic printed by the
//! binary can be matched against the kind of failure without access to the enum itself.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HwOverlayError {
    /// A required field is missing from, or invalid in, an input descriptor.
    #[error("HwOverlayError::MalformedDescriptor: module '{module}' field '{field}': {reason}")]
    MalformedDescriptor {
        module: String,
        field: String,
        reason: String,
    },
    /// Declared and available stream counts disagree, or a target does not resolve.
    #[error("HwOverlayError::ConnectionMismatch: {0}")]
    ConnectionMismatch(String),
    /// A derived field is still absent after resolution.
    #[error(
        "HwOverlayError::IncompleteResolution: module '{module}' has no value for '{field}' after resolution"
    )]
    IncompleteResolution { module: String, field: String },
    #[error(
        "HwOverlayError::ResourceExhausted: cannot find {requested} free interrupt numbers, only {found} available"
    )]
    ResourceExhausted { requested: usize, found: usize },
    #[error("HwOverlayError::ExternalToolFailure: {tool} failed: {message}")]
    ExternalToolFailure { tool: String, message: String },
    #[error("HwOverlayError::Argument: {0}")]
    Argument(String),
    #[error("HwOverlayError::Permission: {0}")]
    Permission(String),
    #[error("HwOverlayError::OverlayStatus: Overlay was not applied: {0}")]
    OverlayStatus(String),
    #[error("HwOverlayError::IORead: An IO error occurred when reading from {file:?}: {e}")]
    IORead { file: PathBuf, e: std::io::Error },
    #[error("HwOverlayError::IOWrite: An IO error occurred when writing to {file:?}: {e}")]
    IOWrite { file: PathBuf, e: std::io::Error },
    #[error("HwOverlayError::IOCreate: An IO error occurred when creating {file:?}: {e}")]
    IOCreate { file: PathBuf, e: std::io::Error },
    #[error("HwOverlayError::IODelete: An IO error occurred when deleting {file:?}: {e}")]
    IODelete { file: PathBuf, e: std::io::Error },
    #[error("HwOverlayError::IOReadDir: An IO error occurred when reading directory {dir:?}: {e}")]
    IOReadDir { dir: PathBuf, e: std::io::Error },
    #[error("HwOverlayError::Xml: Failed to parse XML from {file:?}: {e}")]
    Xml { file: PathBuf, e: roxmltree::Error },
    #[error("HwOverlayError::Yaml: Failed to process YAML for {file:?}: {e}")]
    Yaml {
        file: PathBuf,
        e: serde_yaml::Error,
    },
    #[error("HwOverlayError::TomlDe: Failed to parse config {file:?}: {e}")]
    TomlDe {
        file: PathBuf,
        e: toml::de::Error,
    },
    #[error("HwOverlayError::Archive: Failed to read archive {file:?}: {e}")]
    Archive {
        file: PathBuf,
        e: zip::result::ZipError,
    },
    #[error("HwOverlayError::Internal: An Internal error occurred: {0}")]
    Internal(String),
}

impl HwOverlayError {
    pub(crate) fn malformed(
        module: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        HwOverlayError::MalformedDescriptor {
            module: module.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn incomplete(module: impl Into<String>, field: impl Into<String>) -> Self {
        HwOverlayError::IncompleteResolution {
            module: module.into(),
            field: field.into(),
        }
    }
}
