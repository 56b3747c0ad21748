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

//! Finding the hand-off file inside whatever the design tool exported.
//!
//! The design tool ships its hand-off as a `.hdf` zip archive holding a `sysdef.xml` index
//! and one `.hwh` per block design. Accepted inputs, in order of precedence:
//! - a `.hwh` file, used as is
//! - a directory holding an extracted archive (has `sysdef.xml`)
//! - a directory holding a `.hdf` archive
//! - a `.hdf` archive

use crate::error::HwOverlayError;
use crate::parsers::{attribute, is_element, parse_xml};
use crate::system_io::{fs_open, fs_read, fs_read_dir};
use log::{debug, trace};
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

pub static SYSDEF_FILE_NAME: &str = "sysdef.xml";
static HANDOFF_EXTENSION: &str = "hwh";
static ARCHIVE_EXTENSION: &str = "hdf";
static DEFAULT_DESIGN_TYPE: &str = "DEFAULT_BD";

/// The hand-off text and where it came from. `origin` is a plain path for files on disk and
/// `<archive>/<entry>` for archive members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffSource {
    pub origin: PathBuf,
    pub text: String,
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|e| e == extension)
}

/// Locate and read the default block design's hand-off file under `path`.
///
/// # Returns: `Result<HandoffSource, HwOverlayError>`
/// * `Ok(HandoffSource)` - The hand-off text
/// * `Err(HwOverlayError::Argument)` - `path` is none of the accepted inputs
/// * `Err(HwOverlayError::MalformedDescriptor)` - `sysdef.xml` names no default design
/// * `Err(HwOverlayError::Archive)` - The archive or one of its members cannot be read
pub fn locate_handoff(path: &Path) -> Result<HandoffSource, HwOverlayError> {
    if path.is_file() && has_extension(path, HANDOFF_EXTENSION) {
        debug!("Using hand-off file {path:?}");
        return Ok(HandoffSource {
            origin: path.to_path_buf(),
            text: fs_read(path)?,
        });
    }
    if path.is_file() && has_extension(path, ARCHIVE_EXTENSION) {
        return read_from_archive(path);
    }
    if path.is_dir() {
        let sysdef = path.join(SYSDEF_FILE_NAME);
        if sysdef.is_file() {
            let name = default_design(&fs_read(&sysdef)?, &sysdef)?;
            let handoff = path.join(name);
            debug!("{sysdef:?} points at {handoff:?}");
            return Ok(HandoffSource {
                text: fs_read(&handoff)?,
                origin: handoff,
            });
        }
        let archive = fs_read_dir(path)?
            .into_iter()
            .map(|name| path.join(name))
            .find(|p| p.is_file() && has_extension(p, ARCHIVE_EXTENSION));
        if let Some(archive) = archive {
            return read_from_archive(&archive);
        }
        return Err(HwOverlayError::Argument(format!(
            "{path:?} contains neither {SYSDEF_FILE_NAME} nor a .{ARCHIVE_EXTENSION} archive"
        )));
    }
    Err(HwOverlayError::Argument(format!(
        "{path:?} is not a .{HANDOFF_EXTENSION} file, a .{ARCHIVE_EXTENSION} archive or a directory holding one"
    )))
}

/// Name of the hand-off file of the default block design, as listed in `sysdef.xml`.
pub fn default_design(sysdef_text: &str, sysdef: &Path) -> Result<String, HwOverlayError> {
    let doc = parse_xml(sysdef_text, sysdef)?;
    doc.descendants()
        .filter(|n| is_element(n, "File"))
        .find(|f| attribute(*f, "BD_TYPE") == Some(DEFAULT_DESIGN_TYPE))
        .and_then(|f| attribute(f, "Name"))
        .map(str::to_string)
        .ok_or_else(|| {
            HwOverlayError::malformed(
                sysdef.display().to_string(),
                "BD_TYPE",
                format!("no File entry with BD_TYPE=\"{DEFAULT_DESIGN_TYPE}\" and a Name"),
            )
        })
}

fn read_from_archive(archive_path: &Path) -> Result<HandoffSource, HwOverlayError> {
    trace!("Opening archive {archive_path:?}");
    let archive_err = |e| HwOverlayError::Archive {
        file: archive_path.to_path_buf(),
        e,
    };
    let mut archive = ZipArchive::new(fs_open(archive_path)?).map_err(archive_err)?;

    let sysdef_text = read_member(&mut archive, archive_path, SYSDEF_FILE_NAME)?;
    let name = default_design(&sysdef_text, &archive_path.join(SYSDEF_FILE_NAME))?;
    let text = read_member(&mut archive, archive_path, &name)?;
    debug!("Read {name} from archive {archive_path:?}");
    Ok(HandoffSource {
        origin: archive_path.join(name),
        text,
    })
}

fn read_member<R: std::io::Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    archive_path: &Path,
    name: &str,
) -> Result<String, HwOverlayError> {
    let mut member = archive.by_name(name).map_err(|e| HwOverlayError::Archive {
        file: archive_path.join(name),
        e,
    })?;
    let mut text = String::new();
    member
        .read_to_string(&mut text)
        .map_err(|e| HwOverlayError::IORead {
            file: archive_path.join(name),
            e,
        })?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    const SYSDEF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Project Name="design">
  <File Type="HW_HANDOFF" Name="other.hwh" BD_TYPE="IP_BD"/>
  <File Type="HW_HANDOFF" Name="design_1.hwh" BD_TYPE="DEFAULT_BD"/>
</Project>"#;
    const HANDOFF: &str = "<EDKSYSTEM><MODULES/></EDKSYSTEM>";

    fn write_archive(path: &Path, members: &[(&str, &str)]) {
        let mut writer = zip::ZipWriter::new(fs::File::create(path).unwrap());
        for (name, text) in members {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(text.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[gtest]
    fn handoff_file_is_used_directly() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("top.hwh");
        fs::write(&file, HANDOFF).unwrap();

        let source = locate_handoff(&file).unwrap();
        expect_that!(source.origin, eq(&file));
        expect_that!(source.text, eq(HANDOFF));
    }

    #[gtest]
    fn extracted_bundle_follows_sysdef() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SYSDEF_FILE_NAME), SYSDEF).unwrap();
        fs::write(dir.path().join("design_1.hwh"), HANDOFF).unwrap();
        fs::write(dir.path().join("other.hwh"), "<wrong/>").unwrap();

        let source = locate_handoff(dir.path()).unwrap();
        expect_that!(source.origin, eq(&dir.path().join("design_1.hwh")));
        expect_that!(source.text, eq(HANDOFF));
    }

    #[gtest]
    fn archive_is_read_in_place() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("design.hdf");
        write_archive(
            &archive,
            &[(SYSDEF_FILE_NAME, SYSDEF), ("design_1.hwh", HANDOFF)],
        );

        let source = locate_handoff(&archive).unwrap();
        expect_that!(source.text, eq(HANDOFF));
        expect_that!(source.origin, eq(&archive.join("design_1.hwh")));
        expect_that!(dir.path().join("design_1.hwh").exists(), eq(false));
    }

    #[gtest]
    fn directory_holding_an_archive_is_searched() {
        let dir = TempDir::new().unwrap();
        write_archive(
            &dir.path().join("design.hdf"),
            &[(SYSDEF_FILE_NAME, SYSDEF), ("design_1.hwh", HANDOFF)],
        );
        expect_that!(locate_handoff(dir.path()).map(|s| s.text), ok(eq(HANDOFF)));
    }

    #[gtest]
    fn archive_missing_the_design_is_reported() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("design.hdf");
        write_archive(&archive, &[(SYSDEF_FILE_NAME, SYSDEF)]);
        expect_that!(
            locate_handoff(&archive),
            err(displays_as(contains_substring("HwOverlayError::Archive")))
        );
    }

    #[gtest]
    fn sysdef_without_default_design_is_malformed() {
        let result = default_design(
            r#"<Project><File Name="a.hwh" BD_TYPE="IP_BD"/></Project>"#,
            Path::new("sysdef.xml"),
        );
        expect_that!(
            result,
            err(displays_as(contains_substring("field 'BD_TYPE'")))
        );
    }

    #[gtest]
    fn unrelated_inputs_are_argument_errors() {
        let dir = TempDir::new().unwrap();
        let text = dir.path().join("notes.txt");
        fs::write(&text, "hello").unwrap();

        expect_that!(
            locate_handoff(&text),
            err(displays_as(contains_substring("HwOverlayError::Argument")))
        );
        expect_that!(
            locate_handoff(dir.path()),
            err(displays_as(contains_substring("HwOverlayError::Argument")))
        );
    }
}
