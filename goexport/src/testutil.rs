//! Fixture builders for unit and CLI tests.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use object::write::{Object, SectionId, StandardSection};
use object::{elf, Architecture, BinaryFormat, Endianness, SectionFlags, SectionKind};

use crate::{ARCHIVE_MEMBER, EXPORT_SECTION};

fn base_object(format: BinaryFormat) -> Object<'static> {
    let mut obj = Object::new(format, Architecture::X86_64, Endianness::Little);
    let text = obj.section_id(StandardSection::Text);
    obj.append_section_data(text, &[0xc3], 1);
    obj
}

fn add_export(obj: &mut Object<'static>, contents: &[u8]) -> SectionId {
    let id = obj.add_section(Vec::new(), EXPORT_SECTION.as_bytes().to_vec(), SectionKind::Other);
    obj.append_section_data(id, contents, 1);
    id
}

pub fn object_with_export(export: &[u8]) -> Vec<u8> {
    let mut obj = base_object(BinaryFormat::Elf);
    add_export(&mut obj, export);
    obj.write().unwrap()
}

pub fn object_without_export() -> Vec<u8> {
    base_object(BinaryFormat::Elf).write().unwrap()
}

/// A COFF object that carries an export section under the usual name.
pub fn coff_with_export(export: &[u8]) -> Vec<u8> {
    let mut obj = base_object(BinaryFormat::Coff);
    add_export(&mut obj, export);
    obj.write().unwrap()
}

/// An ELF object whose export section is zlib compressed (`SHF_COMPRESSED`).
pub fn object_with_compressed_export(export: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(export).unwrap();
    let deflated = enc.finish().unwrap();

    // Elf64_Chdr: ch_type, ch_reserved, ch_size, ch_addralign
    let mut payload = Vec::new();
    payload.extend(elf::ELFCOMPRESS_ZLIB.to_le_bytes());
    payload.extend(0u32.to_le_bytes());
    payload.extend((export.len() as u64).to_le_bytes());
    payload.extend(1u64.to_le_bytes());
    payload.extend(deflated);

    let mut obj = base_object(BinaryFormat::Elf);
    let id = add_export(&mut obj, &payload);
    obj.section_mut(id).flags = SectionFlags::Elf {
        sh_flags: u64::from(elf::SHF_COMPRESSED),
    };
    obj.write().unwrap()
}

pub fn write(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Whether a system `ar` is available; notes the skip on stderr when not.
pub fn have_ar() -> bool {
    let found = Command::new("ar")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    if !found {
        eprintln!("skipping: no `ar` on PATH, archive handling is not exercised");
    }
    found
}

/// Builds `name` in `dir` holding `member` as the combined go object.
pub fn archive(dir: &Path, name: &str, member: &[u8]) -> PathBuf {
    let staging = dir.join(format!("{name}.d"));
    fs::create_dir_all(&staging).unwrap();
    let member = write(&staging, ARCHIVE_MEMBER, member);

    let lib = dir.join(name);
    let status = Command::new("ar").arg("rc").arg(&lib).arg(&member).status().unwrap();
    assert!(status.success());
    lib
}
