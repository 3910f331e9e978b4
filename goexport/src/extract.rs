use std::fs;
use std::io::Write;
use std::path::Path;

use log::{debug, trace, warn};
use object::{BinaryFormat, Object, ObjectSection};

use crate::error::{Error, Result};
use crate::{Outcome, EXPORT_SECTION};

/// Copies the export section of `object_path` to `out`, followed by a newline.
///
/// `input` is the path the user asked about and is the one named in
/// diagnostics; for archives `object_path` is the extracted member.
pub fn extract<W: Write>(input: &Path, object_path: &Path, out: &mut W) -> Result<Outcome> {
    debug!("examining ELF file {}", object_path.display());
    let parse_failed = |reason: String| Error::Parse {
        path: input.to_path_buf(),
        reason,
    };

    let data = fs::read(object_path).map_err(|e| parse_failed(e.to_string()))?;
    let file = object::File::parse(&*data).map_err(|e| parse_failed(e.to_string()))?;
    if file.format() != BinaryFormat::Elf {
        return Err(parse_failed(format!("{:?} object, not ELF", file.format())));
    }
    trace!("{} is ELF for {:?}", object_path.display(), file.architecture());

    let Some(section) = file.section_by_name(EXPORT_SECTION) else {
        warn!("{} contains no {}", input.display(), EXPORT_SECTION);
        return Ok(Outcome::Absent);
    };

    // SHF_COMPRESSED sections come out inflated
    let bytes = section.uncompressed_data().map_err(|source| Error::Data {
        path: input.to_path_buf(),
        source,
    })?;
    trace!("{} is {:#x} bytes", EXPORT_SECTION, bytes.len());

    out.write_all(&bytes)
        .and_then(|()| out.write_all(b"\n"))
        .and_then(|()| out.flush())
        .map_err(|source| Error::Output {
            path: input.to_path_buf(),
            source,
        })?;
    Ok(Outcome::Emitted(bytes.len()))
}
