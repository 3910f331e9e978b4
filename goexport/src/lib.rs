//! Dumps the export data that gccgo embeds in objects and archives.
//!
//! Each input goes through two stages: [`classify`] decides whether the file
//! is an archive (and if so unpacks its `_go_.o` member to a temporary file),
//! then [`extract`] copies the raw `.go_export` section to the output.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;

pub mod classify;
pub mod error;
pub mod extract;

#[cfg(any(test, feature = "testutil"))]
#[doc(hidden)]
pub mod testutil;

pub use classify::{ContainerKind, ObjectSource};
pub use error::{Error, Result};

/// Archive member holding the compiler-combined object.
pub const ARCHIVE_MEMBER: &str = "_go_.o";

/// Section carrying the export data.
pub const EXPORT_SECTION: &str = ".go_export";

#[derive(Debug, Clone)]
pub struct Config {
    /// Program used to list and unpack archives.
    pub archiver: OsString,
    /// Where extracted archive members are staged.
    pub scratch_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archiver: OsString::from("ar"),
            scratch_dir: env::temp_dir(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Export data of this many bytes was written.
    Emitted(usize),
    /// The object has no export section.
    Absent,
}

pub fn check_readable(path: &Path) -> Result<()> {
    File::open(path).map(drop).map_err(|source| Error::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs one input file through both stages, writing any export data to `out`.
///
/// Temporary files created along the way are gone by the time this returns.
pub fn examine<W: Write>(path: &Path, config: &Config, out: &mut W) -> Result<Outcome> {
    debug!("examining file {}", path.display());
    let source = classify::classify(path, config)?;
    let outcome = extract::extract(path, source.path(), out)?;
    debug!("done with {}", path.display());
    Ok(outcome)
}
