use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, trace};
use tempfile::TempPath;

use crate::error::{Error, Result};
use crate::{Config, ARCHIVE_MEMBER};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContainerKind {
    Archive,
    StandaloneObject,
}

/// An object file ready for section extraction.
///
/// For archives this owns the temporary file holding the extracted member;
/// the file is removed when the source is dropped.
#[derive(Debug)]
pub struct ObjectSource {
    kind: ContainerKind,
    path: PathBuf,
    _scratch: Option<TempPath>,
}

impl ObjectSource {
    fn standalone(path: &Path) -> Self {
        Self {
            kind: ContainerKind::StandaloneObject,
            path: path.to_path_buf(),
            _scratch: None,
        }
    }

    fn extracted(scratch: TempPath) -> Self {
        Self {
            kind: ContainerKind::Archive,
            path: scratch.to_path_buf(),
            _scratch: Some(scratch),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Asks the archive tool to list `path`. Any failure, including the tool
/// not being runnable at all, means "not an archive".
pub fn probe(archiver: &OsStr, path: &Path) -> ContainerKind {
    trace!("running {} t {}", archiver.to_string_lossy(), path.display());
    match Command::new(archiver).arg("t").arg(path).output() {
        Ok(out) if out.status.success() => ContainerKind::Archive,
        Ok(out) => {
            trace!("{} t {}: {}", archiver.to_string_lossy(), path.display(), out.status);
            ContainerKind::StandaloneObject
        },
        Err(e) => {
            trace!("could not run {}: {}", archiver.to_string_lossy(), e);
            ContainerKind::StandaloneObject
        },
    }
}

/// Pulls the combined object member out of an archive.
pub fn extract_member(archiver: &OsStr, path: &Path) -> Result<Vec<u8>> {
    let failed = |reason: String| Error::Extraction {
        path: path.to_path_buf(),
        member: ARCHIVE_MEMBER,
        reason,
    };

    trace!("running {} p {} {}", archiver.to_string_lossy(), path.display(), ARCHIVE_MEMBER);
    let out = Command::new(archiver)
        .arg("p")
        .arg(path)
        .arg(ARCHIVE_MEMBER)
        .output()
        .map_err(|e| failed(e.to_string()))?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(failed(format!("{}: {}", out.status, stderr.trim())));
    }
    // some ar implementations only warn about a missing member
    if out.stdout.is_empty() {
        return Err(failed("member is missing or empty".into()));
    }
    Ok(out.stdout)
}

/// Writes `contents` to a fresh temporary file in `dir` and returns its guard.
pub fn materialize(dir: &Path, contents: &[u8]) -> Result<TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix("objfile")
        .suffix(".o")
        .tempfile_in(dir)
        .map_err(|source| Error::TempFile { op: "open", source })?;
    debug!("emitting object contents into tempfile {}", file.path().display());

    file.write_all(contents)
        .and_then(|()| file.flush())
        .map_err(|source| Error::TempFile { op: "write to", source })?;

    let (file, path) = file.into_parts();
    file.sync_all()
        .map_err(|source| Error::TempFile { op: "close", source })?;
    drop(file);
    Ok(path)
}

/// Decides what `path` is and produces the object to read sections from.
pub fn classify(path: &Path, config: &Config) -> Result<ObjectSource> {
    match probe(&config.archiver, path) {
        ContainerKind::StandaloneObject => {
            debug!("assuming {} is object file", path.display());
            Ok(ObjectSource::standalone(path))
        },
        ContainerKind::Archive => {
            debug!("assuming {} is archive file", path.display());
            let contents = extract_member(&config.archiver, path)?;
            let scratch = materialize(&config.scratch_dir, &contents)?;
            Ok(ObjectSource::extracted(scratch))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use std::ffi::OsString;
    use std::fs;

    fn no_such_tool() -> OsString {
        OsString::from("/nonexistent/bin/ar-that-is-not-there")
    }

    #[test]
    fn missing_tool_means_standalone() {
        let dir = tempfile::tempdir().unwrap();
        let obj = testutil::write(dir.path(), "plain.o", &testutil::object_with_export(b"v3;\n"));

        assert_eq!(probe(&no_such_tool(), &obj), ContainerKind::StandaloneObject);

        let config = Config {
            archiver: no_such_tool(),
            ..Config::default()
        };
        let source = classify(&obj, &config).unwrap();
        assert_eq!(source.kind(), ContainerKind::StandaloneObject);
        assert_eq!(source.path(), obj);
    }

    #[test]
    fn extraction_with_missing_tool_fails() {
        let dir = tempfile::tempdir().unwrap();
        let lib = testutil::write(dir.path(), "lib.a", b"!<arch>\n");

        let err = extract_member(&no_such_tool(), &lib).unwrap_err();
        assert!(matches!(err, Error::Extraction { member: ARCHIVE_MEMBER, .. }));
    }

    #[test]
    fn materialized_file_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = materialize(dir.path(), b"\x7fELF not really").unwrap();
        let path = scratch.to_path_buf();
        assert_eq!(fs::read(&path).unwrap(), b"\x7fELF not really");
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("objfile"));
        assert!(name.ends_with(".o"));

        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn missing_scratch_dir_is_a_tempfile_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");

        let err = materialize(&gone, b"\x7fELF").unwrap_err();
        assert!(matches!(err, Error::TempFile { op: "open", .. }), "{err}");
        assert!(err.to_string().starts_with("can't open tempfile"));
    }

    #[test]
    fn archive_with_missing_scratch_dir() {
        if !testutil::have_ar() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let lib = testutil::archive(dir.path(), "mumble.a", &testutil::object_with_export(b"v3;\n"));
        let config = Config {
            scratch_dir: dir.path().join("gone"),
            ..Config::default()
        };

        let err = classify(&lib, &config).unwrap_err();
        assert!(matches!(err, Error::TempFile { op: "open", .. }), "{err}");
    }

    #[test]
    fn plain_object_is_not_an_archive() {
        if !testutil::have_ar() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let obj = testutil::write(dir.path(), "plain.o", &testutil::object_with_export(b"v3;\n"));

        assert_eq!(probe(OsStr::new("ar"), &obj), ContainerKind::StandaloneObject);
    }

    #[test]
    fn archive_member_is_extracted() {
        if !testutil::have_ar() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let member = testutil::object_with_export(b"package mumble;\n");
        let lib = testutil::archive(dir.path(), "mumble.a", &member);

        let config = Config::default();
        let source = classify(&lib, &config).unwrap();
        assert_eq!(source.kind(), ContainerKind::Archive);
        assert_ne!(source.path(), lib);
        assert_eq!(fs::read(source.path()).unwrap(), member);

        let scratch = source.path().to_path_buf();
        drop(source);
        assert!(!scratch.exists());
    }

    #[test]
    fn archive_without_go_member() {
        if !testutil::have_ar() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let other = testutil::write(dir.path(), "other.o", &testutil::object_without_export());
        let lib = dir.path().join("other.a");
        let status = Command::new("ar").arg("rc").arg(&lib).arg(&other).status().unwrap();
        assert!(status.success());

        let err = classify(&lib, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
        assert!(err.to_string().contains("_go_.o"));
    }
}
