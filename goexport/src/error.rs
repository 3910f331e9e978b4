use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("problems extracting {member} from {}: {reason}", path.display())]
    Extraction {
        path: PathBuf,
        member: &'static str,
        reason: String,
    },

    #[error("can't {op} tempfile: {source}")]
    TempFile {
        op: &'static str,
        source: io::Error,
    },

    #[error("object parse of {} failed: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("unable to extract export data from {}: {source}", path.display())]
    Data {
        path: PathBuf,
        source: object::Error,
    },

    #[error("writing export data of {}: {source}", path.display())]
    Output { path: PathBuf, source: io::Error },
}
