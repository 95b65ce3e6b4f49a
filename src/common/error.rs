use std::{fmt, path::PathBuf};

use crate::jobs::{JobId, MAX_JOBS};

#[derive(Debug)]
pub enum Error {
    ChDir(PathBuf, std::io::Error),
    JobTableFull,
    DuplicateJob(JobId),
    JobNotFound(JobId),
    InvalidJobSpec(String),
    Usage(&'static str),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ChDir(path, e) => {
                write!(f, "cannot change directory to '{}': {e}", path.display())
            }
            Error::JobTableFull => write!(f, "job table is full (max {MAX_JOBS} jobs)"),
            Error::DuplicateJob(id) => write!(f, "job slot {id} is already occupied"),
            Error::JobNotFound(id) => write!(f, "%{id}: no such job"),
            Error::InvalidJobSpec(spec) => write!(f, "'{spec}': invalid job specification"),
            Error::Usage(usage) => write!(f, "usage: {usage}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
