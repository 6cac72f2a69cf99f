use thiserror::Error;

/// Failures surfaced to the operator. The store itself never fails; these
/// come from the state file, the cluster feed and the CSV export.
#[derive(Error, Debug)]
pub enum BandmapError {
    /// State file, cluster log or export file could not be opened or written.
    #[error("can't access bandmap file: {0}")]
    IO(String),
    /// A record or pattern did not have the expected layout.
    #[error("malformed bandmap data: {0}")]
    Parse(String),
    #[error("bandmap: {0}")]
    Other(String),
}

impl From<std::io::Error> for BandmapError {
    fn from(e: std::io::Error) -> Self {
        BandmapError::IO(e.to_string())
    }
}

impl From<csv::Error> for BandmapError {
    fn from(e: csv::Error) -> Self {
        match e.kind() {
            csv::ErrorKind::Io(_) => BandmapError::IO(e.to_string()),
            _ => BandmapError::Parse(e.to_string()),
        }
    }
}
