use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal front-end failures. Everything recoverable is reported as a
/// [`crate::ParseWarning`] instead.
#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("could not open input file {path}: {source}")]
    InputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("description is missing the application name line")]
    MissingAppName,

    #[error("could not parse XML document: no <resource> root element")]
    MissingRoot,

    #[error(transparent)]
    Graph(#[from] kdg_core::GraphError),
}
