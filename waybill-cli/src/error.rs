//! Error types emitted by the Waybill CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use waybill_core::TripPlanError;
use waybill_data::ProviderBuildError;

/// Errors emitted by the Waybill CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Name of the offending option.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// A country code is not two ASCII letters.
    #[error("invalid country code {code:?} in --{field}")]
    InvalidCountryCode {
        /// Name of the offending option.
        field: &'static str,
        /// Code as supplied.
        code: String,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Name of the offending option.
        field: &'static str,
        /// Path involved.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Name of the offending option.
        field: &'static str,
        /// Path involved.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Name of the offending option.
        field: &'static str,
        /// Path involved.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the trip request file failed.
    #[error("failed to open trip request at {path:?}: {source}")]
    OpenTripRequest {
        /// Path involved.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Trip request JSON could not be decoded.
    #[error("failed to parse trip request JSON at {path:?}: {source}")]
    ParseTripRequest {
        /// Path involved.
        path: Utf8PathBuf,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// Constructing an HTTP adapter failed.
    #[error("failed to build {service} client for {base_url:?}: {source}")]
    BuildProvider {
        /// Service name.
        service: &'static str,
        /// Base URL the client was configured with.
        base_url: String,
        /// Underlying build error.
        #[source]
        source: ProviderBuildError,
    },
    /// The pipeline rejected the trip. The error payload has been written.
    #[error("trip planning failed: {0}")]
    Plan(#[source] TripPlanError),
    /// Serialising the response failed.
    #[error("failed to serialise response: {0}")]
    SerialiseResponse(#[source] serde_json::Error),
    /// Writing the response to stdout failed.
    #[error("failed to write response: {0}")]
    WriteOutput(#[source] std::io::Error),
    /// Writing the response file failed.
    #[error("failed to write response to {path:?}: {source}")]
    WriteOutputFile {
        /// Path involved.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
