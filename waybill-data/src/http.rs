//! Shared plumbing for the HTTP adapters.
//!
//! Every adapter owns a [`reqwest::Client`] and a `current_thread` Tokio
//! runtime. The synchronous port methods run their request futures through
//! [`Bridge::block_on`], which reuses an ambient multi-threaded runtime when
//! one exists.

use std::{future::Future, time::Duration};

use reqwest::Client;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use waybill_core::{GeocodingError, RoutingError, SearchError};

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "waybill-engine/0.1";

/// Default request timeout in seconds.
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error type for adapter construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// An HTTP client paired with the runtime that drives it.
pub(crate) struct Bridge {
    pub(crate) client: Client,
    runtime: Runtime,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("client", &self.client)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl Bridge {
    /// Build a client with the given user agent and timeout, plus a private
    /// `current_thread` runtime.
    pub(crate) fn new(user_agent: &str, timeout: Duration) -> Result<Self, ProviderBuildError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ProviderBuildError::Runtime)?;
        Ok(Self { client, runtime })
    }

    /// Drive `future` to completion from synchronous code.
    ///
    /// Inside a multi-threaded runtime the ambient handle is used with
    /// [`tokio::task::block_in_place`]. Otherwise, including inside a
    /// `current_thread` runtime, the private runtime is used; that case may
    /// deadlock if the caller's runtime drives IO this request needs.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}

/// Join a base URL and a path without doubling the separator.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Transport-level failure, classified once and converted into each port's
/// error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RequestFailure {
    Timeout { url: String, timeout_secs: u64 },
    Status { url: String, status: u16, message: String },
    Network { url: String, message: String },
}

impl RequestFailure {
    pub(crate) fn classify(error: &reqwest::Error, url: &str, timeout: Duration) -> Self {
        if error.is_timeout() {
            return Self::Timeout {
                url: url.to_owned(),
                timeout_secs: timeout.as_secs(),
            };
        }
        if let Some(status) = error.status() {
            return Self::Status {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }
        Self::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

impl From<RequestFailure> for GeocodingError {
    fn from(failure: RequestFailure) -> Self {
        match failure {
            RequestFailure::Timeout { url, timeout_secs } => Self::Timeout { url, timeout_secs },
            RequestFailure::Status {
                url,
                status,
                message,
            } => Self::HttpError {
                url,
                status,
                message,
            },
            RequestFailure::Network { url, message } => Self::NetworkError { url, message },
        }
    }
}

impl From<RequestFailure> for RoutingError {
    fn from(failure: RequestFailure) -> Self {
        match failure {
            RequestFailure::Timeout { url, timeout_secs } => Self::Timeout { url, timeout_secs },
            RequestFailure::Status {
                url,
                status,
                message,
            } => Self::HttpError {
                url,
                status,
                message,
            },
            RequestFailure::Network { url, message } => Self::NetworkError { url, message },
        }
    }
}

impl From<RequestFailure> for SearchError {
    fn from(failure: RequestFailure) -> Self {
        match failure {
            RequestFailure::Timeout { url, timeout_secs } => Self::Timeout { url, timeout_secs },
            RequestFailure::Status { status: 429, .. } => Self::RateLimited,
            RequestFailure::Status {
                url,
                status,
                message,
            } => Self::HttpError {
                url,
                status,
                message,
            },
            RequestFailure::Network { url, message } => Self::NetworkError { url, message },
        }
    }
}
