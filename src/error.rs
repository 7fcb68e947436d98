//! Error taxonomy for the rate and conversion core.

use thiserror::Error;

/// Failures of the external rate source.
///
/// Both variants are recovered inside the rate cache via its degradation
/// chain and never reach aggregation callers.
#[derive(Debug, Error)]
pub enum RateError {
    /// Transport error, timeout, or non-2xx status from the provider.
    #[error("rate source unavailable: {0}")]
    SourceUnavailable(String),

    /// The provider responded but the payload could not be parsed into
    /// numeric rates.
    #[error("malformed rate payload: {0}")]
    MalformedResponse(String),
}

/// Caller input errors surfaced by the converter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// Currency code absent from the resolved rate table.
    #[error("unsupported currency: {0}")]
    UnsupportedCurrency(String),
}
