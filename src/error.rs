use thiserror::Error;

/// Result alias for `loci`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by clustering and recommendation primitives.
///
/// Malformed geographic input is never an error: invalid points are filtered
/// or fall out of clustering through infinite distances. Errors are reserved
/// for configuration that would make the algorithms meaningless.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// A coordinate that must be usable (e.g. the dispatch origin) is not finite.
    #[error("invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate {
        /// Latitude as given.
        lat: f64,
        /// Longitude as given.
        lng: f64,
    },

    /// The clustering pass issued more neighbourhood queries than allowed.
    #[error("clustering exceeded {limit} region queries")]
    IterationLimit {
        /// Configured cap.
        limit: usize,
    },
}
