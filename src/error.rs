/*!
 * Error types for session control and negotiation.
 *
 * All fallible operations in this crate return [`Result`]. Algorithm
 * lookups and preference-list edits report precise variants so callers
 * can distinguish a typo from a genuine conflict.
 */

use thiserror::Error;

use crate::registry::AlgorithmCategory;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by session control and negotiation configuration
#[derive(Error, Debug)]
pub enum Error {
    /// The name does not identify any algorithm of the given category
    #[error("unknown {category} algorithm: {name}")]
    UnknownAlgorithm {
        /// Category the lookup was performed in
        category: AlgorithmCategory,
        /// Name that failed to resolve
        name: String,
    },

    /// The algorithm is already present in the preference list
    #[error("{category} algorithm {name} is already configured")]
    DuplicateAlgorithm {
        /// Category of the rejected entry
        category: AlgorithmCategory,
        /// Name of the rejected entry
        name: &'static str,
    },

    /// A positional read past the end of a preference list
    #[error("no {category} algorithm at index {index} (list holds {len})")]
    IndexOutOfRange {
        /// Category of the list that was indexed
        category: AlgorithmCategory,
        /// Requested index
        index: usize,
        /// Current list length
        len: usize,
    },

    /// The session is not in a phase that allows the operation
    #[error("operation not permitted in the current session phase")]
    NotInitialized,

    /// The identity store could not be opened or created
    #[error("identity store unavailable: {0}")]
    IdentityStoreUnavailable(#[from] std::io::Error),

    /// The protocol engine reported a failure
    #[error("engine error: {0}")]
    Engine(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_algorithm_names_category_and_name() {
        let err = Error::UnknownAlgorithm {
            category: AlgorithmCategory::Cipher,
            name: "AES9".to_string(),
        };
        assert_eq!(err.to_string(), "unknown cipher algorithm: AES9");
    }

    #[test]
    fn duplicate_algorithm_display() {
        let err = Error::DuplicateAlgorithm {
            category: AlgorithmCategory::Hash,
            name: "S256",
        };
        assert_eq!(err.to_string(), "hash algorithm S256 is already configured");
    }

    #[test]
    fn index_out_of_range_reports_length() {
        let err = Error::IndexOutOfRange {
            category: AlgorithmCategory::SasType,
            index: 7,
            len: 2,
        };
        assert_eq!(
            err.to_string(),
            "no sas-type algorithm at index 7 (list holds 2)"
        );
    }

    #[test]
    fn io_errors_convert_into_identity_store_variant() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked");
        let err: Error = io.into();
        assert!(matches!(err, Error::IdentityStoreUnavailable(_)));
        assert!(err.to_string().starts_with("identity store unavailable"));
    }
}
