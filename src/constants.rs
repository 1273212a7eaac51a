/*!
 * Protocol-wide constants.
 *
 * Wire names follow the four-character convention of the key agreement
 * wire format; the identifier and client-id lengths match what engines
 * put on the wire during discovery.
 */

/// Length in bytes of a persistent endpoint identifier
pub const IDENTIFIER_LENGTH: usize = 12;

/// Client identifier advertised during discovery when the host supplies none
pub const CLIENT_ID: &str = "Accord 0.1.0";

/// Number of client-id bytes an engine encodes; longer ids are truncated
pub const CLIENT_ID_MAX_LENGTH: usize = 16;

/// File name of the identity cache placed in the user's home directory
pub const DEFAULT_CACHE_FILE: &str = ".accord.zid";

/// Environment variable consulted when resolving the default cache path
pub const HOME_ENV: &str = "HOME";

/// Wire names of the negotiable algorithms, grouped by category
pub mod names {
    /// Hash algorithm names
    pub mod hash {
        /// SHA-256
        pub const SHA_256: &str = "S256";
        /// SHA-384
        pub const SHA_384: &str = "S384";
    }

    /// Symmetric cipher names
    pub mod cipher {
        /// AES in counter mode, 128-bit key
        pub const AES_128: &str = "AES1";
        /// AES in counter mode, 192-bit key
        pub const AES_192: &str = "AES2";
        /// AES in counter mode, 256-bit key
        pub const AES_256: &str = "AES3";
        /// Twofish, 128-bit key
        pub const TWOFISH_128: &str = "2FS1";
        /// Twofish, 192-bit key
        pub const TWOFISH_192: &str = "2FS2";
        /// Twofish, 256-bit key
        pub const TWOFISH_256: &str = "2FS3";
    }

    /// Key agreement scheme names
    pub mod public_key {
        /// Finite-field Diffie-Hellman, 2048-bit group
        pub const DH_2048: &str = "DH2k";
        /// Finite-field Diffie-Hellman, 3072-bit group
        pub const DH_3072: &str = "DH3k";
        /// Elliptic-curve Diffie-Hellman over P-256
        pub const ECDH_256: &str = "EC25";
        /// Elliptic-curve Diffie-Hellman over P-384
        pub const ECDH_384: &str = "EC38";
        /// Multi-stream keying from an established session
        pub const MULTI_STREAM: &str = "MULT";
    }

    /// Short-authentication-string rendering names
    pub mod sas_type {
        /// Base-32 four-character rendering
        pub const BASE_32: &str = "B32";
        /// Base-256 word-list rendering
        pub const BASE_256: &str = "B256";
    }

    /// Authentication tag length names
    pub mod auth_length {
        /// HMAC-SHA1 with a 32-bit tag
        pub const HMAC_SHA1_32: &str = "HS32";
        /// HMAC-SHA1 with an 80-bit tag
        pub const HMAC_SHA1_80: &str = "HS80";
        /// Skein MAC with a 32-bit tag
        pub const SKEIN_32: &str = "SK32";
        /// Skein MAC with a 64-bit tag
        pub const SKEIN_64: &str = "SK64";
    }
}
