/*!
 * Algorithm registry.
 *
 * A static catalog of every negotiable algorithm, grouped into the five
 * negotiation categories. The catalog is the single source of truth for
 * algorithm names: preference lists hold references into it, so a
 * configured algorithm is always a known one.
 *
 * Per category the catalog is ordered; that order is the canonical
 * preference order used by [`standard`] and preserved by the
 * mandatory-only subset.
 */

use std::fmt;

use crate::constants::names;
use crate::error::{Error, Result};

/// The five negotiation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmCategory {
    /// Negotiated hash function
    Hash,
    /// Symmetric cipher protecting the media path
    Cipher,
    /// Key agreement scheme
    PublicKey,
    /// Short-authentication-string rendering
    SasType,
    /// Authentication tag length
    AuthLength,
}

impl AlgorithmCategory {
    /// Every category, in canonical order
    pub const ALL: [AlgorithmCategory; 5] = [
        AlgorithmCategory::Hash,
        AlgorithmCategory::Cipher,
        AlgorithmCategory::PublicKey,
        AlgorithmCategory::SasType,
        AlgorithmCategory::AuthLength,
    ];

    /// Stable lower-case label used in error messages and logs
    pub fn label(&self) -> &'static str {
        match self {
            AlgorithmCategory::Hash => "hash",
            AlgorithmCategory::Cipher => "cipher",
            AlgorithmCategory::PublicKey => "public-key",
            AlgorithmCategory::SasType => "sas-type",
            AlgorithmCategory::AuthLength => "auth-length",
        }
    }

    /// Position of this category in [`AlgorithmCategory::ALL`]
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for AlgorithmCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Immutable description of one negotiable algorithm.
///
/// Descriptors live in the static catalog; the rest of the crate passes
/// them around as `&'static AlgorithmDescriptor`.
#[derive(Debug, PartialEq, Eq)]
pub struct AlgorithmDescriptor {
    name: &'static str,
    category: AlgorithmCategory,
    mandatory: bool,
    summary: &'static str,
}

impl AlgorithmDescriptor {
    /// Wire name, at most four characters
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Category this algorithm belongs to
    pub fn category(&self) -> AlgorithmCategory {
        self.category
    }

    /// Whether every conforming endpoint must implement this algorithm
    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// Human-readable description
    pub fn summary(&self) -> &'static str {
        self.summary
    }
}

impl fmt::Display for AlgorithmDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

const fn entry(
    name: &'static str,
    category: AlgorithmCategory,
    mandatory: bool,
    summary: &'static str,
) -> AlgorithmDescriptor {
    AlgorithmDescriptor {
        name,
        category,
        mandatory,
        summary,
    }
}

static HASHES: [AlgorithmDescriptor; 2] = [
    entry(names::hash::SHA_256, AlgorithmCategory::Hash, true, "SHA-256"),
    entry(names::hash::SHA_384, AlgorithmCategory::Hash, false, "SHA-384"),
];

static CIPHERS: [AlgorithmDescriptor; 6] = [
    entry(
        names::cipher::AES_128,
        AlgorithmCategory::Cipher,
        true,
        "AES-CM, 128-bit key",
    ),
    entry(
        names::cipher::AES_192,
        AlgorithmCategory::Cipher,
        false,
        "AES-CM, 192-bit key",
    ),
    entry(
        names::cipher::AES_256,
        AlgorithmCategory::Cipher,
        false,
        "AES-CM, 256-bit key",
    ),
    entry(
        names::cipher::TWOFISH_128,
        AlgorithmCategory::Cipher,
        false,
        "Twofish, 128-bit key",
    ),
    entry(
        names::cipher::TWOFISH_192,
        AlgorithmCategory::Cipher,
        false,
        "Twofish, 192-bit key",
    ),
    entry(
        names::cipher::TWOFISH_256,
        AlgorithmCategory::Cipher,
        false,
        "Twofish, 256-bit key",
    ),
];

static PUBLIC_KEYS: [AlgorithmDescriptor; 5] = [
    entry(
        names::public_key::DH_2048,
        AlgorithmCategory::PublicKey,
        false,
        "finite-field DH, 2048-bit group",
    ),
    entry(
        names::public_key::DH_3072,
        AlgorithmCategory::PublicKey,
        true,
        "finite-field DH, 3072-bit group",
    ),
    entry(
        names::public_key::ECDH_256,
        AlgorithmCategory::PublicKey,
        false,
        "elliptic-curve DH over P-256",
    ),
    entry(
        names::public_key::ECDH_384,
        AlgorithmCategory::PublicKey,
        false,
        "elliptic-curve DH over P-384",
    ),
    entry(
        names::public_key::MULTI_STREAM,
        AlgorithmCategory::PublicKey,
        true,
        "multi-stream keying from an established session",
    ),
];

static SAS_TYPES: [AlgorithmDescriptor; 2] = [
    entry(
        names::sas_type::BASE_32,
        AlgorithmCategory::SasType,
        true,
        "base-32 four-character rendering",
    ),
    entry(
        names::sas_type::BASE_256,
        AlgorithmCategory::SasType,
        false,
        "base-256 word-list rendering",
    ),
];

static AUTH_LENGTHS: [AlgorithmDescriptor; 4] = [
    entry(
        names::auth_length::HMAC_SHA1_32,
        AlgorithmCategory::AuthLength,
        true,
        "HMAC-SHA1, 32-bit tag",
    ),
    entry(
        names::auth_length::HMAC_SHA1_80,
        AlgorithmCategory::AuthLength,
        true,
        "HMAC-SHA1, 80-bit tag",
    ),
    entry(
        names::auth_length::SKEIN_32,
        AlgorithmCategory::AuthLength,
        false,
        "Skein MAC, 32-bit tag",
    ),
    entry(
        names::auth_length::SKEIN_64,
        AlgorithmCategory::AuthLength,
        false,
        "Skein MAC, 64-bit tag",
    ),
];

/// The full catalog for a category, in canonical preference order
pub fn standard(category: AlgorithmCategory) -> &'static [AlgorithmDescriptor] {
    match category {
        AlgorithmCategory::Hash => &HASHES,
        AlgorithmCategory::Cipher => &CIPHERS,
        AlgorithmCategory::PublicKey => &PUBLIC_KEYS,
        AlgorithmCategory::SasType => &SAS_TYPES,
        AlgorithmCategory::AuthLength => &AUTH_LENGTHS,
    }
}

/// Resolve a wire name within a category.
///
/// Matching is exact and case-sensitive.
pub fn resolve(category: AlgorithmCategory, name: &str) -> Result<&'static AlgorithmDescriptor> {
    standard(category)
        .iter()
        .find(|algo| algo.name == name)
        .ok_or_else(|| Error::UnknownAlgorithm {
            category,
            name: name.to_string(),
        })
}

/// Wire names known for a category, in canonical order
pub fn names(category: AlgorithmCategory) -> Vec<&'static str> {
    standard(category).iter().map(|algo| algo.name).collect()
}

/// Number of algorithms known for a category
pub fn len(category: AlgorithmCategory) -> usize {
    standard(category).len()
}

/// The mandatory-to-implement subset of a category, canonical order preserved
pub fn mandatory(
    category: AlgorithmCategory,
) -> impl Iterator<Item = &'static AlgorithmDescriptor> {
    standard(category).iter().filter(|algo| algo.mandatory)
}
