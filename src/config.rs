/*!
 * Negotiation configuration.
 *
 * A [`NegotiationConfig`] holds, per algorithm category, an ordered and
 * duplicate-free preference list of catalog descriptors (index 0 is the
 * most preferred entry), plus two policy flags. The engine offers
 * exactly these lists during its handshake, so edits made while a
 * session is live take effect at the next session.
 *
 * Lists and flags are independent: the reset operations replace every
 * list but never touch the flags.
 */

use crate::error::{Error, Result};
use crate::registry::{self, AlgorithmCategory, AlgorithmDescriptor};

const CATEGORY_COUNT: usize = AlgorithmCategory::ALL.len();

/// Per-category algorithm preference lists and negotiation policy flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NegotiationConfig {
    lists: [Vec<&'static AlgorithmDescriptor>; CATEGORY_COUNT],
    trusted_third_party: bool,
    signature_carrying_sas: bool,
}

impl NegotiationConfig {
    /// Create a configuration with empty lists and both flags off
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration preloaded with every catalog algorithm
    pub fn standard() -> Self {
        let mut config = Self::new();
        config.reset_to_standard();
        config
    }

    /// Create a configuration holding only the mandatory-to-implement subset
    pub fn mandatory_only() -> Self {
        let mut config = Self::new();
        config.reset_to_mandatory_only();
        config
    }

    /// Replace every list with the full catalog in canonical order.
    ///
    /// The policy flags keep their current values.
    pub fn reset_to_standard(&mut self) {
        for category in AlgorithmCategory::ALL {
            self.lists[category.index()] = registry::standard(category).iter().collect();
        }
    }

    /// Replace every list with the mandatory subset in canonical order.
    ///
    /// The policy flags keep their current values.
    pub fn reset_to_mandatory_only(&mut self) {
        for category in AlgorithmCategory::ALL {
            self.lists[category.index()] = registry::mandatory(category).collect();
        }
    }

    /// Append an algorithm to the end of its category list.
    ///
    /// Appending an algorithm that is already listed changes nothing.
    /// Returns the resulting list length.
    pub fn append(&mut self, algo: &'static AlgorithmDescriptor) -> usize {
        let list = &mut self.lists[algo.category().index()];
        if !list.contains(&algo) {
            list.push(algo);
        }
        list.len()
    }

    /// Insert an algorithm at a position in its category list.
    ///
    /// Fails with [`Error::DuplicateAlgorithm`] when the algorithm is
    /// already listed. An index past the end degrades to an append.
    /// Returns the resulting list length.
    pub fn insert_at(&mut self, algo: &'static AlgorithmDescriptor, index: usize) -> Result<usize> {
        let list = &mut self.lists[algo.category().index()];
        if list.contains(&algo) {
            return Err(Error::DuplicateAlgorithm {
                category: algo.category(),
                name: algo.name(),
            });
        }
        let index = index.min(list.len());
        list.insert(index, algo);
        Ok(list.len())
    }

    /// Remove an algorithm from its category list.
    ///
    /// Removing an algorithm that is not listed changes nothing.
    /// Returns the resulting list length.
    pub fn remove(&mut self, algo: &'static AlgorithmDescriptor) -> usize {
        let list = &mut self.lists[algo.category().index()];
        list.retain(|candidate| *candidate != algo);
        list.len()
    }

    /// Whether an algorithm is currently listed in its category
    pub fn contains(&self, algo: &'static AlgorithmDescriptor) -> bool {
        self.lists[algo.category().index()].contains(&algo)
    }

    /// Number of algorithms currently listed for a category
    pub fn count(&self, category: AlgorithmCategory) -> usize {
        self.lists[category.index()].len()
    }

    /// Algorithm at a position in a category list.
    ///
    /// Fails with [`Error::IndexOutOfRange`] when `index` is past the
    /// last entry.
    pub fn at(
        &self,
        category: AlgorithmCategory,
        index: usize,
    ) -> Result<&'static AlgorithmDescriptor> {
        let list = &self.lists[category.index()];
        list.get(index).copied().ok_or(Error::IndexOutOfRange {
            category,
            index,
            len: list.len(),
        })
    }

    /// The current preference list for a category, most preferred first
    pub fn list(&self, category: AlgorithmCategory) -> &[&'static AlgorithmDescriptor] {
        &self.lists[category.index()]
    }

    /// Append an algorithm identified by wire name
    pub fn append_name(&mut self, category: AlgorithmCategory, name: &str) -> Result<usize> {
        let algo = registry::resolve(category, name)?;
        Ok(self.append(algo))
    }

    /// Insert an algorithm identified by wire name at a position
    pub fn insert_name_at(
        &mut self,
        category: AlgorithmCategory,
        name: &str,
        index: usize,
    ) -> Result<usize> {
        let algo = registry::resolve(category, name)?;
        self.insert_at(algo, index)
    }

    /// Remove an algorithm identified by wire name
    pub fn remove_name(&mut self, category: AlgorithmCategory, name: &str) -> Result<usize> {
        let algo = registry::resolve(category, name)?;
        Ok(self.remove(algo))
    }

    /// Whether an algorithm identified by wire name is currently listed
    pub fn contains_name(&self, category: AlgorithmCategory, name: &str) -> Result<bool> {
        let algo = registry::resolve(category, name)?;
        Ok(self.contains(algo))
    }

    /// Whether a trusted third party may vouch for SAS verification
    pub fn is_trusted_third_party(&self) -> bool {
        self.trusted_third_party
    }

    /// Allow or forbid trusted-third-party SAS verification
    pub fn set_trusted_third_party(&mut self, allowed: bool) {
        self.trusted_third_party = allowed;
    }

    /// Whether the SAS may carry a signature
    pub fn is_signature_carrying_sas(&self) -> bool {
        self.signature_carrying_sas
    }

    /// Allow or forbid signature-carrying SAS
    pub fn set_signature_carrying_sas(&mut self, allowed: bool) {
        self.signature_carrying_sas = allowed;
    }

    /// Set the trusted-third-party flag, builder style
    pub fn with_trusted_third_party(mut self, allowed: bool) -> Self {
        self.trusted_third_party = allowed;
        self
    }

    /// Set the signature-carrying-SAS flag, builder style
    pub fn with_signature_carrying_sas(mut self, allowed: bool) -> Self {
        self.signature_carrying_sas = allowed;
        self
    }
}

#[cfg(feature = "serde-support")]
mod profile {
    //! Name-based serialized form of a configuration.
    //!
    //! Descriptors are catalog references, so the persistent form
    //! stores wire names and resolves them again on load. Loading a
    //! profile that names an unknown algorithm fails.

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::NegotiationConfig;
    use crate::registry::AlgorithmCategory;

    #[derive(Serialize, Deserialize)]
    struct Profile {
        hash: Vec<String>,
        cipher: Vec<String>,
        public_key: Vec<String>,
        sas_type: Vec<String>,
        auth_length: Vec<String>,
        trusted_third_party: bool,
        signature_carrying_sas: bool,
    }

    fn names(config: &NegotiationConfig, category: AlgorithmCategory) -> Vec<String> {
        config
            .list(category)
            .iter()
            .map(|algo| algo.name().to_string())
            .collect()
    }

    impl Serialize for NegotiationConfig {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            Profile {
                hash: names(self, AlgorithmCategory::Hash),
                cipher: names(self, AlgorithmCategory::Cipher),
                public_key: names(self, AlgorithmCategory::PublicKey),
                sas_type: names(self, AlgorithmCategory::SasType),
                auth_length: names(self, AlgorithmCategory::AuthLength),
                trusted_third_party: self.trusted_third_party,
                signature_carrying_sas: self.signature_carrying_sas,
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for NegotiationConfig {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let profile = Profile::deserialize(deserializer)?;
            let mut config = NegotiationConfig::new();
            let lists = [
                (AlgorithmCategory::Hash, &profile.hash),
                (AlgorithmCategory::Cipher, &profile.cipher),
                (AlgorithmCategory::PublicKey, &profile.public_key),
                (AlgorithmCategory::SasType, &profile.sas_type),
                (AlgorithmCategory::AuthLength, &profile.auth_length),
            ];
            for (category, entries) in lists {
                for name in entries {
                    config
                        .append_name(category, name)
                        .map_err(D::Error::custom)?;
                }
            }
            config.trusted_third_party = profile.trusted_third_party;
            config.signature_carrying_sas = profile.signature_carrying_sas;
            Ok(config)
        }
    }
}
