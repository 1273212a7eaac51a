/*!
 * Session builder.
 *
 * Convenience layer over [`SessionContext::initialize`]: collect the
 * negotiation profile, identity location, and host options, then
 * produce an initialized context in one call. Hosts that need staged
 * setup, or want to retry a failed initialization, use
 * [`SessionContext`] directly.
 */

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

use crate::callback::HostCallbacks;
use crate::config::NegotiationConfig;
use crate::constants;
use crate::engine::EngineFactory;
use crate::error::Result;
use crate::identity::{self, SharedIdentityStore};
use crate::session::{InitOptions, SessionContext};

/// Builder producing an initialized [`SessionContext`]
pub struct SessionBuilder {
    client_id: String,
    identity_path: Option<PathBuf>,
    mitm_mode: bool,
    config: Option<NegotiationConfig>,
    user_data: Option<Arc<dyn Any + Send + Sync>>,
    store: Option<SharedIdentityStore>,
}

impl SessionBuilder {
    /// Defaults: the crate's client identifier, the standard profile,
    /// the process-wide identity store at its default path
    pub fn new() -> Self {
        Self {
            client_id: constants::CLIENT_ID.to_string(),
            identity_path: None,
            mitm_mode: false,
            config: None,
            user_data: None,
            store: None,
        }
    }

    /// Advertise a specific client identifier during discovery
    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = id.into();
        self
    }

    /// Open the identity cache at a specific location
    pub fn with_identity_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_path = Some(path.into());
        self
    }

    /// Act as a trusted relay
    pub fn with_mitm_mode(mut self, enabled: bool) -> Self {
        self.mitm_mode = enabled;
        self
    }

    /// Bind this negotiation profile instead of the standard one
    pub fn with_config(mut self, config: NegotiationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Attach opaque host data
    pub fn with_user_data(mut self, data: Arc<dyn Any + Send + Sync>) -> Self {
        self.user_data = Some(data);
        self
    }

    /// Use a private identity store instead of the process-wide one
    pub fn with_identity_store(mut self, store: SharedIdentityStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Initialize a session context with the collected options
    pub fn build(
        self,
        callbacks: Arc<dyn HostCallbacks>,
        factory: &dyn EngineFactory,
    ) -> Result<SessionContext> {
        let mut context = SessionContext::new();
        if let Some(config) = self.config {
            context.attach_config(config);
        }
        let mut options = InitOptions::new(self.client_id);
        options.identity_path = self.identity_path;
        options.mitm_mode = self.mitm_mode;
        options.user_data = self.user_data;
        let store = self.store.unwrap_or_else(identity::shared);
        context.initialize(options, callbacks, factory, &store)?;
        Ok(context)
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
