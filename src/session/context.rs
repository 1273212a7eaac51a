/*!
 * Session context and control facade.
 *
 * A [`SessionContext`] exclusively owns the three resources of one
 * protocol session: the engine, the callback bridge, and the
 * negotiation profile. They come into existence together in
 * [`SessionContext::initialize`] and go away together in
 * [`SessionContext::destroy`]; no partially populated context is ever
 * observable.
 *
 * Every control operation is phase-guarded. Outside the `Initialized`
 * phase the facade performs no engine call and returns the neutral
 * value of its result type (`false`, `0`, `None`, or unit), so a host
 * racing a teardown never sees a crash, only a declined operation.
 * Absent-versus-empty is made explicit: a query whose engine answer is
 * an empty string or blob comes back as `None`, never as an empty
 * placeholder.
 */

use std::any::Any;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::callback::{CallbackBridge, HostCallbacks};
use crate::config::NegotiationConfig;
use crate::constants;
use crate::engine::{EngineBinding, EngineFactory, ProtocolEngine};
use crate::error::{Error, Result};
use crate::identity::{self, Identifier, SharedIdentityStore};

use super::state::SessionPhase;

/// Host-chosen parameters for session initialization
pub struct InitOptions {
    /// Client identifier advertised during discovery
    pub client_id: String,
    /// Identity cache location; default path when absent
    pub identity_path: Option<PathBuf>,
    /// Whether this endpoint acts as a trusted relay
    pub mitm_mode: bool,
    /// Opaque data made available to the engine through the bridge
    pub user_data: Option<Arc<dyn Any + Send + Sync>>,
}

impl InitOptions {
    /// Options with the given client identifier and everything else default
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            identity_path: None,
            mitm_mode: false,
            user_data: None,
        }
    }

    /// Use a specific identity cache location
    pub fn with_identity_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.identity_path = Some(path.into());
        self
    }

    /// Act as a trusted relay
    pub fn with_mitm_mode(mut self, enabled: bool) -> Self {
        self.mitm_mode = enabled;
        self
    }

    /// Attach opaque host data
    pub fn with_user_data(mut self, data: Arc<dyn Any + Send + Sync>) -> Self {
        self.user_data = Some(data);
        self
    }
}

impl Default for InitOptions {
    fn default() -> Self {
        Self::new(constants::CLIENT_ID)
    }
}

impl fmt::Debug for InitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitOptions")
            .field("client_id", &self.client_id)
            .field("identity_path", &self.identity_path)
            .field("mitm_mode", &self.mitm_mode)
            .field("user_data", &self.user_data.is_some())
            .finish()
    }
}

/// One protocol session: lifecycle plus the control facade.
///
/// See the module documentation for the phase and neutral-value rules.
pub struct SessionContext {
    phase: SessionPhase,
    engine: Option<Box<dyn ProtocolEngine>>,
    bridge: Option<Arc<CallbackBridge>>,
    config: Option<NegotiationConfig>,
    client_id: Option<String>,
    mitm_mode: bool,
    local_identity: Option<Identifier>,
    user_data: Option<Arc<dyn Any + Send + Sync>>,
}

impl SessionContext {
    /// Create a fresh context with nothing bound
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Fresh,
            engine: None,
            bridge: None,
            config: None,
            client_id: None,
            mitm_mode: false,
            local_identity: None,
            user_data: None,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Attach a negotiation profile ahead of initialization.
    ///
    /// Only a fresh context accepts a profile; on any other phase the
    /// call is ignored. Initializing without an attached profile binds
    /// the standard one.
    pub fn attach_config(&mut self, config: NegotiationConfig) {
        if self.phase.can_initialize() {
            self.config = Some(config);
        } else {
            log::debug!("profile attach ignored in phase {}", self.phase);
        }
    }

    /// The bound negotiation profile, if any
    pub fn config(&self) -> Option<&NegotiationConfig> {
        self.config.as_ref()
    }

    /// Mutable access to the bound negotiation profile.
    ///
    /// Edits made while a session is live shape the next session; the
    /// running engine keeps the snapshot it was built with.
    pub fn config_mut(&mut self) -> Option<&mut NegotiationConfig> {
        self.config.as_mut()
    }

    /// Bind identity, bridge, profile, and engine, entering `Initialized`.
    ///
    /// The identity store is opened on first use: an already-open store
    /// is reused as-is, otherwise it is opened at the path from
    /// `options`, falling back to [`identity::default_cache_path`].
    ///
    /// Initialization is all-or-nothing. When the store cannot be
    /// opened or the factory fails, no resource stays bound, the
    /// context remains `Fresh`, and the call may be retried.
    pub fn initialize(
        &mut self,
        options: InitOptions,
        callbacks: Arc<dyn HostCallbacks>,
        factory: &dyn EngineFactory,
        store: &SharedIdentityStore,
    ) -> Result<()> {
        if !self.phase.can_initialize() {
            return Err(Error::NotInitialized);
        }

        let local_identity = {
            let mut store = store.lock().unwrap();
            if !store.is_open() {
                let path = options
                    .identity_path
                    .clone()
                    .unwrap_or_else(identity::default_cache_path);
                store.open(&path)?;
            }
            store.local_identifier().ok_or_else(|| {
                Error::IdentityStoreUnavailable(io::Error::other(
                    "open identity store reports no local identifier",
                ))
            })?
        };

        let config = self.config.clone().unwrap_or_else(NegotiationConfig::standard);
        let bridge = Arc::new(CallbackBridge::new(callbacks, options.user_data.clone()));
        let engine = factory.build(EngineBinding {
            local_identity,
            client_id: options.client_id.clone(),
            config: config.clone(),
            bridge: Arc::clone(&bridge),
            mitm_mode: options.mitm_mode,
        })?;

        log::debug!(
            "session initialized, client id {:?}, local identity {}",
            options.client_id,
            local_identity
        );
        self.engine = Some(engine);
        self.bridge = Some(bridge);
        self.config = Some(config);
        self.client_id = Some(options.client_id);
        self.mitm_mode = options.mitm_mode;
        self.local_identity = Some(local_identity);
        self.user_data = options.user_data;
        self.phase = SessionPhase::Initialized;
        Ok(())
    }

    /// Tear the session down. Idempotent; valid in every phase.
    ///
    /// The engine is released first so it stops referencing the bridge
    /// before the bridge itself goes away, then the profile.
    pub fn destroy(&mut self) {
        if self.phase.is_destroyed() {
            return;
        }
        drop(self.engine.take());
        drop(self.bridge.take());
        drop(self.config.take());
        self.client_id = None;
        self.mitm_mode = false;
        self.local_identity = None;
        self.user_data = None;
        self.phase = SessionPhase::Destroyed;
        log::debug!("session destroyed");
    }

    fn engine(&self) -> Option<&dyn ProtocolEngine> {
        if self.engine.is_none() {
            log::trace!("no engine bound in phase {}", self.phase);
        }
        self.engine.as_deref()
    }

    // invariance of `&mut` forces the explicit trait-object lifetime here
    fn engine_mut(&mut self) -> Option<&mut (dyn ProtocolEngine + '_)> {
        if self.engine.is_none() {
            log::trace!("no engine bound in phase {}", self.phase);
        }
        self.engine.as_deref_mut().map(|engine| engine as _)
    }

    /// Start the engine's handshake state machine
    pub fn start(&mut self) {
        if let Some(engine) = self.engine_mut() {
            engine.start();
        }
    }

    /// Stop the engine's state machine
    pub fn stop(&mut self) {
        if let Some(engine) = self.engine_mut() {
            engine.stop();
        }
    }

    /// Feed one received protocol message to the engine.
    ///
    /// The engine is the sole parser and validator of the buffer.
    pub fn process_message(&mut self, message: &[u8], peer_id: u32) {
        if let Some(engine) = self.engine_mut() {
            engine.process_message(message, peer_id);
        }
    }

    /// Signal expiry of the retransmission timer to the engine
    pub fn process_timeout(&mut self) {
        if let Some(engine) = self.engine_mut() {
            engine.process_timeout();
        }
    }

    /// Forward auxiliary keying material to the engine
    pub fn set_aux_secret(&mut self, secret: &[u8]) {
        if let Some(engine) = self.engine_mut() {
            engine.set_aux_secret(secret);
        }
    }

    /// Whether the engine currently is in the given state
    pub fn in_state(&self, state_id: i32) -> bool {
        self.engine().is_some_and(|engine| engine.in_state(state_id))
    }

    /// Record that the user verified the short authentication string
    pub fn set_sas_verified(&mut self) {
        if let Some(engine) = self.engine_mut() {
            engine.set_sas_verified();
        }
    }

    /// Withdraw an earlier SAS verification
    pub fn reset_sas_verified(&mut self) {
        if let Some(engine) = self.engine_mut() {
            engine.reset_sas_verified();
        }
    }

    /// Hash of the local discovery message for a protocol version
    pub fn hello_hash(&self, version_index: usize) -> Option<String> {
        non_empty(self.engine()?.hello_hash(version_index))
    }

    /// Hash of the peer's discovery message, once one arrived
    pub fn peer_hello_hash(&self) -> Option<String> {
        non_empty(self.engine()?.peer_hello_hash())
    }

    /// Bootstrap blob secondary sessions key from.
    ///
    /// The blob derives from session keys, so the returned buffer wipes
    /// itself on drop. Absent until the session is secure.
    pub fn multi_stream_params(&self) -> Option<Zeroizing<Vec<u8>>> {
        let params = self.engine()?.multi_stream_params();
        if params.is_empty() {
            None
        } else {
            Some(Zeroizing::new(params))
        }
    }

    /// Install a bootstrap blob taken from an established session.
    ///
    /// The blob is opaque to this crate and forwarded untouched.
    pub fn set_multi_stream_params(&mut self, params: &[u8]) {
        if let Some(engine) = self.engine_mut() {
            engine.set_multi_stream_params(params);
        }
    }

    /// Whether this session keys from an established one
    pub fn is_multi_stream(&self) -> bool {
        self.engine().is_some_and(|engine| engine.is_multi_stream())
    }

    /// Whether this session can hand out bootstrap material
    pub fn is_multi_stream_available(&self) -> bool {
        self.engine()
            .is_some_and(|engine| engine.is_multi_stream_available())
    }

    /// Accept or decline a pending enrollment request
    pub fn accept_enrollment(&mut self, accepted: bool) {
        if let Some(engine) = self.engine_mut() {
            engine.accept_enrollment(accepted);
        }
    }

    /// Whether enrollment mode is active
    pub fn is_enrollment_mode(&self) -> bool {
        self.engine().is_some_and(|engine| engine.is_enrollment_mode())
    }

    /// Switch enrollment mode before the handshake starts
    pub fn set_enrollment_mode(&mut self, enabled: bool) {
        if let Some(engine) = self.engine_mut() {
            engine.set_enrollment_mode(enabled);
        }
    }

    /// Whether the peer is enrolled with this endpoint
    pub fn is_peer_enrolled(&self) -> bool {
        self.engine().is_some_and(|engine| engine.is_peer_enrolled())
    }

    /// Relay a SAS hash to the enrolled peer.
    ///
    /// `render_algo` names the SAS rendering the relaying endpoint
    /// negotiated. Returns whether the relay packet went out.
    pub fn send_sas_relay(&mut self, sas_hash: &[u8], render_algo: &str) -> bool {
        self.engine_mut()
            .is_some_and(|engine| engine.send_sas_relay(sas_hash, render_algo))
    }

    /// Wire name of the negotiated SAS rendering
    pub fn sas_type(&self) -> Option<String> {
        non_empty(self.engine()?.sas_type())
    }

    /// Raw SAS hash, borrowed from the engine.
    ///
    /// The view lives as long as the borrow of this context; it cannot
    /// be held across a destroy.
    pub fn sas_hash(&self) -> Option<&[u8]> {
        self.engine()?.sas_hash()
    }

    /// Install signature data for the confirmation message
    pub fn set_signature_data(&mut self, data: &[u8]) -> bool {
        self.engine_mut()
            .is_some_and(|engine| engine.set_signature_data(data))
    }

    /// Signature data received from the peer, borrowed from the engine
    pub fn signature_data(&self) -> Option<&[u8]> {
        self.engine()?.signature_data()
    }

    /// Length in bytes of the received signature data
    pub fn signature_length(&self) -> usize {
        self.engine().map_or(0, |engine| engine.signature_length())
    }

    /// Forward the peer's final confirmation acknowledgement
    pub fn confirm_secure_ack(&mut self) {
        if let Some(engine) = self.engine_mut() {
            engine.confirm_secure_ack();
        }
    }

    /// Stable identifier of the peer, once discovery saw one
    pub fn peer_identity(&self) -> Option<Identifier> {
        self.engine()?.peer_identity()
    }

    /// Number of protocol versions the engine can offer
    pub fn supported_version_count(&self) -> usize {
        self.engine()
            .map_or(0, |engine| engine.supported_version_count())
    }

    /// Protocol version currently negotiated, times ten
    pub fn current_protocol_version(&self) -> i32 {
        self.engine()
            .map_or(0, |engine| engine.current_protocol_version())
    }

    /// Client identifier the session was initialized with
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Whether this endpoint acts as a trusted relay
    pub fn is_mitm_mode(&self) -> bool {
        self.mitm_mode
    }

    /// This endpoint's stable identifier while the session is live
    pub fn local_identity(&self) -> Option<Identifier> {
        self.local_identity
    }

    /// Opaque host data attached at initialization
    pub fn user_data(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.user_data.as_deref()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("phase", &self.phase)
            .field("client_id", &self.client_id)
            .field("mitm_mode", &self.mitm_mode)
            .finish()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::StreamDirection;
    use crate::identity::MemoryIdentityStore;
    use std::sync::Mutex;
    use std::time::Duration;

    struct NullEngine;

    impl ProtocolEngine for NullEngine {
        fn start(&mut self) {}
        fn stop(&mut self) {}
        fn process_message(&mut self, _message: &[u8], _peer_id: u32) {}
        fn process_timeout(&mut self) {}
        fn set_aux_secret(&mut self, _secret: &[u8]) {}
        fn in_state(&self, _state_id: i32) -> bool {
            false
        }
        fn set_sas_verified(&mut self) {}
        fn reset_sas_verified(&mut self) {}
        fn hello_hash(&self, _version_index: usize) -> String {
            String::new()
        }
        fn peer_hello_hash(&self) -> String {
            String::new()
        }
        fn multi_stream_params(&self) -> Vec<u8> {
            Vec::new()
        }
        fn set_multi_stream_params(&mut self, _params: &[u8]) {}
        fn is_multi_stream(&self) -> bool {
            false
        }
        fn is_multi_stream_available(&self) -> bool {
            false
        }
        fn sas_type(&self) -> String {
            String::new()
        }
        fn sas_hash(&self) -> Option<&[u8]> {
            None
        }
        fn confirm_secure_ack(&mut self) {}
        fn peer_identity(&self) -> Option<Identifier> {
            None
        }
        fn supported_version_count(&self) -> usize {
            0
        }
        fn current_protocol_version(&self) -> i32 {
            0
        }
    }

    struct QuietHost;

    impl HostCallbacks for QuietHost {
        fn send_packet(&self, _packet: &[u8]) -> bool {
            true
        }
        fn activate_timer(&self, _timeout: Duration) -> bool {
            true
        }
        fn cancel_timer(&self) -> bool {
            true
        }
        fn secure_secrets_ready(&self, _secrets: &[u8], _direction: StreamDirection) -> bool {
            true
        }
        fn secure_secrets_off(&self, _direction: StreamDirection) {}
    }

    fn null_factory(_binding: EngineBinding) -> Result<Box<dyn ProtocolEngine>> {
        Ok(Box::new(NullEngine))
    }

    fn memory_store() -> SharedIdentityStore {
        Arc::new(Mutex::new(MemoryIdentityStore::new()))
    }

    fn assert_neutral(context: &mut SessionContext) {
        context.start();
        context.process_message(b"ping", 7);
        context.process_timeout();
        assert!(!context.in_state(3));
        assert_eq!(context.hello_hash(0), None);
        assert_eq!(context.peer_hello_hash(), None);
        assert!(context.multi_stream_params().is_none());
        assert!(!context.is_multi_stream_available());
        assert!(!context.send_sas_relay(b"hash", "B32"));
        assert_eq!(context.sas_type(), None);
        assert_eq!(context.sas_hash(), None);
        assert!(!context.set_signature_data(b"sig"));
        assert_eq!(context.signature_data(), None);
        assert_eq!(context.signature_length(), 0);
        assert!(context.peer_identity().is_none());
        assert_eq!(context.supported_version_count(), 0);
        assert_eq!(context.current_protocol_version(), 0);
        assert!(!context.is_enrollment_mode());
        assert!(!context.is_peer_enrolled());
    }

    #[test]
    fn fresh_contexts_answer_neutrally() {
        let mut context = SessionContext::new();
        assert_eq!(context.phase(), SessionPhase::Fresh);
        assert_neutral(&mut context);
        assert!(context.config().is_none());
        assert!(context.client_id().is_none());
        assert!(context.local_identity().is_none());
    }

    #[test]
    fn initialize_binds_everything_at_once() -> Result<()> {
        let mut context = SessionContext::new();
        let options = InitOptions::new("unit test")
            .with_mitm_mode(true)
            .with_user_data(Arc::new(41u32));
        context.initialize(options, Arc::new(QuietHost), &null_factory, &memory_store())?;

        assert_eq!(context.phase(), SessionPhase::Initialized);
        assert_eq!(context.client_id(), Some("unit test"));
        assert!(context.is_mitm_mode());
        assert!(context.local_identity().is_some());
        assert!(context.config().is_some());
        let tag = context.user_data().and_then(|d| d.downcast_ref::<u32>());
        assert_eq!(tag, Some(&41));
        Ok(())
    }

    #[test]
    fn initialize_without_a_profile_binds_the_standard_one() -> Result<()> {
        let mut context = SessionContext::new();
        context.initialize(
            InitOptions::default(),
            Arc::new(QuietHost),
            &null_factory,
            &memory_store(),
        )?;
        let config = context.config().unwrap();
        assert_eq!(config, &NegotiationConfig::standard());
        Ok(())
    }

    #[test]
    fn a_second_initialize_is_rejected() -> Result<()> {
        let mut context = SessionContext::new();
        let store = memory_store();
        context.initialize(
            InitOptions::default(),
            Arc::new(QuietHost),
            &null_factory,
            &store,
        )?;
        let again = context.initialize(
            InitOptions::default(),
            Arc::new(QuietHost),
            &null_factory,
            &store,
        );
        assert!(matches!(again, Err(Error::NotInitialized)));
        assert_eq!(context.phase(), SessionPhase::Initialized);
        Ok(())
    }

    #[test]
    fn a_failed_factory_leaves_the_context_fresh_and_retryable() -> Result<()> {
        let mut context = SessionContext::new();
        let store = memory_store();
        let failing = |_: EngineBinding| -> Result<Box<dyn ProtocolEngine>> {
            Err(Error::Engine("no engine available".to_string()))
        };
        let result = context.initialize(
            InitOptions::default(),
            Arc::new(QuietHost),
            &failing,
            &store,
        );
        assert!(matches!(result, Err(Error::Engine(_))));
        assert_eq!(context.phase(), SessionPhase::Fresh);
        assert!(context.client_id().is_none());

        context.initialize(
            InitOptions::default(),
            Arc::new(QuietHost),
            &null_factory,
            &store,
        )?;
        assert_eq!(context.phase(), SessionPhase::Initialized);
        Ok(())
    }

    #[test]
    fn engine_answers_that_are_empty_map_to_absent() -> Result<()> {
        let mut context = SessionContext::new();
        context.initialize(
            InitOptions::default(),
            Arc::new(QuietHost),
            &null_factory,
            &memory_store(),
        )?;
        // NullEngine reports empty strings and blobs everywhere
        assert_eq!(context.hello_hash(0), None);
        assert_eq!(context.peer_hello_hash(), None);
        assert_eq!(context.sas_type(), None);
        assert!(context.multi_stream_params().is_none());
        Ok(())
    }

    #[test]
    fn engine_borrows_end_with_each_facade_call() -> Result<()> {
        let mut context = SessionContext::new();
        context.initialize(
            InitOptions::default(),
            Arc::new(QuietHost),
            &null_factory,
            &memory_store(),
        )?;
        // mutators and queries interleave freely on one live context
        context.start();
        let hash = context.sas_hash();
        assert!(hash.is_none());
        context.stop();
        context.set_sas_verified();
        assert_eq!(context.phase(), SessionPhase::Initialized);
        Ok(())
    }

    #[test]
    fn destroy_is_idempotent_and_resets_every_binding() -> Result<()> {
        let mut context = SessionContext::new();
        context.initialize(
            InitOptions::new("teardown")
                .with_user_data(Arc::new("tag".to_string())),
            Arc::new(QuietHost),
            &null_factory,
            &memory_store(),
        )?;

        context.destroy();
        assert_eq!(context.phase(), SessionPhase::Destroyed);
        assert!(context.config().is_none());
        assert!(context.client_id().is_none());
        assert!(context.local_identity().is_none());
        assert!(context.user_data().is_none());
        assert!(!context.is_mitm_mode());
        assert_neutral(&mut context);

        context.destroy();
        assert_eq!(context.phase(), SessionPhase::Destroyed);
        Ok(())
    }

    #[test]
    fn destroy_from_fresh_discards_an_attached_profile() {
        let mut context = SessionContext::new();
        context.attach_config(NegotiationConfig::mandatory_only());
        assert!(context.config().is_some());
        context.destroy();
        assert_eq!(context.phase(), SessionPhase::Destroyed);
        assert!(context.config().is_none());
    }

    #[test]
    fn profile_attach_is_ignored_after_initialization() -> Result<()> {
        let mut context = SessionContext::new();
        context.attach_config(NegotiationConfig::mandatory_only());
        context.initialize(
            InitOptions::default(),
            Arc::new(QuietHost),
            &null_factory,
            &memory_store(),
        )?;
        context.attach_config(NegotiationConfig::standard());
        let config = context.config().unwrap();
        assert_eq!(config, &NegotiationConfig::mandatory_only());
        Ok(())
    }
}
