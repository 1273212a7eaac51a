/*!
 * Protocol engine contract.
 *
 * The engine implements the actual key agreement: discovery, commit,
 * key exchange, confirmation, and the retransmission logic that drives
 * them. This crate does not ship an engine. Hosts supply one through
 * an [`EngineFactory`] and the session drives it through the
 * [`ProtocolEngine`] trait.
 *
 * String and byte-blob queries return an empty value when the engine
 * has nothing to report; the session maps those to `None` at its
 * facade. Engines are not thread-safe by contract; hosts serialize
 * access to the owning session.
 */

use std::sync::Arc;

use crate::callback::CallbackBridge;
use crate::config::NegotiationConfig;
use crate::error::Result;
use crate::identity::Identifier;

/// Everything an engine receives at construction
#[derive(Debug)]
pub struct EngineBinding {
    /// Stable identifier of this endpoint, from the identity store
    pub local_identity: Identifier,
    /// Client identifier advertised during discovery
    pub client_id: String,
    /// Snapshot of the negotiation profile, taken at initialization
    pub config: NegotiationConfig,
    /// Bridge carrying every engine event to the host
    pub bridge: Arc<CallbackBridge>,
    /// Whether this endpoint acts as a trusted relay
    pub mitm_mode: bool,
}

/// Builds the engine bound to one session's resources.
///
/// Closures with the matching signature implement this trait, so a
/// factory can be as small as
/// `|binding| Ok(Box::new(MyEngine::new(binding)))`.
pub trait EngineFactory {
    /// Construct an engine for one session
    fn build(&self, binding: EngineBinding) -> Result<Box<dyn ProtocolEngine>>;
}

impl<F> EngineFactory for F
where
    F: Fn(EngineBinding) -> Result<Box<dyn ProtocolEngine>>,
{
    fn build(&self, binding: EngineBinding) -> Result<Box<dyn ProtocolEngine>> {
        self(binding)
    }
}

/// Operations a session forwards into its engine.
///
/// The enrollment, SAS-relay, and signature groups have neutral
/// default implementations; engines without those protocol extensions
/// implement only the core.
pub trait ProtocolEngine: Send {
    /// Start the handshake state machine
    fn start(&mut self);

    /// Stop the state machine and discard handshake state
    fn stop(&mut self);

    /// Feed one received protocol message.
    ///
    /// `peer_id` is the transport-level identifier of the sending
    /// stream, for RTP transports the SSRC.
    fn process_message(&mut self, message: &[u8], peer_id: u32);

    /// Signal expiry of the retransmission timer
    fn process_timeout(&mut self);

    /// Provide auxiliary keying material; only honored before the
    /// relevant handshake step
    fn set_aux_secret(&mut self, secret: &[u8]);

    /// Whether the state machine currently is in the given state
    fn in_state(&self, state_id: i32) -> bool;

    /// Record that the user verified the short authentication string
    fn set_sas_verified(&mut self);

    /// Withdraw an earlier SAS verification
    fn reset_sas_verified(&mut self);

    /// Hash of the local discovery message for the given protocol
    /// version; empty when the index names no version
    fn hello_hash(&self, version_index: usize) -> String;

    /// Hash of the peer's discovery message; empty until one arrived
    fn peer_hello_hash(&self) -> String;

    /// Bootstrap blob for secondary sessions; empty until the primary
    /// session is secure
    fn multi_stream_params(&self) -> Vec<u8>;

    /// Install a bootstrap blob taken from an established session
    fn set_multi_stream_params(&mut self, params: &[u8]);

    /// Whether this session keys from an established one
    fn is_multi_stream(&self) -> bool;

    /// Whether this session can hand out bootstrap material
    fn is_multi_stream_available(&self) -> bool;

    /// Accept or decline a pending enrollment request
    fn accept_enrollment(&mut self, _accepted: bool) {}

    /// Whether enrollment mode is active
    fn is_enrollment_mode(&self) -> bool {
        false
    }

    /// Switch enrollment mode before the handshake starts
    fn set_enrollment_mode(&mut self, _enabled: bool) {}

    /// Whether the peer is enrolled with this endpoint
    fn is_peer_enrolled(&self) -> bool {
        false
    }

    /// Relay a SAS hash to the enrolled peer, rendered with the named
    /// algorithm. Returns whether the relay packet went out.
    fn send_sas_relay(&mut self, _sas_hash: &[u8], _render_algo: &str) -> bool {
        false
    }

    /// Wire name of the negotiated SAS rendering; empty before
    /// negotiation completes
    fn sas_type(&self) -> String;

    /// Raw SAS hash; absent before negotiation completes
    fn sas_hash(&self) -> Option<&[u8]>;

    /// Install signature data to send inside the confirmation message.
    /// Returns whether the engine accepted it.
    fn set_signature_data(&mut self, _data: &[u8]) -> bool {
        false
    }

    /// Signature data received from the peer, if any
    fn signature_data(&self) -> Option<&[u8]> {
        None
    }

    /// Length in bytes of the received signature data
    fn signature_length(&self) -> usize {
        0
    }

    /// The peer acknowledged the final confirmation; the channel is
    /// secure on both sides
    fn confirm_secure_ack(&mut self);

    /// Stable identifier of the peer; absent before discovery
    fn peer_identity(&self) -> Option<Identifier>;

    /// Number of protocol versions this engine can offer
    fn supported_version_count(&self) -> usize;

    /// Protocol version currently negotiated, times ten
    fn current_protocol_version(&self) -> i32;
}
