/*!
 * Host callback contract and the bridge engines call through.
 *
 * An engine never talks to the host directly: every event crosses one
 * [`CallbackBridge`], which owns the host's [`HostCallbacks`]
 * implementation together with the opaque user data supplied at
 * session initialization. The bridge is created by the session and
 * handed to the engine at construction; it lives exactly as long as
 * the session that created it.
 *
 * Transport, timers, and media protection stay on the host side of
 * this boundary. Keying material crosses it as an opaque blob that the
 * host decodes by agreement with its engine.
 */

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Severity of an engine report
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    /// Progress information
    Info = 1,
    /// Recoverable irregularity
    Warning = 2,
    /// Session-fatal failure
    Severe = 3,
    /// Protocol violation signalled to or by the peer
    Protocol = 4,
}

impl ReportLevel {
    /// Convert a raw value to a report level
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(ReportLevel::Info),
            2 => Some(ReportLevel::Warning),
            3 => Some(ReportLevel::Severe),
            4 => Some(ReportLevel::Protocol),
            _ => None,
        }
    }

    /// Raw value of this level
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportLevel::Info => "info",
            ReportLevel::Warning => "warning",
            ReportLevel::Severe => "severe",
            ReportLevel::Protocol => "protocol",
        };
        write!(f, "{name}")
    }
}

/// Direction of a protected media stream
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirection {
    /// Traffic this endpoint sends
    Outbound = 1,
    /// Traffic this endpoint receives
    Inbound = 2,
}

/// Stage of the trusted-relay enrollment workflow
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentEvent {
    /// Peer asks to enroll as a trusted relay
    Request = 1,
    /// Peer asks to reconfirm an earlier enrollment
    Reconfirm = 2,
    /// Enrollment completed
    Confirmed = 3,
    /// Enrollment failed
    Failed = 4,
    /// Enrollment cancelled by either side
    Canceled = 5,
}

/// Events a session host handles.
///
/// `send_packet`, the timer operations, and the keying-material pair
/// are the working core every host must provide. The remaining events
/// default to no-ops so simple hosts only implement what they display
/// or act on. All methods take `&self`: hosts that track state use
/// interior mutability.
pub trait HostCallbacks: Send + Sync {
    /// Hand a protocol message to the transport.
    ///
    /// Returns `false` when the packet could not be queued; the engine
    /// treats that as a fatal transport failure.
    fn send_packet(&self, packet: &[u8]) -> bool;

    /// Arm the retransmission timer. Returns `false` when no timer is
    /// available.
    fn activate_timer(&self, timeout: Duration) -> bool;

    /// Disarm the retransmission timer
    fn cancel_timer(&self) -> bool;

    /// Keying material for one direction is ready.
    ///
    /// The blob layout is an agreement between engine and host; this
    /// crate does not inspect it. Returns whether the host armed its
    /// media protection.
    fn secure_secrets_ready(&self, secrets: &[u8], direction: StreamDirection) -> bool;

    /// Keying material for one direction must no longer be used
    fn secure_secrets_off(&self, direction: StreamDirection);

    /// Diagnostic report from the engine
    fn report(&self, _level: ReportLevel, _code: i32) {}

    /// Media protection became active with the named cipher
    fn secure_on(&self, _cipher: &str) {}

    /// The short authentication string is ready for display
    fn sas_ready(&self, _sas: &str, _verified: bool) {}

    /// Negotiation failed; the session will not reach the secure state
    fn negotiation_failed(&self, _level: ReportLevel, _code: i32) {}

    /// The peer answered with something other than this protocol
    fn peer_not_supported(&self) {}

    /// The user must decide on an enrollment request
    fn ask_enrollment(&self, _event: EnrollmentEvent) {}

    /// Progress update for a running enrollment workflow
    fn inform_enrollment(&self, _event: EnrollmentEvent) {}

    /// Sign the SAS hash and install the signature via the session's
    /// signature-data operation. Returns whether a signature was made.
    fn sign_sas(&self, _sas_hash: &[u8]) -> bool {
        false
    }

    /// Verify the peer's signature over the SAS hash
    fn check_sas_signature(&self, _sas_hash: &[u8]) -> bool {
        false
    }
}

/// Owns the host callback table and user data for one session.
///
/// Engines hold the bridge behind an [`Arc`] and drive every host
/// event through its forwarding methods.
pub struct CallbackBridge {
    callbacks: Arc<dyn HostCallbacks>,
    user_data: Option<Arc<dyn Any + Send + Sync>>,
}

impl CallbackBridge {
    pub(crate) fn new(
        callbacks: Arc<dyn HostCallbacks>,
        user_data: Option<Arc<dyn Any + Send + Sync>>,
    ) -> Self {
        Self {
            callbacks,
            user_data,
        }
    }

    /// Opaque data the host attached at session initialization
    pub fn user_data(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.user_data.as_deref()
    }

    /// Hand a protocol message to the transport
    pub fn send_packet(&self, packet: &[u8]) -> bool {
        self.callbacks.send_packet(packet)
    }

    /// Arm the retransmission timer
    pub fn activate_timer(&self, timeout: Duration) -> bool {
        self.callbacks.activate_timer(timeout)
    }

    /// Disarm the retransmission timer
    pub fn cancel_timer(&self) -> bool {
        self.callbacks.cancel_timer()
    }

    /// Deliver keying material for one direction
    pub fn secure_secrets_ready(&self, secrets: &[u8], direction: StreamDirection) -> bool {
        self.callbacks.secure_secrets_ready(secrets, direction)
    }

    /// Withdraw keying material for one direction
    pub fn secure_secrets_off(&self, direction: StreamDirection) {
        self.callbacks.secure_secrets_off(direction);
    }

    /// Forward a diagnostic report
    pub fn report(&self, level: ReportLevel, code: i32) {
        self.callbacks.report(level, code);
    }

    /// Announce active media protection
    pub fn secure_on(&self, cipher: &str) {
        self.callbacks.secure_on(cipher);
    }

    /// Announce the rendered short authentication string
    pub fn sas_ready(&self, sas: &str, verified: bool) {
        self.callbacks.sas_ready(sas, verified);
    }

    /// Announce a failed negotiation
    pub fn negotiation_failed(&self, level: ReportLevel, code: i32) {
        self.callbacks.negotiation_failed(level, code);
    }

    /// Announce a peer that does not speak the protocol
    pub fn peer_not_supported(&self) {
        self.callbacks.peer_not_supported();
    }

    /// Relay an enrollment decision request to the user
    pub fn ask_enrollment(&self, event: EnrollmentEvent) {
        self.callbacks.ask_enrollment(event);
    }

    /// Relay enrollment workflow progress
    pub fn inform_enrollment(&self, event: EnrollmentEvent) {
        self.callbacks.inform_enrollment(event);
    }

    /// Request a host signature over the SAS hash
    pub fn sign_sas(&self, sas_hash: &[u8]) -> bool {
        self.callbacks.sign_sas(sas_hash)
    }

    /// Request verification of the peer's SAS signature
    pub fn check_sas_signature(&self, sas_hash: &[u8]) -> bool {
        self.callbacks.check_sas_signature(sas_hash)
    }
}

impl fmt::Debug for CallbackBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackBridge")
            .field("user_data", &self.user_data.is_some())
            .finish()
    }
}
