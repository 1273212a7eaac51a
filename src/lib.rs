/*!
# Accord Protocol

Session control and algorithm negotiation for a SAS-verified key
agreement protocol, in the style of media-path key agreement: the
handshake runs in-band over the media transport, endpoints compare a
short authentication string out of band, and trust builds up in a
persistent identity cache instead of a certificate hierarchy.

## Overview

This library provides the control layer a host application drives a
key agreement session through:

- A static algorithm registry covering the five negotiation categories
- Ordered, duplicate-free per-category preference lists with standard
  and mandatory-only resets
- A session context owning engine, callback bridge, and profile with
  all-or-nothing initialization and idempotent teardown
- A phase-guarded control facade that degrades to neutral answers
  instead of crashing when no session is live
- A persistent endpoint identity with a process-wide store handle

The cryptographic handshake itself lives in a protocol engine the host
supplies through [`EngineFactory`]; transport, timers, and media
protection stay on the host side of [`HostCallbacks`].
*/

// Negotiable algorithm catalog
pub mod registry;

// Per-category preference lists and policy flags
pub mod config;

// Session lifecycle and control facade
pub mod session;

// One-call session setup
pub mod builder;

// Engine and host contracts
pub mod callback;
pub mod engine;

// Endpoint identity and its store
pub mod identity;

// Errors and shared constants
pub mod constants;
pub mod error;

// Re-export the host-facing surface for convenience
pub use builder::SessionBuilder;
pub use callback::{CallbackBridge, EnrollmentEvent, HostCallbacks, ReportLevel, StreamDirection};
pub use config::NegotiationConfig;
pub use engine::{EngineBinding, EngineFactory, ProtocolEngine};
pub use error::{Error, Result};
pub use identity::{
    FileIdentityStore, Identifier, IdentityStore, MemoryIdentityStore, SharedIdentityStore,
};
pub use registry::{AlgorithmCategory, AlgorithmDescriptor};
pub use session::{InitOptions, SessionContext, SessionPhase};
