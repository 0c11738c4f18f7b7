//! draugar-signaling – Echtzeit-Relay
//!
//! Langlebige, authentifizierte TCP-Verbindungen pro Mitglied. Der Relay
//! reicht verschluesselte Standorte an alle anderen Verbindungen weiter,
//! ohne sie je zu entschluesseln.
//!
//! ## Architektur
//!
//! ```text
//! TCP Listener (RealtimeServer)
//!     |
//!     v
//! ClientConnection (pro Verbindung ein Task)
//!     |  handshake -> SessionContext (unveraenderlich)
//!     |
//!     +-- SessionTabelle   – ConnectionId -> SessionContext
//!     +-- EventBroadcaster – Send-Queues, try_send an alle anderen
//! ```

pub mod broadcast;
pub mod connection;
pub mod error;
pub mod server_state;
pub mod session;
pub mod tcp;

// Bequeme Re-Exporte
pub use broadcast::EventBroadcaster;
pub use connection::ClientConnection;
pub use draugar_protocol::realtime::{SERVER_VOLL, SHUTDOWN_MELDUNG, UNAUTHORIZED};
pub use error::{SignalingError, SignalingResult};
pub use server_state::{SignalingConfig, SignalingState, VerbindungsPlatz};
pub use session::{SessionContext, SessionTabelle};
pub use tcp::RealtimeServer;
