//! draugar-protocol – Draht-Formate
//!
//! Dieses Crate definiert alle Strukturen, die zwischen Geraet und Server
//! ausgetauscht werden. Der Server behandelt [`EncryptedPayload`] als
//! undurchsichtige Nutzlast; nur Geraete kennen [`LocationRecord`] im Klartext.

pub mod keys;
pub mod payload;
pub mod realtime;
pub mod wire;

pub use keys::{AktuellesMitglied, RegisterKeyRequest, WrappedGroupKeyPackage};
pub use payload::{EncryptedPayload, LocationRecord};
pub use realtime::{
    HandshakeAnfrage, HandshakeBestaetigung, LocationBroadcast, PingNachricht, PresenzHinweis,
    RealtimeMessage,
};
pub use wire::FrameCodec;
