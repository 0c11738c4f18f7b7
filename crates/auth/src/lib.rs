//! draugar-auth – Identitaets-Tokens
//!
//! Dieses Crate implementiert:
//! - HMAC-SHA256-signierte Tokens mit fester Lebensdauer
//! - AuthService (Ausstellen, Verifizieren)
//!
//! Es gibt keine Sperrliste; einzig der Ablauf macht ein Token ungueltig.

pub mod error;
pub mod service;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use service::{
    AuthService, MAX_LEBENSDAUER_TAGE, MIN_SECRET_LAENGE, STANDARD_LEBENSDAUER_TAGE,
};
pub use token::IdentityToken;
