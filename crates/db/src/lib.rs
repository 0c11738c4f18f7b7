//! draugar-db – Repository-Abstraktion
//!
//! Persistenz liegt ausserhalb des Kerns. Dieses Crate beschreibt sie als
//! Repository-Traits und liefert ein In-Memory-Backend, das Server und
//! Tests verwenden.

pub mod error;
pub mod memory;
pub mod models;
pub mod repository;

pub use error::{DbError, DbResult};
pub use memory::InMemoryStore;
pub use models::{GroupRecord, MemberRecord, NeueGruppe, ERSTE_KEY_VERSION, GRUPPEN_NAME};
pub use repository::{GroupRepository, MemberRepository};
