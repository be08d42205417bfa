//! Entity records and the collections that own them.
//!
//! Every discovered extension becomes an [`Entity`]: a read-only, ordered map of
//! descriptor fields with an identity key. Entities of one kind live in a
//! [`Collection`], which upserts by identity and looks entities up linearly in
//! insertion order.

pub mod collection;
pub mod record;

pub use collection::Collection;
pub use record::{Entity, Fields};
