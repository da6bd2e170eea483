//! Serialized access to shared key/value state.
//!
//! ## Contents
//! - [`StateActor`] single owner task, request/reply over a mailbox (primary design)
//! - [`LockedStore`] `RwLock`-guarded map (alternative)
//! - [`StateStore`] the read/write contract both satisfy
//! - [`ActorStats`] read/write accounting

mod actor;
mod locked;
mod store;

pub use actor::{ActorStats, StateActor};
pub use locked::LockedStore;
pub use store::StateStore;
