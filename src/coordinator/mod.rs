//! # Composition root.
//!
//! [`Coordinator`] owns the shared [`Bus`](crate::Bus), the
//! [`SubscriberSet`](crate::SubscriberSet) fed from it, and the root
//! cancellation token every component it builds is tied to.
//! [`CoordinatorBuilder`] assembles one.

mod builder;
mod coordinator;
mod scope;

pub use builder::CoordinatorBuilder;
pub use coordinator::Coordinator;

pub(crate) use scope::Scope;
