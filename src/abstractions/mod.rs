//! Abstraction layers for external collaborators
//!
//! This module provides trait-based abstractions for the remote deal table
//! and the identity provider to enable testing and dependency injection.

pub mod identity;
pub mod persistence;

pub use identity::{Identity, IdentityProvider, MockIdentityProvider};
pub use persistence::{
    DealPersistence, MockDealPersistence, PersistenceCall, PersistenceOp,
};
