//! Resources managed by converge
//!
//! Every declaration in a manifest becomes a [`reconcile::Resource`] with:
//! - State detection (current vs desired)
//! - Apply function (converge current → desired)
//! - Privilege requirements (mutating actions only)

pub mod service;

pub use service::ServiceResource;
