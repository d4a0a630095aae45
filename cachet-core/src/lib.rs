//! Core types shared by every cachet crate.
//!
//! Drivers, the namespacing store and the configuration layer all speak in
//! terms of [`Lookup`], [`Ttl`] and [`Raw`] payloads defined here.

pub mod label;
pub mod lookup;
pub mod ttl;

pub use label::DriverLabel;
pub use lookup::Lookup;
pub use ttl::Ttl;

/// Opaque payload stored by drivers.
pub type Raw = bytes::Bytes;
