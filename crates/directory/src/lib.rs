//! Directory domain module (offices and the client registry).
//!
//! Offices own the per-branch invoice counter; clients are deduplicated on
//! their national identity key.

pub mod client;
pub mod office;

pub use client::{Client, ClientDetails, ClientIdType, ClientKey};
pub use office::{Office, OfficeDetails};
