//! External system integrations for Satchel.
//!
//! - [`remote`] - the remote collection server (trait plus HTTP client)
//! - [`storage`] - local form storage and export writers
//!
//! Both sides are trait-based so the export driver can run against in-memory
//! fakes in tests.

pub mod remote;
pub mod storage;
