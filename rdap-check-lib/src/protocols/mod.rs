//! Protocol implementations for RDAP resolution.
//!
//! This module contains the RDAP query client, the response classifier and
//! the IANA bootstrap directory used to find authoritative servers.

/// IANA bootstrap directory with TTL cache
pub mod bootstrap;

/// RDAP query client
pub mod rdap;

/// Response classification
pub mod response;

// Re-export commonly used functions and types
pub use bootstrap::{BootstrapCacheEntry, BootstrapDirectory, ServiceGroup};
pub use rdap::{RdapClient, RdapResponse};
pub use response::{interpret, Interpretation};
