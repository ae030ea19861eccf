//! Core traits for the DNS-01 challenge system
//!
//! - [`DnsProvider`]: Zone listing and TXT record create/delete via provider APIs

pub mod dns_provider;

pub use dns_provider::{CreateResult, DeleteResult, DnsProvider, DnsProviderFactory};
