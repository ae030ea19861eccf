// # Provider Implementations
//
// DnsProvider implementations that live in the core crate. Remote providers
// live in their own crates (e.g. `dns01-provider-regru`).

pub mod memory;

pub use memory::{MemoryProvider, MemoryProviderFactory};
