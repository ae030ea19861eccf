// # dns01-core
//
// Core library for fulfilling DNS-01 challenges.
//
// ## Architecture Overview
//
// This library provides the core functionality for proving domain control
// with a temporary TXT record:
// - **DnsProvider**: Trait for listing zones and creating/deleting TXT records via provider APIs
// - **zone**: Resolution of a challenge domain to its managed zone and record name
// - **ChallengeManager**: Publishes the record, waits for propagation, removes it again
// - **MemoryProvider**: In-process provider for tests and embedding
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Challenge logic is separate from provider APIs
// 2. **Explicit Wiring**: Hosts construct a provider and a manager directly
// 3. **Stateless Between Calls**: `retract` recomputes everything `fulfill` derived
// 4. **Library-First**: The hook binary is a thin layer over this crate
// 5. **Idempotency**: Duplicate creates and repeated deletes are safe

pub mod traits;
pub mod zone;
pub mod lifecycle;
pub mod provider;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsProvider, DnsProviderFactory, CreateResult, DeleteResult};
pub use zone::ChallengeTarget;
pub use lifecycle::{ChallengeEvent, ChallengeManager, ChallengeOperation, ChallengeRecord, RetractOutcome};
pub use provider::MemoryProvider;
pub use config::{ChallengeConfig, Credentials, ProviderConfig};
pub use error::{Error, Result};
