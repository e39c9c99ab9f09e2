// # zonesync-core
//
// Core library for declarative DNS zone reconciliation.
//
// ## Architecture Overview
//
// - **Record model**: canonical records plus a back-reference to the native
//   record set or rows each one was read from
// - **Normalizer**: fits desired records to a provider's constraints
// - **Differ**: computes create / change / delete instructions
// - **Correction compiler**: turns instructions into executable API calls
//   for the provider's mutation style
// - **Translator**: maps native record sets and rows to canonical records
// - **Reconciler**: wires the above to a `DnsProvider`
// - **ProviderRegistry**: plugin-based registry for DNS providers
//
// ## Design Principles
//
// 1. **Plan before touching**: every validation runs while compiling, before
//    the first mutation
// 2. **Exact identifiers**: updates use the label or row ID the provider
//    returned, never a re-derived one
// 3. **Plugin-Based**: providers are registered dynamically, no hard-coded
//    if-else

pub mod compile;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod registry;
pub mod traits;
pub mod translate;

// Re-export core types for convenience
pub use config::{EngineConfig, ProviderConfig, ZoneConfig, ZoneSyncConfig};
pub use diff::{DiffMode, DiffOptions, Differ, IncrementalDiffer};
pub use engine::{ExecutionReport, Plan, Reconciler};
pub use error::{Error, Result};
pub use model::{Correction, Record, RecordType, ZoneRef};
pub use normalize::{Diagnostic, ProviderPolicy};
pub use registry::ProviderRegistry;
pub use traits::{DnsProvider, DnsProviderFactory, Mutator, RecordSetApi, RowApi};
