//! Core traits for the zonesync system
//!
//! - [`DnsProvider`]: zone lookup, record fetching and provider policy
//! - [`RecordSetApi`] / [`RowApi`]: the two mutation capabilities, exposed
//!   through the [`Mutator`] tag

pub mod dns_provider;

pub use dns_provider::{DnsProvider, DnsProviderFactory, Mutator, RecordSetApi, RowApi};
