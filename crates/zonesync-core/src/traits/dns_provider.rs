// # DNS Provider Traits
//
// Defines what the reconciler needs from a DNS backend: a way to resolve a
// zone, fetch its records in native form, and mutate them.
//
// ## Mutation styles
//
// Providers differ in the unit they mutate. Rather than branching on the
// provider's identity, a provider hands out a [`Mutator`]:
//
// - `Mutator::ByLabel`: every record set at a label is replaced in one call
//   (Gandi LiveDNS)
// - `Mutator::ByRow`: each row is created, edited or deleted by numeric ID
//   (SoftLayer)
//
// ## Implementations
//
// - Gandi: `zonesync-provider-gandi` crate
// - SoftLayer: `zonesync-provider-softlayer` crate

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::diff::DiffMode;
use crate::error::Result;
use crate::model::{NativeRecordSet, NativeRecords, NativeRow, Record, RecordType, RowDelta, ZoneRef};
use crate::normalize::ProviderPolicy;

/// Mutation capability of a record-set shaped backend
///
/// Labels passed to these methods are relative to the zone and are used
/// verbatim in request paths, so callers pass the exact-case label the
/// provider returned when one is known.
#[async_trait]
pub trait RecordSetApi: Send + Sync {
    /// Create one record set at `label`
    async fn create_record_set(
        &self,
        zone: &str,
        label: &str,
        rtype: &str,
        ttl: u32,
        values: &[String],
    ) -> Result<()>;

    /// Replace every record set at `label` with `sets`
    async fn update_by_label(&self, zone: &str, label: &str, sets: &[NativeRecordSet]) -> Result<()>;

    /// Delete every record set at `label`
    async fn delete_by_label(&self, zone: &str, label: &str) -> Result<()>;
}

/// Mutation capability of a row shaped backend
///
/// Each call issues exactly one request.
#[async_trait]
pub trait RowApi: Send + Sync {
    /// Create one row; the row carries its zone's numeric ID
    async fn create_row(&self, row: &NativeRow) -> Result<()>;

    /// Apply `delta` to the row with numeric ID `id`
    async fn update_row(&self, id: u64, rtype: RecordType, delta: &RowDelta) -> Result<()>;

    /// Delete the row with numeric ID `id`
    async fn delete_row(&self, id: u64) -> Result<()>;
}

/// The mutation capability a provider exposes
#[derive(Clone)]
pub enum Mutator {
    ByLabel(Arc<dyn RecordSetApi>),
    ByRow(Arc<dyn RowApi>),
}

impl Mutator {
    /// Diff granularity matching this capability
    pub fn diff_mode(&self) -> DiffMode {
        match self {
            Mutator::ByLabel(_) => DiffMode::ByLabel,
            Mutator::ByRow(_) => DiffMode::ByRecord,
        }
    }

    /// Short name for logs
    pub fn style(&self) -> &'static str {
        match self {
            Mutator::ByLabel(_) => "by-label",
            Mutator::ByRow(_) => "by-row",
        }
    }
}

impl fmt::Debug for Mutator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Mutator").field(&self.style()).finish()
    }
}

/// Trait for DNS provider implementations
///
/// # Thread Safety
///
/// Implementations are shared across zone tasks behind an `Arc` and must
/// not hold mutable state between calls.
///
/// # Retries
///
/// Providers never retry. A failed request surfaces as an error carrying
/// the provider's raw status or result code.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// A static string identifying the provider (e.g., "gandi", "softlayer")
    fn provider_name(&self) -> &'static str;

    /// Constraints desired records are normalized against
    fn policy(&self) -> &ProviderPolicy;

    /// Mutation capability used to compile corrections
    fn mutator(&self) -> Mutator;

    /// Reject records the provider cannot host
    ///
    /// Runs on desired records before normalization.
    fn audit_records(&self, _records: &[Record]) -> Result<()> {
        Ok(())
    }

    /// Resolve a zone name to the provider's handle for it
    ///
    /// # Returns
    ///
    /// - `Ok(ZoneRef)`: the zone, with its numeric ID if the provider has one
    /// - `Err(Error::NotFound)`: no zone matches
    /// - `Err(Error::Ambiguous)`: more than one zone matches
    async fn lookup_zone(&self, zone: &str) -> Result<ZoneRef>;

    /// Fetch every record of a zone in native form
    async fn fetch_existing(&self, zone: &ZoneRef) -> Result<NativeRecords>;

    /// Authoritative name servers of a zone
    async fn nameservers(&self, zone: &ZoneRef) -> Result<Vec<String>>;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>>;
}
