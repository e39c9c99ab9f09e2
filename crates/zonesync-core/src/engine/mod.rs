//! Reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Fetching the records a provider currently holds for a zone
//! - Turning a zone's desired records into an ordered list of corrections
//! - Applying those corrections
//!
//! ## Architecture
//!
//! ```text
//! ZoneConfig ──► audit ──► normalize ──┐
//!                                      ├──► Differ ──► compile ──► Plan ──► execute
//! DnsProvider ──► fetch ──► translate ─┘
//! ```
//!
//! Every run starts from a fresh fetch; nothing is cached between runs.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::compile::compile;
use crate::config::ZoneConfig;
use crate::diff::{DiffOptions, Differ, IncrementalDiffer};
use crate::error::{Error, Result};
use crate::model::{Correction, Record, ZoneRef};
use crate::normalize::{Diagnostic, normalize};
use crate::traits::{DnsProvider, Mutator};
use crate::translate::native_to_records;
use crate::translate::row::merge_txt_records;

/// Corrections for one zone, ready to display or execute
#[derive(Debug, Clone)]
pub struct Plan {
    /// The zone as resolved at the provider
    pub zone: ZoneRef,
    /// Corrections in execution order
    pub corrections: Vec<Correction>,
    /// Record-level changes the corrections carry out
    pub change_count: usize,
    /// What the normalizer changed or dropped
    pub diagnostics: Vec<Diagnostic>,
}

impl Plan {
    /// Whether applying the plan would change nothing
    pub fn is_empty(&self) -> bool {
        self.change_count == 0
    }
}

/// A correction that failed to apply
#[derive(Debug)]
pub struct FailedCorrection {
    pub message: String,
    pub error: Error,
}

/// Outcome of [`Reconciler::execute`]
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Messages of corrections applied successfully
    pub applied: Vec<String>,
    /// Corrections that failed
    pub failed: Vec<FailedCorrection>,
    /// Corrections never attempted after an earlier failure
    pub skipped: usize,
}

impl ExecutionReport {
    /// Whether every attempted correction succeeded
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Reconciles zones against one provider
pub struct Reconciler {
    provider: Arc<dyn DnsProvider>,
    differ: Box<dyn Differ>,
}

impl Reconciler {
    /// Create a reconciler using the stock differ
    pub fn new(provider: Arc<dyn DnsProvider>) -> Self {
        Self::with_differ(provider, Box::new(IncrementalDiffer::new()))
    }

    /// Create a reconciler using a custom differ
    pub fn with_differ(provider: Arc<dyn DnsProvider>, differ: Box<dyn Differ>) -> Self {
        Self { provider, differ }
    }

    /// The provider this reconciler talks to
    pub fn provider(&self) -> &Arc<dyn DnsProvider> {
        &self.provider
    }

    /// Resolve `zone` and fetch its records in canonical form
    pub async fn get_zone_records(&self, zone: &str) -> Result<Vec<Record>> {
        let zone_ref = self.provider.lookup_zone(zone).await?;
        self.fetch_records(&zone_ref).await
    }

    async fn fetch_records(&self, zone: &ZoneRef) -> Result<Vec<Record>> {
        let native = self.provider.fetch_existing(zone).await?;
        let records = native_to_records(native, &zone.name)?;
        debug!(
            "Fetched {} records for {} from {}",
            records.len(),
            zone.name,
            self.provider.provider_name()
        );
        Ok(records)
    }

    /// Compute the corrections that make the provider match `zone`
    ///
    /// `existing` must come from [`Reconciler::get_zone_records`] for the
    /// same zone; records without a native back-reference cannot be updated.
    pub async fn get_corrections(&self, zone: &ZoneConfig, existing: &[Record]) -> Result<Plan> {
        let zone_ref = self.provider.lookup_zone(&zone.name).await?;
        self.plan(&zone_ref, zone, existing)
    }

    /// Fetch the zone and compute its plan in one step
    pub async fn plan_zone(&self, zone: &ZoneConfig) -> Result<Plan> {
        let zone_ref = self.provider.lookup_zone(&zone.name).await?;
        let existing = self.fetch_records(&zone_ref).await?;
        self.plan(&zone_ref, zone, &existing)
    }

    fn plan(&self, zone_ref: &ZoneRef, zone: &ZoneConfig, existing: &[Record]) -> Result<Plan> {
        let policy = self.provider.policy();
        policy.validate()?;

        let desired = zone.desired_records();
        self.provider.audit_records(&desired)?;

        let normalized = normalize(&zone_ref.name, desired, policy);
        for diagnostic in &normalized.diagnostics {
            warn!("{}: {}", zone_ref.name, diagnostic);
        }

        let existing: Vec<Record> = existing
            .iter()
            .filter(|record| !policy.owns_apex_ns(record))
            .cloned()
            .collect();

        let mutator = self.provider.mutator();
        // rows at one TXT label are read back as a single record
        let desired = match &mutator {
            Mutator::ByRow(_) => merge_txt_records(normalized.records),
            Mutator::ByLabel(_) => normalized.records,
        };

        let options = DiffOptions::new(mutator.diff_mode()).with_unmanaged(zone.unmanaged.clone());
        let diff = self.differ.diff(&existing, &desired, &options)?;
        let corrections = compile(zone_ref, &diff.instructions, &mutator)?;

        info!(
            "Planned {} corrections ({} changes) for {} using {} mutations",
            corrections.iter().filter(|c| !c.is_report()).count(),
            diff.change_count,
            zone_ref.name,
            mutator.style()
        );

        Ok(Plan {
            zone: zone_ref.clone(),
            corrections,
            change_count: diff.change_count,
            diagnostics: normalized.diagnostics,
        })
    }

    /// Apply a plan's corrections in order
    ///
    /// A failed correction is recorded; with `continue_on_error` the
    /// remaining corrections still run, otherwise they are skipped.
    pub async fn execute(&self, plan: &Plan, continue_on_error: bool) -> ExecutionReport {
        let mut report = ExecutionReport::default();

        for (idx, correction) in plan.corrections.iter().enumerate() {
            if correction.is_report() {
                info!("{}", correction.message);
                continue;
            }

            match correction.apply().await {
                Ok(()) => {
                    info!("{}", correction.message);
                    report.applied.push(correction.message.clone());
                }
                Err(e) => {
                    warn!("Failed to apply {}: {}", correction.message, e);
                    report.failed.push(FailedCorrection {
                        message: correction.message.clone(),
                        error: e,
                    });
                    if !continue_on_error {
                        report.skipped = plan.corrections[idx + 1..]
                            .iter()
                            .filter(|c| !c.is_report())
                            .count();
                        break;
                    }
                }
            }
        }

        report
    }
}
