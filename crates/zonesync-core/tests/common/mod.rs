//! Test doubles and common utilities for contract tests
//!
//! The doubles record every mutation they receive so tests can assert on
//! the exact calls a plan makes, in order.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use zonesync_core::error::{Error, Result};
use zonesync_core::model::{
    NativeRecordSet, NativeRecords, NativeRow, Record, RecordType, RowDelta, ZoneRef,
};
use zonesync_core::normalize::ProviderPolicy;
use zonesync_core::traits::{DnsProvider, Mutator, RecordSetApi, RowApi};

pub const ZONE: &str = "example.com";

/// A mutation received by one of the recording doubles
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    CreateRecordSet {
        zone: String,
        label: String,
        rtype: String,
        ttl: u32,
        values: Vec<String>,
    },
    UpdateByLabel {
        zone: String,
        label: String,
        sets: Vec<NativeRecordSet>,
    },
    DeleteByLabel {
        zone: String,
        label: String,
    },
    CreateRow(NativeRow),
    UpdateRow {
        id: u64,
        rtype: RecordType,
        delta: RowDelta,
    },
    DeleteRow(u64),
}

/// Records calls and optionally fails the n-th one with a transport error
#[derive(Clone, Default)]
pub struct RecordingApi {
    calls: Arc<Mutex<Vec<ApiCall>>>,
    attempts: Arc<AtomicUsize>,
    fail_on: Option<usize>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the call with this zero-based index
    pub fn failing_on(index: usize) -> Self {
        Self {
            fail_on: Some(index),
            ..Self::default()
        }
    }

    /// Calls that succeeded, in order
    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Every call made, including failed ones
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn record(&self, call: ApiCall) -> Result<()> {
        let index = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(index) {
            return Err(Error::transport("mock", 500, "{\"message\":\"boom\"}"));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl RecordSetApi for RecordingApi {
    async fn create_record_set(
        &self,
        zone: &str,
        label: &str,
        rtype: &str,
        ttl: u32,
        values: &[String],
    ) -> Result<()> {
        self.record(ApiCall::CreateRecordSet {
            zone: zone.into(),
            label: label.into(),
            rtype: rtype.into(),
            ttl,
            values: values.to_vec(),
        })
    }

    async fn update_by_label(&self, zone: &str, label: &str, sets: &[NativeRecordSet]) -> Result<()> {
        self.record(ApiCall::UpdateByLabel {
            zone: zone.into(),
            label: label.into(),
            sets: sets.to_vec(),
        })
    }

    async fn delete_by_label(&self, zone: &str, label: &str) -> Result<()> {
        self.record(ApiCall::DeleteByLabel {
            zone: zone.into(),
            label: label.into(),
        })
    }
}

#[async_trait]
impl RowApi for RecordingApi {
    async fn create_row(&self, row: &NativeRow) -> Result<()> {
        self.record(ApiCall::CreateRow(row.clone()))
    }

    async fn update_row(&self, id: u64, rtype: RecordType, delta: &RowDelta) -> Result<()> {
        self.record(ApiCall::UpdateRow {
            id,
            rtype,
            delta: delta.clone(),
        })
    }

    async fn delete_row(&self, id: u64) -> Result<()> {
        self.record(ApiCall::DeleteRow(id))
    }
}

/// Mutation style of an [`InMemoryProvider`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    ByLabel,
    ByRow,
}

/// A provider serving fixed native records and recording mutations
pub struct InMemoryProvider {
    pub style: Style,
    pub policy: ProviderPolicy,
    pub native: NativeRecords,
    pub api: RecordingApi,
    pub fetch_count: Arc<AtomicUsize>,
}

impl InMemoryProvider {
    /// By-label provider with Gandi-like constraints
    pub fn by_label(sets: Vec<NativeRecordSet>) -> Self {
        Self {
            style: Style::ByLabel,
            policy: ProviderPolicy::new(300)
                .with_max_ttl(2_592_000)
                .with_alias_apex_only()
                .with_apex_ns([".gandi.net."]),
            native: NativeRecords::RecordSets(sets),
            api: RecordingApi::new(),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// By-row provider with SoftLayer-like constraints
    pub fn by_row(rows: Vec<NativeRow>) -> Self {
        Self {
            style: Style::ByRow,
            policy: ProviderPolicy::new(60),
            native: NativeRecords::Rows(rows),
            api: RecordingApi::new(),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_api(mut self, api: RecordingApi) -> Self {
        self.api = api;
        self
    }
}

#[async_trait]
impl DnsProvider for InMemoryProvider {
    fn provider_name(&self) -> &'static str {
        "memory"
    }

    fn policy(&self) -> &ProviderPolicy {
        &self.policy
    }

    fn mutator(&self) -> Mutator {
        match self.style {
            Style::ByLabel => Mutator::ByLabel(Arc::new(self.api.clone())),
            Style::ByRow => Mutator::ByRow(Arc::new(self.api.clone())),
        }
    }

    async fn lookup_zone(&self, zone: &str) -> Result<ZoneRef> {
        if !zone.eq_ignore_ascii_case(ZONE) {
            return Err(Error::not_found(format!("zone {zone}")));
        }
        Ok(match self.style {
            Style::ByLabel => ZoneRef::named(zone),
            Style::ByRow => ZoneRef::with_id(zone, 7),
        })
    }

    async fn fetch_existing(&self, _zone: &ZoneRef) -> Result<NativeRecords> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.native.clone())
    }

    async fn nameservers(&self, _zone: &ZoneRef) -> Result<Vec<String>> {
        Ok(vec!["ns1.example.net.".into()])
    }
}

/// A native record set
pub fn rrset(name: &str, rtype: &str, ttl: u32, values: &[&str]) -> NativeRecordSet {
    NativeRecordSet {
        rrset_name: name.into(),
        rrset_type: rtype.into(),
        rrset_ttl: ttl,
        rrset_values: values.iter().map(|v| v.to_string()).collect(),
    }
}

/// A native row in zone 7
pub fn row(id: u64, host: &str, rtype: &str, data: &str, ttl: u32) -> NativeRow {
    NativeRow {
        id: Some(id),
        domain_id: Some(7),
        host: host.into(),
        data: data.into(),
        ttl,
        record_type: rtype.into(),
        ..Default::default()
    }
}

/// A desired record in [`ZONE`]
pub fn record(label: &str, rtype: RecordType, target: &str) -> Record {
    let mut record = Record::new(ZONE, label, rtype, target);
    record.canonicalize(ZONE);
    record
}
