//! Native record shapes and the back-reference canonical records keep to them
//!
//! Two shapes cover the supported backends:
//!
//! - [`NativeRecordSet`]: one (name, type) pair holding every value and a
//!   single TTL, mutated as a unit.
//! - [`NativeRow`]: one value per row with its own numeric ID and
//!   type-specific columns.

use serde::{Deserialize, Serialize};

/// A record set keyed by (name, type)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeRecordSet {
    /// Label as stored by the provider, exact case
    pub rrset_name: String,
    /// Record type mnemonic
    pub rrset_type: String,
    /// TTL shared by every value
    pub rrset_ttl: u32,
    /// Ordered values in presentation form
    pub rrset_values: Vec<String>,
}

/// One record row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeRow {
    /// Numeric row ID, absent on rows not created yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Numeric ID of the owning zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<u64>,
    /// Label as stored by the provider
    pub host: String,
    /// Record value
    pub data: String,
    /// TTL in seconds
    pub ttl: u32,
    /// Record type mnemonic
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mx_priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Field-level change to an existing row; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mx_priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl RowDelta {
    /// Whether no field differs
    pub fn is_empty(&self) -> bool {
        *self == RowDelta::default()
    }

    /// Names of the fields carried by this delta
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.host.is_some() {
            fields.push("host");
        }
        if self.data.is_some() {
            fields.push("data");
        }
        if self.ttl.is_some() {
            fields.push("ttl");
        }
        if self.mx_priority.is_some() {
            fields.push("mxPriority");
        }
        if self.priority.is_some() {
            fields.push("priority");
        }
        if self.weight.is_some() {
            fields.push("weight");
        }
        if self.port.is_some() {
            fields.push("port");
        }
        fields
    }
}

/// Records as fetched from a provider, in the provider's own shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeRecords {
    /// Record-set oriented backend
    RecordSets(Vec<NativeRecordSet>),
    /// Row oriented backend
    Rows(Vec<NativeRow>),
}

/// Back-reference from a canonical record to the native record(s) it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Original {
    /// The record set holding this value
    RecordSet(NativeRecordSet),
    /// The row(s) this record was built from; several for merged TXT records
    Rows(Vec<NativeRow>),
}

impl Original {
    /// Exact-case label of the originating record set
    pub fn record_set_name(&self) -> Option<&str> {
        match self {
            Original::RecordSet(set) => Some(&set.rrset_name),
            Original::Rows(_) => None,
        }
    }

    /// Originating rows, empty for record-set originals
    pub fn rows(&self) -> &[NativeRow] {
        match self {
            Original::RecordSet(_) => &[],
            Original::Rows(rows) => rows,
        }
    }

    /// Numeric IDs of the originating rows
    pub fn row_ids(&self) -> Vec<u64> {
        self.rows().iter().filter_map(|row| row.id).collect()
    }
}

/// A zone resolved at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRef {
    /// Zone name as configured
    pub name: String,
    /// Provider-side numeric ID, for providers that key zones by ID
    pub id: Option<u64>,
}

impl ZoneRef {
    /// A zone addressed by name only
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }

    /// A zone with a provider-side numeric ID
    pub fn with_id(name: impl Into<String>, id: u64) -> Self {
        Self {
            name: name.into(),
            id: Some(id),
        }
    }
}
