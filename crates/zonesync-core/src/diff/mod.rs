//! Diff capability
//!
//! The reconciler consumes a [`Differ`]: given existing and desired records
//! it returns typed instructions plus the number of effective changes.
//! [`IncrementalDiffer`] is the stock implementation.
//!
//! ## Grouping modes
//!
//! - [`DiffMode::ByLabel`]: one instruction per label, carrying every
//!   existing and desired record at that label
//! - [`DiffMode::ByRecord`]: one instruction per record pair; a CHANGE
//!   holds exactly one existing and one desired record

mod incremental;

pub use incremental::IncrementalDiffer;

use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::{Record, RecordKey};

/// Granularity of the produced instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffMode {
    /// Group by label
    ByLabel,
    /// One instruction per individual record
    ByRecord,
}

/// Options for one diff run
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Instruction granularity
    pub mode: DiffMode,
    /// Labels left alone: exact names, or `*.suffix` patterns
    pub unmanaged: Vec<String>,
}

impl DiffOptions {
    /// Options for `mode` with every label managed
    pub fn new(mode: DiffMode) -> Self {
        Self {
            mode,
            unmanaged: Vec::new(),
        }
    }

    /// Leave the given labels untouched
    pub fn with_unmanaged(mut self, unmanaged: Vec<String>) -> Self {
        self.unmanaged = unmanaged;
        self
    }
}

/// Kind of change an instruction describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InstructionKind {
    /// Informational only, nothing to execute
    Report,
    Create,
    Change,
    Delete,
}

/// One provider-agnostic change derived from a snapshot of existing and
/// desired records
#[derive(Debug, Clone)]
pub struct Instruction {
    pub kind: InstructionKind,
    pub key: RecordKey,
    /// Existing records (CHANGE, DELETE)
    pub old: Vec<Record>,
    /// Desired records (CREATE, CHANGE)
    pub new: Vec<Record>,
    /// Human-readable description, one line per record-level change
    pub msgs: Vec<String>,
    /// The same messages grouped by (label, type)
    pub msgs_by_key: BTreeMap<RecordKey, Vec<String>>,
}

impl Instruction {
    /// Create an instruction without messages
    pub fn new(kind: InstructionKind, key: RecordKey, old: Vec<Record>, new: Vec<Record>) -> Self {
        Self {
            kind,
            key,
            old,
            new,
            msgs: Vec::new(),
            msgs_by_key: BTreeMap::new(),
        }
    }

    /// Record a message against a (label, type) key
    pub fn push_msg(&mut self, key: RecordKey, msg: impl Into<String>) {
        let msg = msg.into();
        self.msgs_by_key.entry(key).or_default().push(msg.clone());
        self.msgs.push(msg);
    }

    /// All messages, newline separated
    pub fn msgs_joined(&self) -> String {
        self.msgs.join("\n")
    }

    /// Messages for one (label, type) key, newline separated
    pub fn msgs_for(&self, key: &RecordKey) -> String {
        self.msgs_by_key
            .get(key)
            .map(|msgs| msgs.join("\n"))
            .unwrap_or_default()
    }
}

/// Result of a diff run
#[derive(Debug, Clone, Default)]
pub struct Diff {
    pub instructions: Vec<Instruction>,
    /// Record-level changes across all CREATE, CHANGE and DELETE instructions
    pub change_count: usize,
}

impl Diff {
    /// Instructions that require a mutation
    pub fn mutations(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions
            .iter()
            .filter(|inst| inst.kind != InstructionKind::Report)
    }
}

/// Computes instructions that turn `existing` into `desired`
pub trait Differ: Send + Sync {
    fn diff(&self, existing: &[Record], desired: &[Record], options: &DiffOptions) -> Result<Diff>;
}

/// Message for a record that will be created
pub fn create_msg(record: &Record) -> String {
    format!("+ CREATE {record}")
}

/// Message for a record that will be deleted
pub fn delete_msg(record: &Record) -> String {
    format!("- DELETE {record}")
}

/// Message for a record that will be modified
pub fn change_msg(old: &Record, new: &Record) -> String {
    format!(
        "± MODIFY {} {} ({} ttl={}) -> ({} ttl={})",
        new.name_fqdn,
        new.rtype,
        old.content(),
        old.ttl,
        new.content(),
        new.ttl
    )
}
