//! Contract Test: Correction Compilation
//!
//! Constraints verified:
//! - By-label updates address the exact-case label the provider returned
//! - A CHANGE whose rows need no edit is rejected before any call
//! - By-row plans run deletes before creates before changes
//! - A failed mutation surfaces the provider's raw result code

mod common;

use std::sync::Arc;

use common::*;
use zonesync_core::compile::compile;
use zonesync_core::diff::{DiffMode, DiffOptions, Differ, IncrementalDiffer, Instruction, InstructionKind};
use zonesync_core::error::Error;
use zonesync_core::model::{Original, RecordType, ZoneRef};
use zonesync_core::translate::rrset::record_set_to_records;
use zonesync_core::translate::row::rows_to_records;
use zonesync_core::traits::Mutator;

#[test]
fn update_uses_exact_case_label() {
    let existing = record_set_to_records(&rrset("Www", "A", 300, &["192.0.2.1"]), ZONE).unwrap();
    let desired = vec![record("www", RecordType::A, "192.0.2.2")];

    let diff = IncrementalDiffer
        .diff(&existing, &desired, &DiffOptions::new(DiffMode::ByLabel))
        .unwrap();
    let api = RecordingApi::new();
    let corrections = compile(
        &ZoneRef::named(ZONE),
        &diff.instructions,
        &Mutator::ByLabel(Arc::new(api.clone())),
    )
    .unwrap();

    assert_eq!(corrections.len(), 1);
    tokio_test::block_on(corrections[0].apply()).unwrap();

    match &api.calls()[0] {
        ApiCall::UpdateByLabel { label, sets, .. } => {
            assert_eq!(label, "Www");
            assert_eq!(sets.len(), 1);
            assert_eq!(sets[0].rrset_name, "Www");
            assert_eq!(sets[0].rrset_values, vec!["192.0.2.2"]);
        }
        other => panic!("expected an update by label, got {other:?}"),
    }
}

#[test]
fn zero_diff_change_is_rejected() {
    let existing = rows_to_records(&[row(11, "www", "a", "192.0.2.1", 300)], ZONE).unwrap();
    let mut desired = existing[0].clone();
    desired.original = None;

    let instruction = Instruction::new(
        InstructionKind::Change,
        desired.key(),
        existing.clone(),
        vec![desired],
    );
    let api = RecordingApi::new();
    let err = compile(
        &ZoneRef::with_id(ZONE, 7),
        &[instruction],
        &Mutator::ByRow(Arc::new(api.clone())),
    )
    .unwrap_err();

    assert!(matches!(err, Error::Consistency(_)));
    assert_eq!(api.attempts(), 0);
}

#[test]
fn by_row_deletes_by_numeric_id() {
    let existing = rows_to_records(
        &[
            row(11, "www", "a", "192.0.2.1", 300),
            row(12, "@", "txt", "one", 300),
            row(13, "@", "txt", "two", 300),
        ],
        ZONE,
    )
    .unwrap();

    let diff = IncrementalDiffer
        .diff(&existing, &[], &DiffOptions::new(DiffMode::ByRecord))
        .unwrap();
    let api = RecordingApi::new();
    let corrections = compile(
        &ZoneRef::with_id(ZONE, 7),
        &diff.instructions,
        &Mutator::ByRow(Arc::new(api.clone())),
    )
    .unwrap();

    for correction in &corrections {
        tokio_test::block_on(correction.apply()).unwrap();
    }
    let mut deleted: Vec<u64> = api
        .calls()
        .into_iter()
        .map(|call| match call {
            ApiCall::DeleteRow(id) => id,
            other => panic!("expected only deletes, got {other:?}"),
        })
        .collect();
    deleted.sort();
    assert_eq!(deleted, vec![11, 12, 13]);
}

#[test]
fn by_row_plan_orders_deletes_creates_changes() {
    let existing = rows_to_records(
        &[
            row(11, "www", "a", "192.0.2.1", 300),
            row(12, "old", "a", "192.0.2.5", 300),
        ],
        ZONE,
    )
    .unwrap();
    let desired = vec![
        record("www", RecordType::A, "192.0.2.1").with_ttl(900),
        record("new", RecordType::A, "192.0.2.6"),
    ];

    let diff = IncrementalDiffer
        .diff(&existing, &desired, &DiffOptions::new(DiffMode::ByRecord))
        .unwrap();
    let api = RecordingApi::new();
    let corrections = compile(
        &ZoneRef::with_id(ZONE, 7),
        &diff.instructions,
        &Mutator::ByRow(Arc::new(api.clone())),
    )
    .unwrap();

    assert_eq!(corrections.len(), 3);
    assert!(corrections[0].message.starts_with("- DELETE"));
    assert!(corrections[1].message.starts_with("+ CREATE"));
    assert!(corrections[2].message.starts_with("± MODIFY"));

    for correction in &corrections {
        tokio_test::block_on(correction.apply()).unwrap();
    }
    let calls = api.calls();
    assert_eq!(calls[0], ApiCall::DeleteRow(12));
    match &calls[1] {
        ApiCall::CreateRow(created) => {
            assert_eq!(created.host, "new");
            assert_eq!(created.domain_id, Some(7));
            assert_eq!(created.record_type, "a");
        }
        other => panic!("expected a create, got {other:?}"),
    }
    match &calls[2] {
        ApiCall::UpdateRow { id, delta, .. } => {
            assert_eq!(*id, 11);
            assert_eq!(delta.fields(), vec!["ttl"]);
            assert_eq!(delta.ttl, Some(900));
        }
        other => panic!("expected an update, got {other:?}"),
    }
}

#[test]
fn failed_mutation_keeps_raw_result_code() {
    let desired = vec![record("www", RecordType::A, "192.0.2.1")];
    let diff = IncrementalDiffer
        .diff(&[], &desired, &DiffOptions::new(DiffMode::ByLabel))
        .unwrap();
    let api = RecordingApi::failing_on(0);
    let corrections = compile(
        &ZoneRef::named(ZONE),
        &diff.instructions,
        &Mutator::ByLabel(Arc::new(api.clone())),
    )
    .unwrap();

    let err = tokio_test::block_on(corrections[0].apply()).unwrap_err();
    match err {
        Error::Transport { code, detail, .. } => {
            assert_eq!(code, 500);
            assert!(detail.contains("boom"));
        }
        other => panic!("expected a transport error, got {other:?}"),
    }
}

#[test]
fn every_fetched_record_carries_its_original() {
    let records = record_set_to_records(&rrset("Mail", "MX", 300, &["10 mx1", "20 mx2"]), ZONE).unwrap();
    assert!(records.iter().all(|r| matches!(
        r.original,
        Some(Original::RecordSet(ref set)) if set.rrset_name == "Mail"
    )));
}
