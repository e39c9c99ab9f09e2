//! Contract Test: Record Normalization
//!
//! Constraints verified:
//! - TTL clamping is idempotent
//! - Apex NS records are filtered with one diagnostic per foreign target
//! - ALIAS below the apex becomes a CNAME when the provider requires it

mod common;

use common::*;
use zonesync_core::model::RecordType;
use zonesync_core::normalize::{Diagnostic, ProviderPolicy, normalize};

fn gandi_policy() -> ProviderPolicy {
    ProviderPolicy::new(300)
        .with_max_ttl(2_592_000)
        .with_alias_apex_only()
        .with_apex_ns([".gandi.net."])
}

#[test]
fn normalizing_twice_changes_nothing_more() {
    let records = vec![
        record("www", RecordType::A, "192.0.2.1").with_ttl(30),
        record("big", RecordType::A, "192.0.2.2").with_ttl(9_999_999),
        record("ok", RecordType::A, "192.0.2.3").with_ttl(3600),
    ];

    let first = normalize(ZONE, records, &gandi_policy());
    assert_eq!(first.diagnostics.len(), 2);

    let second = normalize(ZONE, first.records.clone(), &gandi_policy());
    assert_eq!(second.records, first.records);
    assert!(second.diagnostics.is_empty());
}

#[test]
fn each_foreign_apex_ns_is_reported_once() {
    let records = vec![
        record("@", RecordType::Ns, "ns1.other.net."),
        record("@", RecordType::Ns, "ns2.other.net."),
        record("@", RecordType::Ns, "ns-42-a.gandi.net."),
        record("sub", RecordType::Ns, "ns1.other.net."),
    ];

    let out = normalize(ZONE, records, &gandi_policy());

    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].name, "sub");
    let ignored: Vec<_> = out
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::ApexNsIgnored { target, .. } => Some(target.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(ignored, vec!["ns1.other.net.", "ns2.other.net."]);
}

#[test]
fn alias_below_apex_becomes_qualified_cname() {
    let records = vec![
        record("www", RecordType::Alias, "lb"),
        record("@", RecordType::Alias, "lb.example.net."),
    ];

    let out = normalize(ZONE, records, &gandi_policy());

    assert_eq!(out.records[0].rtype, RecordType::Cname);
    assert_eq!(out.records[0].name, "www");
    assert_eq!(out.records[0].target, "lb.example.com.");
    assert_eq!(out.records[1].rtype, RecordType::Alias);
}

#[test]
fn row_policy_keeps_apex_ns_and_raises_low_ttl() {
    let records = vec![
        record("@", RecordType::Ns, "ns1.other.net.").with_ttl(10),
    ];

    let out = normalize(ZONE, records, &ProviderPolicy::new(60));

    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].ttl, 60);
    assert_eq!(
        out.diagnostics,
        vec![Diagnostic::TtlClamped {
            record: "example.com".into(),
            old: 10,
            new: 60,
        }]
    );
}
