//! Desired-record normalization
//!
//! Rewrites the desired records of a zone so they fit what a provider can
//! store before they are diffed against the existing records. The pass is
//! pure: it never logs and never touches the network. Every silent change
//! is reported back as a [`Diagnostic`] for the caller to surface.
//!
//! ## Rules
//!
//! 1. ALIAS outside the apex becomes a CNAME when the provider only allows
//!    aliasing at the apex
//! 2. TTLs are clamped into the provider's range
//! 3. Apex NS records are dropped when the provider owns the apex NS set;
//!    a diagnostic is emitted unless they point at the provider's own servers

use std::fmt;

use crate::error::{Error, Result};
use crate::model::{Record, RecordType, normalize_zone, qualify};

/// Apex NS ownership of a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApexNsPolicy {
    /// Suffixes identifying the provider's own name servers (e.g. `.gandi.net.`)
    pub own_suffixes: Vec<String>,
}

/// Constraints a provider places on the records it stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPolicy {
    /// Smallest accepted TTL
    pub min_ttl: u32,
    /// Largest accepted TTL, if bounded
    pub max_ttl: Option<u32>,
    /// ALIAS is accepted only at the zone apex
    pub alias_apex_only: bool,
    /// Apex NS records are managed by the provider itself
    pub apex_ns: Option<ApexNsPolicy>,
}

impl ProviderPolicy {
    /// A policy with only a TTL floor
    pub fn new(min_ttl: u32) -> Self {
        Self {
            min_ttl,
            max_ttl: None,
            alias_apex_only: false,
            apex_ns: None,
        }
    }

    /// Set a TTL ceiling
    pub fn with_max_ttl(mut self, max_ttl: u32) -> Self {
        self.max_ttl = Some(max_ttl);
        self
    }

    /// Only allow ALIAS at the apex
    pub fn with_alias_apex_only(mut self) -> Self {
        self.alias_apex_only = true;
        self
    }

    /// Mark the apex NS set as provider-owned
    pub fn with_apex_ns<I, S>(mut self, own_suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apex_ns = Some(ApexNsPolicy {
            own_suffixes: own_suffixes.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Reject policies no record could satisfy
    pub fn validate(&self) -> Result<()> {
        if let Some(max_ttl) = self.max_ttl
            && self.min_ttl > max_ttl
        {
            return Err(Error::config(format!(
                "minimum TTL {} exceeds maximum TTL {}",
                self.min_ttl, max_ttl
            )));
        }
        Ok(())
    }

    /// Whether the provider owns `record`, so it is neither created nor deleted
    pub fn owns_apex_ns(&self, record: &Record) -> bool {
        self.apex_ns.is_some() && record.rtype == RecordType::Ns && record.is_apex()
    }

    fn clamp_ttl(&self, ttl: u32) -> u32 {
        let ttl = ttl.max(self.min_ttl);
        match self.max_ttl {
            Some(max_ttl) => ttl.min(max_ttl),
            None => ttl,
        }
    }
}

/// A change the normalizer made, or a record it dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// TTL moved into the provider's range
    TtlClamped {
        record: String,
        old: u32,
        new: u32,
    },
    /// Apex NS record pointing away from the provider's servers was dropped
    ApexNsIgnored { record: String, target: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::TtlClamped { record, old, new } => {
                write!(f, "TTL of {record} not supported; setting from {old} to {new}")
            }
            Diagnostic::ApexNsIgnored { record, target } => write!(
                f,
                "changing apex NS records is not supported; ignoring {record} -> {target}"
            ),
        }
    }
}

/// Output of [`normalize`]
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Records safe to diff against the provider
    pub records: Vec<Record>,
    /// One entry per silent modification or dropped record
    pub diagnostics: Vec<Diagnostic>,
}

/// Rewrite `records` to fit `policy`
pub fn normalize(zone: &str, records: Vec<Record>, policy: &ProviderPolicy) -> Normalized {
    let zone = normalize_zone(zone);
    let mut out = Normalized {
        records: Vec::with_capacity(records.len()),
        diagnostics: Vec::new(),
    };

    for mut record in records {
        if record.rtype == RecordType::Alias && policy.alias_apex_only && !record.is_apex() {
            record.rtype = RecordType::Cname;
            record.target = qualify(&record.target, &zone);
        }

        let ttl = policy.clamp_ttl(record.ttl);
        if ttl != record.ttl {
            out.diagnostics.push(Diagnostic::TtlClamped {
                record: record.name_fqdn.clone(),
                old: record.ttl,
                new: ttl,
            });
            record.ttl = ttl;
        }

        if policy.owns_apex_ns(&record)
            && let Some(apex_ns) = &policy.apex_ns
        {
            let target = qualify(&record.target, &zone).to_ascii_lowercase();
            let own = apex_ns
                .own_suffixes
                .iter()
                .any(|suffix| target.ends_with(&suffix.to_ascii_lowercase()));
            if !own {
                out.diagnostics.push(Diagnostic::ApexNsIgnored {
                    record: record.name_fqdn.clone(),
                    target: record.target.clone(),
                });
            }
            continue;
        }

        out.records.push(record);
    }

    out
}
