//! Translation between native provider records and canonical records
//!
//! - [`rrset`]: record-set shaped backends (one set per name and type)
//! - [`row`]: row shaped backends (one row per value)

pub mod row;
pub mod rrset;

use crate::error::{Error, Result};
use crate::model::{NativeRecords, Record, normalize_zone};

pub use crate::model::qualify;

/// Convert fetched native records into canonical records
pub fn native_to_records(native: NativeRecords, zone: &str) -> Result<Vec<Record>> {
    match native {
        NativeRecords::RecordSets(sets) => {
            let mut records = Vec::new();
            for set in &sets {
                records.extend(rrset::record_set_to_records(set, zone)?);
            }
            Ok(records)
        }
        NativeRecords::Rows(rows) => row::rows_to_records(&rows, zone),
    }
}

/// Short label of `name_fqdn` relative to `zone`, `@` for the apex
pub fn short_label(name_fqdn: &str, zone: &str) -> String {
    let zone = normalize_zone(zone);
    let name = name_fqdn.trim_end_matches('.');
    if name.eq_ignore_ascii_case(&zone) {
        return "@".to_string();
    }
    name.strip_suffix(&format!(".{zone}"))
        .unwrap_or(name)
        .to_string()
}

/// Split a presentation-form TXT value into its segments
///
/// Unquoted input is taken as a single segment.
pub fn parse_txt(value: &str) -> Result<Vec<String>> {
    let value = value.trim();
    if !value.starts_with('"') {
        return Ok(vec![value.to_string()]);
    }

    let mut segments = Vec::new();
    let mut chars = value.chars();
    loop {
        match chars.next() {
            None => break,
            Some(c) if c.is_whitespace() => continue,
            Some('"') => {
                let mut segment = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some(escaped) => segment.push(escaped),
                            None => break,
                        },
                        '"' => {
                            closed = true;
                            break;
                        }
                        other => segment.push(other),
                    }
                }
                if !closed {
                    return Err(Error::validation(value, "unterminated TXT string"));
                }
                segments.push(segment);
            }
            Some(_) => return Err(Error::validation(value, "TXT segments must be quoted")),
        }
    }
    Ok(segments)
}
