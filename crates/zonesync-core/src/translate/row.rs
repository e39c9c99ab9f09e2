//! Row translation
//!
//! Row-oriented backends store one value per row with its own numeric ID.
//! SRV rows keep service and protocol in dedicated columns, MX rows keep the
//! preference in `mxPriority`, and TXT records span one row per segment.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{NativeRow, Original, Record, RecordType, qualify};

/// Lowest TTL a row-oriented backend accepts
pub const ROW_MIN_TTL: u32 = 60;

/// SRV labels must be `_service._protocol`
static SRV_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^_(?P<service>\w+)\._(?P<protocol>\w+)$").expect("SRV_LABEL is a valid regex pattern")
});

type RowDecoder = fn(&NativeRow, RecordType, &str) -> Record;

fn row_decoder(rtype: RecordType) -> RowDecoder {
    match rtype {
        RecordType::Srv => srv_from_row,
        RecordType::Mx => mx_from_row,
        RecordType::Txt => txt_from_row,
        _ => plain_from_row,
    }
}

fn base_record(row: &NativeRow, rtype: RecordType, label: &str, zone: &str) -> Record {
    let data = if rtype.has_host_target() {
        qualify(&row.data, zone)
    } else {
        row.data.clone()
    };
    Record::new(zone, label, rtype, data)
        .with_ttl(row.ttl)
        .with_original(Original::Rows(vec![row.clone()]))
}

fn plain_from_row(row: &NativeRow, rtype: RecordType, zone: &str) -> Record {
    base_record(row, rtype, &row.host, zone)
}

fn mx_from_row(row: &NativeRow, rtype: RecordType, zone: &str) -> Record {
    base_record(row, rtype, &row.host, zone).with_mx_preference(row.mx_priority.unwrap_or_default())
}

fn txt_from_row(row: &NativeRow, rtype: RecordType, zone: &str) -> Record {
    let mut record = base_record(row, rtype, &row.host, zone);
    record.set_txt(vec![row.data.clone()]);
    record
}

fn srv_from_row(row: &NativeRow, rtype: RecordType, zone: &str) -> Record {
    let service = row.service.as_deref().map(underscored).unwrap_or_default();
    let protocol = row
        .protocol
        .as_deref()
        .map(underscored)
        .unwrap_or_else(|| "_tcp".to_string());
    let label = format!("{}.{}", service, protocol.to_ascii_lowercase());
    base_record(row, rtype, &label, zone).with_srv(
        row.priority.unwrap_or_default(),
        row.weight.unwrap_or_default(),
        row.port.unwrap_or_default(),
    )
}

fn underscored(name: &str) -> String {
    if name.is_empty() || name.starts_with('_') {
        name.to_string()
    } else {
        format!("_{name}")
    }
}

/// Convert native rows into canonical records
///
/// SOA rows are dropped. TXT rows sharing a label merge into one record
/// whose segments follow row order; its original keeps every row.
pub fn rows_to_records(rows: &[NativeRow], zone: &str) -> Result<Vec<Record>> {
    let mut records: Vec<Record> = Vec::new();

    for row in rows {
        let rtype: RecordType = row.record_type.parse()?;
        if rtype == RecordType::Soa {
            continue;
        }

        let record = row_decoder(rtype)(row, rtype, zone);
        push_merging_txt(&mut records, record);
    }

    Ok(records)
}

/// Fold TXT records sharing a label into one record, as rows are read back
///
/// The merged record keeps the TTL of the first record at the label.
pub fn merge_txt_records(records: Vec<Record>) -> Vec<Record> {
    let mut merged = Vec::with_capacity(records.len());
    for record in records {
        push_merging_txt(&mut merged, record);
    }
    merged
}

fn push_merging_txt(records: &mut Vec<Record>, record: Record) {
    if record.rtype == RecordType::Txt
        && let Some(merged) = records
            .iter_mut()
            .find(|r| r.rtype == RecordType::Txt && r.name_fqdn == record.name_fqdn)
    {
        let mut segments = merged.txt.clone();
        segments.extend(record.txt);
        merged.set_txt(segments);
        if let Some(Original::Rows(originals)) = &mut merged.original
            && let Some(Original::Rows(rows)) = record.original
        {
            originals.extend(rows);
        }
        return;
    }
    records.push(record);
}

/// Raise a TTL to the backend floor
pub fn verify_min_ttl(ttl: u32) -> u32 {
    if ttl < ROW_MIN_TTL {
        debug!("Raising TTL to minimum supported value: {} -> {}", ttl, ROW_MIN_TTL);
        return ROW_MIN_TTL;
    }
    ttl
}

/// Split an SRV label into bare `(service, protocol)` column values
///
/// The backend prepends the underscores itself.
pub fn split_srv_label(label: &str) -> Result<(String, String)> {
    let captures = SRV_LABEL.captures(label).ok_or_else(|| {
        Error::validation(
            format!("{label} SRV"),
            format!("SRV record must match format \"_service._protocol\" not {label}"),
        )
    })?;
    Ok((
        captures["service"].to_string(),
        captures["protocol"].to_ascii_lowercase(),
    ))
}

/// Convert a canonical record into the native rows that store it
///
/// TXT records yield one row per segment; every other type yields one row.
pub fn record_to_rows(record: &Record, domain_id: Option<u64>) -> Result<Vec<NativeRow>> {
    let base = NativeRow {
        id: None,
        domain_id,
        host: record.name.clone(),
        data: record.target.clone(),
        ttl: verify_min_ttl(record.ttl),
        record_type: record.rtype.as_str().to_ascii_lowercase(),
        ..Default::default()
    };

    let rows = match record.rtype {
        RecordType::Txt if !record.txt.is_empty() => record
            .txt
            .iter()
            .map(|segment| NativeRow {
                data: segment.clone(),
                ..base.clone()
            })
            .collect(),
        RecordType::Mx => vec![NativeRow {
            mx_priority: Some(record.mx_preference),
            ..base
        }],
        RecordType::Srv => {
            let (service, protocol) = split_srv_label(&record.name)?;
            vec![NativeRow {
                service: Some(service),
                protocol: Some(protocol),
                priority: Some(record.srv_priority),
                weight: Some(record.srv_weight),
                port: Some(record.srv_port),
                ..base
            }]
        }
        _ => vec![base],
    };
    Ok(rows)
}
