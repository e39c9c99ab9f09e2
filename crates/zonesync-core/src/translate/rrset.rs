//! Record-set translation
//!
//! A native record set holds every value of one (name, type) pair. Each value
//! becomes one canonical record; the way a value is read depends on the type
//! and is picked from [`value_parser`].

use crate::error::{Error, Result};
use crate::model::{NativeRecordSet, Original, Record, RecordType, qualify};

use super::parse_txt;

type ValueParser = fn(&mut Record, &str, &str) -> Result<()>;

/// Parser filling the type-specific fields of a record from one value
fn value_parser(rtype: RecordType) -> ValueParser {
    match rtype {
        RecordType::Mx => parse_mx,
        RecordType::Srv => parse_srv,
        RecordType::Txt => parse_txt_value,
        rtype if rtype.has_host_target() => parse_host,
        _ => parse_plain,
    }
}

fn parse_plain(record: &mut Record, value: &str, _zone: &str) -> Result<()> {
    record.target = value.to_string();
    Ok(())
}

fn parse_host(record: &mut Record, value: &str, zone: &str) -> Result<()> {
    record.target = qualify(value, zone);
    Ok(())
}

fn parse_mx(record: &mut Record, value: &str, zone: &str) -> Result<()> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    let &[preference, target] = fields.as_slice() else {
        return Err(Error::validation(
            record.key().to_string(),
            format!("MX value must be \"preference target\", got {value:?}"),
        ));
    };
    record.mx_preference = parse_u16(record, "MX preference", preference)?;
    record.target = qualify(target, zone);
    Ok(())
}

fn parse_srv(record: &mut Record, value: &str, zone: &str) -> Result<()> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    let &[priority, weight, port, target] = fields.as_slice() else {
        return Err(Error::validation(
            record.key().to_string(),
            format!("SRV value must be \"priority weight port target\", got {value:?}"),
        ));
    };
    record.srv_priority = parse_u16(record, "SRV priority", priority)?;
    record.srv_weight = parse_u16(record, "SRV weight", weight)?;
    record.srv_port = parse_u16(record, "SRV port", port)?;
    record.target = qualify(target, zone);
    Ok(())
}

fn parse_txt_value(record: &mut Record, value: &str, _zone: &str) -> Result<()> {
    record.set_txt(parse_txt(value)?);
    Ok(())
}

fn parse_u16(record: &Record, field: &str, value: &str) -> Result<u16> {
    value.parse().map_err(|_| {
        Error::validation(
            record.key().to_string(),
            format!("{field} is not a number: {value:?}"),
        )
    })
}

/// Convert one native record set into canonical records, one per value
///
/// SOA sets are dropped.
pub fn record_set_to_records(set: &NativeRecordSet, zone: &str) -> Result<Vec<Record>> {
    let rtype: RecordType = set.rrset_type.parse()?;
    if rtype == RecordType::Soa {
        return Ok(Vec::new());
    }

    let parse = value_parser(rtype);
    set.rrset_values
        .iter()
        .map(|value| {
            let mut record = Record::new(zone, &set.rrset_name, rtype, String::new())
                .with_ttl(set.rrset_ttl)
                .with_original(Original::RecordSet(set.clone()));
            parse(&mut record, value, zone)?;
            Ok(record)
        })
        .collect()
}

/// Group canonical records into native record sets
///
/// Sets appear in first-seen (label, type) order; each takes the TTL of its
/// first record.
pub fn records_to_record_sets(records: &[Record]) -> Vec<NativeRecordSet> {
    let mut sets: Vec<NativeRecordSet> = Vec::new();
    for record in records {
        let value = record.content();
        let existing = sets
            .iter_mut()
            .find(|set| set.rrset_name == record.name && set.rrset_type == record.rtype.as_str());
        match existing {
            Some(set) => set.rrset_values.push(value),
            None => sets.push(NativeRecordSet {
                rrset_name: record.name.clone(),
                rrset_type: record.rtype.as_str().to_string(),
                rrset_ttl: record.ttl,
                rrset_values: vec![value],
            }),
        }
    }
    sets
}
