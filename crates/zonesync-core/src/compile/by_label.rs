use std::sync::Arc;

use crate::diff::{Instruction, InstructionKind};
use crate::error::{Error, Result};
use crate::model::{Correction, Original, Record, RecordKey, RecordType, ZoneRef};
use crate::traits::RecordSetApi;
use crate::translate::rrset::records_to_record_sets;
use crate::translate::short_label;

pub(super) fn compile(
    zone: &ZoneRef,
    instructions: &[Instruction],
    api: &Arc<dyn RecordSetApi>,
) -> Result<Vec<Correction>> {
    let mut corrections = Vec::new();

    for inst in instructions {
        match inst.kind {
            InstructionKind::Report => corrections.push(Correction::report(inst.msgs_joined())),
            InstructionKind::Create => corrections.extend(create(zone, inst, api)),
            InstructionKind::Change => corrections.push(change(zone, inst, api)?),
            InstructionKind::Delete => corrections.push(delete(zone, inst, api)),
        }
    }

    Ok(corrections)
}

fn create(zone: &ZoneRef, inst: &Instruction, api: &Arc<dyn RecordSetApi>) -> Vec<Correction> {
    records_to_record_sets(&inst.new)
        .into_iter()
        .map(|set| {
            let msg = match set.rrset_type.parse::<RecordType>() {
                Ok(rtype) => inst.msgs_for(&RecordKey::new(inst.key.name_fqdn.clone(), rtype)),
                Err(_) => String::new(),
            };
            let msg = if msg.is_empty() { inst.msgs_joined() } else { msg };

            let api = Arc::clone(api);
            let zone = zone.name.clone();
            Correction::new(msg, move || {
                let api = Arc::clone(&api);
                let zone = zone.clone();
                let set = set.clone();
                async move {
                    api.create_record_set(&zone, &set.rrset_name, &set.rrset_type, set.rrset_ttl, &set.rrset_values)
                        .await
                }
            })
        })
        .collect()
}

fn change(zone: &ZoneRef, inst: &Instruction, api: &Arc<dyn RecordSetApi>) -> Result<Correction> {
    let label = exact_label(&inst.old).ok_or_else(|| {
        Error::consistency(format!(
            "no record-set original for {} to update by label",
            inst.key
        ))
    })?;

    let mut sets = records_to_record_sets(&inst.new);
    for set in &mut sets {
        set.rrset_name = label.clone();
    }

    let api = Arc::clone(api);
    let zone = zone.name.clone();
    Ok(Correction::new(inst.msgs_joined(), move || {
        let api = Arc::clone(&api);
        let zone = zone.clone();
        let label = label.clone();
        let sets = sets.clone();
        async move { api.update_by_label(&zone, &label, &sets).await }
    }))
}

fn delete(zone: &ZoneRef, inst: &Instruction, api: &Arc<dyn RecordSetApi>) -> Correction {
    let label = exact_label(&inst.old).unwrap_or_else(|| short_label(&inst.key.name_fqdn, &zone.name));

    let api = Arc::clone(api);
    let zone = zone.name.clone();
    Correction::new(inst.msgs_joined(), move || {
        let api = Arc::clone(&api);
        let zone = zone.clone();
        let label = label.clone();
        async move { api.delete_by_label(&zone, &label).await }
    })
}

/// Label exactly as the provider returned it
fn exact_label(records: &[Record]) -> Option<String> {
    records
        .iter()
        .find_map(|record| record.original.as_ref().and_then(Original::record_set_name))
        .map(str::to_string)
}
