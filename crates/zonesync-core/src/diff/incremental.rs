//! Stock differ
//!
//! Records are matched inside each (label, type) group: identical records
//! cancel out, records with the same rdata but another TTL pair up next, and
//! whatever is left pairs up in sorted order. Unpaired existing records are
//! deleted and unpaired desired records created.

use std::collections::{BTreeMap, BTreeSet};

use super::{
    Diff, DiffMode, DiffOptions, Differ, Instruction, InstructionKind, change_msg, create_msg,
    delete_msg,
};
use crate::error::Result;
use crate::model::{Record, RecordKey, RecordType};

/// Default [`Differ`] implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementalDiffer;

impl IncrementalDiffer {
    pub fn new() -> Self {
        Self
    }
}

enum Pairing<'a> {
    Create(&'a Record),
    Change(&'a Record, &'a Record),
    Delete(&'a Record),
}

impl Pairing<'_> {
    fn msg(&self) -> String {
        match self {
            Pairing::Create(new) => create_msg(new),
            Pairing::Change(old, new) => change_msg(old, new),
            Pairing::Delete(old) => delete_msg(old),
        }
    }
}

type Sides<'a> = (Vec<&'a Record>, Vec<&'a Record>);

fn pair_records<'a>(old: &[&'a Record], new: &[&'a Record]) -> Vec<Pairing<'a>> {
    let mut old_left: Vec<&Record> = old.to_vec();
    let mut new_left: Vec<&Record> = Vec::new();
    for &record in new {
        match old_left.iter().position(|existing| *existing == record) {
            Some(pos) => {
                old_left.remove(pos);
            }
            None => new_left.push(record),
        }
    }

    let mut pairings = Vec::new();
    let mut unmatched: Vec<&Record> = Vec::new();
    for record in new_left {
        match old_left
            .iter()
            .position(|existing| existing.content() == record.content())
        {
            Some(pos) => pairings.push(Pairing::Change(old_left.remove(pos), record)),
            None => unmatched.push(record),
        }
    }

    old_left.sort_by_key(|record| record.content());
    unmatched.sort_by_key(|record| record.content());
    let mut old_iter = old_left.into_iter();
    for record in unmatched {
        match old_iter.next() {
            Some(existing) => pairings.push(Pairing::Change(existing, record)),
            None => pairings.push(Pairing::Create(record)),
        }
    }
    pairings.extend(old_iter.map(Pairing::Delete));
    pairings
}

fn managed<'a>(records: &'a [Record], patterns: &[String]) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| !is_unmanaged(record, patterns))
        .collect()
}

fn is_unmanaged(record: &Record, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        let pattern = pattern.trim_end_matches('.').to_ascii_lowercase();
        match pattern.strip_prefix("*.") {
            Some(suffix) => {
                record.name.ends_with(&format!(".{suffix}"))
                    || record.name_fqdn.ends_with(&format!(".{suffix}"))
            }
            None => record.name == pattern || record.name_fqdn == pattern,
        }
    })
}

impl IncrementalDiffer {
    fn by_label<'a>(&self, existing: &[&'a Record], desired: &[&'a Record], diff: &mut Diff) {
        let mut labels: BTreeMap<&'a str, Sides<'a>> = BTreeMap::new();
        for &record in existing {
            labels.entry(record.name_fqdn.as_str()).or_default().0.push(record);
        }
        for &record in desired {
            labels.entry(record.name_fqdn.as_str()).or_default().1.push(record);
        }

        for (label, (old, new)) in labels {
            let mut by_type: BTreeMap<RecordType, Sides<'a>> = BTreeMap::new();
            for &record in &old {
                by_type.entry(record.rtype).or_default().0.push(record);
            }
            for &record in &new {
                by_type.entry(record.rtype).or_default().1.push(record);
            }

            let mut msgs = Vec::new();
            for (rtype, (old_of_type, new_of_type)) in &by_type {
                for pairing in pair_records(old_of_type, new_of_type) {
                    msgs.push((RecordKey::new(label, *rtype), pairing.msg()));
                }
            }
            if msgs.is_empty() {
                continue;
            }

            let kind = if new.is_empty() {
                InstructionKind::Delete
            } else if old.is_empty() {
                InstructionKind::Create
            } else {
                InstructionKind::Change
            };
            let mut inst = Instruction::new(
                kind,
                RecordKey::label(label),
                old.into_iter().cloned().collect(),
                new.into_iter().cloned().collect(),
            );
            diff.change_count += msgs.len();
            for (key, msg) in msgs {
                inst.push_msg(key, msg);
            }
            diff.instructions.push(inst);
        }
    }

    fn by_record<'a>(&self, existing: &[&'a Record], desired: &[&'a Record], diff: &mut Diff) {
        let mut groups: BTreeMap<RecordKey, Sides<'a>> = BTreeMap::new();
        for &record in existing {
            groups.entry(record.key()).or_default().0.push(record);
        }
        for &record in desired {
            groups.entry(record.key()).or_default().1.push(record);
        }

        for (key, (old, new)) in groups {
            for pairing in pair_records(&old, &new) {
                let msg = pairing.msg();
                let mut inst = match pairing {
                    Pairing::Create(new) => Instruction::new(
                        InstructionKind::Create,
                        key.clone(),
                        Vec::new(),
                        vec![new.clone()],
                    ),
                    Pairing::Change(old, new) => Instruction::new(
                        InstructionKind::Change,
                        key.clone(),
                        vec![old.clone()],
                        vec![new.clone()],
                    ),
                    Pairing::Delete(old) => Instruction::new(
                        InstructionKind::Delete,
                        key.clone(),
                        vec![old.clone()],
                        Vec::new(),
                    ),
                };
                inst.push_msg(key.clone(), msg);
                diff.change_count += 1;
                diff.instructions.push(inst);
            }
        }
    }
}

impl Differ for IncrementalDiffer {
    fn diff(&self, existing: &[Record], desired: &[Record], options: &DiffOptions) -> Result<Diff> {
        let existing_managed = managed(existing, &options.unmanaged);
        let desired_managed = managed(desired, &options.unmanaged);
        let ignored: BTreeSet<&str> = existing
            .iter()
            .chain(desired)
            .filter(|record| is_unmanaged(record, &options.unmanaged))
            .map(|record| record.name_fqdn.as_str())
            .collect();

        let mut diff = Diff::default();
        for label in ignored {
            let mut inst = Instruction::new(
                InstructionKind::Report,
                RecordKey::label(label),
                Vec::new(),
                Vec::new(),
            );
            inst.push_msg(RecordKey::label(label), format!("! IGNORE {label} (unmanaged)"));
            diff.instructions.push(inst);
        }

        match options.mode {
            DiffMode::ByLabel => self.by_label(&existing_managed, &desired_managed, &mut diff),
            DiffMode::ByRecord => self.by_record(&existing_managed, &desired_managed, &mut diff),
        }

        Ok(diff)
    }
}
