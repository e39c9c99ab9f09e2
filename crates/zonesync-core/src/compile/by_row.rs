use std::sync::Arc;

use crate::diff::{Instruction, InstructionKind, change_msg, create_msg, delete_msg};
use crate::error::{Error, Result};
use crate::model::{Correction, NativeRow, Record, RecordType, RowDelta, ZoneRef};
use crate::traits::RowApi;
use crate::translate::row::{record_to_rows, verify_min_ttl};

#[derive(Default)]
struct Buckets {
    reports: Vec<Correction>,
    deletes: Vec<Correction>,
    creates: Vec<Correction>,
    changes: Vec<Correction>,
}

pub(super) fn compile(
    zone: &ZoneRef,
    instructions: &[Instruction],
    api: &Arc<dyn RowApi>,
) -> Result<Vec<Correction>> {
    let mut out = Buckets::default();

    for inst in instructions {
        match inst.kind {
            InstructionKind::Report => out.reports.push(Correction::report(inst.msgs_joined())),
            InstructionKind::Create => {
                for record in &inst.new {
                    let msg = message(inst, || create_msg(record));
                    for row in record_to_rows(record, zone.id)? {
                        out.creates.push(create_row(msg.clone(), row, api));
                    }
                }
            }
            InstructionKind::Delete => {
                for record in &inst.old {
                    let msg = message(inst, || delete_msg(record));
                    for id in row_ids(record)? {
                        out.deletes.push(delete_row(msg.clone(), id, api));
                    }
                }
            }
            InstructionKind::Change => {
                if inst.old.len() != inst.new.len() {
                    return Err(Error::consistency(format!(
                        "CHANGE of {} pairs {} existing with {} desired records",
                        inst.key,
                        inst.old.len(),
                        inst.new.len()
                    )));
                }
                for (old, new) in inst.old.iter().zip(&inst.new) {
                    let msg = message(inst, || change_msg(old, new));
                    out.changes.extend(change(zone, msg, old, new, api)?);
                }
            }
        }
    }

    let mut corrections = out.reports;
    corrections.extend(out.deletes);
    corrections.extend(out.creates);
    corrections.extend(out.changes);
    Ok(corrections)
}

/// Single-record instructions keep the differ's message
fn message(inst: &Instruction, fallback: impl FnOnce() -> String) -> String {
    if inst.old.len() <= 1 && inst.new.len() <= 1 && !inst.msgs.is_empty() {
        inst.msgs_joined()
    } else {
        fallback()
    }
}

fn row_ids(record: &Record) -> Result<Vec<u64>> {
    let ids = record
        .original
        .as_ref()
        .map(|original| original.row_ids())
        .unwrap_or_default();
    if ids.is_empty() {
        return Err(Error::consistency(format!("no row ID known for {record}")));
    }
    Ok(ids)
}

fn existing_rows(record: &Record) -> Result<&[NativeRow]> {
    match record.original.as_ref().map(|original| original.rows()) {
        Some(rows) if !rows.is_empty() && rows.iter().all(|row| row.id.is_some()) => Ok(rows),
        _ => Err(Error::consistency(format!("no row ID known for {record}"))),
    }
}

fn change(
    zone: &ZoneRef,
    msg: String,
    old: &Record,
    new: &Record,
    api: &Arc<dyn RowApi>,
) -> Result<Vec<Correction>> {
    let existing = existing_rows(old)?;
    let desired = record_to_rows(new, zone.id)?;
    let mut corrections = Vec::new();

    if new.rtype == RecordType::Txt {
        for idx in 0..existing.len().max(desired.len()) {
            match (existing.get(idx), desired.get(idx)) {
                (Some(row), Some(wanted)) => {
                    let delta = RowDelta {
                        data: (row.data != wanted.data).then(|| wanted.data.clone()),
                        ttl: (row.ttl != wanted.ttl).then_some(wanted.ttl),
                        ..Default::default()
                    };
                    if !delta.is_empty() {
                        corrections.push(update_row(msg.clone(), row, new.rtype, delta, api));
                    }
                }
                (None, Some(wanted)) => corrections.push(create_row(msg.clone(), wanted.clone(), api)),
                (Some(row), None) => {
                    if let Some(id) = row.id {
                        corrections.push(delete_row(msg.clone(), id, api));
                    }
                }
                (None, None) => {}
            }
        }
    } else {
        let delta = row_delta(old, new);
        if !delta.is_empty() {
            corrections.push(update_row(msg, &existing[0], new.rtype, delta, api));
        }
    }

    if corrections.is_empty() {
        return Err(Error::consistency(format!(
            "didn't find changes when I expect some on {}",
            new.key()
        )));
    }
    Ok(corrections)
}

/// Fields of the row behind `old` that must change to store `new`
///
/// Labels that differ only by case are the same label.
fn row_delta(old: &Record, new: &Record) -> RowDelta {
    let ttl = verify_min_ttl(new.ttl);
    let mut delta = RowDelta {
        host: (!old.name.eq_ignore_ascii_case(&new.name)).then(|| new.name.clone()),
        data: (old.target != new.target).then(|| new.target.clone()),
        ttl: (old.ttl != ttl).then_some(ttl),
        ..Default::default()
    };

    match new.rtype {
        RecordType::Mx => {
            delta.mx_priority = (old.mx_preference != new.mx_preference).then_some(new.mx_preference);
        }
        RecordType::Srv => {
            // service and protocol live in the label and are not editable
            delta.host = None;
            delta.priority = (old.srv_priority != new.srv_priority).then_some(new.srv_priority);
            delta.weight = (old.srv_weight != new.srv_weight).then_some(new.srv_weight);
            delta.port = (old.srv_port != new.srv_port).then_some(new.srv_port);
        }
        _ => {}
    }
    delta
}

fn create_row(msg: String, row: NativeRow, api: &Arc<dyn RowApi>) -> Correction {
    let api = Arc::clone(api);
    Correction::new(msg, move || {
        let api = Arc::clone(&api);
        let row = row.clone();
        async move { api.create_row(&row).await }
    })
}

fn update_row(
    msg: String,
    row: &NativeRow,
    rtype: RecordType,
    delta: RowDelta,
    api: &Arc<dyn RowApi>,
) -> Correction {
    let api = Arc::clone(api);
    let id = row.id.unwrap_or_default();
    Correction::new(msg, move || {
        let api = Arc::clone(&api);
        let delta = delta.clone();
        async move { api.update_row(id, rtype, &delta).await }
    })
}

fn delete_row(msg: String, id: u64, api: &Arc<dyn RowApi>) -> Correction {
    let api = Arc::clone(api);
    Correction::new(msg, move || {
        let api = Arc::clone(&api);
        async move { api.delete_row(id).await }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Original;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const ZONE: &str = "example.com";

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl RowApi for Recorder {
        async fn create_row(&self, row: &NativeRow) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create {} {} {}", row.host, row.record_type, row.data));
            Ok(())
        }

        async fn update_row(&self, id: u64, _rtype: RecordType, delta: &RowDelta) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("update {id} {}", delta.fields().join(",")));
            Ok(())
        }

        async fn delete_row(&self, id: u64) -> Result<()> {
            self.calls.lock().unwrap().push(format!("delete {id}"));
            Ok(())
        }
    }

    fn row(id: u64, host: &str, rtype: &str, data: &str, ttl: u32) -> NativeRow {
        NativeRow {
            id: Some(id),
            domain_id: Some(7),
            host: host.into(),
            data: data.into(),
            ttl,
            record_type: rtype.into(),
            ..Default::default()
        }
    }

    fn instruction(kind: InstructionKind, old: Vec<Record>, new: Vec<Record>) -> Instruction {
        let key = old.first().or(new.first()).map(Record::key).unwrap();
        Instruction::new(kind, key, old, new)
    }

    fn apply_all(corrections: &[Correction]) {
        for correction in corrections {
            tokio_test::block_on(correction.apply()).unwrap();
        }
    }

    #[test]
    fn ttl_change_edits_only_ttl() {
        let old = Record::new(ZONE, "www", RecordType::A, "192.0.2.1")
            .with_ttl(300)
            .with_original(Original::Rows(vec![row(11, "www", "a", "192.0.2.1", 300)]));
        let new = Record::new(ZONE, "www", RecordType::A, "192.0.2.1").with_ttl(900);

        let recorder = Arc::new(Recorder::default());
        let api: Arc<dyn RowApi> = recorder.clone();
        let corrections = compile(
            &ZoneRef::with_id(ZONE, 7),
            &[instruction(InstructionKind::Change, vec![old], vec![new])],
            &api,
        )
        .unwrap();

        apply_all(&corrections);
        assert_eq!(*recorder.calls.lock().unwrap(), vec!["update 11 ttl"]);
    }

    #[test]
    fn case_only_difference_is_rejected() {
        let old = Record::new(ZONE, "www", RecordType::A, "192.0.2.1")
            .with_original(Original::Rows(vec![row(11, "WWW", "a", "192.0.2.1", 300)]));
        let new = Record::new(ZONE, "www", RecordType::A, "192.0.2.1");

        let api: Arc<dyn RowApi> = Arc::new(Recorder::default());
        let err = compile(
            &ZoneRef::with_id(ZONE, 7),
            &[instruction(InstructionKind::Change, vec![old], vec![new])],
            &api,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Consistency(_)));
    }

    #[test]
    fn txt_change_adds_and_removes_segment_rows() {
        let old = Record::txt(ZONE, "@", vec!["a".into(), "b".into(), "c".into()]).with_original(
            Original::Rows(vec![
                row(1, "@", "txt", "a", 300),
                row(2, "@", "txt", "b", 300),
                row(3, "@", "txt", "c", 300),
            ]),
        );
        let new = Record::txt(ZONE, "@", vec!["a".into(), "x".into()]);

        let recorder = Arc::new(Recorder::default());
        let api: Arc<dyn RowApi> = recorder.clone();
        let corrections = compile(
            &ZoneRef::with_id(ZONE, 7),
            &[instruction(InstructionKind::Change, vec![old], vec![new])],
            &api,
        )
        .unwrap();

        apply_all(&corrections);
        assert_eq!(*recorder.calls.lock().unwrap(), vec!["update 2 data", "delete 3"]);
    }

    #[test]
    fn output_is_reports_deletes_creates_changes() {
        let created = Record::new(ZONE, "new", RecordType::A, "192.0.2.9");
        let deleted = Record::new(ZONE, "gone", RecordType::A, "192.0.2.8")
            .with_original(Original::Rows(vec![row(5, "gone", "a", "192.0.2.8", 300)]));
        let old = Record::new(ZONE, "www", RecordType::A, "192.0.2.1")
            .with_original(Original::Rows(vec![row(11, "www", "a", "192.0.2.1", 300)]));
        let new = Record::new(ZONE, "www", RecordType::A, "192.0.2.2");

        let mut report = Instruction::new(
            InstructionKind::Report,
            crate::model::RecordKey::label("home.example.com"),
            Vec::new(),
            Vec::new(),
        );
        report.push_msg(crate::model::RecordKey::label("home.example.com"), "! IGNORE home.example.com");

        let instructions = vec![
            instruction(InstructionKind::Change, vec![old], vec![new]),
            instruction(InstructionKind::Create, Vec::new(), vec![created]),
            report,
            instruction(InstructionKind::Delete, vec![deleted], Vec::new()),
        ];

        let recorder = Arc::new(Recorder::default());
        let api: Arc<dyn RowApi> = recorder.clone();
        let corrections = compile(&ZoneRef::with_id(ZONE, 7), &instructions, &api).unwrap();

        assert_eq!(corrections.len(), 4);
        assert!(corrections[0].is_report());
        apply_all(&corrections);
        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec!["delete 5", "create new a 192.0.2.9", "update 11 data"]
        );
    }

    #[test]
    fn malformed_srv_label_fails_before_any_call() {
        let srv = Record::new(ZONE, "sip.tcp", RecordType::Srv, "sip.example.com.").with_srv(10, 20, 5060);
        let api: Arc<dyn RowApi> = Arc::new(Recorder::default());
        let err = compile(
            &ZoneRef::with_id(ZONE, 7),
            &[instruction(InstructionKind::Create, Vec::new(), vec![srv])],
            &api,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
