use std::collections::{BTreeMap, BTreeSet};

use super::error::IngestError;
use super::model::{Channel, Label, PartitionRow, RawRecord, RowId, WideTable};

/// Sort key of a wide row: (Run, Sample, Index).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct PartitionKey {
    run: String,
    sample: String,
    index: i64,
}

#[derive(Debug, Default)]
struct PivotCell {
    c40: [Option<f64>; 5],
    seen: [bool; 5],
}

/// Pivot long-format records into the wide table.
///
/// * Rejected records are dropped before pivoting.
/// * One row per (Run, Sample, Index), ordered by that key.
/// * A channel with no surviving record leaves its cell missing.
/// * Channels outside the fixed set are ignored.
/// * Every label starts as `Neg`.
pub fn reshape(records: &[RawRecord]) -> Result<WideTable, IngestError> {
    let mut cells: BTreeMap<PartitionKey, PivotCell> = BTreeMap::new();
    let mut ignored: BTreeSet<&str> = BTreeSet::new();

    for record in records.iter().filter(|r| !r.reject) {
        let key = PartitionKey {
            run: record.run.clone(),
            sample: record.sample.clone(),
            index: record.index,
        };
        let cell = cells.entry(key).or_default();

        let Some(channel) = Channel::from_name(&record.channel) else {
            ignored.insert(record.channel.as_str());
            continue;
        };
        let slot = channel.slot();
        if cell.seen[slot] {
            return Err(IngestError::DuplicateEntry {
                run: record.run.clone(),
                sample: record.sample.clone(),
                index: record.index,
                channel,
            });
        }
        cell.seen[slot] = true;
        cell.c40[slot] = record.c40;
    }

    if !ignored.is_empty() {
        log::warn!("Ignoring readings for unknown channels {ignored:?}");
    }

    let rows = cells
        .into_iter()
        .enumerate()
        .map(|(i, (key, cell))| PartitionRow {
            id: RowId(i),
            run: key.run,
            sample: key.sample,
            index: key.index,
            c40: cell.c40,
            labels: [Label::Neg; 4],
        })
        .collect();

    Ok(WideTable::from_rows(rows))
}
