use super::model::{Channel, Label, LabelAction, RowId, WideTable};

/// Apply `action` to the rows identified by `ids`. Returns how many rows were updated.
///
/// Ids not present in the table are skipped.
pub fn apply_label(table: &mut WideTable, action: LabelAction, ids: &[RowId]) -> usize {
    let Some(slot) = action.channel().label_slot() else {
        return 0;
    };

    let mut updated = 0;
    for &id in ids {
        if let Some(row) = table.row_mut(id) {
            row.labels[slot] = action.label();
            updated += 1;
        }
    }
    log::debug!("{action} applied to {updated} rows");
    updated
}

/// Per-channel label counts for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTally {
    pub channel: Channel,
    /// Rows labeled `Pos`.
    pub positives: usize,
    /// Rows with a measurement in this channel.
    pub measured: usize,
}

/// Tally the four label columns within `sample`.
pub fn label_tally(table: &WideTable, sample: &str) -> Vec<ChannelTally> {
    Channel::LABELED
        .into_iter()
        .map(|channel| {
            let mut tally = ChannelTally {
                channel,
                positives: 0,
                measured: 0,
            };
            for row in table.sample_rows(sample) {
                if row.label(channel) == Some(Label::Pos) {
                    tally.positives += 1;
                }
                if row.value(channel).is_some() {
                    tally.measured += 1;
                }
            }
            tally
        })
        .collect()
}
