use super::error::ProjectionError;
use super::model::{Channel, ChannelPair, RowId, WideTable};

// ---------------------------------------------------------------------------
// Sample-level helpers
// ---------------------------------------------------------------------------

/// Channels with at least one measurement for `sample`, in column order.
///
/// Channels missing for every row of the sample are dropped, like an
/// all-missing column.
pub fn present_channels(table: &WideTable, sample: &str) -> Vec<Channel> {
    Channel::ALL
        .into_iter()
        .filter(|&c| table.sample_rows(sample).any(|r| r.value(c).is_some()))
        .collect()
}

/// Number of wide rows for `sample`.
pub fn sample_len(table: &WideTable, sample: &str) -> usize {
    table.sample_rows(sample).count()
}

/// Text shown under the parallel plot for an active selection.
pub fn selected_count_text(selected: usize, total: usize) -> String {
    format!("{selected} data points selected out of {total} total data points.")
}

fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

// ---------------------------------------------------------------------------
// Scatter projection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub id: RowId,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl ScatterPoint {
    /// Plot position; `None` when either coordinate is missing.
    pub fn position(&self) -> Option<[f64; 2]> {
        Some([self.x?, self.y?])
    }
}

/// The sample's rows projected onto a channel pair.
#[derive(Debug, Clone)]
pub struct ScatterView {
    pub pair: ChannelPair,
    pub points: Vec<ScatterPoint>,
    /// Range of the second channel, used for the colour scale.
    pub color_range: Option<(f64, f64)>,
}

impl ScatterView {
    /// Ids of plotted points for which `inside` holds.
    pub fn select(&self, inside: impl Fn([f64; 2]) -> bool) -> Vec<RowId> {
        self.points
            .iter()
            .filter(|p| p.position().is_some_and(&inside))
            .map(|p| p.id)
            .collect()
    }
}

/// Project `sample` onto the two channels of `pair`.
///
/// Every row of the sample is kept, including rows missing one of the two
/// values. Fails when either channel has no measurement at all for the sample.
pub fn scatter_view(
    table: &WideTable,
    sample: &str,
    pair: ChannelPair,
) -> Result<ScatterView, ProjectionError> {
    let present = present_channels(table, sample);
    for channel in [pair.first(), pair.second()] {
        if !present.contains(&channel) {
            return Err(ProjectionError::ChannelUnavailable {
                channel,
                sample: sample.to_string(),
            });
        }
    }

    let points: Vec<ScatterPoint> = table
        .sample_rows(sample)
        .map(|r| ScatterPoint {
            id: r.id,
            x: r.value(pair.first()),
            y: r.value(pair.second()),
        })
        .collect();
    let color_range = value_range(points.iter().filter_map(|p| p.y));

    Ok(ScatterView {
        pair,
        points,
        color_range,
    })
}

// ---------------------------------------------------------------------------
// Parallel-coordinates projection
// ---------------------------------------------------------------------------

/// Restriction of the parallel plot derived from a scatter selection.
///
/// Rows match by value equality in `channel`, not by identity, so repeated
/// values select more lines than were picked in the scatter plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelSubset {
    pub channel: Channel,
    pub x_values: Vec<f64>,
}

impl ParallelSubset {
    pub fn matches(&self, value: Option<f64>) -> bool {
        value.is_some_and(|v| self.x_values.contains(&v))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParallelLine {
    pub id: RowId,
    /// One entry per [`ParallelView::dimensions`].
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone)]
pub struct ParallelView {
    pub dimensions: Vec<Channel>,
    /// Per-dimension (min, max) over all rows of the sample.
    pub ranges: Vec<Option<(f64, f64)>>,
    /// Lines drawn in colour: every row, or the subset when one is active.
    pub lines: Vec<ParallelLine>,
    /// Rows outside an active subset, drawn dimmed.
    pub dimmed: Vec<ParallelLine>,
    /// Dimension used to colour lines.
    pub color_dimension: Option<usize>,
}

impl ParallelView {
    /// Map a value onto [0, 1] within its dimension's range.
    pub fn normalize(&self, dimension: usize, value: f64) -> f64 {
        match self.ranges.get(dimension).copied().flatten() {
            Some((lo, hi)) if hi > lo => (value - lo) / (hi - lo),
            _ => 0.5,
        }
    }

    pub fn color_value(&self, line: &ParallelLine) -> Option<f64> {
        self.color_dimension
            .and_then(|d| line.values.get(d).copied().flatten())
    }

    pub fn color_range(&self) -> Option<(f64, f64)> {
        self.color_dimension
            .and_then(|d| self.ranges.get(d).copied().flatten())
    }
}

/// Project every present channel of `sample`, optionally restricted to a subset.
pub fn parallel_view(
    table: &WideTable,
    sample: &str,
    subset: Option<&ParallelSubset>,
) -> ParallelView {
    let dimensions = present_channels(table, sample);
    let ranges = dimensions
        .iter()
        .map(|&c| value_range(table.sample_rows(sample).filter_map(|r| r.value(c))))
        .collect();
    let color_dimension = dimensions
        .iter()
        .position(|&c| c == Channel::Vic)
        .or(if dimensions.is_empty() { None } else { Some(0) });

    let mut lines = Vec::new();
    let mut dimmed = Vec::new();
    for row in table.sample_rows(sample) {
        let line = ParallelLine {
            id: row.id,
            values: dimensions.iter().map(|&c| row.value(c)).collect(),
        };
        match subset {
            Some(s) if !s.matches(row.value(s.channel)) => dimmed.push(line),
            _ => lines.push(line),
        }
    }

    ParallelView {
        dimensions,
        ranges,
        lines,
        dimmed,
        color_dimension,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Label, PartitionRow};

    fn row(id: usize, sample: &str, c40: [Option<f64>; 5]) -> PartitionRow {
        PartitionRow {
            id: RowId(id),
            run: "R1".to_string(),
            sample: sample.to_string(),
            index: id as i64,
            c40,
            labels: [Label::Neg; 4],
        }
    }

    fn table() -> WideTable {
        WideTable::from_rows(vec![
            row(0, "A1", [Some(1.0), Some(10.0), None, Some(5.0), None]),
            row(1, "A1", [Some(2.0), None, None, Some(6.0), None]),
            row(2, "B1", [Some(3.0), Some(30.0), Some(7.0), None, Some(9.0)]),
            row(3, "A1", [Some(1.0), Some(40.0), None, Some(8.0), None]),
        ])
    }

    #[test]
    fn test_present_channels_drop_all_missing() {
        let t = table();
        assert_eq!(
            present_channels(&t, "A1"),
            vec![Channel::Fam, Channel::Vic, Channel::Jun]
        );
        assert_eq!(present_channels(&t, "B1").len(), 4);
        assert!(present_channels(&t, "nope").is_empty());
    }

    #[test]
    fn test_scatter_keeps_rows_with_missing_values() {
        let t = table();
        let pair: ChannelPair = "FAM_VIC".parse().unwrap();
        let view = scatter_view(&t, "A1", pair).unwrap();

        let ids: Vec<RowId> = view.points.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![RowId(0), RowId(1), RowId(3)]);
        assert_eq!(view.points[1].position(), None);
        assert_eq!(view.points[2].position(), Some([1.0, 40.0]));
        assert_eq!(view.color_range, Some((10.0, 40.0)));
    }

    #[test]
    fn test_scatter_channel_unavailable() {
        let t = table();
        let pair: ChannelPair = "FAM_ABY".parse().unwrap();
        let err = scatter_view(&t, "A1", pair).unwrap_err();
        assert_eq!(
            err,
            ProjectionError::ChannelUnavailable {
                channel: Channel::Aby,
                sample: "A1".to_string()
            }
        );
        assert_eq!(err.to_string(), "Channel ABY is unavailable for sample A1.");
    }

    #[test]
    fn test_scatter_select_skips_unplotted_points() {
        let t = table();
        let view = scatter_view(&t, "A1", "FAM_JUN".parse().unwrap()).unwrap();
        let picked = view.select(|[x, _]| x < 1.5);
        assert_eq!(picked, vec![RowId(0), RowId(3)]);

        let view = scatter_view(&t, "A1", "FAM_VIC".parse().unwrap()).unwrap();
        assert_eq!(view.select(|_| true), vec![RowId(0), RowId(3)]);
    }

    #[test]
    fn test_parallel_without_subset() {
        let t = table();
        let view = parallel_view(&t, "A1", None);
        assert_eq!(view.dimensions, vec![Channel::Fam, Channel::Vic, Channel::Jun]);
        assert_eq!(view.lines.len(), 3);
        assert!(view.dimmed.is_empty());
        assert_eq!(view.lines[1].values, vec![Some(2.0), None, Some(6.0)]);
        assert_eq!(view.color_dimension, Some(1));
        assert_eq!(view.ranges[2], Some((5.0, 8.0)));
        assert_eq!(view.normalize(2, 6.5), 0.5);
    }

    #[test]
    fn test_parallel_subset_matches_by_value() {
        let t = table();
        // Only row 0 was picked, but row 3 shares its FAM value.
        let subset = ParallelSubset {
            channel: Channel::Fam,
            x_values: vec![1.0],
        };
        let view = parallel_view(&t, "A1", Some(&subset));
        let lines: Vec<RowId> = view.lines.iter().map(|l| l.id).collect();
        let dimmed: Vec<RowId> = view.dimmed.iter().map(|l| l.id).collect();
        assert_eq!(lines, vec![RowId(0), RowId(3)]);
        assert_eq!(dimmed, vec![RowId(1)]);
    }

    #[test]
    fn test_parallel_colors_by_first_dimension_without_vic() {
        let t = WideTable::from_rows(vec![row(0, "C1", [None, None, Some(1.0), Some(2.0), None])]);
        let view = parallel_view(&t, "C1", None);
        assert_eq!(view.color_dimension, Some(0));
        assert_eq!(view.normalize(0, 1.0), 0.5);
    }

    #[test]
    fn test_selected_count_text() {
        assert_eq!(
            selected_count_text(3, 120),
            "3 data points selected out of 120 total data points."
        );
    }
}
