use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use super::error::ParseValueError;

// ---------------------------------------------------------------------------
// Channel – one fluorescence detection channel
// ---------------------------------------------------------------------------

/// The fixed set of detection channels, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    Fam,
    Vic,
    Aby,
    Jun,
    Rox,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Fam,
        Channel::Vic,
        Channel::Aby,
        Channel::Jun,
        Channel::Rox,
    ];

    /// Channels that carry a Pos/Neg label column.
    pub const LABELED: [Channel; 4] = [Channel::Fam, Channel::Vic, Channel::Aby, Channel::Jun];

    pub fn name(self) -> &'static str {
        match self {
            Channel::Fam => "FAM",
            Channel::Vic => "VIC",
            Channel::Aby => "ABY",
            Channel::Jun => "JUN",
            Channel::Rox => "ROX",
        }
    }

    /// Measurement column name, e.g. `C40_FAM`.
    pub fn column_name(self) -> String {
        format!("C40_{}", self.name())
    }

    /// Label column name, e.g. `FAM_labeling`. `None` for ROX.
    pub fn label_column_name(self) -> Option<String> {
        self.label_slot().map(|_| format!("{}_labeling", self.name()))
    }

    /// Position of this channel's measurement in a [`PartitionRow`].
    pub fn slot(self) -> usize {
        self as usize
    }

    /// Position of this channel's label in a [`PartitionRow`].
    pub fn label_slot(self) -> Option<usize> {
        match self {
            Channel::Rox => None,
            other => Some(other as usize),
        }
    }

    /// Case-sensitive lookup by short name (`"FAM"`, `"VIC"`, …).
    pub fn from_name(name: &str) -> Option<Channel> {
        Channel::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::from_name(s).ok_or_else(|| ParseValueError::UnknownChannel(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ChannelPair – the two axes of the scatter plot
// ---------------------------------------------------------------------------

/// One of the ten unordered channel pairs offered for the scatter plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ChannelPair {
    first: Channel,
    second: Channel,
}

impl ChannelPair {
    pub const ALL: [ChannelPair; 10] = [
        ChannelPair::new(Channel::Fam, Channel::Vic),
        ChannelPair::new(Channel::Fam, Channel::Aby),
        ChannelPair::new(Channel::Fam, Channel::Jun),
        ChannelPair::new(Channel::Fam, Channel::Rox),
        ChannelPair::new(Channel::Vic, Channel::Aby),
        ChannelPair::new(Channel::Vic, Channel::Jun),
        ChannelPair::new(Channel::Vic, Channel::Rox),
        ChannelPair::new(Channel::Aby, Channel::Jun),
        ChannelPair::new(Channel::Aby, Channel::Rox),
        ChannelPair::new(Channel::Jun, Channel::Rox),
    ];

    const fn new(first: Channel, second: Channel) -> Self {
        Self { first, second }
    }

    /// Channel plotted on the x axis.
    pub fn first(self) -> Channel {
        self.first
    }

    /// Channel plotted on the y axis (and used for colouring).
    pub fn second(self) -> Channel {
        self.second
    }

    /// Human-readable label for selectors, e.g. `FAM - VIC`.
    pub fn label(self) -> String {
        format!("{} - {}", self.first, self.second)
    }
}

impl Default for ChannelPair {
    fn default() -> Self {
        ChannelPair::ALL[0]
    }
}

impl fmt::Display for ChannelPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.first, self.second)
    }
}

impl FromStr for ChannelPair {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseValueError::InvalidPair(s.to_string());
        let (a, b) = s.split_once('_').ok_or_else(invalid)?;
        let first = Channel::from_name(a).ok_or_else(invalid)?;
        let second = Channel::from_name(b).ok_or_else(invalid)?;
        ChannelPair::ALL
            .into_iter()
            .find(|p| p.first == first && p.second == second)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for ChannelPair {
    type Error = ParseValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// User-assigned classification of a partition in one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Label {
    Pos,
    #[default]
    Neg,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Pos => f.write_str("Pos"),
            Label::Neg => f.write_str("Neg"),
        }
    }
}

/// A labeling action of the form `<Channel>_labeling_<Pos|Neg>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelAction {
    channel: Channel,
    label: Label,
}

impl LabelAction {
    pub const ALL: [LabelAction; 8] = [
        LabelAction::new_unchecked(Channel::Fam, Label::Pos),
        LabelAction::new_unchecked(Channel::Fam, Label::Neg),
        LabelAction::new_unchecked(Channel::Vic, Label::Pos),
        LabelAction::new_unchecked(Channel::Vic, Label::Neg),
        LabelAction::new_unchecked(Channel::Aby, Label::Pos),
        LabelAction::new_unchecked(Channel::Aby, Label::Neg),
        LabelAction::new_unchecked(Channel::Jun, Label::Pos),
        LabelAction::new_unchecked(Channel::Jun, Label::Neg),
    ];

    const fn new_unchecked(channel: Channel, label: Label) -> Self {
        Self { channel, label }
    }

    /// `None` when `channel` has no label column (ROX).
    pub fn new(channel: Channel, label: Label) -> Option<Self> {
        channel
            .label_slot()
            .map(|_| Self::new_unchecked(channel, label))
    }

    pub fn channel(self) -> Channel {
        self.channel
    }

    pub fn label(self) -> Label {
        self.label
    }
}

impl Default for LabelAction {
    fn default() -> Self {
        LabelAction::ALL[0]
    }
}

impl fmt::Display for LabelAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_labeling_{}", self.channel, self.label)
    }
}

impl FromStr for LabelAction {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseValueError::InvalidLabelAction(s.to_string());
        let (channel, label) = s.split_once("_labeling_").ok_or_else(invalid)?;
        let channel = Channel::from_name(channel).ok_or_else(invalid)?;
        let label = match label {
            "Pos" => Label::Pos,
            "Neg" => Label::Neg,
            _ => return Err(invalid()),
        };
        LabelAction::new(channel, label).ok_or_else(invalid)
    }
}

// ---------------------------------------------------------------------------
// CellValue – a single cell of an uploaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from CSV, spreadsheet or Parquet input.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// RawRecord – one row of the long-format upload
// ---------------------------------------------------------------------------

/// One measurement: a (Run, Sample, Index, Channel) reading.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub run: String,
    pub sample: String,
    pub index: i64,
    pub reject: bool,
    /// Channel name as written in the file; may be outside the fixed set.
    pub channel: String,
    pub c40: Option<f64>,
}

// ---------------------------------------------------------------------------
// Wide table
// ---------------------------------------------------------------------------

/// Stable identifier of a wide-table row, assigned when the table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub usize);

/// One partition: all channel readings for a (Run, Sample, Index).
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionRow {
    pub id: RowId,
    pub run: String,
    pub sample: String,
    pub index: i64,
    /// Indexed by [`Channel::slot`].
    pub c40: [Option<f64>; 5],
    /// Indexed by [`Channel::label_slot`].
    pub labels: [Label; 4],
}

impl PartitionRow {
    pub fn value(&self, channel: Channel) -> Option<f64> {
        self.c40[channel.slot()]
    }

    pub fn label(&self, channel: Channel) -> Option<Label> {
        channel.label_slot().map(|slot| self.labels[slot])
    }
}

/// The pivoted one-row-per-partition table.
#[derive(Debug, Clone, Default)]
pub struct WideTable {
    rows: Vec<PartitionRow>,
    samples: Vec<String>,
}

impl WideTable {
    /// Build the table and its sample index. Row ids must equal positions.
    pub fn from_rows(rows: Vec<PartitionRow>) -> Self {
        debug_assert!(rows.iter().enumerate().all(|(i, r)| r.id == RowId(i)));

        let mut samples = Vec::new();
        let mut seen = BTreeSet::new();
        for row in &rows {
            if seen.insert(row.sample.as_str()) {
                samples.push(row.sample.clone());
            }
        }

        WideTable { rows, samples }
    }

    pub fn rows(&self) -> &[PartitionRow] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> Option<&PartitionRow> {
        self.rows.get(id.0)
    }

    pub fn row_mut(&mut self, id: RowId) -> Option<&mut PartitionRow> {
        self.rows.get_mut(id.0)
    }

    /// Rows belonging to `sample`, in table order.
    pub fn sample_rows<'a>(
        &'a self,
        sample: &'a str,
    ) -> impl Iterator<Item = &'a PartitionRow> + 'a {
        self.rows().iter().filter(move |r| r.sample == sample)
    }

    /// Distinct samples in first-appearance order.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// `Sample`, the five measurement columns, then the four label columns.
    pub fn column_names(&self) -> Vec<String> {
        std::iter::once("Sample".to_string())
            .chain(Channel::ALL.iter().map(|c| c.column_name()))
            .chain(Channel::LABELED.iter().filter_map(|c| c.label_column_name()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Facts about the most recent successful upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSummary {
    pub file_name: String,
    pub records: usize,
    pub runs: Vec<String>,
    pub rows: usize,
    pub columns: usize,
}
