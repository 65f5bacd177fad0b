use super::model::Channel;

/// Errors that reject an upload. No partial table survives any of them.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// File name matches none of the supported format markers
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// I/O error reading the upload
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet parsing error
    #[error("Spreadsheet parsing error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Workbook contains no worksheet
    #[error("Spreadsheet has no worksheets")]
    EmptyWorkbook,

    /// Parquet parsing error
    #[error("Parquet parsing error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Arrow decoding error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Required input column absent from the header
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    /// Cell that cannot be coerced to its column's type
    #[error("Row {row}, column {column}: invalid value '{value}'")]
    InvalidCell {
        row: usize,
        column: &'static str,
        value: String,
    },

    /// Two non-rejected readings for the same partition and channel
    #[error("Duplicate reading for run {run}, sample {sample}, index {index}, channel {channel}")]
    DuplicateEntry {
        run: String,
        sample: String,
        index: i64,
        channel: Channel,
    },
}

/// Errors raised while projecting the wide table for plotting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("Channel {channel} is unavailable for sample {sample}.")]
    ChannelUnavailable { channel: Channel, sample: String },
}

/// Errors parsing selector values from their string forms.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseValueError {
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Invalid channel pair: {0}")]
    InvalidPair(String),

    #[error("Invalid label action: {0}")]
    InvalidLabelAction(String),
}
