use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use calamine::{open_workbook_auto, Data, Range, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::IngestError;
use super::model::{CellValue, RawRecord};

/// Columns every upload must carry (exact, case-sensitive names).
pub const REQUIRED_COLUMNS: [&str; 6] = ["Run", "Sample", "Index", "Reject", "Channel", "C40"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Input formats, chosen from the file name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
    Parquet,
}

impl SourceFormat {
    /// Substring heuristic on the file name: `csv`, then `xls`, then `parquet`.
    pub fn detect(file_name: &str) -> Option<SourceFormat> {
        if file_name.contains("csv") {
            Some(SourceFormat::Csv)
        } else if file_name.contains("xls") {
            Some(SourceFormat::Spreadsheet)
        } else if file_name.contains("parquet") {
            Some(SourceFormat::Parquet)
        } else {
            None
        }
    }
}

/// Load the long-format partition records from a file.  Dispatch by name.
///
/// Supported formats:
/// * `*csv*`     – comma-separated with a header row
/// * `*xls*`     – first worksheet of an `.xls`/`.xlsx` workbook, header in row 1
/// * `*parquet*` – flat Parquet table
pub fn load_file(path: &Path) -> Result<Vec<RawRecord>, IngestError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match SourceFormat::detect(&file_name) {
        Some(SourceFormat::Csv) => load_csv(path),
        Some(SourceFormat::Spreadsheet) => load_spreadsheet(path),
        Some(SourceFormat::Parquet) => load_parquet(path),
        None => Err(IngestError::UnsupportedFormat(file_name)),
    }
}

// ---------------------------------------------------------------------------
// Column lookup and cell coercion (shared by all formats)
// ---------------------------------------------------------------------------

/// Positions of the required columns within a header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    run: usize,
    sample: usize,
    index: usize,
    reject: usize,
    channel: usize,
    c40: usize,
}

impl ColumnIndex {
    fn from_headers<S: AsRef<str>>(headers: &[S]) -> Result<Self, IngestError> {
        let mut positions = [0usize; REQUIRED_COLUMNS.len()];
        for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.as_ref() == name)
                .ok_or(IngestError::MissingColumn(name))?;
        }
        let [run, sample, index, reject, channel, c40] = positions;
        Ok(ColumnIndex {
            run,
            sample,
            index,
            reject,
            channel,
            c40,
        })
    }

    /// Build a record from one row; `cell(i)` returns the value at column `i`.
    fn record(
        &self,
        row: usize,
        cell: impl Fn(usize) -> CellValue,
    ) -> Result<RawRecord, IngestError> {
        Ok(RawRecord {
            run: to_text(cell(self.run), row, "Run")?,
            sample: to_text(cell(self.sample), row, "Sample")?,
            index: to_index(cell(self.index), row)?,
            reject: to_reject(cell(self.reject), row)?,
            channel: to_text(cell(self.channel), row, "Channel")?,
            c40: to_measurement(cell(self.c40), row)?,
        })
    }
}

fn invalid(row: usize, column: &'static str, value: &CellValue) -> IngestError {
    IngestError::InvalidCell {
        row,
        column,
        value: value.to_string(),
    }
}

fn to_text(value: CellValue, row: usize, column: &'static str) -> Result<String, IngestError> {
    match &value {
        CellValue::Null => Err(invalid(row, column, &value)),
        CellValue::String(s) if s.trim().is_empty() => Err(invalid(row, column, &CellValue::Null)),
        CellValue::String(s) => Ok(s.clone()),
        other => Ok(other.to_string()),
    }
}

fn to_index(value: CellValue, row: usize) -> Result<i64, IngestError> {
    match &value {
        CellValue::Integer(i) => Ok(*i),
        CellValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(*f as i64),
        CellValue::String(s) => {
            let s = s.trim();
            match (s.parse::<i64>(), s.parse::<f64>()) {
                (Ok(i), _) => Ok(i),
                (_, Ok(f)) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
                _ => Err(invalid(row, "Index", &value)),
            }
        }
        _ => Err(invalid(row, "Index", &value)),
    }
}

/// An empty Reject cell never compares equal to `false`, so the row is dropped.
fn to_reject(value: CellValue, row: usize) -> Result<bool, IngestError> {
    match &value {
        CellValue::Bool(b) => Ok(*b),
        CellValue::Null => Ok(true),
        CellValue::Integer(0) => Ok(false),
        CellValue::Integer(1) => Ok(true),
        CellValue::Float(f) if *f == 0.0 => Ok(false),
        CellValue::Float(f) if *f == 1.0 => Ok(true),
        CellValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            "" => Ok(true),
            _ => Err(invalid(row, "Reject", &value)),
        },
        _ => Err(invalid(row, "Reject", &value)),
    }
}

fn to_measurement(value: CellValue, row: usize) -> Result<Option<f64>, IngestError> {
    if value.is_null() {
        return Ok(None);
    }
    if let CellValue::String(s) = &value {
        if s.trim().is_empty() {
            return Ok(None);
        }
    }
    match value.as_f64() {
        Some(v) if v.is_nan() => Ok(None),
        Some(v) => Ok(Some(v)),
        None => Err(invalid(row, "C40", &value)),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<RawRecord>, IngestError> {
    let file = std::fs::File::open(path)?;
    read_csv(file)
}

/// Parse comma-separated records with a header row.
pub fn read_csv<R: Read>(input: R) -> Result<Vec<RawRecord>, IngestError> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let row = row_no + 1;
        records.push(columns.record(row, |i| csv_cell(record.get(i).unwrap_or("")))?);
    }
    Ok(records)
}

/// CSV cells stay text; numeric columns are parsed during coercion, so
/// text columns such as Sample keep values like `01` verbatim.
fn csv_cell(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        CellValue::Null
    } else {
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Reads the first worksheet; row 1 is the header.
fn load_spreadsheet(path: &Path) -> Result<Vec<RawRecord>, IngestError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::EmptyWorkbook)??;
    read_range(&range)
}

/// Parse a worksheet range whose first row is the header.
fn read_range(range: &Range<Data>) -> Result<Vec<RawRecord>, IngestError> {
    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => Vec::new(),
    };
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut records = Vec::new();
    for (row_no, cells) in rows.enumerate() {
        // Trailing blank rows are common in hand-edited workbooks.
        if cells.iter().all(|c| matches!(c, Data::Empty)) {
            continue;
        }
        let row = row_no + 1;
        records.push(columns.record(row, |i| {
            cells.get(i).map(spreadsheet_cell).unwrap_or(CellValue::Null)
        })?);
    }
    Ok(records)
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Empty => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet table with the required columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<RawRecord>, IngestError> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let field_names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let columns = ColumnIndex::from_headers(&field_names)?;

    let reader = builder.build()?;
    let mut records = Vec::new();
    let mut offset = 0;

    for batch_result in reader {
        let batch = batch_result?;
        for row in 0..batch.num_rows() {
            records.push(columns.record(offset + row + 1, |i| {
                extract_cell(batch.column(i), row)
            })?);
        }
        offset += batch.num_rows();
    }

    Ok(records)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => CellValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::{BooleanArray, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    const SAMPLE_CSV: &str = "\
Run,Well,Sample,Index,Reject,Channel,C40
R1,A01,A1,1,False,FAM,1500.5
R1,A01,A1,1,False,VIC,800
R1,A01,A1,2,True,FAM,20
R1,A01,A1,2,false,VIC,
";

    #[test]
    fn test_detect_format() {
        assert_eq!(SourceFormat::detect("run.csv"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::detect("run.xlsx"), Some(SourceFormat::Spreadsheet));
        assert_eq!(SourceFormat::detect("run.xls"), Some(SourceFormat::Spreadsheet));
        assert_eq!(SourceFormat::detect("run.parquet"), Some(SourceFormat::Parquet));
        // Substring, not extension: a csv marker anywhere wins.
        assert_eq!(SourceFormat::detect("csv_export.xlsx"), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::detect("run.txt"), None);
    }

    #[test]
    fn test_read_csv_records() {
        let records = read_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].run, "R1");
        assert_eq!(records[0].sample, "A1");
        assert_eq!(records[0].index, 1);
        assert!(!records[0].reject);
        assert_eq!(records[0].channel, "FAM");
        assert_eq!(records[0].c40, Some(1500.5));
        assert_eq!(records[1].c40, Some(800.0));
        assert!(records[2].reject);
        assert!(!records[3].reject);
        assert_eq!(records[3].c40, None);
    }

    #[test]
    fn test_text_columns_keep_leading_zeros() {
        let csv = "\
Run,Sample,Index,Reject,Channel,C40
007,A1,1,False,FAM,1.0
R1,01,2,0,FAM,2.0
R1,1,3,1,FAM,3.0
";
        let records = read_csv(csv.as_bytes()).unwrap();
        let keys: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.run.as_str(), r.sample.as_str()))
            .collect();
        assert_eq!(keys, vec![("007", "A1"), ("R1", "01"), ("R1", "1")]);
        assert_eq!(records[1].index, 2);
        assert!(!records[1].reject);
        assert!(records[2].reject);
    }

    fn worksheet(rows: Vec<Vec<Data>>) -> Range<Data> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (r, cells) in rows.into_iter().enumerate() {
            for (c, cell) in cells.into_iter().enumerate() {
                range.set_value((r as u32, c as u32), cell);
            }
        }
        range
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    fn header() -> Vec<Data> {
        REQUIRED_COLUMNS.iter().map(|name| text(name)).collect()
    }

    fn reading(sample: &str, index: Data, reject: Data, channel: &str, c40: Data) -> Vec<Data> {
        vec![text("R1"), text(sample), index, reject, text(channel), c40]
    }

    #[test]
    fn test_read_worksheet_range() {
        let range = worksheet(vec![
            header(),
            reading("A1", Data::Float(1.0), Data::Bool(false), "FAM", Data::Float(812.5)),
            reading("A1", Data::Int(2), Data::Bool(true), "VIC", Data::Empty),
            vec![Data::Empty; 6],
            reading("01", Data::Float(3.0), text("FALSE"), "ROX", Data::Int(40)),
        ]);

        let records = read_range(&range).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].index, 1);
        assert!(!records[0].reject);
        assert_eq!(records[0].c40, Some(812.5));
        assert!(records[1].reject);
        assert_eq!(records[1].c40, None);
        assert_eq!(records[2].sample, "01");
        assert_eq!(records[2].index, 3);
        assert!(!records[2].reject);
        assert_eq!(records[2].c40, Some(40.0));
    }

    #[test]
    fn test_worksheet_missing_column() {
        let mut columns = header();
        columns.remove(3);
        let range = worksheet(vec![
            columns,
            vec![text("R1"), text("A1"), Data::Int(1), text("FAM"), Data::Float(1.0)],
        ]);
        let err = read_range(&range).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn("Reject")));
    }

    #[test]
    fn test_worksheet_fractional_index_rejected() {
        let range = worksheet(vec![
            header(),
            reading("A1", Data::Float(1.5), Data::Bool(false), "FAM", Data::Float(1.0)),
        ]);
        match read_range(&range).unwrap_err() {
            IngestError::InvalidCell { row, column, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "Index");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_column_rejected() {
        let csv = "Run,Sample,Index,Channel,C40\nR1,A1,1,FAM,1.0\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn("Reject")));
    }

    #[test]
    fn test_column_names_are_case_sensitive() {
        let csv = "run,Sample,Index,Reject,Channel,C40\nR1,A1,1,False,FAM,1.0\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn("Run")));
    }

    #[test]
    fn test_invalid_cell_reports_location() {
        let csv = "\
Run,Sample,Index,Reject,Channel,C40
R1,A1,1,False,FAM,1.0
R1,A1,x,False,FAM,2.0
";
        match read_csv(csv.as_bytes()).unwrap_err() {
            IngestError::InvalidCell { row, column, value } => {
                assert_eq!(row, 2);
                assert_eq!(column, "Index");
                assert_eq!(value, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reject_coercion() {
        assert!(!to_reject(CellValue::String("FALSE".into()), 1).unwrap());
        assert!(to_reject(CellValue::String("True".into()), 1).unwrap());
        assert!(!to_reject(CellValue::Integer(0), 1).unwrap());
        assert!(!to_reject(CellValue::String("0".into()), 1).unwrap());
        assert!(to_reject(CellValue::String("1".into()), 1).unwrap());
        assert!(to_reject(CellValue::Null, 1).unwrap());
        assert!(to_reject(CellValue::String("maybe".into()), 1).is_err());
    }

    #[test]
    fn test_index_accepts_integral_floats() {
        assert_eq!(to_index(CellValue::Float(7.0), 1).unwrap(), 7);
        assert!(to_index(CellValue::Float(7.5), 1).is_err());
        assert_eq!(to_index(CellValue::String("007".into()), 1).unwrap(), 7);
        assert_eq!(to_index(CellValue::String("7.0".into()), 1).unwrap(), 7);
        assert!(to_index(CellValue::Null, 1).is_err());
    }

    #[test]
    fn test_load_file_routes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plate.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(SAMPLE_CSV.as_bytes()).unwrap();

        let records = load_file(&path).unwrap();
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn test_load_file_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plate.txt");
        std::fs::write(&path, SAMPLE_CSV).unwrap();

        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(name) if name == "plate.txt"));
    }

    #[test]
    fn test_load_file_corrupt_spreadsheet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plate.xlsx");
        std::fs::write(&path, b"definitely not a workbook").unwrap();

        assert!(load_file(&path).is_err());
    }

    #[test]
    fn test_load_parquet() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Run", DataType::Utf8, false),
            Field::new("Sample", DataType::Utf8, false),
            Field::new("Index", DataType::Int64, false),
            Field::new("Reject", DataType::Boolean, false),
            Field::new("Channel", DataType::Utf8, false),
            Field::new("C40", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["R1", "R1"])),
                Arc::new(StringArray::from(vec!["B2", "B2"])),
                Arc::new(Int64Array::from(vec![5, 5])),
                Arc::new(BooleanArray::from(vec![false, true])),
                Arc::new(StringArray::from(vec!["ROX", "JUN"])),
                Arc::new(Float64Array::from(vec![Some(42.0), None])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plate.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let records = load_file(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sample, "B2");
        assert_eq!(records[0].index, 5);
        assert_eq!(records[0].channel, "ROX");
        assert_eq!(records[0].c40, Some(42.0));
        assert!(records[1].reject);
        assert_eq!(records[1].c40, None);
    }
}
