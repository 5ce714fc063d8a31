use crate::error::{ClimateError, Result};
use crate::report::Report;
use crate::structs::{Month, OutputFormat, Record, ReportConfig, TemperatureUnit};
use arrow_array::{BooleanArray, Float64Array, Int32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use log::{debug, info};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Positional row layout: `temperature,year,month,country,country_code`.
type RawRow = (f64, i32, String, String, String);

/// Loads the base dataset from a CSV file with a header line.
///
/// Fields are trimmed and read by position, so the header text is not
/// checked.
///
/// # Errors
///
/// Returns `ClimateError::Ingest` if the file cannot be read or any row is
/// malformed. One bad row fails the whole load.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    debug!("Reading CSV file: {}", path.display());
    let ingest = |reason: String| ClimateError::Ingest(format!("{}: {}", path.display(), reason));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ingest(e.to_string()))?;

    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<RawRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let (temperature, year, month, country, code) =
            row.map_err(|e| ingest(format!("line {}: {}", line, e)))?;
        let month: Month = month
            .parse()
            .map_err(|e: ClimateError| ingest(format!("line {}: {}", line, e)))?;
        let record = Record::new(temperature, year, month, country, code)
            .map_err(|e| ingest(format!("line {}: {}", line, e)))?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(ingest("no data rows".to_string()));
    }
    info!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Writes `report` into `config.output_dir` in every configured format.
///
/// Returns the paths written.
pub fn write_report(report: &Report, config: &ReportConfig) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&config.output_dir)?;
    let stem = report.kind.file_stem();
    let mut written = Vec::with_capacity(config.formats.len());
    for format in &config.formats {
        let path = match format {
            OutputFormat::Text => {
                let path = config.output_dir.join(format!("{}.csv", stem));
                write_report_text(report, &path)?;
                path
            }
            OutputFormat::Json => {
                let path = config.output_dir.join(format!("{}.json", stem));
                write_json(&report.records, &path)?;
                path
            }
            OutputFormat::Parquet => {
                let path = config.output_dir.join(format!("{}.parquet", stem));
                write_parquet(&report.records, &path)?;
                path
            }
        };
        debug!("  - {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Appends the caption line, the column header and one line per record.
///
/// Successive reports of the same kind accumulate in the same file.
pub fn write_report_text(report: &Report, output_path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output_path)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", report.caption)?;
    writeln!(writer, "{}", report.kind.column_header())?;
    for record in &report.records {
        writeln!(writer, "{}", record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Prints the caption and each record with its temperature in `unit`.
pub fn print_report<W: Write>(report: &Report, unit: TemperatureUnit, out: &mut W) -> Result<()> {
    writeln!(out, "{}", report.caption)?;
    for record in &report.records {
        writeln!(
            out,
            "  {:.2}({}), {}, {}, {}, {}",
            record.temperature(unit),
            unit.suffix(),
            record.year(),
            record.month(),
            record.country(),
            record.country_code()
        )?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct RecordRow<'a> {
    celsius: f64,
    fahrenheit: f64,
    year: i32,
    month: &'static str,
    country: &'a str,
    country_code: &'a str,
    delta: bool,
}

impl<'a> From<&'a Record> for RecordRow<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            celsius: record.celsius(),
            fahrenheit: record.fahrenheit(),
            year: record.year(),
            month: record.month().code(),
            country: record.country(),
            country_code: record.country_code(),
            delta: record.is_delta(),
        }
    }
}

/// Writes records to a pretty-formatted JSON array.
pub fn write_json(records: &[Record], output_path: &Path) -> Result<()> {
    let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(file, &rows)?;
    Ok(())
}

/// Writes records to a columnar Parquet file using Arrow format.
///
/// # Errors
/// Returns error if file cannot be created, schema is invalid, or Arrow operations fail.
pub fn write_parquet(records: &[Record], output_path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("celsius", DataType::Float64, false),
        Field::new("fahrenheit", DataType::Float64, false),
        Field::new("year", DataType::Int32, false),
        Field::new("month", DataType::Utf8, false),
        Field::new("country", DataType::Utf8, false),
        Field::new("country_code", DataType::Utf8, false),
        Field::new("delta", DataType::Boolean, false),
    ]));

    let celsius: Float64Array = records.iter().map(|r| r.celsius()).collect();
    let fahrenheit: Float64Array = records.iter().map(|r| r.fahrenheit()).collect();
    let years: Int32Array = records.iter().map(|r| r.year()).collect();
    let months = StringArray::from_iter_values(records.iter().map(|r| r.month().code()));
    let countries = StringArray::from_iter_values(records.iter().map(|r| r.country()));
    let codes = StringArray::from_iter_values(records.iter().map(|r| r.country_code()));
    let deltas: BooleanArray = records.iter().map(|r| Some(r.is_delta())).collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(celsius),
            Arc::new(fahrenheit),
            Arc::new(years),
            Arc::new(months),
            Arc::new(countries),
            Arc::new(codes),
            Arc::new(deltas),
        ],
    )?;

    let file = File::create(output_path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}
