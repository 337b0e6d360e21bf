//! Loading and saving flight tables.
//!
//! All file I/O flows through this module. It provides:
//!
//! - **Format detection**: by extension. Workbooks (`.xlsx`, `.xlsm`, `.xlsb`,
//!   `.xls`, `.ods`) are read with `calamine`. `.xlsx` output is written with
//!   `rust_xlsxwriter`. Everything else is delimited text (`.tsv` → tab,
//!   otherwise comma unless overridden).
//! - **Encoding**: delimited input is decoded and output transcoded via
//!   `encoding_rs`, defaulting to UTF-8.
//! - **stdin/stdout**: the `-` path convention routes delimited text through
//!   the standard streams.
//!
//! Loaders hand back raw content. Delimited fields become [`Cell::Text`];
//! workbook cells keep their native kind.

use std::{
    collections::HashMap,
    fs::{self, File},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use calamine::{Data, Reader, open_workbook_auto};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::{
    data::{Cell, Table},
    error::{FlightDelayError, Result},
    timeparse,
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];
const XLSX_DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const XLSX_TIME_FORMAT: &str = "hh:mm:ss";

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    /// Worksheet name or 0-based index; the first sheet when `None`.
    pub sheet: Option<String>,
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            delimiter: None,
            sheet: None,
            encoding: UTF_8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

fn has_extension(path: &Path, candidates: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| candidates.iter().any(|c| ext.eq_ignore_ascii_case(c)))
}

pub fn is_workbook(path: &Path) -> bool {
    !is_dash(path) && has_extension(path, WORKBOOK_EXTENSIONS)
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| FlightDelayError::UnknownEncoding(value.to_string())),
        None => Ok(UTF_8),
    }
}

pub fn resolve_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or(if has_extension(path, &["tsv"]) {
        DEFAULT_TSV_DELIMITER
    } else {
        DEFAULT_CSV_DELIMITER
    })
}

/// Reads `path` into a [`Table`], choosing the reader by extension.
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<Table> {
    let table = if is_workbook(path) {
        read_workbook(path, options.sheet.as_deref())?
    } else {
        let delimiter = resolve_delimiter(path, options.delimiter);
        read_delimited(path, delimiter, options.encoding)?
    };
    info!(
        "Loaded {} row(s) across {} column(s) from {:?}",
        table.row_count(),
        table.column_count(),
        path
    );
    Ok(table)
}

fn source_unavailable(path: &Path) -> impl FnOnce(io::Error) -> FlightDelayError + '_ {
    move |source| FlightDelayError::SourceUnavailable {
        path: path.to_path_buf(),
        source,
    }
}

fn read_delimited(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Table> {
    let mut bytes = Vec::new();
    if is_dash(path) {
        io::stdin()
            .lock()
            .read_to_end(&mut bytes)
            .map_err(source_unavailable(path))?;
    } else {
        bytes = fs::read(path).map_err(source_unavailable(path))?;
    }
    let text = decode_bytes(&bytes, encoding).ok_or_else(|| FlightDelayError::Decode {
        path: path.to_path_buf(),
        encoding: encoding.name().to_string(),
    })?;
    parse_delimited(&text, delimiter, path)
}

/// Decodes `bytes`, stripping a byte order mark. `None` on malformed input.
pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Option<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    (!had_errors).then(|| text.into_owned())
}

/// Parses delimited text whose first record is the header row. `path` only
/// names the source in errors.
///
/// Short records are padded with empty cells. A record wider than the header
/// is an error, since its extra fields have no column to land in.
pub fn parse_delimited(text: &str, delimiter: u8, path: &Path) -> Result<Table> {
    let csv_error = |source: csv::Error| FlightDelayError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = normalize_headers(
        reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect(),
    );
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        if record.len() > headers.len() {
            return Err(FlightDelayError::WideRecord {
                path: path.to_path_buf(),
                line: record.position().map_or(0, |pos| pos.line()),
                found: record.len(),
                expected: headers.len(),
            });
        }
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(Table::new(headers, rows))
}

fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Table> {
    // Surface a missing or unreadable file as an I/O failure rather than a
    // workbook format error.
    File::open(path).map_err(source_unavailable(path))?;
    let workbook_error = |message: String| FlightDelayError::Workbook {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| workbook_error(e.to_string()))?;
    if workbook.sheet_names().is_empty() {
        return Err(workbook_error("workbook has no worksheets".to_string()));
    }
    let range = match sheet {
        Some(selector) => match selector.parse::<usize>() {
            Ok(idx) => workbook
                .worksheet_range_at(idx)
                .ok_or_else(|| workbook_error(format!("no sheet at index {idx}")))?,
            Err(_) => workbook.worksheet_range(selector),
        },
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| workbook_error("no first sheet".to_string()))?,
    }
    .map_err(|e| workbook_error(e.to_string()))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        debug!("Worksheet in {path:?} is empty");
        return Ok(Table::default());
    };
    let headers = normalize_headers(header_row.iter().map(header_text).collect());
    let rows = rows
        .map(|row| row.iter().map(workbook_cell).collect())
        .collect();
    Ok(Table::new(headers, rows))
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn workbook_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from_text(s.as_str()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        // Converted with the same serial rules the writer uses, so time-only
        // cells share the date of bare text times and survive a round trip.
        Data::DateTime(dt) => {
            timeparse::from_serial(dt.as_f64()).map_or(Cell::Number(dt.as_f64()), Cell::Temporal)
        }
        Data::DateTimeIso(s) => {
            timeparse::parse_text(s).map_or_else(|| Cell::from_text(s.as_str()), Cell::Temporal)
        }
        Data::Bool(b) => Cell::Text(b.to_string().to_uppercase()),
        Data::DurationIso(s) => Cell::from_text(s.as_str()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

/// Names blank headers `column_{n}` and suffixes repeats with `.1`, `.2`, ...
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::with_capacity(raw.len());
    for (idx, header) in raw.into_iter().enumerate() {
        let base = if header.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            header
        };
        let mut name = base.clone();
        while let Some(count) = seen.get_mut(&name) {
            *count += 1;
            name = format!("{base}.{count}");
        }
        seen.insert(name.clone(), 0);
        if name != base {
            seen.entry(base).or_insert(0);
        }
        headers.push(name);
    }
    headers
}

/// Writes `table` to `path`, choosing the writer by extension.
pub fn write_table(table: &Table, path: &Path, options: &WriteOptions) -> Result<()> {
    if has_extension(path, &["xlsx"]) && !is_dash(path) {
        write_xlsx(table, path)?;
    } else if is_workbook(path) {
        return Err(FlightDelayError::UnsupportedOutput(path.to_path_buf()));
    } else {
        let delimiter = resolve_delimiter(path, options.delimiter);
        write_delimited(table, path, delimiter, options.encoding)?;
    }
    info!(
        "Wrote {} row(s) across {} column(s) to {:?}",
        table.row_count(),
        table.column_count(),
        path
    );
    Ok(())
}

fn write_failure(path: &Path) -> impl FnOnce(io::Error) -> FlightDelayError + '_ {
    move |source| FlightDelayError::DestinationWriteFailure {
        path: path.to_path_buf(),
        source,
    }
}

/// Renders `table` as delimited UTF-8 text. Every field is quoted.
pub fn render_delimited(table: &Table, delimiter: u8) -> io::Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .from_writer(Vec::new());
    writer.write_record(&table.headers).map_err(io::Error::other)?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(Cell::as_display))
            .map_err(io::Error::other)?;
    }
    let bytes = writer.into_inner().map_err(|e| io::Error::other(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn write_delimited(
    table: &Table,
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    let text = render_delimited(table, delimiter).map_err(write_failure(path))?;
    let (encoded, _, had_errors) = encoding.encode(&text);
    if had_errors {
        return Err(write_failure(path)(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("output is not representable in {}", encoding.name()),
        )));
    }
    if is_dash(path) {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(&encoded)
            .and_then(|_| stdout.flush())
            .map_err(write_failure(path))
    } else {
        fs::write(path, &encoded).map_err(write_failure(path))
    }
}

fn write_xlsx(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(write_failure(path))?;
    build_workbook(table)
        .and_then(|mut workbook| workbook.save_to_writer(file))
        .map_err(|err| xlsx_failure(path.to_path_buf(), err))
}

fn xlsx_failure(path: PathBuf, err: XlsxError) -> FlightDelayError {
    match err {
        XlsxError::IoError(source) => FlightDelayError::DestinationWriteFailure { path, source },
        other => FlightDelayError::Xlsx {
            path,
            message: other.to_string(),
        },
    }
}

fn build_workbook(table: &Table) -> std::result::Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let datetime_format = Format::new().set_num_format(XLSX_DATETIME_FORMAT);
    let time_format = Format::new().set_num_format(XLSX_TIME_FORMAT);
    let worksheet = workbook.add_worksheet();

    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, xlsx_col(col)?, header, &header_format)?;
    }
    for (idx, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, cell) in row.iter().enumerate() {
            let col = xlsx_col(col)?;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet.write_string(row_num, col, s)?;
                }
                Cell::Number(n) if n.is_finite() => {
                    worksheet.write_number(row_num, col, *n)?;
                }
                Cell::Number(_) => {}
                Cell::Temporal(dt) => {
                    worksheet.write_number_with_format(
                        row_num,
                        col,
                        timeparse::to_serial(*dt),
                        if timeparse::is_time_only(*dt) {
                            &time_format
                        } else {
                            &datetime_format
                        },
                    )?;
                }
            }
        }
    }
    Ok(workbook)
}

fn xlsx_col(col: usize) -> std::result::Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}
