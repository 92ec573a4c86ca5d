// Workbook ingestion - First sheet of an .xlsx/.xls upload into a time series
use crate::domain::error::ImportError;
use crate::domain::time_series::{
    TimeSeries, TimeSeriesPoint, parse_timestamp, spreadsheet_serial_to_millis,
};
use calamine::{Data, Reader};
use std::io::Cursor;

const TIMESTAMP_HEADERS: &[&str] = &["timestamp", "fecha", "date", "time", "hora", "tiempo"];
const VALUE_HEADERS: &[&str] = &[
    "valor", "value", "lectura", "reading", "consumo", "volumen", "volume", "caudal", "flow",
    "medicion", "medición",
];
const UNIT_HEADERS: &[&str] = &["unidad", "unit", "uom"];

/// Numbers below this are date serials; larger ones are epoch millis.
const MAX_DATE_SERIAL: f64 = 10_000_000.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Date(f64),
    Text(String),
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(n) => Cell::Number(*n as f64),
            Data::Float(n) => Cell::Number(*n),
            Data::DateTime(dt) => Cell::Date(dt.as_f64()),
            Data::String(s) | Data::DateTimeIso(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DurationIso(_) | Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

impl Cell {
    fn header(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_lowercase(),
            Cell::Number(n) | Cell::Date(n) => n.to_string(),
            Cell::Empty => String::new(),
        }
    }

    fn timestamp(&self) -> Option<i64> {
        match self {
            Cell::Date(serial) => Some(spreadsheet_serial_to_millis(*serial)),
            Cell::Number(n) if *n < MAX_DATE_SERIAL => Some(spreadsheet_serial_to_millis(*n)),
            Cell::Number(n) => Some(*n as i64),
            Cell::Text(s) => parse_timestamp(s),
            Cell::Empty => None,
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
            Cell::Date(_) | Cell::Empty => None,
        }
    }

    fn text(&self) -> Option<String> {
        match self {
            Cell::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ColumnMap {
    timestamp: usize,
    value: usize,
    unit: Option<usize>,
}

/// Parse an uploaded workbook's first sheet.
pub fn parse_workbook(bytes: &[u8]) -> Result<TimeSeries, ImportError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ImportError::NoSheets)?
        .map_err(|e| ImportError::Unreadable(e.to_string()))?;

    let rows: Vec<Vec<Cell>> = range
        .rows()
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();
    parse_rows(&rows)
}

/// Locate columns from the header row and read every data row. Rows missing
/// a timestamp or value are skipped.
pub fn parse_rows(rows: &[Vec<Cell>]) -> Result<TimeSeries, ImportError> {
    if rows.len() < 2 {
        return Err(ImportError::TooFewRows);
    }

    let headers: Vec<String> = rows[0].iter().map(Cell::header).collect();
    let columns = locate_columns(&headers)?;
    let header_unit = unit_from_header(&headers[columns.value]);
    tracing::debug!(
        "Spreadsheet columns: timestamp={} value={} unit={:?}",
        headers[columns.timestamp],
        headers[columns.value],
        columns.unit.map(|i| headers[i].as_str())
    );

    let mut points = Vec::with_capacity(rows.len() - 1);
    let mut skipped = 0;
    for row in &rows[1..] {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        let timestamp = row.get(columns.timestamp).and_then(Cell::timestamp);
        let value = row.get(columns.value).and_then(Cell::number);
        let (Some(timestamp), Some(value)) = (timestamp, value) else {
            skipped += 1;
            continue;
        };
        let unit = columns
            .unit
            .and_then(|i| row.get(i))
            .and_then(Cell::text)
            .or_else(|| header_unit.clone())
            .unwrap_or_default();
        points.push(TimeSeriesPoint::new(timestamp, value, unit));
    }

    if points.is_empty() {
        return Err(ImportError::NoValidRows);
    }
    if skipped > 0 {
        tracing::warn!("Skipped {} spreadsheet rows without timestamp or value", skipped);
    }

    Ok(TimeSeries::new(points, skipped))
}

fn locate_columns(headers: &[String]) -> Result<ColumnMap, ImportError> {
    let matches = |header: &str, synonyms: &[&str]| synonyms.iter().any(|s| header.contains(s));

    let timestamp = headers
        .iter()
        .position(|h| matches(h, TIMESTAMP_HEADERS))
        .ok_or(ImportError::MissingTimestampColumn)?;
    let value = headers
        .iter()
        .enumerate()
        .position(|(i, h)| i != timestamp && matches(h, VALUE_HEADERS))
        .ok_or(ImportError::MissingValueColumn)?;
    let unit = headers
        .iter()
        .enumerate()
        .position(|(i, h)| i != timestamp && i != value && matches(h, UNIT_HEADERS));

    Ok(ColumnMap {
        timestamp,
        value,
        unit,
    })
}

/// "volumen (m3)" -> "m3"
fn unit_from_header(header: &str) -> Option<String> {
    let open = header.find('(')?;
    let close = header[open..].find(')')? + open;
    let unit = header[open + 1..close].trim();
    (!unit.is_empty()).then(|| unit.to_string())
}
