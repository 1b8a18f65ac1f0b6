// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::preprocess::{self, RawRow};
use crate::FlightqError;
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use flightq_nlp::Weekday;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Header names accepted for the flight identifier, first match wins.
pub const FLIGHT_ID_COLUMNS: &[&str] = &["Flight Number", "Flight_Number", "FlightNumber", "Flight"];
pub const ORIGIN_COLUMNS: &[&str] = &["From", "Origin"];
pub const DESTINATION_COLUMNS: &[&str] = &["To", "Destination"];
pub const ROUTE_COLUMNS: &[&str] = &["Route"];

/// Raw rows kept for `inspect`.
const SAMPLE_LIMIT: usize = 50;

/// One flight leg after preprocessing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    pub date: Option<NaiveDate>,
    pub weekday: Option<Weekday>,
    pub std: Option<NaiveDateTime>,
    pub takeoff_hour: Option<u8>,
    pub sta: Option<NaiveDateTime>,
    pub landing_hour: Option<u8>,
    pub atd: Option<NaiveDateTime>,
    /// Signed minutes, negative when the flight left early.
    pub delay: Option<f64>,
    pub flight_id: Option<String>,
    pub aircraft: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

impl FlightRecord {
    pub fn on_day(&self, day: Option<Weekday>) -> bool {
        day.map_or(true, |d| self.weekday == Some(d))
    }
}

/// Which optional source columns the file actually had.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    pub date: bool,
    pub std: bool,
    pub sta: bool,
    pub atd: bool,
    pub delay: bool,
    pub dep_delay: bool,
    pub aircraft: bool,
    pub flight_id: bool,
    pub route: bool,
}

impl ColumnSet {
    /// Every column present; handy for in-memory datasets.
    pub fn all() -> Self {
        Self {
            date: true,
            std: true,
            sta: true,
            atd: true,
            delay: true,
            dep_delay: true,
            aircraft: true,
            flight_id: true,
            route: true,
        }
    }
}

/// Read-only snapshot of the preprocessed flights for one session.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    headers: Vec<String>,
    columns: ColumnSet,
    records: Vec<FlightRecord>,
    sample: Vec<Vec<String>>,
}

impl Dataset {
    pub fn from_records(records: Vec<FlightRecord>, columns: ColumnSet) -> Self {
        Self {
            headers: Vec::new(),
            columns,
            records,
            sample: Vec::new(),
        }
    }

    pub fn records(&self) -> &[FlightRecord] {
        &self.records
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Up to `n` raw rows as they appeared in the file.
    pub fn sample(&self, n: usize) -> &[Vec<String>] {
        &self.sample[..n.min(self.sample.len())]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows on `day`, or every row when no day is given.
    pub fn rows_on(&self, day: Option<Weekday>) -> impl Iterator<Item = &FlightRecord> {
        self.records.iter().filter(move |r| r.on_day(day))
    }
}

#[derive(Debug, Default)]
struct HeaderIndex {
    date: Option<usize>,
    std: Option<usize>,
    sta: Option<usize>,
    atd: Option<usize>,
    delay: Option<usize>,
    dep_delay: Option<usize>,
    aircraft: Option<usize>,
    flight_id: Option<usize>,
    origin: Option<usize>,
    destination: Option<usize>,
    route: Option<usize>,
}

impl HeaderIndex {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let find = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| headers.iter().position(|h| h == *name))
        };
        Self {
            date: find(&["Date"]),
            std: find(&["STD"]),
            sta: find(&["STA"]),
            atd: find(&["ATD"]),
            delay: find(&["delay"]),
            dep_delay: find(&["Dep_Delay"]),
            aircraft: find(&["Aircraft"]),
            flight_id: find(FLIGHT_ID_COLUMNS),
            origin: find(ORIGIN_COLUMNS),
            destination: find(DESTINATION_COLUMNS),
            route: find(ROUTE_COLUMNS),
        }
    }

    fn columns(&self) -> ColumnSet {
        ColumnSet {
            date: self.date.is_some(),
            std: self.std.is_some(),
            sta: self.sta.is_some(),
            atd: self.atd.is_some(),
            delay: self.delay.is_some(),
            dep_delay: self.dep_delay.is_some(),
            aircraft: self.aircraft.is_some(),
            flight_id: self.flight_id.is_some(),
            route: (self.origin.is_some() && self.destination.is_some()) || self.route.is_some(),
        }
    }

    fn raw_row<'a>(&self, record: &'a csv::StringRecord) -> RawRow<'a> {
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i));
        RawRow {
            date: cell(self.date),
            std: cell(self.std),
            sta: cell(self.sta),
            atd: cell(self.atd),
            delay: cell(self.delay),
            dep_delay: cell(self.dep_delay),
            aircraft: cell(self.aircraft),
            flight_id: cell(self.flight_id),
            origin: cell(self.origin),
            destination: cell(self.destination),
            route: cell(self.route),
        }
    }
}

/// File extensions read through the spreadsheet path.
const SPREADSHEET_EXTENSIONS: &[&str] = &["xls", "xlsx", "xlsm", "xlsb", "ods"];
const DELIMITED_EXTENSIONS: &[&str] = &["csv", "txt", ""];

pub struct DatasetLoader;

impl DatasetLoader {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Dataset, FlightqError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let spreadsheet = SPREADSHEET_EXTENSIONS.contains(&ext.as_str());
        if !spreadsheet && !DELIMITED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(FlightqError::UnsupportedFormat(ext));
        }
        if !path.exists() {
            return Err(FlightqError::DataNotFound(path.to_path_buf()));
        }

        info!("[Dataset] Loading {}", path.display());
        if spreadsheet {
            Self::from_spreadsheet(path)
        } else {
            Self::from_reader(File::open(path)?)
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Dataset, FlightqError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header_record = rdr.headers()?.clone();
        Self::assemble(header_record, rdr.records())
    }

    /// Reads the first worksheet; its first row is the header.
    pub fn from_spreadsheet(path: &Path) -> Result<Dataset, FlightqError> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(FlightqError::MissingHeader)??;
        Self::from_sheet_rows(range.rows())
    }

    fn from_sheet_rows<'a>(
        mut rows: impl Iterator<Item = &'a [Data]>,
    ) -> Result<Dataset, FlightqError> {
        let to_record =
            |row: &[Data]| csv::StringRecord::from(row.iter().map(cell_text).collect::<Vec<_>>());
        let header_record = rows.next().map(to_record).unwrap_or_default();
        Self::assemble(header_record, rows.map(|row| Ok(to_record(row))))
    }

    fn assemble(
        header_record: csv::StringRecord,
        rows: impl Iterator<Item = Result<csv::StringRecord, csv::Error>>,
    ) -> Result<Dataset, FlightqError> {
        if header_record.iter().all(|h| h.is_empty()) {
            return Err(FlightqError::MissingHeader);
        }
        let index = HeaderIndex::from_headers(&header_record);
        let columns = index.columns();
        debug!("[Dataset] Columns detected: {:?}", columns);

        let mut records = Vec::new();
        let mut sample = Vec::new();
        let mut skipped = 0usize;

        for result in rows {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!("[Dataset] Skipping malformed row: {}", e);
                    skipped += 1;
                    continue;
                }
            };
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }
            if sample.len() < SAMPLE_LIMIT {
                sample.push(record.iter().map(|f| f.to_string()).collect());
            }
            records.push(preprocess::preprocess(&index.raw_row(&record)));
        }

        let undated = records.iter().filter(|r| r.weekday.is_none()).count();
        let no_delay = records.iter().filter(|r| r.delay.is_none()).count();
        info!(
            "[Dataset] Loaded {} rows (skipped={} no_weekday={} no_delay={})",
            records.len(),
            skipped,
            undated,
            no_delay
        );

        Ok(Dataset {
            headers: header_record.iter().map(|h| h.to_string()).collect(),
            columns,
            records,
            sample,
        })
    }
}

/// Renders a sheet cell the way the CSV path would have seen it. Excel
/// serials below one day are bare times.
fn cell_text(cell: &Data) -> String {
    let text = match cell {
        Data::Empty => String::new(),
        Data::DateTime(serial) => match cell.as_datetime() {
            Some(at) if serial.as_f64() < 1.0 => at.format("%H:%M:%S").to_string(),
            Some(at) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        _ => cell.to_string(),
    };
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
Flight Number,Date,From,To,Aircraft,STD,ATD,STA
AI2509,25-Jul-25,Mumbai (BOM),Chandigarh (IXC),A20N (VT-EXU),6:00:00,6:20:00,8:10:00
6E762,2025-07-26,Mumbai (BOM),Delhi (DEL),A21N (VT-ILS),6:00:00,6:05:00,8:05:00
,,,,,,,
QP1891,,BOM,DEL,B38M,bad,6:25:00,
";

    #[test]
    fn test_load_sample() {
        let ds = DatasetLoader::from_reader(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.headers()[0], "Flight Number");

        let cols = ds.columns();
        assert!(cols.flight_id && cols.aircraft && cols.route && cols.std && cols.atd);
        assert!(!cols.dep_delay && !cols.delay);

        let first = &ds.records()[0];
        assert_eq!(first.flight_id.as_deref(), Some("AI2509"));
        assert_eq!(first.weekday, Some(Weekday::Friday));
        assert_eq!(first.takeoff_hour, Some(6));
        assert_eq!(first.landing_hour, Some(8));
        assert_eq!(first.delay, Some(20.0));
        assert_eq!(first.origin.as_deref(), Some("BOM"));
        assert_eq!(first.destination.as_deref(), Some("IXC"));

        let broken = &ds.records()[2];
        assert_eq!(broken.weekday, None);
        assert_eq!(broken.takeoff_hour, None);
        assert_eq!(broken.delay, None);
        assert_eq!(broken.landing_hour, None);
    }

    #[test]
    fn test_rows_on_filters_by_weekday() {
        let ds = DatasetLoader::from_reader(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(ds.rows_on(Some(Weekday::Saturday)).count(), 1);
        assert_eq!(ds.rows_on(None).count(), 3);
        assert_eq!(ds.rows_on(Some(Weekday::Monday)).count(), 0);
    }

    #[test]
    fn test_missing_optional_columns() {
        let csv = "Date,STD,Dep_Delay\n2025-07-21,09:00,15\n";
        let ds = DatasetLoader::from_reader(Cursor::new(csv)).unwrap();
        let cols = ds.columns();
        assert!(!cols.flight_id);
        assert!(!cols.aircraft);
        assert!(!cols.route);
        assert_eq!(ds.records()[0].delay, Some(15.0));
    }

    #[test]
    fn test_sample_is_capped() {
        let ds = DatasetLoader::from_reader(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(ds.sample(2).len(), 2);
        assert_eq!(ds.sample(100).len(), 3);
        assert_eq!(ds.sample(1)[0][0], "AI2509");
    }

    #[test]
    fn test_rejects_unknown_formats_and_missing_files() {
        assert!(matches!(
            DatasetLoader::load("flights.parquet"),
            Err(FlightqError::UnsupportedFormat(_))
        ));
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DatasetLoader::load(dir.path().join("nope.csv")),
            Err(FlightqError::DataNotFound(_))
        ));
        assert!(matches!(
            DatasetLoader::load(dir.path().join("processed_data.xls")),
            Err(FlightqError::DataNotFound(_))
        ));
    }

    #[test]
    fn test_spreadsheet_extension_goes_to_workbook_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_data.xlsx");
        std::fs::write(&path, "definitely not a zip archive").unwrap();
        assert!(matches!(
            DatasetLoader::load(&path),
            Err(FlightqError::Spreadsheet(_))
        ));
    }

    #[test]
    fn test_sheet_rows_share_the_csv_path() {
        let text = |s: &str| Data::String(s.to_string());
        let rows = vec![
            vec![
                text("Flight Number"),
                text("Date"),
                text("Route"),
                text("Aircraft"),
                text("STD"),
                text("Dep_Delay"),
            ],
            vec![
                text("AI101"),
                text("2025-07-21"),
                text("HYD-DEL"),
                text(" A320 "),
                text("14:00"),
                Data::Float(12.5),
            ],
            vec![Data::Empty; 6],
            vec![
                text("6E202"),
                Data::DateTimeIso("2025-07-22T00:00:00".to_string()),
                text("BOM-DEL"),
                Data::Empty,
                text("09:30"),
                Data::Int(-3),
            ],
        ];

        let ds = DatasetLoader::from_sheet_rows(rows.iter().map(|r| r.as_slice())).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(ds.columns().flight_id && ds.columns().route && ds.columns().dep_delay);

        let first = &ds.records()[0];
        assert_eq!(first.weekday, Some(Weekday::Monday));
        assert_eq!(first.takeoff_hour, Some(14));
        assert_eq!(first.delay, Some(12.5));
        assert_eq!(first.aircraft.as_deref(), Some("A320"));
        assert_eq!(first.origin.as_deref(), Some("HYD"));

        let second = &ds.records()[1];
        assert_eq!(second.weekday, Some(Weekday::Tuesday));
        assert_eq!(second.delay, Some(-3.0));
        assert_eq!(second.aircraft, None);
    }

    #[test]
    fn test_empty_sheet_has_no_header() {
        let rows: Vec<Vec<Data>> = Vec::new();
        assert!(matches!(
            DatasetLoader::from_sheet_rows(rows.iter().map(|r| r.as_slice())),
            Err(FlightqError::MissingHeader)
        ));
    }
}
