//! Sensor dataset schema and CSV validation.
//!
//! Parses raw CSV text into typed, range-checked records. The whole
//! dataset is rejected if any single row fails - a partially validated
//! dataset must never reach the model. Unlike a fail-fast validator,
//! every field violation across the dataset is collected before failing,
//! each tagged with its row and column.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Columns every dataset row must provide. Names are exact and
/// case-sensitive; column order in the file is irrelevant.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    "timestamp",
    "location_id",
    "temperature_celsius",
    "humidity_percent",
    "air_quality_index",
    "noise_level_db",
    "lighting_lux",
    "crowd_density",
    "stress_level",
    "sleep_hours",
    "mood_score",
    "mental_health_status",
];

/// Mental health status flag carried by each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MentalHealthStatus {
    Normal = 0,
    Concern = 1,
    Severe = 2,
}

impl MentalHealthStatus {
    /// Decode the integer CSV column. Anything outside 0..=2 is a
    /// range violation, not a new variant.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Normal),
            1 => Some(Self::Concern),
            2 => Some(Self::Severe),
            _ => None,
        }
    }

    /// True for the CONCERN and SEVERE states.
    pub fn is_concerning(&self) -> bool {
        !matches!(self, Self::Normal)
    }
}

/// One timestamped observation for a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorRecord {
    pub timestamp: DateTime<Utc>,
    pub location_id: i64,
    pub temperature_celsius: f64,
    /// 0-100 inclusive.
    pub humidity_percent: f64,
    pub air_quality_index: i64,
    pub noise_level_db: f64,
    pub lighting_lux: f64,
    pub crowd_density: i64,
    /// 0-100 inclusive.
    pub stress_level: i64,
    /// 0-24 inclusive.
    pub sleep_hours: f64,
    pub mood_score: f64,
    pub mental_health_status: MentalHealthStatus,
}

/// Ordered, non-empty sequence of records sharing one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub records: Vec<SensorRecord>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// What went wrong with a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Cell is absent from the row.
    Missing,
    /// Cell cannot be coerced to the declared type.
    Type,
    /// Value is outside the declared bound.
    Range,
}

/// A single field-level violation, attributed to its row and column.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldViolation {
    /// 1-based data row number (the header is row 0).
    pub row: usize,
    pub column: &'static str,
    pub kind: ViolationKind,
    pub message: String,
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}, {}: {}", self.row, self.column, self.message)
    }
}

/// Dataset validation errors.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("invalid CSV structure: {0}")]
    Format(String),

    #[error("required column '{0}' is missing from the header")]
    MissingColumn(&'static str),

    #[error("dataset must contain at least one record")]
    Empty,

    #[error("dataset has {} invalid field(s): {}", .0.len(), summarize(.0))]
    Invalid(Vec<FieldViolation>),
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse raw CSV text into a validated [`Dataset`].
///
/// The header row is required. Rows are processed independently, but a
/// violation in any row rejects the whole dataset.
pub fn parse_dataset(raw: &str) -> Result<Dataset, DatasetError> {
    let mut lines = raw.lines().filter(|l| !l.trim().is_empty());

    let header_line = lines
        .next()
        .ok_or_else(|| DatasetError::Format("input is empty".to_string()))?;
    let header = split_csv_line(header_line);

    // Map each required column to its position in this file.
    let mut positions = [0usize; REQUIRED_COLUMNS.len()];
    for (i, column) in REQUIRED_COLUMNS.into_iter().enumerate() {
        match header.iter().position(|h| h == column) {
            Some(pos) => positions[i] = pos,
            None => return Err(DatasetError::MissingColumn(column)),
        }
    }

    let mut records = Vec::new();
    let mut violations = Vec::new();

    for (line_idx, line) in lines.enumerate() {
        let row_num = line_idx + 1;
        let cells = split_csv_line(line);
        let mut row = RowReader {
            row: row_num,
            cells: &cells,
            positions: &positions,
            violations: &mut violations,
        };

        let timestamp = row.timestamp("timestamp");
        let location_id = row.integer("location_id");
        let temperature_celsius = row.real("temperature_celsius");
        let humidity_percent = row.bounded_real("humidity_percent", 0.0, 100.0);
        let air_quality_index = row.integer("air_quality_index");
        let noise_level_db = row.real("noise_level_db");
        let lighting_lux = row.real("lighting_lux");
        let crowd_density = row.integer("crowd_density");
        let stress_level = row.bounded_integer("stress_level", 0, 100);
        let sleep_hours = row.bounded_real("sleep_hours", 0.0, 24.0);
        let mood_score = row.real("mood_score");
        let mental_health_status = row.status("mental_health_status");

        // Only assemble the record when every field came through clean;
        // the violations vector already holds everything that did not.
        if let (
            Some(timestamp),
            Some(location_id),
            Some(temperature_celsius),
            Some(humidity_percent),
            Some(air_quality_index),
            Some(noise_level_db),
            Some(lighting_lux),
            Some(crowd_density),
            Some(stress_level),
            Some(sleep_hours),
            Some(mood_score),
            Some(mental_health_status),
        ) = (
            timestamp,
            location_id,
            temperature_celsius,
            humidity_percent,
            air_quality_index,
            noise_level_db,
            lighting_lux,
            crowd_density,
            stress_level,
            sleep_hours,
            mood_score,
            mental_health_status,
        ) {
            records.push(SensorRecord {
                timestamp,
                location_id,
                temperature_celsius,
                humidity_percent,
                air_quality_index,
                noise_level_db,
                lighting_lux,
                crowd_density,
                stress_level,
                sleep_hours,
                mood_score,
                mental_health_status,
            });
        }
    }

    if !violations.is_empty() {
        return Err(DatasetError::Invalid(violations));
    }

    if records.is_empty() {
        return Err(DatasetError::Empty);
    }

    Ok(Dataset { records })
}

/// Split one CSV line into cells, honoring double-quoted fields with
/// `""` escapes. Whitespace around unquoted cells is trimmed.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                cells.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

/// Cursor over one data row; coercion failures land in the shared
/// violations vector instead of aborting the scan.
struct RowReader<'a> {
    row: usize,
    cells: &'a [String],
    positions: &'a [usize; REQUIRED_COLUMNS.len()],
    violations: &'a mut Vec<FieldViolation>,
}

impl<'a> RowReader<'a> {
    fn cell(&mut self, column: &'static str) -> Option<&'a str> {
        let idx = REQUIRED_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.positions[i])?;

        match self.cells.get(idx).map(|s| s.as_str()) {
            Some(value) if !value.is_empty() => Some(value),
            _ => {
                self.push(column, ViolationKind::Missing, "value is missing".to_string());
                None
            }
        }
    }

    fn push(&mut self, column: &'static str, kind: ViolationKind, message: String) {
        self.violations.push(FieldViolation {
            row: self.row,
            column,
            kind,
            message,
        });
    }

    fn integer(&mut self, column: &'static str) -> Option<i64> {
        let value = self.cell(column)?;
        match value.parse::<i64>() {
            Ok(n) => Some(n),
            Err(_) => {
                let message = format!("'{}' is not an integer", value);
                self.push(column, ViolationKind::Type, message);
                None
            }
        }
    }

    fn real(&mut self, column: &'static str) -> Option<f64> {
        let value = self.cell(column)?;
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(n),
            _ => {
                let message = format!("'{}' is not a number", value);
                self.push(column, ViolationKind::Type, message);
                None
            }
        }
    }

    fn bounded_integer(&mut self, column: &'static str, min: i64, max: i64) -> Option<i64> {
        let n = self.integer(column)?;
        if n < min || n > max {
            let message = format!("{} must be between {} and {}, got {}", column, min, max, n);
            self.push(column, ViolationKind::Range, message);
            return None;
        }
        Some(n)
    }

    fn bounded_real(&mut self, column: &'static str, min: f64, max: f64) -> Option<f64> {
        let n = self.real(column)?;
        if n < min || n > max {
            let message = format!("{} must be between {} and {}, got {}", column, min, max, n);
            self.push(column, ViolationKind::Range, message);
            return None;
        }
        Some(n)
    }

    /// Extended ISO-8601 with a literal `Z` designator, normalized to UTC.
    fn timestamp(&mut self, column: &'static str) -> Option<DateTime<Utc>> {
        let value = self.cell(column)?;
        match DateTime::parse_from_rfc3339(value) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(_) => {
                let message = format!("'{}' is not an ISO-8601 timestamp", value);
                self.push(column, ViolationKind::Type, message);
                None
            }
        }
    }

    fn status(&mut self, column: &'static str) -> Option<MentalHealthStatus> {
        let code = self.integer(column)?;
        match MentalHealthStatus::from_code(code) {
            Some(status) => Some(status),
            None => {
                let message = format!("{} must be between 0 and 2, got {}", column, code);
                self.push(column, ViolationKind::Range, message);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "timestamp,location_id,temperature_celsius,humidity_percent,air_quality_index,noise_level_db,lighting_lux,crowd_density,stress_level,sleep_hours,mood_score,mental_health_status";

    fn csv_with_rows(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_parse_single_valid_row() {
        let csv = csv_with_rows(&["2025-07-27T10:00:00Z,1,23.5,45.0,50,65.5,500.0,10,75,7.5,6.5,1"]);

        let dataset = parse_dataset(&csv).unwrap();
        assert_eq!(dataset.len(), 1);

        let record = &dataset.records[0];
        assert_eq!(record.location_id, 1);
        assert_eq!(record.stress_level, 75);
        assert_eq!(record.mental_health_status, MentalHealthStatus::Concern);
        assert_eq!(record.timestamp.to_rfc3339(), "2025-07-27T10:00:00+00:00");
    }

    #[test]
    fn test_parse_preserves_row_count_and_order() {
        let csv = csv_with_rows(&[
            "2025-07-27T10:00:00Z,1,23.5,45.0,50,65.5,500.0,10,75,7.5,6.5,1",
            "2025-07-27T11:00:00Z,2,24.0,50.0,55,60.0,450.0,12,30,8.0,7.0,0",
            "2025-07-27T12:00:00Z,3,22.0,40.0,45,70.0,520.0,8,90,4.0,1.5,2",
        ]);

        let dataset = parse_dataset(&csv).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.records[1].location_id, 2);
        assert_eq!(dataset.records[2].mental_health_status, MentalHealthStatus::Severe);
    }

    #[test]
    fn test_column_order_is_irrelevant() {
        let csv = "stress_level,timestamp,location_id,temperature_celsius,humidity_percent,air_quality_index,noise_level_db,lighting_lux,crowd_density,sleep_hours,mood_score,mental_health_status\n\
                   75,2025-07-27T10:00:00Z,1,23.5,45.0,50,65.5,500.0,10,7.5,6.5,1";

        let dataset = parse_dataset(csv).unwrap();
        assert_eq!(dataset.records[0].stress_level, 75);
        assert_eq!(dataset.records[0].location_id, 1);
    }

    #[test]
    fn test_missing_column_rejects_whole_dataset() {
        let csv = "timestamp,location_id\n2025-07-27T10:00:00Z,1";

        match parse_dataset(csv) {
            Err(DatasetError::MissingColumn(col)) => assert_eq!(col, "temperature_celsius"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_is_format_error() {
        assert!(matches!(parse_dataset(""), Err(DatasetError::Format(_))));
        assert!(matches!(parse_dataset("   \n  "), Err(DatasetError::Format(_))));
    }

    #[test]
    fn test_header_only_input_is_empty() {
        assert!(matches!(parse_dataset(HEADER), Err(DatasetError::Empty)));
    }

    #[test]
    fn test_out_of_range_stress_level() {
        let csv = csv_with_rows(&["2025-07-27T10:00:00Z,1,23.5,45.0,50,65.5,500.0,10,101,7.5,6.5,1"]);

        match parse_dataset(&csv) {
            Err(DatasetError::Invalid(violations)) => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].column, "stress_level");
                assert_eq!(violations[0].kind, ViolationKind::Range);
                assert_eq!(violations[0].row, 1);
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_boundary_values_pass() {
        let csv = csv_with_rows(&[
            "2025-07-27T10:00:00Z,1,23.5,0.0,50,65.5,500.0,10,0,0.0,6.5,0",
            "2025-07-27T11:00:00Z,1,23.5,100.0,50,65.5,500.0,10,100,24.0,6.5,2",
        ]);

        let dataset = parse_dataset(&csv).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].stress_level, 0);
        assert_eq!(dataset.records[1].humidity_percent, 100.0);
        assert_eq!(dataset.records[1].sleep_hours, 24.0);
    }

    #[test]
    fn test_non_numeric_text_is_type_violation() {
        let csv = csv_with_rows(&["2025-07-27T10:00:00Z,1,warm,45.0,50,65.5,500.0,10,75,7.5,6.5,1"]);

        match parse_dataset(&csv) {
            Err(DatasetError::Invalid(violations)) => {
                assert_eq!(violations[0].column, "temperature_celsius");
                assert_eq!(violations[0].kind, ViolationKind::Type);
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_timestamp_is_type_violation() {
        let csv = csv_with_rows(&["yesterday,1,23.5,45.0,50,65.5,500.0,10,75,7.5,6.5,1"]);

        match parse_dataset(&csv) {
            Err(DatasetError::Invalid(violations)) => {
                assert_eq!(violations[0].column, "timestamp");
                assert_eq!(violations[0].kind, ViolationKind::Type);
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_offset_timestamp_normalizes_to_utc() {
        let csv = csv_with_rows(&["2025-07-27T12:00:00+02:00,1,23.5,45.0,50,65.5,500.0,10,75,7.5,6.5,1"]);

        let dataset = parse_dataset(&csv).unwrap();
        assert_eq!(
            dataset.records[0].timestamp.to_rfc3339(),
            "2025-07-27T10:00:00+00:00"
        );
    }

    #[test]
    fn test_violations_collected_across_rows() {
        let csv = csv_with_rows(&[
            "2025-07-27T10:00:00Z,1,23.5,145.0,50,65.5,500.0,10,75,7.5,6.5,1",
            "2025-07-27T11:00:00Z,1,23.5,45.0,50,65.5,500.0,10,75,25.5,6.5,9",
        ]);

        match parse_dataset(&csv) {
            Err(DatasetError::Invalid(violations)) => {
                assert_eq!(violations.len(), 3);
                assert_eq!(violations[0].row, 1);
                assert_eq!(violations[0].column, "humidity_percent");
                assert_eq!(violations[1].row, 2);
                assert_eq!(violations[1].column, "sleep_hours");
                assert_eq!(violations[2].row, 2);
                assert_eq!(violations[2].column, "mental_health_status");
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_short_row_reports_missing_cells() {
        let csv = csv_with_rows(&["2025-07-27T10:00:00Z,1,23.5"]);

        match parse_dataset(&csv) {
            Err(DatasetError::Invalid(violations)) => {
                assert!(violations
                    .iter()
                    .all(|v| v.kind == ViolationKind::Missing));
                assert!(violations.iter().any(|v| v.column == "humidity_percent"));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_quoted_cells_are_unwrapped() {
        let csv = csv_with_rows(&["\"2025-07-27T10:00:00Z\",1,23.5,45.0,50,65.5,500.0,10,75,7.5,6.5,1"]);

        let dataset = parse_dataset(&csv).unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_status_code_decoding() {
        assert_eq!(MentalHealthStatus::from_code(0), Some(MentalHealthStatus::Normal));
        assert_eq!(MentalHealthStatus::from_code(2), Some(MentalHealthStatus::Severe));
        assert_eq!(MentalHealthStatus::from_code(3), None);
        assert!(MentalHealthStatus::Concern.is_concerning());
        assert!(!MentalHealthStatus::Normal.is_concerning());
    }

    /// Validation has no side effects on valid input: parsing the same
    /// text twice yields identical structures.
    #[test]
    fn test_parse_is_idempotent() {
        let csv = csv_with_rows(&["2025-07-27T10:00:00Z,1,23.5,45.0,50,65.5,500.0,10,75,7.5,6.5,1"]);

        let first = parse_dataset(&csv).unwrap();
        let second = parse_dataset(&csv).unwrap();
        assert_eq!(first, second);
    }
}
