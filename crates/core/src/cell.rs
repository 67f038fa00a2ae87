use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Raw value of a cell as handed over by a grid loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDateTime),
}

/// Coarse value category used by every detection heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Number,
    Text,
    Date,
    Empty,
}

impl ValueKind {
    /// Lowercase name, as serialized in detection results.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Number => "number",
            ValueKind::Text => "text",
            ValueKind::Date => "date",
            ValueKind::Empty => "empty",
        }
    }

    /// Numbers and dates both count as data for the header density shift.
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Number | ValueKind::Date)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CellValue {
    /// Check if the value is null
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Try to get the value as a float
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            CellValue::Float(f) => Some(*f),
            CellValue::Int(i) => Some(*i as f64),
            CellValue::String(s) => parse_number(s),
            CellValue::Null | CellValue::Bool(_) | CellValue::Date(_) => None,
        }
    }

    /// Parse a string into a `CellValue` with type inference
    /// Tries: null -> bool -> int -> float -> date -> string
    #[must_use]
    pub fn parse(s: &str) -> CellValue {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Null;
        }

        match trimmed.to_lowercase().as_str() {
            "true" => return CellValue::Bool(true),
            "false" => return CellValue::Bool(false),
            _ => {}
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }

        if is_plain_number(trimmed) {
            if let Ok(f) = trimmed.parse::<f64>() {
                return CellValue::Float(f);
            }
        }

        if let Some(dt) = parse_calendar_date(trimmed) {
            return CellValue::Date(dt);
        }

        CellValue::String(s.to_string())
    }

    /// Infer the coarse kind of this value.
    ///
    /// Strings are inspected so that loaders which only deliver text (CSV,
    /// JSON) classify `"12.5%"` as a number and `"2024-03"` as a date.
    pub fn kind(&self) -> ValueKind {
        match self {
            CellValue::Null => ValueKind::Empty,
            CellValue::Int(_) | CellValue::Float(_) => ValueKind::Number,
            CellValue::Date(_) => ValueKind::Date,
            CellValue::Bool(_) => ValueKind::Text,
            CellValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    ValueKind::Empty
                } else if parse_number(trimmed).is_some() {
                    ValueKind::Number
                } else if date_like_regex().is_match(trimmed) {
                    ValueKind::Date
                } else {
                    ValueKind::Text
                }
            }
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(fl) => write!(f, "{fl}"),
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Date(dt) if dt.time() == NaiveTime::MIN => {
                write!(f, "{}", dt.format("%Y-%m-%d"))
            }
            CellValue::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d.and_time(NaiveTime::MIN))
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::Date(dt)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

/// A grid cell: the raw value plus its kind, inferred once on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    value: CellValue,
    kind: ValueKind,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        let value = value.into();
        let kind = value.kind();
        Self { value, kind }
    }

    pub fn empty() -> Self {
        Self {
            value: CellValue::Null,
            kind: ValueKind::Empty,
        }
    }

    pub fn value(&self) -> &CellValue {
        &self.value
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.kind == ValueKind::Empty
    }

    /// Display text of the cell with surrounding whitespace removed.
    pub fn text(&self) -> String {
        self.value.to_string().trim().to_string()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::empty()
    }
}

/// Parse a plain decimal number, optionally suffixed with `%`.
///
/// Percentages are returned as written (`"12.5%"` gives `12.5`). Words that
/// `f64::from_str` accepts, such as `inf` or `NaN`, are rejected.
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    let digits = trimmed.strip_suffix('%').map_or(trimmed, str::trim_end);
    if !is_plain_number(digits) {
        return None;
    }
    digits.parse::<f64>().ok()
}

fn is_plain_number(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

/// Parse `YYYY-MM-DD` / `YYYY/MM/DD` dates with an optional time part.
fn parse_calendar_date(s: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn date_like_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\d{4}[-/.](0?[1-9]|1[0-2])([-/.](0?[1-9]|[12]\d|3[01]))?([ T]\d{1,2}:\d{2}(:\d{2})?)?$",
        )
        .expect("valid date regex")
    })
}
