use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DataType / Field – typed keys into a report
// ---------------------------------------------------------------------------

/// Declared type of a report field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataType {
    Numeric,
    Boolean,
    String,
    Unknown,
}

impl DataType {
    /// Single-letter code used by the simple text format.
    pub fn code(&self) -> char {
        match self {
            DataType::Numeric => 'N',
            DataType::Boolean => 'B',
            DataType::String => 'S',
            DataType::Unknown => 'U',
        }
    }

    /// Inverse of [`DataType::code`]; anything unrecognised is `Unknown`.
    pub fn from_code(code: &str) -> DataType {
        match code.trim() {
            "N" => DataType::Numeric,
            "B" => DataType::Boolean,
            "S" => DataType::String,
            _ => DataType::Unknown,
        }
    }
}

/// A named, typed key into a [`Report`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Numeric)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Boolean)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, DataType::String)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.data_type.code())
    }
}

// ---------------------------------------------------------------------------
// ReportValue – a single typed value
// ---------------------------------------------------------------------------

/// A report value. `Unknown` keeps raw text whose type could not be determined.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportValue {
    Numeric(f64),
    Boolean(bool),
    String(String),
    Unknown(String),
}

// -- Manual Eq/Ord so values can live in BTreeSet (viewer selections) --

impl Eq for ReportValue {}

impl PartialOrd for ReportValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReportValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use ReportValue::*;
        let da = self.data_type();
        let db = other.data_type();
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Numeric(a), Numeric(b)) => a.total_cmp(b),
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (String(a), String(b)) | (Unknown(a), Unknown(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for ReportValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ReportValue::String(s) | ReportValue::Unknown(s) => s.hash(state),
            ReportValue::Numeric(f) => f.to_bits().hash(state),
            ReportValue::Boolean(b) => b.hash(state),
        }
    }
}

impl fmt::Display for ReportValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportValue::Numeric(v) => write!(f, "{v}"),
            ReportValue::Boolean(b) => write!(f, "{b}"),
            ReportValue::String(s) | ReportValue::Unknown(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for ReportValue {
    fn from(v: f64) -> Self {
        ReportValue::Numeric(v)
    }
}

impl From<bool> for ReportValue {
    fn from(v: bool) -> Self {
        ReportValue::Boolean(v)
    }
}

impl From<&str> for ReportValue {
    fn from(v: &str) -> Self {
        ReportValue::String(v.to_string())
    }
}

impl From<String> for ReportValue {
    fn from(v: String) -> Self {
        ReportValue::String(v)
    }
}

impl ReportValue {
    pub fn data_type(&self) -> DataType {
        match self {
            ReportValue::Numeric(_) => DataType::Numeric,
            ReportValue::Boolean(_) => DataType::Boolean,
            ReportValue::String(_) => DataType::String,
            ReportValue::Unknown(_) => DataType::Unknown,
        }
    }

    /// Try to interpret the value as an `f64` for numeric colour mapping.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ReportValue::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    /// Guess the type of free text: numeric, then boolean, then string.
    pub fn guess(s: &str) -> ReportValue {
        let s = s.trim();
        if let Ok(f) = s.parse::<f64>() {
            return ReportValue::Numeric(f);
        }
        if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
            return ReportValue::Boolean(s.eq_ignore_ascii_case("true"));
        }
        ReportValue::String(s.to_string())
    }

    /// Parse text as the declared type. Text that does not fit becomes `Unknown`.
    pub fn parse_as(s: &str, data_type: DataType) -> ReportValue {
        match data_type {
            DataType::Numeric => s
                .trim()
                .parse::<f64>()
                .map(ReportValue::Numeric)
                .unwrap_or_else(|_| ReportValue::Unknown(s.to_string())),
            DataType::Boolean => match s.trim().to_ascii_lowercase().as_str() {
                "true" => ReportValue::Boolean(true),
                "false" => ReportValue::Boolean(false),
                _ => ReportValue::Unknown(s.to_string()),
            },
            DataType::String => ReportValue::String(s.to_string()),
            DataType::Unknown => ReportValue::Unknown(s.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Report – typed key/value side table of a data container
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("field '{field}' is declared {expected:?} but value is {actual:?}")]
    TypeMismatch {
        field: String,
        expected: DataType,
        actual: DataType,
    },
}

/// Ordered field name → value map attached to spectra and 3-way data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    values: BTreeMap<String, ReportValue>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under a typed field. A non-`Unknown` field type must
    /// agree with the value's type.
    pub fn set_value(&mut self, field: &Field, value: ReportValue) -> Result<(), ReportError> {
        let actual = value.data_type();
        if field.data_type != DataType::Unknown && field.data_type != actual {
            return Err(ReportError::TypeMismatch {
                field: field.name.clone(),
                expected: field.data_type,
                actual,
            });
        }
        self.values.insert(field.name.clone(), value);
        Ok(())
    }

    /// Store a value, replacing whatever type was there before.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ReportValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn set_numeric(&mut self, name: impl Into<String>, value: f64) {
        self.insert(name, ReportValue::Numeric(value));
    }

    pub fn set_boolean(&mut self, name: impl Into<String>, value: bool) {
        self.insert(name, ReportValue::Boolean(value));
    }

    pub fn set_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.insert(name, ReportValue::String(value.into()));
    }

    pub fn value(&self, name: &str) -> Option<&ReportValue> {
        self.values.get(name)
    }

    pub fn numeric(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(ReportValue::as_f64)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ReportValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ReportValue::String(s)) | Some(ReportValue::Unknown(s)) => Some(s),
            _ => None,
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ReportValue> {
        self.values.remove(name)
    }

    /// Typed fields, ordered by name.
    pub fn fields(&self) -> Vec<Field> {
        self.values
            .iter()
            .map(|(name, v)| Field::new(name.clone(), v.data_type()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ReportValue)> {
        self.values.iter()
    }

    /// Copy all values of `other` into this report; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Report) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, ReportValue)> for Report {
    fn from_iter<T: IntoIterator<Item = (String, ReportValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
