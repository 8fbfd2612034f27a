// src/mapping.rs

//! Field mapping from spreadsheet columns to profile document fields.
//!
//! Each external column is looked up in a fixed rule table and coerced into
//! its internal field type. Columns with no rule are dropped silently.
//! Coercion is total: every failure mode degrades to a sentinel value
//! (`false`, `""`, or null) so that mapping never fails a row on its own.
//! The only way a row is rejected here is a missing application number.

use std::sync::OnceLock;

use chrono::NaiveDate;
use mongodb::bson::{self, Bson, Document};
use regex::Regex;
use serde_json::Value;

use crate::models::{MappedRow, Row, ValidRow};

/// Internal profile document field names.
pub mod fields {
    pub const APPLICATION_NUMBER: &str = "applicationNumber";
    pub const ROLL_NUMBER: &str = "studentRollNumber";
    pub const SEMESTER: &str = "studentSemester";
    pub const SEMESTER_TYPE: &str = "studentSemesterType";
    pub const CLASS: &str = "studentClass";
    pub const COLLEGE_EMAIL: &str = "studentCollegeEmail";
    pub const DATE_OF_ADMISSION: &str = "studentDateOfAdmission";
    pub const IS_ACTIVE: &str = "isActive";
}

/// External column carrying the primary key.
pub const APPLICATION_NUMBER_COLUMN: &str = "Application Number";

/// How a raw cell value is coerced into its internal field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// `"active"`/`"inactive"` (trimmed, case-insensitive) to bool;
    /// anything else is `false`
    BooleanStatus,

    /// Upper-cased string; non-strings are stringified first, null becomes ""
    UppercaseText,

    /// `DD-MM-YYYY` or `DD/MM/YYYY` to epoch milliseconds at UTC midnight;
    /// any parse failure becomes null
    DateToEpochMillis,

    /// Numeric parse (booleans count as 1/0); failure becomes null
    Integer,

    /// Value copied unchanged
    Passthrough,
}

/// One entry of the column-to-field rule table.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// External spreadsheet column name
    pub column: &'static str,

    /// Internal document field name
    pub field: &'static str,

    /// Coercion applied to the cell value
    pub coercion: Coercion,
}

/// The fixed mapping between spreadsheet columns and document fields.
pub const FIELD_RULES: [FieldRule; 8] = [
    FieldRule {
        column: APPLICATION_NUMBER_COLUMN,
        field: fields::APPLICATION_NUMBER,
        coercion: Coercion::Passthrough,
    },
    FieldRule {
        column: "RollNo",
        field: fields::ROLL_NUMBER,
        coercion: Coercion::UppercaseText,
    },
    FieldRule {
        column: "Semester",
        field: fields::SEMESTER,
        coercion: Coercion::Integer,
    },
    FieldRule {
        column: "Semester Type",
        field: fields::SEMESTER_TYPE,
        coercion: Coercion::UppercaseText,
    },
    FieldRule {
        column: "Class",
        field: fields::CLASS,
        coercion: Coercion::UppercaseText,
    },
    FieldRule {
        column: "College Email Id",
        field: fields::COLLEGE_EMAIL,
        coercion: Coercion::UppercaseText,
    },
    FieldRule {
        column: "Date Of Admission",
        field: fields::DATE_OF_ADMISSION,
        coercion: Coercion::DateToEpochMillis,
    },
    FieldRule {
        column: "Status",
        field: fields::IS_ACTIVE,
        coercion: Coercion::BooleanStatus,
    },
];

fn rule_for(column: &str) -> Option<&'static FieldRule> {
    FIELD_RULES.iter().find(|rule| rule.column == column)
}

/// Map one raw row into a profile document.
///
/// Unmapped columns are ignored. This function never fails: every coercion
/// degrades to its sentinel value on bad input.
pub fn map_row(row: &Row) -> Document {
    let mut mapped = Document::new();
    for (column, value) in row {
        let Some(rule) = rule_for(column) else {
            continue;
        };
        mapped.insert(rule.field, coerce(rule.coercion, value));
    }
    mapped
}

/// Map a raw row and check it carries a usable application number.
pub fn validate_row(row: &Row) -> MappedRow {
    let mapped = map_row(row);
    match mapped.get(fields::APPLICATION_NUMBER).and_then(key_string) {
        Some(key) => MappedRow::Valid(ValidRow {
            application_number: key,
            fields: mapped,
        }),
        None => MappedRow::Invalid {
            source_key: source_key(row),
        },
    }
}

/// Render a mapped key cell as the string used in write filters and the
/// existence check. Spreadsheet cells arrive as strings or numbers; whole
/// numbers render canonically ("12345"), everything else is unusable.
fn key_string(value: &Bson) -> Option<String> {
    match value {
        Bson::String(key) if !key.is_empty() => Some(key.clone()),
        Bson::Int32(key) => Some(key.to_string()),
        Bson::Int64(key) => Some(key.to_string()),
        Bson::Double(key) if key.is_finite() && key.fract() == 0.0 => {
            Some((*key as i64).to_string())
        }
        _ => None,
    }
}

/// The raw "Application Number" cell rendered as a string, for failure
/// reporting. Absent or null cells render as the empty string; numbers
/// render the same way `key_string` renders them, so a row never appears
/// under two spellings in the failure report.
pub fn source_key(row: &Row) -> String {
    match row.get(APPLICATION_NUMBER_COLUMN) {
        Some(Value::String(key)) => key.clone(),
        Some(Value::Number(number)) => {
            if let Some(integer) = number.as_i64() {
                integer.to_string()
            } else if let Some(float) = number
                .as_f64()
                .filter(|float| float.is_finite() && float.fract() == 0.0)
            {
                (float as i64).to_string()
            } else {
                number.to_string()
            }
        }
        Some(Value::Null) | None => String::new(),
        Some(value) => value.to_string(),
    }
}

fn coerce(kind: Coercion, value: &Value) -> Bson {
    match kind {
        Coercion::BooleanStatus => coerce_status(value),
        Coercion::UppercaseText => coerce_text(value),
        Coercion::DateToEpochMillis => coerce_date_millis(value),
        Coercion::Integer => coerce_integer(value),
        Coercion::Passthrough => bson::to_bson(value).unwrap_or(Bson::Null),
    }
}

fn coerce_status(value: &Value) -> Bson {
    let active = match value {
        Value::String(status) => status.trim().eq_ignore_ascii_case("active"),
        _ => false,
    };
    Bson::Boolean(active)
}

fn coerce_text(value: &Value) -> Bson {
    let text = match value {
        Value::String(text) => text.to_uppercase(),
        Value::Null => String::new(),
        other => other.to_string().to_uppercase(),
    };
    Bson::String(text)
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Two-digit day, two-digit month, four-digit year, "-" or "/" separator.
    // Anchored at the start only; trailing text is tolerated.
    PATTERN.get_or_init(|| Regex::new(r"^(\d{2})[-/](\d{2})[-/](\d{4})").expect("valid pattern"))
}

fn coerce_date_millis(value: &Value) -> Bson {
    let Value::String(text) = value else {
        return Bson::Null;
    };
    let Some(captures) = date_pattern().captures(text.trim()) else {
        return Bson::Null;
    };

    let day: u32 = captures[1].parse().unwrap_or(0);
    let month: u32 = captures[2].parse().unwrap_or(0);
    let year: i32 = captures[3].parse().unwrap_or(0);

    match NaiveDate::from_ymd_opt(year, month, day).and_then(|date| date.and_hms_opt(0, 0, 0)) {
        Some(midnight) => Bson::Int64(midnight.and_utc().timestamp_millis()),
        None => Bson::Null,
    }
}

fn coerce_integer(value: &Value) -> Bson {
    match value {
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Bson::Int64(integer)
            } else if let Some(float) = number.as_f64() {
                Bson::Int64(float.trunc() as i64)
            } else {
                Bson::Null
            }
        }
        Value::String(text) => match text.trim().parse::<i64>() {
            Ok(integer) => Bson::Int64(integer),
            Err(_) => Bson::Null,
        },
        Value::Bool(flag) => Bson::Int64(i64::from(*flag)),
        _ => Bson::Null,
    }
}
