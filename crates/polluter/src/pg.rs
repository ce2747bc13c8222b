//! `PostgreSQL` parameter encoding.
//!
//! `PostgreSQL` checks every parameter against the type it inferred for the
//! placeholder, and sqlx sends parameters in binary form, so a value must be
//! encoded exactly as that type. Each statement is prepared first and every
//! fixture value is converted to the type the server reported:
//!
//! | Inferred type | Accepted fixture values |
//! |---------------|-------------------------|
//! | any | `null`, sent untyped |
//! | `BOOL` | booleans, `"true"` / `"false"` |
//! | `INT2`, `INT4`, `INT8` | integral numbers, integer strings |
//! | `FLOAT4`, `FLOAT8` | numbers, numeric strings |
//! | `NUMERIC` | numbers, decimal strings |
//! | `TEXT`, `VARCHAR`, `CHAR`, `NAME` | strings; other scalars as their text, arrays and objects as JSON |
//! | `JSON`, `JSONB` | any value |
//! | `UUID` | UUID strings |
//! | `TIMESTAMP`, `TIMESTAMPTZ`, `DATE`, `TIME` | ISO 8601 strings |
//! | `BOOL[]`, `INT2[]`, `INT4[]`, `INT8[]`, `FLOAT4[]`, `FLOAT8[]`, `TEXT[]`, `UUID[]` | arrays without nulls |
//!
//! Any other scalar type (enums, domains, extension types) receives the
//! value's text untyped, which suits every type whose binary input is its
//! text form.

use polluter_types::{Value, exact_integer};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgTypeInfo};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{Encode, Postgres, Type};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// OID of the `numeric` type.
const NUMERIC_OID: Oid = Oid(1700);

/// Sign word of a negative `numeric`.
const NUMERIC_NEG: u16 = 0x4000;

/// Sign word of a non-negative `numeric`.
const NUMERIC_POS: u16 = 0x0000;

/// A query with `PostgreSQL` arguments.
pub(crate) type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// A fixture value converted to a concrete parameter type.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Param {
    /// Sent with OID 0; `None` is SQL `NULL`.
    Untyped(Option<String>),
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Numeric(Numeric),
    Text(String),
    Json(Value),
    Uuid(Uuid),
    Timestamp(PrimitiveDateTime),
    Timestamptz(OffsetDateTime),
    Date(Date),
    Time(Time),
    BoolArray(Vec<bool>),
    Int2Array(Vec<i16>),
    Int4Array(Vec<i32>),
    Int8Array(Vec<i64>),
    Float4Array(Vec<f32>),
    Float8Array(Vec<f64>),
    TextArray(Vec<String>),
    UuidArray(Vec<Uuid>),
}

/// Convert `value` for a placeholder of the type named `type_name`.
///
/// `type_name` is the display name sqlx gives the inferred type, such as
/// `INT4` or `TEXT[]`. Without one the value is sent untyped as text.
pub(crate) fn convert(value: &Value, type_name: Option<&str>) -> Result<Param, String> {
    if matches!(value, Value::Null) {
        return Ok(Param::Untyped(None));
    }
    let Some(type_name) = type_name else {
        return to_text(value).map(|text| Param::Untyped(Some(text)));
    };

    let param = match type_name {
        "BOOL" => Param::Bool(to_bool(value)?),
        "INT2" => Param::Int2(to_integer(value)?),
        "INT4" => Param::Int4(to_integer(value)?),
        "INT8" => Param::Int8(to_integer(value)?),
        "FLOAT4" => Param::Float4(narrow(to_float(value)?)),
        "FLOAT8" => Param::Float8(to_float(value)?),
        "NUMERIC" => Param::Numeric(to_numeric(value)?),
        "TEXT" | "VARCHAR" | "CHAR" | "NAME" => Param::Text(to_text(value)?),
        "JSON" | "JSONB" => Param::Json(value.clone()),
        "UUID" => Param::Uuid(to_uuid(value)?),
        "TIMESTAMP" => Param::Timestamp(with_str(value, parse_timestamp)?),
        "TIMESTAMPTZ" => Param::Timestamptz(with_str(value, parse_timestamptz)?),
        "DATE" => Param::Date(with_str(value, parse_date)?),
        "TIME" => Param::Time(with_str(value, parse_time)?),
        "BOOL[]" => Param::BoolArray(elements(value, to_bool)?),
        "INT2[]" => Param::Int2Array(elements(value, to_integer)?),
        "INT4[]" => Param::Int4Array(elements(value, to_integer)?),
        "INT8[]" => Param::Int8Array(elements(value, to_integer)?),
        "FLOAT4[]" => Param::Float4Array(elements(value, |v| to_float(v).map(narrow))?),
        "FLOAT8[]" => Param::Float8Array(elements(value, to_float)?),
        "TEXT[]" => Param::TextArray(elements(value, to_text)?),
        "UUID[]" => Param::UuidArray(elements(value, to_uuid)?),
        name if name.ends_with("[]") => {
            return Err(format!("arrays of type {name} are not supported"));
        }
        _ => Param::Untyped(Some(to_text(value)?)),
    };
    Ok(param)
}

/// Bind a converted parameter to the next placeholder of `query`.
pub(crate) fn bind(query: PgQuery<'_>, param: Param) -> PgQuery<'_> {
    match param {
        Param::Untyped(text) => query.bind(Untyped(text)),
        Param::Bool(v) => query.bind(v),
        Param::Int2(v) => query.bind(v),
        Param::Int4(v) => query.bind(v),
        Param::Int8(v) => query.bind(v),
        Param::Float4(v) => query.bind(v),
        Param::Float8(v) => query.bind(v),
        Param::Numeric(v) => query.bind(v),
        Param::Text(v) => query.bind(v),
        Param::Json(v) => query.bind(Json(v)),
        Param::Uuid(v) => query.bind(v),
        Param::Timestamp(v) => query.bind(v),
        Param::Timestamptz(v) => query.bind(v),
        Param::Date(v) => query.bind(v),
        Param::Time(v) => query.bind(v),
        Param::BoolArray(v) => query.bind(v),
        Param::Int2Array(v) => query.bind(v),
        Param::Int4Array(v) => query.bind(v),
        Param::Int8Array(v) => query.bind(v),
        Param::Float4Array(v) => query.bind(v),
        Param::Float8Array(v) => query.bind(v),
        Param::TextArray(v) => query.bind(v),
        Param::UuidArray(v) => query.bind(v),
    }
}

fn unsupported(value: &Value) -> String {
    format!("no conversion from {}", value.kind())
}

fn to_bool(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => s.trim().parse().map_err(|e| format!("{e}: {s:?}")),
        other => Err(unsupported(other)),
    }
}

fn to_integer<T: TryFrom<i64>>(value: &Value) -> Result<T, String> {
    let integer = match value {
        Value::Number(n) => exact_integer(*n).ok_or_else(|| format!("{n} is not an integer"))?,
        Value::String(s) => s.trim().parse::<i64>().map_err(|e| format!("{e}: {s:?}"))?,
        other => return Err(unsupported(other)),
    };
    T::try_from(integer)
        .ok()
        .ok_or_else(|| format!("{integer} is out of range"))
}

fn to_float(value: &Value) -> Result<f64, String> {
    let number = match value {
        Value::Number(n) => *n,
        Value::String(s) => s.trim().parse::<f64>().map_err(|e| format!("{e}: {s:?}"))?,
        other => return Err(unsupported(other)),
    };
    if number.is_finite() {
        Ok(number)
    } else {
        Err(format!("{number} is not finite"))
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn narrow(number: f64) -> f32 {
    number as f32
}

fn to_numeric(value: &Value) -> Result<Numeric, String> {
    match value {
        Value::Number(n) if n.is_finite() => Numeric::parse(&number_text(*n)),
        Value::String(s) => Numeric::parse(s.trim()),
        other => Err(unsupported(other)),
    }
}

fn to_text(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(number_text(*n)),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).map_err(|e| e.to_string())
        }
        Value::Null => Err(unsupported(value)),
    }
}

fn to_uuid(value: &Value) -> Result<Uuid, String> {
    with_str(value, |s| Uuid::parse_str(s).map_err(|e| e.to_string()))
}

/// Integral numbers without a fractional part, others in full decimal form.
fn number_text(number: f64) -> String {
    exact_integer(number).map_or_else(|| number.to_string(), |integer| integer.to_string())
}

fn with_str<T>(value: &Value, parse: impl Fn(&str) -> Result<T, String>) -> Result<T, String> {
    match value {
        Value::String(s) => parse(s.trim()),
        other => Err(unsupported(other)),
    }
}

fn elements<T>(
    value: &Value,
    convert: impl Fn(&Value) -> Result<T, String>,
) -> Result<Vec<T>, String> {
    let values = value.as_array().ok_or_else(|| unsupported(value))?;
    values
        .iter()
        .enumerate()
        .map(|(i, element)| convert(element).map_err(|e| format!("element {i}: {e}")))
        .collect()
}

// ---------------------------------------------------------------------------
// Dates and times
// ---------------------------------------------------------------------------

/// `2024-01-02 03:04:05[.fff]`, the same with a `T`, or a bare date at midnight.
fn parse_timestamp(s: &str) -> Result<PrimitiveDateTime, String> {
    naive_timestamp(s).map_err(|e| format!("invalid timestamp {s:?}: {e}"))
}

fn naive_timestamp(s: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(
        s,
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"),
    )
    .or_else(|_| {
        PrimitiveDateTime::parse(
            s,
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"),
        )
    })
    .or_else(|_| Date::parse(s, format_description!("[year]-[month]-[day]")).map(Date::midnight))
}

/// RFC 3339, the space-separated form with an offset, or a timestamp
/// without offset taken as UTC.
fn parse_timestamptz(s: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(s, &Rfc3339)
        .or_else(|_| {
            OffsetDateTime::parse(
                s,
                format_description!(
                    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory][optional [:[offset_minute]]]"
                ),
            )
        })
        .or_else(|_| naive_timestamp(s).map(PrimitiveDateTime::assume_utc))
        .map_err(|e| format!("invalid timestamp with time zone {s:?}: {e}"))
}

fn parse_date(s: &str) -> Result<Date, String> {
    Date::parse(s, format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("invalid date {s:?}: {e}"))
}

fn parse_time(s: &str) -> Result<Time, String> {
    Time::parse(
        s,
        format_description!("[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"),
    )
    .map_err(|e| format!("invalid time {s:?}: {e}"))
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A parameter the server types from the statement; binary input of such
/// types is their text form.
#[derive(Debug)]
struct Untyped(Option<String>);

impl Type<Postgres> for Untyped {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

impl Encode<'_, Postgres> for Untyped {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        match &self.0 {
            Some(text) => {
                buf.extend(text.as_bytes());
                Ok(IsNull::No)
            }
            None => Ok(IsNull::Yes),
        }
    }
}

/// An exact decimal in the binary layout of `numeric`: base-10000 digits,
/// the weight of the first digit, and the display scale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Numeric {
    negative: bool,
    weight: i16,
    scale: u16,
    digits: Vec<i16>,
}

impl Numeric {
    /// Parse a plain decimal such as `-12.50`. Exponents are rejected.
    pub(crate) fn parse(text: &str) -> Result<Self, String> {
        let invalid = || format!("invalid decimal {text:?}");
        let (negative, unsigned) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (integer, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if (integer.is_empty() && fraction.is_empty())
            || !integer.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let scale = u16::try_from(fraction.len()).ok().ok_or_else(invalid)?;
        let mut digits = integer
            .trim_start_matches('0')
            .as_bytes()
            .rchunks(4)
            .rev()
            .map(|chunk| digit_group(chunk, false))
            .collect::<Result<Vec<_>, _>>()?;
        let mut weight = i16::try_from(digits.len())
            .ok()
            .ok_or_else(invalid)?
            .saturating_sub(1);
        for chunk in fraction.as_bytes().chunks(4) {
            digits.push(digit_group(chunk, true)?);
        }

        let leading = digits.iter().take_while(|digit| **digit == 0).count();
        let mut digits = digits.split_off(leading);
        weight = weight.saturating_sub(i16::try_from(leading).ok().ok_or_else(invalid)?);
        while digits.last() == Some(&0) {
            digits.pop();
        }

        if digits.is_empty() {
            return Ok(Self {
                negative: false,
                weight: 0,
                scale,
                digits,
            });
        }
        Ok(Self {
            negative,
            weight,
            scale,
            digits,
        })
    }
}

/// One base-10000 digit from up to four decimal digits; fractional groups
/// are padded on the right.
fn digit_group(chunk: &[u8], fractional: bool) -> Result<i16, String> {
    let mut text = String::from_utf8_lossy(chunk).into_owned();
    if fractional {
        while text.len() < 4 {
            text.push('0');
        }
    }
    text.parse().map_err(|e| format!("invalid digits {text:?}: {e}"))
}

impl Type<Postgres> for Numeric {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(NUMERIC_OID)
    }
}

impl Encode<'_, Postgres> for Numeric {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        let sign = if self.negative { NUMERIC_NEG } else { NUMERIC_POS };
        buf.extend(i16::try_from(self.digits.len())?.to_be_bytes());
        buf.extend(self.weight.to_be_bytes());
        buf.extend(sign.to_be_bytes());
        buf.extend(self.scale.to_be_bytes());
        for digit in &self.digits {
            buf.extend(digit.to_be_bytes());
        }
        Ok(IsNull::No)
    }
}
