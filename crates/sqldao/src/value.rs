//! Dynamically typed SQL values.
//!
//! [`Value`] is what the builders bind as parameters and what executors hand back
//! inside a [`ResultSet`](crate::executor::ResultSet). It is deliberately small:
//! the scalar types that show up in filter templates and generic row maps.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::error::Error;
use std::fmt;
use std::net::IpAddr;
use thiserror::Error;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type};

/// A single bound parameter or column value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Json(serde_json::Value),
    Array(Vec<Value>),
}

impl Value {
    /// Short type name, used in conversion errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Json(_) => "json",
            Value::Array(_) => "array",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text payload, if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

/// `Null` renders as `null`, bytes as lowercase hex and arrays as `{a,b}`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Bytes(v) => {
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Value::Uuid(v) => write!(f, "{v}"),
            Value::Timestamp(v) => write!(f, "{v}"),
            Value::TimestampTz(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{v}"),
            Value::Time(v) => write!(f, "{v}"),
            Value::Json(v) => write!(f, "{v}"),
            Value::Array(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::TimestampTz(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    ) || ty.name() == "citext"
}

/// Types a [`Value`] can be bound as. Domains and arrays are checked against their
/// base and member types.
fn bindable(ty: &Type) -> bool {
    match ty.kind() {
        Kind::Domain(inner) => bindable(inner),
        Kind::Array(member) => bindable(member),
        Kind::Enum(_) => true,
        _ => {
            is_text(ty)
                || matches!(
                    *ty,
                    Type::BOOL
                        | Type::INT2
                        | Type::INT4
                        | Type::INT8
                        | Type::OID
                        | Type::FLOAT4
                        | Type::FLOAT8
                        | Type::NUMERIC
                        | Type::BYTEA
                        | Type::UUID
                        | Type::TIMESTAMP
                        | Type::TIMESTAMPTZ
                        | Type::DATE
                        | Type::TIME
                        | Type::INET
                        | Type::JSON
                        | Type::JSONB
                )
        }
    }
}

/// A [`Value`] cannot be written in the wire format of the parameter type the
/// server inferred.
#[derive(Debug, Clone, Error)]
#[error("cannot bind a {kind} value as Postgres type {ty}")]
pub struct BindError {
    pub kind: &'static str,
    pub ty: Type,
}

/// Accepted text forms: `2024-01-01 12:30:00[.fff]`, the same with a `T` separator, or a
/// bare date meaning midnight.
fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| s.parse::<NaiveDateTime>())
        .or_else(|_| s.parse::<NaiveDate>().map(|d| d.and_time(NaiveTime::MIN)))
}

/// RFC 3339, `2024-01-01 12:30:00+02` style offsets, or an offset-less timestamp taken as UTC.
fn parse_timestamptz(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z"))
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| parse_timestamp(s).map(|naive| naive.and_utc()))
}

type BoxError = Box<dyn Error + Sync + Send>;

impl Value {
    fn wrong_type(&self, ty: &Type) -> BoxError {
        Box::new(BindError {
            kind: self.kind(),
            ty: ty.clone(),
        })
    }

    fn text_to_sql(v: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        let s = v.trim();
        match *ty {
            Type::INT2 => s.parse::<i16>()?.to_sql(ty, out),
            Type::INT4 => s.parse::<i32>()?.to_sql(ty, out),
            Type::INT8 => s.parse::<i64>()?.to_sql(ty, out),
            Type::OID => s.parse::<u32>()?.to_sql(ty, out),
            Type::FLOAT4 => s.parse::<f32>()?.to_sql(ty, out),
            Type::FLOAT8 => s.parse::<f64>()?.to_sql(ty, out),
            Type::NUMERIC => s.parse::<Decimal>()?.to_sql(ty, out),
            Type::BOOL => s.parse::<bool>()?.to_sql(ty, out),
            Type::UUID => s.parse::<uuid::Uuid>()?.to_sql(ty, out),
            Type::DATE => s.parse::<NaiveDate>()?.to_sql(ty, out),
            Type::TIME => s.parse::<NaiveTime>()?.to_sql(ty, out),
            Type::TIMESTAMP => parse_timestamp(s)?.to_sql(ty, out),
            Type::TIMESTAMPTZ => parse_timestamptz(s)?.to_sql(ty, out),
            Type::INET => s.parse::<IpAddr>()?.to_sql(ty, out),
            Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(v)?.to_sql(ty, out),
            // Text-like types and enum labels share the plain UTF-8 wire form.
            _ => v.to_sql(ty, out),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match ty.kind() {
            Kind::Domain(inner) => return self.to_sql(inner, out),
            Kind::Array(_) => {
                return match self {
                    Value::Null => Ok(IsNull::Yes),
                    Value::Array(items) => items.as_slice().to_sql(ty, out),
                    other => Err(other.wrong_type(ty)),
                };
            }
            Kind::Enum(_) => {
                return match self {
                    Value::Null => Ok(IsNull::Yes),
                    Value::Text(v) => Value::text_to_sql(v, ty, out),
                    other => Err(other.wrong_type(ty)),
                };
            }
            _ => {}
        }

        let text = is_text(ty);
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Text(v) => Value::text_to_sql(v, ty, out),
            // Everything else binds as its own type, a close numeric/temporal relative,
            // or its display form for text parameters.
            _ if text => self.to_string().to_sql(ty, out),
            Value::Bool(v) => match *ty {
                Type::BOOL => v.to_sql(ty, out),
                _ => Err(self.wrong_type(ty)),
            },
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::INT8 => v.to_sql(ty, out),
                Type::OID => u32::try_from(*v)?.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql(ty, out),
                Type::NUMERIC => Decimal::from(*v).to_sql(ty, out),
                _ => Err(self.wrong_type(ty)),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => v.to_sql(ty, out),
                Type::NUMERIC => Decimal::try_from(*v)?.to_sql(ty, out),
                _ => Err(self.wrong_type(ty)),
            },
            Value::Decimal(v) => match *ty {
                Type::NUMERIC => v.to_sql(ty, out),
                Type::FLOAT8 => v
                    .to_f64()
                    .ok_or_else(|| self.wrong_type(ty))?
                    .to_sql(ty, out),
                _ => Err(self.wrong_type(ty)),
            },
            Value::Bytes(v) => match *ty {
                Type::BYTEA => v.to_sql(ty, out),
                _ => Err(self.wrong_type(ty)),
            },
            Value::Uuid(v) => match *ty {
                Type::UUID => v.to_sql(ty, out),
                _ => Err(self.wrong_type(ty)),
            },
            Value::Timestamp(v) => match *ty {
                Type::TIMESTAMP => v.to_sql(ty, out),
                Type::TIMESTAMPTZ => v.and_utc().to_sql(ty, out),
                Type::DATE => v.date().to_sql(ty, out),
                _ => Err(self.wrong_type(ty)),
            },
            Value::TimestampTz(v) => match *ty {
                Type::TIMESTAMPTZ => v.to_sql(ty, out),
                Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                _ => Err(self.wrong_type(ty)),
            },
            Value::Date(v) => match *ty {
                Type::DATE => v.to_sql(ty, out),
                Type::TIMESTAMP => v.and_time(NaiveTime::MIN).to_sql(ty, out),
                Type::TIMESTAMPTZ => v.and_time(NaiveTime::MIN).and_utc().to_sql(ty, out),
                _ => Err(self.wrong_type(ty)),
            },
            Value::Time(v) => match *ty {
                Type::TIME => v.to_sql(ty, out),
                _ => Err(self.wrong_type(ty)),
            },
            Value::Json(v) => match *ty {
                Type::JSON | Type::JSONB => v.to_sql(ty, out),
                _ => Err(self.wrong_type(ty)),
            },
            Value::Array(_) => Err(self.wrong_type(ty)),
        }
    }

    fn accepts(ty: &Type) -> bool {
        bindable(ty)
    }

    tokio_postgres::types::to_sql_checked!();
}

/// Types a column can be decoded from.
fn decodable(ty: &Type) -> bool {
    match ty.kind() {
        Kind::Domain(inner) => decodable(inner),
        Kind::Array(member) => decodable(member),
        Kind::Enum(_) => true,
        _ => {
            bindable(ty) || matches!(*ty, Type::INTERVAL | Type::CIDR | Type::XML)
        }
    }
}

/// Binary `interval`: microseconds (i64), days (i32), months (i32), rendered the way
/// the server's default `postgres` output style does.
fn interval_text(raw: &[u8]) -> Result<String, BoxError> {
    let raw: &[u8; 16] = raw.try_into().map_err(|_| "invalid interval length")?;
    let micros = i64::from_be_bytes(raw[0..8].try_into()?);
    let days = i32::from_be_bytes(raw[8..12].try_into()?);
    let months = i32::from_be_bytes(raw[12..16].try_into()?);

    let plural = |n: i64| if n == 1 { "" } else { "s" };
    let mut parts = Vec::new();
    let (years, months) = (i64::from(months / 12), i64::from(months % 12));
    if years != 0 {
        parts.push(format!("{years} year{}", plural(years)));
    }
    if months != 0 {
        parts.push(format!("{months} mon{}", plural(months)));
    }
    if days != 0 {
        parts.push(format!("{days} day{}", plural(i64::from(days))));
    }
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let micros = micros.unsigned_abs();
        let secs = micros / 1_000_000;
        let frac = micros % 1_000_000;
        let mut time = format!("{sign}{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60);
        if frac != 0 {
            let digits = format!("{frac:06}");
            time.push('.');
            time.push_str(digits.trim_end_matches('0'));
        }
        parts.push(time);
    }
    Ok(parts.join(" "))
}

/// Binary `inet` / `cidr`: family, prefix bits, cidr flag, address length, address.
fn inet_text(ty: &Type, raw: &[u8]) -> Result<String, BoxError> {
    let [family, bits, _, len, addr @ ..] = raw else {
        return Err("invalid inet value".into());
    };
    let (addr, max_bits) = match (*family, *len, addr.len()) {
        (2, 4, 4) => (IpAddr::from(<[u8; 4]>::try_from(addr)?), 32),
        (3, 16, 16) => (IpAddr::from(<[u8; 16]>::try_from(addr)?), 128),
        _ => return Err("invalid inet address".into()),
    };
    if *ty == Type::CIDR || *bits != max_bits {
        Ok(format!("{addr}/{bits}"))
    } else {
        Ok(addr.to_string())
    }
}

/// Column decoding by type. Domains decode as their base type, arrays element-wise.
/// Enums, `citext` and `xml` are sent as UTF-8 text.
impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        match ty.kind() {
            Kind::Domain(inner) => return Value::from_sql(inner, raw),
            Kind::Array(_) => return Vec::<Value>::from_sql(ty, raw).map(Value::Array),
            _ => {}
        }

        let value = match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::INT2 => Value::from(i16::from_sql(ty, raw)?),
            Type::INT4 => Value::from(i32::from_sql(ty, raw)?),
            Type::INT8 => Value::Int(i64::from_sql(ty, raw)?),
            Type::OID => Value::from(u32::from_sql(ty, raw)?),
            Type::FLOAT4 => Value::from(f32::from_sql(ty, raw)?),
            Type::FLOAT8 => Value::Float(f64::from_sql(ty, raw)?),
            Type::NUMERIC => Value::Decimal(Decimal::from_sql(ty, raw)?),
            Type::BYTEA => Value::Bytes(Vec::<u8>::from_sql(ty, raw)?),
            Type::UUID => Value::Uuid(uuid::Uuid::from_sql(ty, raw)?),
            Type::TIMESTAMP => Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?),
            Type::TIMESTAMPTZ => Value::TimestampTz(DateTime::<Utc>::from_sql(ty, raw)?),
            Type::DATE => Value::Date(NaiveDate::from_sql(ty, raw)?),
            Type::TIME => Value::Time(NaiveTime::from_sql(ty, raw)?),
            Type::INTERVAL => Value::Text(interval_text(raw)?),
            Type::INET | Type::CIDR => Value::Text(inet_text(ty, raw)?),
            Type::JSON | Type::JSONB => Value::Json(serde_json::Value::from_sql(ty, raw)?),
            _ => Value::Text(std::str::from_utf8(raw)?.to_string()),
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(Value::Null)
    }

    fn accepts(ty: &Type) -> bool {
        decodable(ty)
    }
}

/// A [`Value`] could not be converted into the requested Rust type.
#[derive(Debug, Clone, Error)]
#[error("expected {expected}, found {found}")]
pub struct ConversionError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl ConversionError {
    fn new(expected: &'static str, value: &Value) -> Self {
        Self {
            expected,
            found: value.kind(),
        }
    }
}

/// Conversion from a column [`Value`] into a record field.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(v) => Ok(*v),
            Value::Int(v) => Ok(*v != 0),
            other => Err(ConversionError::new("bool", other)),
        }
    }
}

/// Whole decimals convert too: `sum(bigint)` comes back as `numeric`.
impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Int(v) => Ok(*v),
            Value::Decimal(d) if d.fract().is_zero() => {
                d.to_i64().ok_or_else(|| ConversionError::new("i64", value))
            }
            other => Err(ConversionError::new("i64", other)),
        }
    }
}

macro_rules! impl_from_value_narrow {
    ($($t:ty => $name:literal),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Int(v) => <$t>::try_from(*v)
                            .map_err(|_| ConversionError::new($name, value)),
                        other => Err(ConversionError::new($name, other)),
                    }
                }
            }
        )*
    };
}

impl_from_value_narrow!(i32 => "i32", i16 => "i16");

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            Value::Decimal(d) => d.to_f64().ok_or_else(|| ConversionError::new("f64", value)),
            other => Err(ConversionError::new("f64", other)),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|v| v as f32)
    }
}

/// Text columns map directly; other scalars are rendered with `Display`.
impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(v) => Ok(v.clone()),
            Value::Null | Value::Bytes(_) => Err(ConversionError::new("string", value)),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bytes(v) => Ok(v.clone()),
            other => Err(ConversionError::new("bytes", other)),
        }
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Uuid(v) => Ok(*v),
            Value::Text(s) => s.parse().map_err(|_| ConversionError::new("uuid", value)),
            other => Err(ConversionError::new("uuid", other)),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Timestamp(v) => Ok(*v),
            Value::TimestampTz(v) => Ok(v.naive_utc()),
            other => Err(ConversionError::new("timestamp", other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::TimestampTz(v) => Ok(*v),
            Value::Timestamp(v) => Ok(v.and_utc()),
            other => Err(ConversionError::new("timestamptz", other)),
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Date(v) => Ok(*v),
            other => Err(ConversionError::new("date", other)),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Decimal(v) => Ok(*v),
            Value::Int(v) => Ok(Decimal::from(*v)),
            Value::Text(s) => s.parse().map_err(|_| ConversionError::new("decimal", value)),
            other => Err(ConversionError::new("decimal", other)),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Time(v) => Ok(*v),
            other => Err(ConversionError::new("time", other)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            Value::Text(s) => {
                serde_json::from_str(s).map_err(|_| ConversionError::new("json", value))
            }
            other => Err(ConversionError::new("json", other)),
        }
    }
}
