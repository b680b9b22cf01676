//! # Built-in Datatypes
//!
//! Lexical checks for the XML Schema built-in simple types, plus the
//! ordering used by range facets.
//!
//! Decimal-family values compare exactly through `rust_decimal`; dates and
//! times are checked for calendar validity through `chrono`.

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Whitespace normalization applied before a value is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhiteSpace {
    /// Keep the value as is.
    Preserve,
    /// Turn tabs and line breaks into spaces.
    Replace,
    /// Replace, then trim and squeeze runs of spaces.
    Collapse,
}

impl WhiteSpace {
    /// Parse a `whiteSpace` facet value.
    pub fn from_facet(value: &str) -> Option<Self> {
        match value {
            "preserve" => Some(Self::Preserve),
            "replace" => Some(Self::Replace),
            "collapse" => Some(Self::Collapse),
            _ => None,
        }
    }

    /// Apply the normalization.
    pub fn apply(&self, value: &str) -> String {
        match self {
            Self::Preserve => value.to_string(),
            Self::Replace => value.replace(['\t', '\n', '\r'], " "),
            Self::Collapse => value.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

/// The built-in simple types (and `anyType`) the validator understands.
///
/// Variants are named after the XML Schema types; [`Builtin::label`] gives
/// the schema spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    AnyType,
    AnySimpleType,
    String,
    NormalizedString,
    Token,
    Language,
    Name,
    NcName,
    Id,
    IdRef,
    IdRefs,
    Entity,
    NmToken,
    NmTokens,
    AnyUri,
    QName,
    Notation,
    Boolean,
    Decimal,
    Integer,
    NonPositiveInteger,
    NegativeInteger,
    NonNegativeInteger,
    PositiveInteger,
    Long,
    Int,
    Short,
    Byte,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    Float,
    Double,
    Duration,
    DateTime,
    Date,
    Time,
    GYear,
    GYearMonth,
    GMonth,
    GDay,
    GMonthDay,
    Base64Binary,
    HexBinary,
}

impl Builtin {
    /// Look up a built-in by its local name in the XML Schema namespace.
    pub fn from_local_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "anyType" => Self::AnyType,
            "anySimpleType" => Self::AnySimpleType,
            "string" => Self::String,
            "normalizedString" => Self::NormalizedString,
            "token" => Self::Token,
            "language" => Self::Language,
            "Name" => Self::Name,
            "NCName" => Self::NcName,
            "ID" => Self::Id,
            "IDREF" => Self::IdRef,
            "IDREFS" => Self::IdRefs,
            "ENTITY" => Self::Entity,
            "NMTOKEN" => Self::NmToken,
            "NMTOKENS" => Self::NmTokens,
            "anyURI" => Self::AnyUri,
            "QName" => Self::QName,
            "NOTATION" => Self::Notation,
            "boolean" => Self::Boolean,
            "decimal" => Self::Decimal,
            "integer" => Self::Integer,
            "nonPositiveInteger" => Self::NonPositiveInteger,
            "negativeInteger" => Self::NegativeInteger,
            "nonNegativeInteger" => Self::NonNegativeInteger,
            "positiveInteger" => Self::PositiveInteger,
            "long" => Self::Long,
            "int" => Self::Int,
            "short" => Self::Short,
            "byte" => Self::Byte,
            "unsignedLong" => Self::UnsignedLong,
            "unsignedInt" => Self::UnsignedInt,
            "unsignedShort" => Self::UnsignedShort,
            "unsignedByte" => Self::UnsignedByte,
            "float" => Self::Float,
            "double" => Self::Double,
            "duration" => Self::Duration,
            "dateTime" => Self::DateTime,
            "date" => Self::Date,
            "time" => Self::Time,
            "gYear" => Self::GYear,
            "gYearMonth" => Self::GYearMonth,
            "gMonth" => Self::GMonth,
            "gDay" => Self::GDay,
            "gMonthDay" => Self::GMonthDay,
            "base64Binary" => Self::Base64Binary,
            "hexBinary" => Self::HexBinary,
            _ => return None,
        };
        Some(builtin)
    }

    /// Normalization the type applies to its values.
    pub fn white_space(&self) -> WhiteSpace {
        match self {
            Self::String | Self::AnySimpleType | Self::AnyType => WhiteSpace::Preserve,
            Self::NormalizedString => WhiteSpace::Replace,
            _ => WhiteSpace::Collapse,
        }
    }

    /// True for `decimal` and everything derived from it.
    pub fn is_decimal(&self) -> bool {
        matches!(
            self,
            Self::Decimal
                | Self::Integer
                | Self::NonPositiveInteger
                | Self::NegativeInteger
                | Self::NonNegativeInteger
                | Self::PositiveInteger
                | Self::Long
                | Self::Int
                | Self::Short
                | Self::Byte
                | Self::UnsignedLong
                | Self::UnsignedInt
                | Self::UnsignedShort
                | Self::UnsignedByte
        )
    }

    /// True for whitespace-separated list types.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::IdRefs | Self::NmTokens)
    }

    /// Check a value, already whitespace-normalized, against the type's
    /// lexical space and range.
    pub fn check(&self, value: &str) -> Result<(), String> {
        let ok = match self {
            Self::AnyType
            | Self::AnySimpleType
            | Self::String
            | Self::NormalizedString
            | Self::AnyUri => true,
            Self::Token => !value.starts_with(' ') && !value.ends_with(' ') && !value.contains("  "),
            Self::Language => lexical_match(&LANGUAGE, r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$", value),
            Self::Name => lexical_match(&NAME, r"^[\p{L}_:][\p{L}\p{N}._:\-\p{Mn}]*$", value),
            Self::NcName | Self::Id | Self::IdRef | Self::Entity => is_ncname(value),
            Self::IdRefs => !value.is_empty() && value.split(' ').all(is_ncname),
            Self::NmToken => is_nmtoken(value),
            Self::NmTokens => !value.is_empty() && value.split(' ').all(is_nmtoken),
            Self::QName | Self::Notation => match value.split_once(':') {
                Some((prefix, local)) => is_ncname(prefix) && is_ncname(local),
                None => is_ncname(value),
            },
            Self::Boolean => matches!(value, "true" | "false" | "1" | "0"),
            Self::Decimal => lexical_match(&DECIMAL, r"^[+-]?(\d+(\.\d*)?|\.\d+)$", value),
            Self::Float | Self::Double => lexical_match(
                &FLOAT,
                r"^([+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?|-?INF|NaN)$",
                value,
            ),
            Self::Duration => is_duration(value),
            Self::DateTime => is_date_time(value),
            Self::Date => is_date(value),
            Self::Time => is_time(value),
            Self::GYear => lexical_match(&G_YEAR, r"^-?\d{4,}(Z|[+-]\d{2}:\d{2})?$", value),
            Self::GYearMonth => captures(&G_YEAR_MONTH, r"^-?\d{4,}-(\d{2})(Z|[+-]\d{2}:\d{2})?$", value)
                .is_some_and(|c| in_range(&c[1], 1, 12)),
            Self::GMonth => captures(&G_MONTH, r"^--(\d{2})(Z|[+-]\d{2}:\d{2})?$", value)
                .is_some_and(|c| in_range(&c[1], 1, 12)),
            Self::GDay => captures(&G_DAY, r"^---(\d{2})(Z|[+-]\d{2}:\d{2})?$", value)
                .is_some_and(|c| in_range(&c[1], 1, 31)),
            Self::GMonthDay => captures(&G_MONTH_DAY, r"^--(\d{2})-(\d{2})(Z|[+-]\d{2}:\d{2})?$", value)
                .is_some_and(|c| in_range(&c[1], 1, 12) && in_range(&c[2], 1, 31)),
            Self::Base64Binary => base64_length(value).is_some(),
            Self::HexBinary => value.len() % 2 == 0 && value.chars().all(|c| c.is_ascii_hexdigit()),
            Self::Integer
            | Self::NonPositiveInteger
            | Self::NegativeInteger
            | Self::NonNegativeInteger
            | Self::PositiveInteger
            | Self::Long
            | Self::Int
            | Self::Short
            | Self::Byte
            | Self::UnsignedLong
            | Self::UnsignedInt
            | Self::UnsignedShort
            | Self::UnsignedByte => return self.check_integer(value),
        };
        if ok {
            Ok(())
        } else {
            Err(format!("The string '{value}' is not a valid {} value.", self.label()))
        }
    }

    fn check_integer(&self, value: &str) -> Result<(), String> {
        if !lexical_match(&INTEGER, r"^[+-]?\d+$", value) {
            return Err(format!("The string '{value}' is not a valid {} value.", self.label()));
        }
        let negative = value.starts_with('-') && !value.trim_start_matches(['-', '0']).is_empty();
        let zero = value.trim_start_matches(['+', '-']).trim_start_matches('0').is_empty();
        let sign_ok = match self {
            Self::NonPositiveInteger => negative || zero,
            Self::NegativeInteger => negative,
            Self::NonNegativeInteger
            | Self::UnsignedLong
            | Self::UnsignedInt
            | Self::UnsignedShort
            | Self::UnsignedByte => !negative,
            Self::PositiveInteger => !negative && !zero,
            _ => true,
        };
        let (min, max): (i128, i128) = match self {
            Self::Long => (i64::MIN.into(), i64::MAX.into()),
            Self::Int => (i32::MIN.into(), i32::MAX.into()),
            Self::Short => (i16::MIN.into(), i16::MAX.into()),
            Self::Byte => (i8::MIN.into(), i8::MAX.into()),
            Self::UnsignedLong => (0, u64::MAX.into()),
            Self::UnsignedInt => (0, u32::MAX.into()),
            Self::UnsignedShort => (0, u16::MAX.into()),
            Self::UnsignedByte => (0, u8::MAX.into()),
            _ => (i128::MIN, i128::MAX),
        };
        let bounded = min != i128::MIN;
        let range_ok = !bounded
            || value
                .trim_start_matches('+')
                .parse::<i128>()
                .is_ok_and(|v| (min..=max).contains(&v));
        if sign_ok && range_ok {
            Ok(())
        } else {
            Err(format!(
                "Value '{value}' was either too large or too small for {}.",
                self.label()
            ))
        }
    }

    /// Schema name of the type, for diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AnyType => "anyType",
            Self::AnySimpleType => "anySimpleType",
            Self::String => "string",
            Self::NormalizedString => "normalizedString",
            Self::Token => "token",
            Self::Language => "language",
            Self::Name => "Name",
            Self::NcName => "NCName",
            Self::Id => "ID",
            Self::IdRef => "IDREF",
            Self::IdRefs => "IDREFS",
            Self::Entity => "ENTITY",
            Self::NmToken => "NMTOKEN",
            Self::NmTokens => "NMTOKENS",
            Self::AnyUri => "anyURI",
            Self::QName => "QName",
            Self::Notation => "NOTATION",
            Self::Boolean => "boolean",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::NonPositiveInteger => "nonPositiveInteger",
            Self::NegativeInteger => "negativeInteger",
            Self::NonNegativeInteger => "nonNegativeInteger",
            Self::PositiveInteger => "positiveInteger",
            Self::Long => "long",
            Self::Int => "int",
            Self::Short => "short",
            Self::Byte => "byte",
            Self::UnsignedLong => "unsignedLong",
            Self::UnsignedInt => "unsignedInt",
            Self::UnsignedShort => "unsignedShort",
            Self::UnsignedByte => "unsignedByte",
            Self::Float => "float",
            Self::Double => "double",
            Self::Duration => "duration",
            Self::DateTime => "dateTime",
            Self::Date => "date",
            Self::Time => "time",
            Self::GYear => "gYear",
            Self::GYearMonth => "gYearMonth",
            Self::GMonth => "gMonth",
            Self::GDay => "gDay",
            Self::GMonthDay => "gMonthDay",
            Self::Base64Binary => "base64Binary",
            Self::HexBinary => "hexBinary",
        }
    }

    /// Length of a value in the units the length facets count.
    ///
    /// Characters for strings, octets for binary types, items for lists.
    pub fn length_of(&self, value: &str) -> usize {
        match self {
            Self::HexBinary => value.len() / 2,
            Self::Base64Binary => base64_length(value).unwrap_or(0),
            Self::IdRefs | Self::NmTokens => value.split(' ').filter(|s| !s.is_empty()).count(),
            _ => value.chars().count(),
        }
    }

    /// Order two values of this type, if the type is ordered and both
    /// parse.
    pub fn compare(&self, a: &str, b: &str) -> Option<Ordering> {
        if self.is_decimal() {
            return match (parse_decimal(a), parse_decimal(b)) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => a.parse::<f64>().ok()?.partial_cmp(&b.parse::<f64>().ok()?),
            };
        }
        match self {
            Self::Float | Self::Double => parse_float(a)?.partial_cmp(&parse_float(b)?),
            Self::Date => date_part(a)?.cmp(&date_part(b)?).into(),
            Self::DateTime => date_time_part(a)?.cmp(&date_time_part(b)?).into(),
            Self::Time => time_part(a)?.cmp(&time_part(b)?).into(),
            Self::GYear => year_part(a)?.cmp(&year_part(b)?).into(),
            _ => None,
        }
    }

    /// True if two lexical values denote the same value.
    pub fn same_value(&self, a: &str, b: &str) -> bool {
        if a == b {
            return true;
        }
        match self.compare(a, b) {
            Some(order) => order == Ordering::Equal,
            None => false,
        }
    }
}

static LANGUAGE: OnceLock<Option<Regex>> = OnceLock::new();
static NAME: OnceLock<Option<Regex>> = OnceLock::new();
static NCNAME: OnceLock<Option<Regex>> = OnceLock::new();
static NMTOKEN: OnceLock<Option<Regex>> = OnceLock::new();
static DECIMAL: OnceLock<Option<Regex>> = OnceLock::new();
static INTEGER: OnceLock<Option<Regex>> = OnceLock::new();
static FLOAT: OnceLock<Option<Regex>> = OnceLock::new();
static DURATION: OnceLock<Option<Regex>> = OnceLock::new();
static DATE: OnceLock<Option<Regex>> = OnceLock::new();
static TIME: OnceLock<Option<Regex>> = OnceLock::new();
static DATE_TIME: OnceLock<Option<Regex>> = OnceLock::new();
static G_YEAR: OnceLock<Option<Regex>> = OnceLock::new();
static G_YEAR_MONTH: OnceLock<Option<Regex>> = OnceLock::new();
static G_MONTH: OnceLock<Option<Regex>> = OnceLock::new();
static G_DAY: OnceLock<Option<Regex>> = OnceLock::new();
static G_MONTH_DAY: OnceLock<Option<Regex>> = OnceLock::new();
static BASE64: OnceLock<Option<Regex>> = OnceLock::new();

/// Compile a constant pattern on first use.
fn regex(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn lexical_match(cell: &'static OnceLock<Option<Regex>>, pattern: &str, value: &str) -> bool {
    regex(cell, pattern).is_some_and(|r| r.is_match(value))
}

fn captures<'v>(
    cell: &'static OnceLock<Option<Regex>>,
    pattern: &str,
    value: &'v str,
) -> Option<Captures<'v>> {
    regex(cell, pattern)?.captures(value)
}

fn is_ncname(value: &str) -> bool {
    lexical_match(&NCNAME, r"^[\p{L}_][\p{L}\p{N}._\-\p{Mn}]*$", value)
}

fn is_nmtoken(value: &str) -> bool {
    lexical_match(&NMTOKEN, r"^[\p{L}\p{N}._:\-\p{Mn}]+$", value)
}

fn in_range(digits: &str, min: u32, max: u32) -> bool {
    digits.parse::<u32>().is_ok_and(|v| (min..=max).contains(&v))
}

fn is_duration(value: &str) -> bool {
    let Some(caps) = captures(
        &DURATION,
        r"^-?P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$",
        value,
    ) else {
        return false;
    };
    let date_parts = (1..=3).any(|i| caps.get(i).is_some());
    let time_parts = (5..=7).any(|i| caps.get(i).is_some());
    let has_t = caps.get(4).is_some();
    (date_parts || time_parts) && (!has_t || time_parts)
}

fn date_regex() -> Option<&'static Regex> {
    regex(&DATE, r"^(-?\d{4,})-(\d{2})-(\d{2})(Z|[+-]\d{2}:\d{2})?$")
}

fn time_regex() -> Option<&'static Regex> {
    regex(&TIME, r"^(\d{2}):(\d{2}):(\d{2})(\.\d+)?(Z|[+-]\d{2}:\d{2})?$")
}

fn date_time_regex() -> Option<&'static Regex> {
    regex(
        &DATE_TIME,
        r"^(-?\d{4,})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(\.\d+)?(Z|[+-]\d{2}:\d{2})?$",
    )
}

fn valid_date(year: &str, month: &str, day: &str) -> bool {
    match (year.parse::<i32>(), month.parse::<u32>(), day.parse::<u32>()) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d).is_some(),
        _ => false,
    }
}

fn valid_time(hour: &str, minute: &str, second: &str, fraction: Option<&str>) -> bool {
    match (hour.parse::<u32>(), minute.parse::<u32>(), second.parse::<u32>()) {
        (Ok(24), Ok(0), Ok(0)) => {
            fraction.map_or(true, |f| f.trim_start_matches('.').bytes().all(|b| b == b'0'))
        }
        (Ok(h), Ok(m), Ok(s)) => NaiveTime::from_hms_opt(h, m, s).is_some(),
        _ => false,
    }
}

fn is_date(value: &str) -> bool {
    date_regex()
        .and_then(|r| r.captures(value))
        .is_some_and(|c| valid_date(&c[1], &c[2], &c[3]))
}

fn is_time(value: &str) -> bool {
    time_regex()
        .and_then(|r| r.captures(value))
        .is_some_and(|c| valid_time(&c[1], &c[2], &c[3], c.get(4).map(|m| m.as_str())))
}

fn is_date_time(value: &str) -> bool {
    date_time_regex()
        .and_then(|r| r.captures(value))
        .is_some_and(|c| {
            valid_date(&c[1], &c[2], &c[3])
                && valid_time(&c[4], &c[5], &c[6], c.get(7).map(|m| m.as_str()))
        })
}

/// Decoded octet count of a base64 value, or `None` if it is not base64.
fn base64_length(value: &str) -> Option<usize> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let valid = lexical_match(
        &BASE64,
        r"^([A-Za-z0-9+/]{4})*([A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$",
        &compact,
    );
    if !valid {
        return None;
    }
    let padding = compact.chars().rev().take_while(|c| *c == '=').count();
    Some(compact.len() / 4 * 3 - padding)
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    let mut text = value.trim_start_matches('+').to_string();
    if text.starts_with('.') {
        text.insert(0, '0');
    } else if text.starts_with("-.") {
        text.insert(1, '0');
    }
    if text.ends_with('.') {
        text.push('0');
    }
    Decimal::from_str(&text).ok()
}

fn parse_float(value: &str) -> Option<f64> {
    match value {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}

fn date_part(value: &str) -> Option<NaiveDate> {
    let caps = date_regex()?.captures(value)?;
    NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
}

fn time_part(value: &str) -> Option<NaiveTime> {
    let caps = time_regex()?.captures(value)?;
    NaiveTime::from_hms_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
}

fn date_time_part(value: &str) -> Option<NaiveDateTime> {
    let caps = date_time_regex()?.captures(value)?;
    let date = NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)?;
    let time = NaiveTime::from_hms_opt(caps[4].parse().ok()?, caps[5].parse().ok()?, caps[6].parse().ok()?)?;
    Some(NaiveDateTime::new(date, time))
}

fn year_part(value: &str) -> Option<i64> {
    let end = value
        .char_indices()
        .skip(1)
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(value.len(), |(i, _)| i);
    value.get(..end)?.parse().ok()
}

/// Digit counts of a decimal lexical value: `(total, fraction)`.
///
/// Leading zeros of the integer part and trailing zeros of the fraction
/// are not significant.
pub fn digit_counts(value: &str) -> (u32, u32) {
    let unsigned = value.trim_start_matches(['+', '-']);
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let int_digits = int_part.trim_start_matches('0').len();
    let frac_digits = frac_part.trim_end_matches('0').len();
    let total = (int_digits + frac_digits).max(1);
    (
        u32::try_from(total).unwrap_or(u32::MAX),
        u32::try_from(frac_digits).unwrap_or(u32::MAX),
    )
}
