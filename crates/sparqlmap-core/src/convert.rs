//! Literal → Rust scalar conversion.
//!
//! A target type implements [`FromLiteral`]: a cheap probe ([`FromLiteral::accepts`])
//! that the predicate matcher uses to drop incompatible literals, and the actual
//! conversion. The probe looks at the datatype (and, for URLs written as plain
//! strings, at the lexical form); lexical parsing happens in the conversion, so a
//! malformed `"19x6"^^xsd:integer` is reported as a conversion error rather than
//! silently skipped.
//!
//! Language tags are handled separately by [`language_matches`], see its docs
//! for the rule.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use url::Url;

use crate::descriptor::PropertyMeta;
use crate::error::{MappingError, Result};
use crate::term::Literal;
use crate::vocab::{rdf, xsd};

/// A scalar that can be read from an RDF literal.
pub trait FromLiteral: Sized + Send + 'static {
    /// Name used in diagnostics.
    const TARGET: &'static str;

    /// Whether `literal` is a candidate for this type.
    fn accepts(literal: &Literal) -> bool;

    /// Parse the lexical form. The error is a human-readable reason.
    fn from_literal(literal: &Literal) -> std::result::Result<Self, String>;
}

/// Language filter applied before the datatype probe.
///
/// - An untagged literal always passes.
/// - A tagged literal passes when no preference is in effect, or when its
///   primary subtag equals the preference's primary subtag (ASCII
///   case-insensitive): `en-GB` passes for `en`, `de` does not.
///
/// Collections keep every survivor. Single-valued properties are narrowed
/// further by [`prefer_language`].
pub fn language_matches(literal: &Literal, preferred: Option<&str>) -> bool {
    match (&literal.language, preferred) {
        (None, _) | (Some(_), None) => true,
        (Some(tag), Some(pref)) => primary_subtag(tag).eq_ignore_ascii_case(primary_subtag(pref)),
    }
}

fn primary_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// Tie-break among the literals that passed [`language_matches`] for a
/// single-valued property. Only the best tier is kept:
///
/// 1. literals tagged with the preferred language;
/// 2. untagged literals;
/// 3. with no preference, literals carrying the lexically smallest tag
///    (compared lowercase).
///
/// Two literals in the winning tier remain ambiguous, e.g. two untagged
/// values or `"a"@en` and `"b"@en`.
pub fn prefer_language<'l>(literals: Vec<&'l Literal>, preferred: Option<&str>) -> Vec<&'l Literal> {
    let rank = |literal: &Literal| match (&literal.language, preferred) {
        (Some(tag), Some(pref)) if primary_subtag(tag).eq_ignore_ascii_case(primary_subtag(pref)) => {
            (0, None)
        }
        (None, _) => (1, None),
        (Some(tag), _) => (2, Some(tag.to_ascii_lowercase())),
    };
    let Some(best) = literals.iter().map(|l| rank(l)).min() else {
        return literals;
    };
    literals.into_iter().filter(|l| rank(l) == best).collect()
}

/// Convertibility probe for one property.
pub fn can_convert(literal: &Literal, property: &PropertyMeta, default_language: Option<&str>) -> bool {
    language_matches(literal, property.language().or(default_language)) && property.probe(literal)
}

/// Convert `literal` to `T` for `property`.
pub fn convert<T: FromLiteral>(literal: &Literal, property: &PropertyMeta) -> Result<T> {
    T::from_literal(literal).map_err(|reason| MappingError::Conversion {
        property: property.name().to_string(),
        lexical: literal.lexical.clone(),
        datatype: literal.datatype_iri().to_string(),
        target: T::TARGET,
        reason,
    })
}

// ============================================================================
// Lexical helpers
// ============================================================================

/// Strip an XSD timezone suffix (`Z`, `+hh:mm`, `-hh:mm`).
fn split_timezone(lexical: &str) -> (&str, Option<&str>) {
    if let Some(rest) = lexical.strip_suffix('Z') {
        return (rest, Some("Z"));
    }
    let bytes = lexical.as_bytes();
    if bytes.len() > 6 {
        let sign = bytes[bytes.len() - 6];
        if (sign == b'+' || sign == b'-') && bytes[bytes.len() - 3] == b':' {
            let at = lexical.len() - 6;
            return (&lexical[..at], Some(&lexical[at..]));
        }
    }
    (lexical, None)
}

fn parse_offset(tz: Option<&str>) -> std::result::Result<FixedOffset, String> {
    let utc = FixedOffset::east_opt(0).ok_or_else(|| "invalid UTC offset".to_string())?;
    let Some(tz) = tz else {
        return Ok(utc);
    };
    if tz == "Z" {
        return Ok(utc);
    }
    let sign = if tz.starts_with('-') { -1 } else { 1 };
    let (h, m) = tz[1..]
        .split_once(':')
        .ok_or_else(|| format!("invalid timezone {tz:?}"))?;
    let h: i32 = h.parse().map_err(|_| format!("invalid timezone {tz:?}"))?;
    let m: i32 = m.parse().map_err(|_| format!("invalid timezone {tz:?}"))?;
    FixedOffset::east_opt(sign * (h * 3600 + m * 60)).ok_or_else(|| format!("timezone out of range {tz:?}"))
}

fn parse_date(lexical: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(lexical, "%Y-%m-%d").map_err(|e| e.to_string())
}

fn parse_naive_date_time(lexical: &str) -> std::result::Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(lexical, "%Y-%m-%dT%H:%M:%S%.f").map_err(|e| e.to_string())
}

fn is_string_like(literal: &Literal) -> bool {
    let dt = literal.datatype_iri();
    xsd::is_string(dt) || dt == rdf::LANG_STRING
}

// ============================================================================
// Targets
// ============================================================================

impl FromLiteral for String {
    const TARGET: &'static str = "string";

    fn accepts(literal: &Literal) -> bool {
        is_string_like(literal) || literal.datatype_iri() == xsd::ANY_URI
    }

    fn from_literal(literal: &Literal) -> std::result::Result<Self, String> {
        Ok(literal.lexical.clone())
    }
}

macro_rules! integer_from_literal {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl FromLiteral for $ty {
            const TARGET: &'static str = $name;

            fn accepts(literal: &Literal) -> bool {
                let dt = literal.datatype_iri();
                xsd::is_integer(dt) || dt == xsd::G_YEAR
            }

            fn from_literal(literal: &Literal) -> std::result::Result<Self, String> {
                let lexical = literal.lexical.trim();
                let lexical = if literal.datatype_iri() == xsd::G_YEAR {
                    split_timezone(lexical).0
                } else {
                    lexical
                };
                lexical.parse::<$ty>().map_err(|e| e.to_string())
            }
        }
    )*};
}

integer_from_literal! {
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
}

macro_rules! float_from_literal {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl FromLiteral for $ty {
            const TARGET: &'static str = $name;

            fn accepts(literal: &Literal) -> bool {
                let dt = literal.datatype_iri();
                dt == xsd::DOUBLE || dt == xsd::FLOAT || dt == xsd::DECIMAL || xsd::is_integer(dt)
            }

            fn from_literal(literal: &Literal) -> std::result::Result<Self, String> {
                match literal.lexical.trim() {
                    "INF" => Ok(<$ty>::INFINITY),
                    "-INF" => Ok(<$ty>::NEG_INFINITY),
                    "NaN" => Ok(<$ty>::NAN),
                    other => other.parse::<$ty>().map_err(|e| e.to_string()),
                }
            }
        }
    )*};
}

float_from_literal! {
    f32 => "f32",
    f64 => "f64",
}

impl FromLiteral for bool {
    const TARGET: &'static str = "bool";

    fn accepts(literal: &Literal) -> bool {
        literal.datatype_iri() == xsd::BOOLEAN
    }

    fn from_literal(literal: &Literal) -> std::result::Result<Self, String> {
        match literal.lexical.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(format!("{other:?} is not an xsd:boolean")),
        }
    }
}

impl FromLiteral for NaiveDate {
    const TARGET: &'static str = "date";

    fn accepts(literal: &Literal) -> bool {
        literal.datatype_iri() == xsd::DATE
    }

    fn from_literal(literal: &Literal) -> std::result::Result<Self, String> {
        parse_date(split_timezone(literal.lexical.trim()).0)
    }
}

impl FromLiteral for NaiveDateTime {
    const TARGET: &'static str = "date-time";

    fn accepts(literal: &Literal) -> bool {
        literal.datatype_iri() == xsd::DATE_TIME
    }

    fn from_literal(literal: &Literal) -> std::result::Result<Self, String> {
        parse_naive_date_time(split_timezone(literal.lexical.trim()).0)
    }
}

impl FromLiteral for DateTime<FixedOffset> {
    const TARGET: &'static str = "zoned date-time";

    fn accepts(literal: &Literal) -> bool {
        let dt = literal.datatype_iri();
        dt == xsd::DATE_TIME || dt == xsd::DATE
    }

    /// Dates become midnight in their own offset; a missing offset means UTC.
    fn from_literal(literal: &Literal) -> std::result::Result<Self, String> {
        let (local, tz) = split_timezone(literal.lexical.trim());
        let offset = parse_offset(tz)?;
        let naive = if literal.datatype_iri() == xsd::DATE {
            parse_date(local)?
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| "invalid midnight".to_string())?
        } else {
            parse_naive_date_time(local)?
        };
        offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| format!("ambiguous local time {naive}"))
    }
}

impl FromLiteral for Url {
    const TARGET: &'static str = "url";

    fn accepts(literal: &Literal) -> bool {
        literal.datatype_iri() == xsd::ANY_URI
            || (is_string_like(literal) && Url::parse(literal.lexical.trim()).is_ok())
    }

    fn from_literal(literal: &Literal) -> std::result::Result<Self, String> {
        Url::parse(literal.lexical.trim()).map_err(|e| e.to_string())
    }
}
