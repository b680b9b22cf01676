//! # Constraining Facets
//!
//! Compilation of `pattern` facets and checking of a value against the
//! facets of one restriction step.
//!
//! Messages follow the wording schema processors commonly use ("The actual
//! length is less than the MinLength value."), so logs read familiarly to
//! people who have validated ISO 20022 messages with other tools.

use std::cmp::Ordering;

use regex::Regex;

use crate::datatypes::{digit_counts, Builtin};
use crate::model::{Facets, Pattern};

/// How the facets of a step see the value: as one atom of a primitive
/// type, or as a list of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A single value whose primitive type is known.
    Atomic(Builtin),
    /// A whitespace-separated list; length facets count items.
    List,
}

impl ValueKind {
    fn length_of(&self, value: &str) -> usize {
        match self {
            Self::Atomic(builtin) => builtin.length_of(value),
            Self::List => value.split_whitespace().count(),
        }
    }

    fn primitive(&self) -> Option<Builtin> {
        match self {
            Self::Atomic(builtin) => Some(*builtin),
            Self::List => None,
        }
    }
}

/// Translate an XML Schema regular expression into an anchored `regex`
/// pattern and compile it.
///
/// Schema patterns match the whole value, use `\i`/`\c` for name
/// characters, and write class subtraction as `[a-z-[aeiou]]`.
pub fn compile_pattern(source: &str) -> Result<Pattern, regex::Error> {
    let mut translated = String::with_capacity(source.len() + 8);
    let mut chars = source.chars().peekable();
    let mut class_depth = 0usize;
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('i') => translated.push_str(if class_depth > 0 { "_:A-Za-z" } else { "[_:A-Za-z]" }),
                Some('I') => translated.push_str("[^_:A-Za-z]"),
                Some('c') => translated.push_str(if class_depth > 0 { "\\-._:A-Za-z0-9" } else { "[\\-._:A-Za-z0-9]" }),
                Some('C') => translated.push_str("[^\\-._:A-Za-z0-9]"),
                Some(other) => {
                    translated.push('\\');
                    translated.push(other);
                }
                None => translated.push_str("\\\\"),
            },
            '[' => {
                class_depth += 1;
                translated.push('[');
            }
            ']' if class_depth > 0 => {
                class_depth -= 1;
                translated.push(']');
            }
            '-' if class_depth > 0 && chars.peek() == Some(&'[') => translated.push_str("--"),
            other => translated.push(other),
        }
    }
    let regex = Regex::new(&format!("^(?:{translated})$"))?;
    Ok(Pattern {
        source: source.to_string(),
        regex,
    })
}

/// Check a normalized value against one step's facets.
///
/// The first failing facet wins.
pub fn check_facets(facets: &Facets, value: &str, kind: ValueKind) -> Result<(), String> {
    let length = kind.length_of(value);
    if let Some(expected) = facets.length {
        if length != expected {
            return Err("The actual length is not equal to the specified length.".to_string());
        }
    }
    if let Some(min) = facets.min_length {
        if length < min {
            return Err("The actual length is less than the MinLength value.".to_string());
        }
    }
    if let Some(max) = facets.max_length {
        if length > max {
            return Err("The actual length is greater than the MaxLength value.".to_string());
        }
    }
    if !facets.patterns.is_empty() && !facets.patterns.iter().any(|p| p.regex.is_match(value)) {
        return Err("The Pattern constraint failed.".to_string());
    }
    if !facets.enumeration.is_empty() {
        let listed = facets.enumeration.iter().any(|e| match kind.primitive() {
            Some(primitive) => primitive.same_value(e, value),
            None => e.split_whitespace().eq(value.split_whitespace()),
        });
        if !listed {
            return Err("The Enumeration constraint failed.".to_string());
        }
    }

    if let Some(primitive) = kind.primitive() {
        let bounds: [(&Option<String>, &[Ordering], &str); 4] = [
            (&facets.min_inclusive, &[Ordering::Greater, Ordering::Equal], "MinInclusive"),
            (&facets.max_inclusive, &[Ordering::Less, Ordering::Equal], "MaxInclusive"),
            (&facets.min_exclusive, &[Ordering::Greater], "MinExclusive"),
            (&facets.max_exclusive, &[Ordering::Less], "MaxExclusive"),
        ];
        for (bound, allowed, label) in bounds {
            let Some(bound) = bound else { continue };
            if let Some(order) = primitive.compare(value, bound) {
                if !allowed.contains(&order) {
                    return Err(format!("The {label} constraint failed."));
                }
            }
        }

        if primitive.is_decimal() {
            let (total, fraction) = digit_counts(value);
            if facets.total_digits.is_some_and(|max| total > max) {
                return Err("The TotalDigits value constraint failed.".to_string());
            }
            if facets.fraction_digits.is_some_and(|max| fraction > max) {
                return Err("The FractionDigits value constraint failed.".to_string());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_facets() -> Facets {
        Facets {
            min_length: Some(1),
            max_length: Some(35),
            ..Facets::default()
        }
    }

    #[test]
    fn length_bounds() {
        let facets = text_facets();
        let kind = ValueKind::Atomic(Builtin::String);
        assert!(check_facets(&facets, "MSG-001", kind).is_ok());
        assert_eq!(
            check_facets(&facets, "", kind).unwrap_err(),
            "The actual length is less than the MinLength value."
        );
        assert!(check_facets(&facets, &"x".repeat(36), kind).is_err());
        // Characters, not bytes.
        assert!(check_facets(&facets, &"é".repeat(35), kind).is_ok());
    }

    #[test]
    fn patterns_are_anchored() {
        let bic = compile_pattern("[A-Z]{6,6}[A-Z2-9][A-NP-Z0-9]([A-Z0-9]{3,3}){0,1}").unwrap();
        assert!(bic.regex.is_match("DEUTDEFF"));
        assert!(bic.regex.is_match("DEUTDEFF500"));
        assert!(!bic.regex.is_match("xDEUTDEFF"));
        assert!(!bic.regex.is_match("DEUTDEFF5"));

        let facets = Facets {
            patterns: vec![compile_pattern("[A-Z]{3,3}").unwrap()],
            ..Facets::default()
        };
        assert!(check_facets(&facets, "USD", ValueKind::Atomic(Builtin::String)).is_ok());
        assert_eq!(
            check_facets(&facets, "usd", ValueKind::Atomic(Builtin::String)).unwrap_err(),
            "The Pattern constraint failed."
        );
    }

    #[test]
    fn name_escapes_and_subtraction() {
        let name = compile_pattern(r"\i\c*").unwrap();
        assert!(name.regex.is_match("Ccy"));
        assert!(!name.regex.is_match("1Ccy"));

        let consonants = compile_pattern("[a-z-[aeiou]]+").unwrap();
        assert!(consonants.regex.is_match("xyz"));
        assert!(!consonants.regex.is_match("abc"));
    }

    #[test]
    fn enumeration_uses_value_space() {
        let facets = Facets {
            enumeration: vec!["ACCP".into(), "RJCT".into()],
            ..Facets::default()
        };
        let kind = ValueKind::Atomic(Builtin::String);
        assert!(check_facets(&facets, "RJCT", kind).is_ok());
        assert!(check_facets(&facets, "PDNG", kind).is_err());

        let numeric = Facets {
            enumeration: vec!["1.0".into()],
            ..Facets::default()
        };
        assert!(check_facets(&numeric, "1", ValueKind::Atomic(Builtin::Decimal)).is_ok());
    }

    #[test]
    fn ranges_and_digits() {
        let amount = Facets {
            min_inclusive: Some("0".into()),
            total_digits: Some(18),
            fraction_digits: Some(5),
            ..Facets::default()
        };
        let kind = ValueKind::Atomic(Builtin::Decimal);
        assert!(check_facets(&amount, "1000.00", kind).is_ok());
        assert!(check_facets(&amount, "0", kind).is_ok());
        assert_eq!(
            check_facets(&amount, "-0.01", kind).unwrap_err(),
            "The MinInclusive constraint failed."
        );
        assert_eq!(
            check_facets(&amount, "1.123456", kind).unwrap_err(),
            "The FractionDigits value constraint failed."
        );
        assert!(check_facets(&amount, &"9".repeat(19), kind).is_err());

        let exclusive = Facets {
            min_exclusive: Some("0".into()),
            ..Facets::default()
        };
        assert!(check_facets(&exclusive, "0", kind).is_err());
        assert!(check_facets(&exclusive, "0.01", kind).is_ok());
    }

    #[test]
    fn list_length_counts_items() {
        let facets = Facets {
            max_length: Some(2),
            ..Facets::default()
        };
        assert!(check_facets(&facets, "a b", ValueKind::List).is_ok());
        assert!(check_facets(&facets, "a b c", ValueKind::List).is_err());
    }
}
