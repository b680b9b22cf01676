//! Components shared by the bundled pacs bindings.
//!
//! Field names are the ISO 20022 XML tags, applied with `serde(rename)`, so
//! one set of types serves both encodings. Optional members are skipped
//! when absent and every component container is `#[serde(default)]`, which
//! gives the codec its missing-member tolerance.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MessageError;

/// Defines a closed ISO code list: a unit enum whose serde form is the
/// four-letter code, validated on the way in.
macro_rules! iso_code {
    (
        $(#[$meta:meta])*
        $name:ident ($list:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $code:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// ISO code list name.
            pub const LIST: &'static str = $list;

            /// Every code in the list.
            pub fn all() -> &'static [$name] {
                &[$( $name::$variant, )+]
            }

            /// The four-letter code.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $code, )+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::MessageError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $( $code => Ok(Self::$variant), )+
                    other => Err($crate::error::MessageError::UnknownCode {
                        kind: $list,
                        code: other.to_string(),
                    }),
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use iso_code;

/// `ActiveCurrencyAndAmount`: a decimal amount with its ISO 4217 currency
/// as the `Ccy` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyAmount {
    #[serde(rename = "@Ccy")]
    pub currency: String,
    #[serde(rename = "$text")]
    pub value: Decimal,
}

impl CurrencyAmount {
    pub fn new(currency: impl Into<String>, value: Decimal) -> Self {
        Self {
            currency: currency.into(),
            value,
        }
    }

    /// Build from an integer count of minor units, scaled by the
    /// currency's ISO 4217 exponent.
    pub fn from_minor_units(currency: impl Into<String>, minor_units: i64) -> Self {
        let currency = currency.into();
        let scale = minor_unit_exponent(&currency);
        Self {
            value: Decimal::new(minor_units, scale),
            currency,
        }
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

/// ISO 4217 minor unit exponent. Most currencies use 2; JPY and KRW use 0;
/// BHD, KWD and OMR use 3.
pub fn minor_unit_exponent(currency: &str) -> u32 {
    match currency {
        "JPY" | "KRW" | "VND" | "CLP" | "ISK" | "UGX" | "PYG" => 0,
        "BHD" | "KWD" | "OMR" => 3,
        _ => 2,
    }
}

/// `BranchAndFinancialInstitutionIdentification6`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Agent {
    #[serde(rename = "FinInstnId")]
    pub institution: FinancialInstitution,
}

impl Agent {
    /// An agent identified by BIC only.
    pub fn from_bic(bic: impl Into<String>) -> Self {
        Self {
            institution: FinancialInstitution {
                bic: Some(bic.into()),
                ..FinancialInstitution::default()
            },
        }
    }

    pub fn bic(&self) -> Option<&str> {
        self.institution.bic.as_deref()
    }
}

/// `FinancialInstitutionIdentification18`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialInstitution {
    #[serde(rename = "BICFI", skip_serializing_if = "Option::is_none")]
    pub bic: Option<String>,
    #[serde(rename = "LEI", skip_serializing_if = "Option::is_none")]
    pub lei: Option<String>,
    #[serde(rename = "Nm", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `PartyIdentification135`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Party {
    #[serde(rename = "Nm", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "CtryOfRes", skip_serializing_if = "Option::is_none")]
    pub country_of_residence: Option<String>,
}

impl Party {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Check the basic shape of a BIC: 8 or 11 ASCII alphanumerics.
pub fn validate_bic(bic: &str) -> Result<(), MessageError> {
    let trimmed = bic.trim();
    if trimmed.len() != 8 && trimmed.len() != 11 {
        return Err(MessageError::InvalidBic(format!(
            "BIC must be 8 or 11 characters, got {}",
            trimmed.len()
        )));
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(MessageError::InvalidBic(
            "BIC must be alphanumeric".to_string(),
        ));
    }
    Ok(())
}
