//! Strongly-typed value objects used by domain entities.
//!
//! These wrappers enforce basic invariants (positive identifiers, known
//! status and payment method names) so that once a value reaches the domain
//! layer it can be treated as trusted.
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided identifier is zero or negative.
    #[error("id must be greater than zero")]
    NonPositiveId,
    /// Provided string contained no non-whitespace characters.
    #[error("value cannot be empty")]
    EmptyString,
    /// Provided amount is negative.
    #[error("amount cannot be negative")]
    NegativeAmount,
    /// Provided value failed custom validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId)
                }
            }

            /// Returns the raw `i32` backing this identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_newtype!(TransactionId, "Unique identifier for a transaction.");

/// Macro to generate snake_case string enums with `as_str`/`FromStr`.
macro_rules! string_enum {
    ($name:ident, $doc:expr, { $($variant:ident => $value:literal),+ $(,)? }) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// All known variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire representation of the variant.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $value),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = TypeConstraintError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($value => Ok($name::$variant),)+
                    other => Err(TypeConstraintError::InvalidValue(other.to_string())),
                }
            }
        }
    };
}

string_enum!(TransactionStatus, "Lifecycle status of a payment transaction.", {
    Processing => "processing",
    Authorized => "authorized",
    Paid => "paid",
    Refunded => "refunded",
    WaitingPayment => "waiting_payment",
    PendingRefund => "pending_refund",
    Refused => "refused",
    Chargedback => "chargedback",
    Analyzing => "analyzing",
    PendingReview => "pending_review",
});

string_enum!(PaymentMethod, "Instrument used to pay for a transaction.", {
    CreditCard => "credit_card",
    DebitCard => "debit_card",
    Boleto => "boleto",
});

string_enum!(ExportFormat, "File format requested for a transaction export.", {
    Csv => "csv",
    Xls => "xls",
});

impl ExportFormat {
    /// File extension appended to the export filename.
    pub const fn extension(self) -> &'static str {
        self.as_str()
    }
}

/// Direction of the result ordering.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ascending" | "asc" => Ok(SortOrder::Ascending),
            "descending" | "desc" => Ok(SortOrder::Descending),
            other => Err(TypeConstraintError::InvalidValue(other.to_string())),
        }
    }
}

/// How the search results are presented.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Table,
    Chart,
}

/// Monetary amount in cents.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(i64);

impl Amount {
    /// Creates an amount ensuring it is not negative.
    pub fn new(cents: i64) -> Result<Self, TypeConstraintError> {
        if cents >= 0 {
            Ok(Self(cents))
        } else {
            Err(TypeConstraintError::NegativeAmount)
        }
    }

    pub const fn cents(self) -> i64 {
        self.0
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Amount {
    type Err = TypeConstraintError;

    /// Parses currency units with up to two decimals, e.g. `"12.5"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        let invalid = || TypeConstraintError::InvalidValue(value.to_string());
        if value.starts_with('-') {
            return Err(TypeConstraintError::NegativeAmount);
        }

        let (units, fraction) = value.split_once('.').unwrap_or((value, ""));
        if units.is_empty() || fraction.len() > 2 {
            return Err(invalid());
        }
        let units: i64 = units.parse().map_err(|_| invalid())?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        units
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .ok_or_else(invalid)
            .and_then(Amount::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_rejects_non_positive_values() {
        assert_eq!(
            TransactionId::new(0),
            Err(TypeConstraintError::NonPositiveId)
        );
        assert_eq!(TransactionId::new(5).map(TransactionId::get), Ok(5));
    }

    #[test]
    fn status_round_trips_through_wire_name() {
        for status in TransactionStatus::ALL {
            assert_eq!(status.as_str().parse::<TransactionStatus>(), Ok(*status));
        }
        assert!("settled".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn sort_order_accepts_short_names() {
        assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Ascending));
        assert_eq!("descending".parse::<SortOrder>(), Ok(SortOrder::Descending));
        assert_eq!(SortOrder::default(), SortOrder::Descending);
    }

    #[test]
    fn amount_formats_cents() {
        let amount = Amount::new(123_456).unwrap();
        assert_eq!(amount.to_string(), "1234.56");
        assert!(Amount::new(-1).is_err());
    }

    #[test]
    fn amount_parses_currency_units() {
        assert_eq!("12.5".parse::<Amount>().map(Amount::cents), Ok(1250));
        assert_eq!(" 7 ".parse::<Amount>().map(Amount::cents), Ok(700));
        assert_eq!("0.07".parse::<Amount>().map(Amount::cents), Ok(7));
        assert_eq!("-1".parse::<Amount>(), Err(TypeConstraintError::NegativeAmount));
        assert!("1.234".parse::<Amount>().is_err());
        assert!("abc".parse::<Amount>().is_err());
        assert!(".5".parse::<Amount>().is_err());
    }
}
