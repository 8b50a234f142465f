//! Seller grades and the commission table.
//!
//! The table is a total function over the closed grade set: every grade
//! has a rate, and an unrecognized grade string fails at parse time, long
//! before any arithmetic happens.

use crate::error::SettlementError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SellerGrade {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl SellerGrade {
    pub const ALL: [SellerGrade; 4] = [
        SellerGrade::Bronze,
        SellerGrade::Silver,
        SellerGrade::Gold,
        SellerGrade::Platinum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SellerGrade::Bronze => "BRONZE",
            SellerGrade::Silver => "SILVER",
            SellerGrade::Gold => "GOLD",
            SellerGrade::Platinum => "PLATINUM",
        }
    }
}

impl fmt::Display for SellerGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SellerGrade {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BRONZE" => Ok(SellerGrade::Bronze),
            "SILVER" => Ok(SellerGrade::Silver),
            "GOLD" => Ok(SellerGrade::Gold),
            "PLATINUM" => Ok(SellerGrade::Platinum),
            other => Err(SettlementError::UnknownGrade {
                value: other.to_string(),
            }),
        }
    }
}

/// Commission rate for a grade, fractional with four decimal places.
pub fn commission_rate(grade: SellerGrade) -> Decimal {
    match grade {
        SellerGrade::Bronze => Decimal::new(1500, 4),   // 15%
        SellerGrade::Silver => Decimal::new(1200, 4),   // 12%
        SellerGrade::Gold => Decimal::new(1000, 4),     // 10%
        SellerGrade::Platinum => Decimal::new(800, 4),  // 8%
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rates_match_the_grade_table() {
        assert_eq!(commission_rate(SellerGrade::Bronze), dec!(0.1500));
        assert_eq!(commission_rate(SellerGrade::Silver), dec!(0.1200));
        assert_eq!(commission_rate(SellerGrade::Gold), dec!(0.1000));
        assert_eq!(commission_rate(SellerGrade::Platinum), dec!(0.0800));
    }

    #[test]
    fn grade_strings_round_trip() {
        for grade in SellerGrade::ALL {
            let parsed: SellerGrade = grade.as_str().parse().unwrap();
            assert_eq!(parsed, grade);
        }
    }

    #[test]
    fn unknown_grade_is_rejected() {
        let err = "DIAMOND".parse::<SellerGrade>().unwrap_err();
        assert!(matches!(
            err,
            SettlementError::UnknownGrade { value } if value == "DIAMOND"
        ));
    }
}
