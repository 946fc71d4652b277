//! Filter operators
//!
//! Every field carries one operator describing how its value is compared
//! by whoever consumes the payload. Operators are grouped into families;
//! each field type offers exactly one family (see
//! [`FieldType::operators`](crate::field::FieldType::operators)).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// Comparison applied to a field's value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Includes,
    NotIncludes,
    StartsWith,
    EndsWith,
    Equals,
    NotEquals,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Is,
    IsNot,
    Before,
    After,
    Past,
    NotPast,
    Between,
    NotBetween,
}

/// Operators offered by text fields
pub const TEXT_OPERATORS: &[Operator] = &[
    Operator::Includes,
    Operator::NotIncludes,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::Equals,
    Operator::NotEquals,
];

/// Operators offered by number fields
pub const EQUALITY_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::GreaterThan,
    Operator::GreaterOrEqual,
    Operator::LessThan,
    Operator::LessOrEqual,
];

/// Operators offered by select and combobox fields
pub const IDENTITY_OPERATORS: &[Operator] = &[Operator::Is, Operator::IsNot];

/// Operators offered by date and time fields
pub const TIME_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::Before,
    Operator::After,
    Operator::LessThan,
    Operator::GreaterThan,
    Operator::Past,
    Operator::NotPast,
];

/// Operators offered by range and date-range fields
pub const RANGE_OPERATORS: &[Operator] = &[Operator::Between, Operator::NotBetween];

/// Boolean fields only ever compare with `is`
pub const BOOLEAN_OPERATORS: &[Operator] = &[Operator::Is];

impl Operator {
    /// Wire name (camelCase)
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Includes => "includes",
            Operator::NotIncludes => "notIncludes",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::Equals => "equals",
            Operator::NotEquals => "notEquals",
            Operator::GreaterThan => "greaterThan",
            Operator::GreaterOrEqual => "greaterOrEqual",
            Operator::LessThan => "lessThan",
            Operator::LessOrEqual => "lessOrEqual",
            Operator::Is => "is",
            Operator::IsNot => "isNot",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::Past => "past",
            Operator::NotPast => "notPast",
            Operator::Between => "between",
            Operator::NotBetween => "notBetween",
        }
    }

    /// Label shown in an operator dropdown
    pub fn label(&self) -> &'static str {
        match self {
            Operator::Includes => "includes",
            Operator::NotIncludes => "does not include",
            Operator::StartsWith => "starts with",
            Operator::EndsWith => "ends with",
            Operator::Equals => "equals",
            Operator::NotEquals => "does not equal",
            Operator::GreaterThan => "greater than",
            Operator::GreaterOrEqual => "greater or equal",
            Operator::LessThan => "less than",
            Operator::LessOrEqual => "less or equal",
            Operator::Is => "is",
            Operator::IsNot => "is not",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::Past => "past",
            Operator::NotPast => "not past",
            Operator::Between => "between",
            Operator::NotBetween => "not between",
        }
    }

    /// Every operator, in declaration order
    pub fn all() -> &'static [Operator] {
        &[
            Operator::Includes,
            Operator::NotIncludes,
            Operator::StartsWith,
            Operator::EndsWith,
            Operator::Equals,
            Operator::NotEquals,
            Operator::GreaterThan,
            Operator::GreaterOrEqual,
            Operator::LessThan,
            Operator::LessOrEqual,
            Operator::Is,
            Operator::IsNot,
            Operator::Before,
            Operator::After,
            Operator::Past,
            Operator::NotPast,
            Operator::Between,
            Operator::NotBetween,
        ]
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::all()
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| FilterError::UnknownOperator(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_serde() {
        for op in Operator::all() {
            let json = serde_json::to_string(op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
        }
    }

    #[test]
    fn test_parse_operator() {
        assert_eq!("startsWith".parse::<Operator>(), Ok(Operator::StartsWith));
        assert_eq!("notPast".parse::<Operator>(), Ok(Operator::NotPast));
        assert_eq!(
            "contains".parse::<Operator>(),
            Err(FilterError::UnknownOperator("contains".into()))
        );
    }

    #[test]
    fn test_families_are_disjoint_where_expected() {
        assert!(RANGE_OPERATORS.iter().all(|op| !TEXT_OPERATORS.contains(op)));
        assert_eq!(BOOLEAN_OPERATORS, &[Operator::Is]);
    }
}
