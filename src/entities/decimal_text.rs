//! Exact decimal column type.
//!
//! `SQLite` has no decimal type and binds `Decimal` as a float, which loses digits and
//! makes stock comparisons inexact. Quantities and money are stored as their canonical
//! decimal string in a TEXT column instead and parsed back exactly.

use rust_decimal::Decimal;
use sea_orm::{
    ColIdx, DbErr, QueryResult, TryGetError, TryGetable,
    sea_query::{ArrayType, ColumnType, Nullable, Value, ValueType, ValueTypeErr},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A [`Decimal`] persisted as TEXT.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DecimalText(pub Decimal);

impl DecimalText {
    /// The wrapped value.
    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }
}

impl From<Decimal> for DecimalText {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<DecimalText> for Decimal {
    fn from(value: DecimalText) -> Self {
        value.0
    }
}

impl PartialEq<Decimal> for DecimalText {
    fn eq(&self, other: &Decimal) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for DecimalText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<DecimalText> for Value {
    fn from(value: DecimalText) -> Self {
        Self::String(Some(Box::new(value.0.to_string())))
    }
}

impl TryGetable for DecimalText {
    fn try_get_by<I: ColIdx>(res: &QueryResult, index: I) -> Result<Self, TryGetError> {
        let raw = String::try_get_by(res, index)?;
        raw.parse::<Decimal>().map(Self).map_err(|e| {
            TryGetError::DbErr(DbErr::TryIntoErr {
                from: "String",
                into: "Decimal",
                source: Box::new(e),
            })
        })
    }
}

impl ValueType for DecimalText {
    fn try_from(v: Value) -> Result<Self, ValueTypeErr> {
        match v {
            Value::String(Some(raw)) => raw.parse().map(Self).map_err(|_| ValueTypeErr),
            _ => Err(ValueTypeErr),
        }
    }

    fn type_name() -> String {
        "DecimalText".to_string()
    }

    fn array_type() -> ArrayType {
        ArrayType::String
    }

    fn column_type() -> ColumnType {
        ColumnType::Text
    }
}

impl Nullable for DecimalText {
    fn null() -> Value {
        Value::String(None)
    }
}
