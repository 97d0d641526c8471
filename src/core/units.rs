//! Unit conversion - Normalises quantities into a canonical base unit.
//!
//! Three families are supported, each with its own base unit: mass (`g`), volume (`ml`)
//! and count (`u`). Quantities only ever convert within their own family, so `1 kg`
//! can become `1000 g` but never millilitres.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Physical dimension a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitFamily {
    /// Weight, base unit grams
    Mass,
    /// Liquid volume, base unit millilitres
    Volume,
    /// Discrete pieces, base unit single units
    Count,
}

impl UnitFamily {
    /// The canonical unit of this family.
    #[must_use]
    pub const fn base_unit(self) -> Unit {
        match self {
            Self::Mass => Unit::Gram,
            Self::Volume => Unit::Milliliter,
            Self::Count => Unit::Piece,
        }
    }
}

impl fmt::Display for UnitFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mass => "mass",
            Self::Volume => "volume",
            Self::Count => "count",
        };
        f.write_str(name)
    }
}

/// A recognised unit of measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Milligram
    Milligram,
    /// Gram (mass base)
    Gram,
    /// Kilogram
    Kilogram,
    /// Millilitre (volume base)
    Milliliter,
    /// Litre
    Liter,
    /// A single piece (count base)
    Piece,
    /// Twelve pieces
    Dozen,
}

impl Unit {
    /// Family this unit belongs to.
    #[must_use]
    pub const fn family(self) -> UnitFamily {
        match self {
            Self::Milligram | Self::Gram | Self::Kilogram => UnitFamily::Mass,
            Self::Milliliter | Self::Liter => UnitFamily::Volume,
            Self::Piece | Self::Dozen => UnitFamily::Count,
        }
    }

    /// How many base units one of this unit is worth.
    #[must_use]
    pub fn factor(self) -> Decimal {
        match self {
            Self::Milligram => Decimal::new(1, 3),
            Self::Gram | Self::Milliliter | Self::Piece => Decimal::ONE,
            Self::Kilogram | Self::Liter => Decimal::ONE_THOUSAND,
            Self::Dozen => Decimal::from(12),
        }
    }

    /// Canonical symbol, also used when persisting units.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Milligram => "mg",
            Self::Gram => "g",
            Self::Kilogram => "kg",
            Self::Milliliter => "ml",
            Self::Liter => "l",
            Self::Piece => "u",
            Self::Dozen => "dz",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let unit = match s.trim().to_lowercase().as_str() {
            "mg" | "milligram" | "milligrams" => Self::Milligram,
            "g" | "gr" | "gram" | "grams" => Self::Gram,
            "kg" | "kilo" | "kilos" | "kilogram" | "kilograms" => Self::Kilogram,
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => Self::Milliliter,
            "l" | "lt" | "liter" | "liters" | "litre" | "litres" => Self::Liter,
            "u" | "un" | "unit" | "units" | "pc" | "pcs" | "piece" | "pieces" => Self::Piece,
            "dz" | "doz" | "dozen" | "dozens" => Self::Dozen,
            other => {
                return Err(Error::Conversion {
                    message: format!("unrecognised unit '{other}'"),
                });
            }
        };
        Ok(unit)
    }
}

/// Converts `quantity` expressed in `unit` into its family's base unit.
///
/// Returns the base quantity together with the base unit it is expressed in.
///
/// # Errors
/// Returns [`Error::Conversion`] if the unit is not recognised or the quantity
/// is not strictly positive.
pub fn convert_to_base(quantity: Decimal, unit: &str) -> Result<(Decimal, Unit)> {
    let unit: Unit = unit.parse()?;
    if quantity <= Decimal::ZERO {
        return Err(Error::Conversion {
            message: format!("quantity must be positive, got {quantity} {unit}"),
        });
    }

    let base_quantity = quantity
        .checked_mul(unit.factor())
        .ok_or_else(|| Error::Conversion {
            message: format!("{quantity} {unit} overflows when converted to base units"),
        })?;
    // Sub-precision quantities round to zero in the base unit
    if base_quantity <= Decimal::ZERO {
        return Err(Error::Conversion {
            message: format!("{quantity} {unit} is too small to express in base units"),
        });
    }

    Ok((base_quantity, unit.family().base_unit()))
}

/// Converts `quantity` from one unit to another of the same family.
///
/// # Errors
/// Returns [`Error::Conversion`] when the units belong to different families.
pub fn convert(quantity: Decimal, from: Unit, to: Unit) -> Result<Decimal> {
    if from.family() != to.family() {
        return Err(Error::Conversion {
            message: format!(
                "cannot convert {from} ({}) to {to} ({})",
                from.family(),
                to.family()
            ),
        });
    }

    quantity
        .checked_mul(from.factor())
        .and_then(|base| base.checked_div(to.factor()))
        .ok_or_else(|| Error::Conversion {
            message: format!("{quantity} {from} cannot be represented in {to}"),
        })
}
