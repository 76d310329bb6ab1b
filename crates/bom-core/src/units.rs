// bom-core/src/units.rs

use uom::si::f64::Mass as UomMass;
use uom::si::mass::pound;

/// Canonical mass type. Catalog rows carry weights in pounds.
pub type Mass = UomMass;

#[inline]
pub fn lb(v: f64) -> Mass {
    Mass::new::<pound>(v)
}

#[inline]
pub fn to_lb(m: Mass) -> f64 {
    m.get::<pound>()
}

/// Sum of `masses`; zero when empty.
pub fn total_mass(masses: impl IntoIterator<Item = Mass>) -> Mass {
    masses.into_iter().fold(lb(0.0), |acc, m| acc + m)
}

/// `#[serde(with = "bom_core::units::pounds")]`: a [`Mass`] on the wire as a
/// plain number of pounds.
#[cfg(feature = "serde")]
pub mod pounds {
    use super::{Mass, lb, to_lb};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Rounded to micro-pounds so unit conversion noise stays off the wire.
    pub fn serialize<S: Serializer>(mass: &Mass, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64((to_lb(*mass) * 1e6).round() / 1e6)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Mass, D::Error> {
        f64::deserialize(deserializer).map(lb)
    }
}
