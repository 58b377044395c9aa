use crate::errors::{Error, Result};

/// Validates reading measurements. Any finite value is accepted. SQLite
/// turns NaN into NULL and JSON has no representation for infinities.
pub fn validate(x: f64, y: f64, z: f64) -> Result<()> {
    for (axis, value) in [("x", x), ("y", y), ("z", z)] {
        if !value.is_finite() {
            return Err(Error::Validation(format!(
                "{} must be a finite number, got {}",
                axis, value
            )));
        }
    }

    Ok(())
}
