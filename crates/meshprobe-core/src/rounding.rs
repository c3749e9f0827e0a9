//! Decimal rounding helpers for displayed and exported coordinates.
//!
//! Values are nudged by one machine epsilon (relative) before rounding so that inputs such as
//! `1.005` round the way they read in decimal.

#![allow(clippy::cast_possible_wrap)]

fn scale(decimal_places: u32) -> f64 {
    10f64.powi(decimal_places as i32)
}

/// Rounds half away from zero to `decimal_places`.
pub fn round(value: f64, decimal_places: u32) -> f64 {
    let p = scale(decimal_places);
    let n = value * p * (1.0 + f64::EPSILON);
    n.round() / p
}

/// Rounds towards positive infinity at `decimal_places`.
pub fn ceil(value: f64, decimal_places: u32) -> f64 {
    let p = scale(decimal_places);
    let n = value * p * (1.0 - value.signum() * f64::EPSILON);
    n.ceil() / p
}

/// Rounds towards negative infinity at `decimal_places`.
pub fn floor(value: f64, decimal_places: u32) -> f64 {
    let p = scale(decimal_places);
    let n = value * p * (1.0 + value.signum() * f64::EPSILON);
    n.floor() / p
}

/// Rounds towards zero at `decimal_places`.
pub fn trunc(value: f64, decimal_places: u32) -> f64 {
    if value < 0.0 {
        ceil(value, decimal_places)
    } else {
        floor(value, decimal_places)
    }
}

/// Formats with exactly `decimal_places` digits after the point, rounding half away from zero.
pub fn to_fixed(value: f64, decimal_places: u32) -> String {
    format!(
        "{:.*}",
        decimal_places as usize,
        round(value, decimal_places)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round(1.005, 2), 1.01);
        assert_eq!(round(-1.005, 2), -1.01);
        assert_eq!(round(2.5, 0), 3.0);
        assert_eq!(round(1.234, 1), 1.2);
    }

    #[test]
    fn test_ceil_floor() {
        assert_eq!(ceil(1.231, 2), 1.24);
        assert_eq!(ceil(-1.239, 2), -1.23);
        assert_eq!(floor(1.239, 2), 1.23);
        assert_eq!(floor(-1.231, 2), -1.24);
    }

    #[test]
    fn test_trunc() {
        assert_eq!(trunc(1.239, 2), 1.23);
        assert_eq!(trunc(-1.239, 2), -1.23);
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(1.005, 2), "1.01");
        assert_eq!(to_fixed(3.0, 3), "3.000");
        assert_eq!(to_fixed(-0.5, 0), "-1");
    }
}
