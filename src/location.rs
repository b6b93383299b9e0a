use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sky::{EquatorialCoord, GalacticCoord};
use crate::wcs::PixelCoord;

/// Where in the cube a spectrum is requested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    Pixel(PixelCoord),
    Galactic(GalacticCoord),
    Equatorial(EquatorialCoord),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationParseError {
    #[error("expected 2 or 4 position values, got {0}")]
    WrongArity(usize),
    #[error("'{value}' is not a valid {expected}")]
    BadNumber { value: String, expected: &'static str },
}

fn parse<T: std::str::FromStr>(
    value: &str,
    expected: &'static str,
) -> Result<T, LocationParseError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| LocationParseError::BadNumber {
            value: value.to_string(),
            expected,
        })
}

impl Location {
    /// Parse the positional values that follow the cube path.
    ///
    /// ```text
    ///   -x -y              pixel (values are negated to tell them apart)
    ///   glon glat          Galactic degrees
    ///   rah ram ras dec    equatorial, integers
    /// ```
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, LocationParseError> {
        match args {
            [x, y] if x.as_ref().trim_start().starts_with('-') => {
                let x: i64 = parse(x.as_ref(), "pixel index")?;
                let y: i64 = parse(y.as_ref(), "pixel index")?;
                Ok(Location::Pixel(PixelCoord::new(-(x as f64), -(y as f64))))
            }
            [glon, glat] => Ok(Location::Galactic(GalacticCoord::new(
                parse(glon.as_ref(), "longitude")?,
                parse(glat.as_ref(), "latitude")?,
            ))),
            [rah, ram, ras, dec] => Ok(Location::Equatorial(EquatorialCoord::new(
                parse(rah.as_ref(), "RA hour")?,
                parse(ram.as_ref(), "RA minute")?,
                parse::<i32>(ras.as_ref(), "RA second")? as f64,
                parse::<i32>(dec.as_ref(), "declination")? as f64,
            ))),
            other => Err(LocationParseError::WrongArity(other.len())),
        }
    }

    /// Same grammar over a whitespace separated string.
    pub fn parse_line(line: &str) -> Result<Self, LocationParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        Self::from_args(&parts)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Pixel(p) => write!(f, "pixel {} {}", p.x, p.y),
            Location::Galactic(g) => write!(f, "l={} b={}", g.lon_degrees, g.lat_degrees),
            Location::Equatorial(eq) => write!(f, "{eq}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negated_pair_is_a_pixel() {
        assert_eq!(
            Location::from_args(&["-12", "-7"]),
            Ok(Location::Pixel(PixelCoord::new(12.0, 7.0)))
        );
        assert_eq!(
            Location::from_args(&["-0", "-0"]),
            Ok(Location::Pixel(PixelCoord::new(0.0, 0.0)))
        );
    }

    #[test]
    fn float_pair_is_galactic() {
        assert_eq!(
            Location::from_args(&["83.886", "-2.67928"]),
            Ok(Location::Galactic(GalacticCoord::new(83.886, -2.67928)))
        );
    }

    #[test]
    fn four_integers_are_equatorial() {
        assert_eq!(
            Location::parse_line("21 0 0 42"),
            Ok(Location::Equatorial(EquatorialCoord::new(21, 0, 0.0, 42.0)))
        );
    }

    #[test]
    fn rejects_other_forms() {
        assert_eq!(
            Location::from_args(&["1", "2", "3"]),
            Err(LocationParseError::WrongArity(3))
        );
        assert_eq!(Location::parse_line(""), Err(LocationParseError::WrongArity(0)));
        assert!(matches!(
            Location::from_args(&["-1.5", "-2"]),
            Err(LocationParseError::BadNumber { .. })
        ));
        assert!(matches!(
            Location::from_args(&["21", "0", "0", "42.5"]),
            Err(LocationParseError::BadNumber { .. })
        ));
    }
}
