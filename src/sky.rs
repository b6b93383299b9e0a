use std::fmt;

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectrumError};

/// Rotation taking ICRS unit vectors into the Galactic frame.
///
/// Rows are the Galactic x (toward l=0, b=0), y (toward l=90) and z (north
/// Galactic pole) axes expressed in ICRS. Liu, Zhu & Zhang (2011), A&A 526, A16.
#[allow(clippy::excessive_precision)]
const ICRS_TO_GALACTIC: [f64; 9] = [
    -0.054875560416215368492398900454,
    -0.873437090234885048760383168409,
    -0.483835015548713226831774175116,
    0.494109427875583673525222371358,
    -0.444829629960011178146614061616,
    0.746982244497218890527388004556,
    -0.867666149019004701181616534570,
    -0.198076373431201528180486091412,
    0.455983776175066922272100478348,
];

fn icrs_to_galactic() -> Matrix3<f64> {
    Matrix3::from_row_slice(&ICRS_TO_GALACTIC)
}

// ---------------------------------------------------------------------------
// Coordinate value types
// ---------------------------------------------------------------------------

/// Equatorial position with RA in hour/minute/second form (LST convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquatorialCoord {
    pub ra_hours: i32,
    pub ra_minutes: i32,
    pub ra_seconds: f64,
    pub dec_degrees: f64,
}

impl EquatorialCoord {
    pub fn new(ra_hours: i32, ra_minutes: i32, ra_seconds: f64, dec_degrees: f64) -> Self {
        Self {
            ra_hours,
            ra_minutes,
            ra_seconds,
            dec_degrees,
        }
    }

    /// Split a decimal RA (degrees) into hours, minutes and seconds, rounded
    /// to the nearest hundredth of a second.
    pub fn from_degrees(ra_degrees: f64, dec_degrees: f64) -> Self {
        const CENTISECONDS_PER_DAY: i64 = 24 * 3600 * 100;
        let hours = ra_degrees.rem_euclid(360.0) / 15.0;
        let cs = (hours * 360_000.0).round() as i64 % CENTISECONDS_PER_DAY;
        let h = cs / 360_000;
        let m = cs / 6000 % 60;
        let s = (cs % 6000) as f64 / 100.0;
        Self::new(h as i32, m as i32, s, dec_degrees)
    }

    /// Right ascension in decimal degrees.
    pub fn ra_degrees(&self) -> f64 {
        15.0 * (self.ra_hours as f64
            + self.ra_minutes as f64 / 60.0
            + self.ra_seconds / 3600.0)
    }

    fn check(&self) -> Result<()> {
        if !(0..=24).contains(&self.ra_hours) {
            return Err(SpectrumError::InvalidCoordinate(format!(
                "RA hours {} outside [0, 24]",
                self.ra_hours
            )));
        }
        if !(0..60).contains(&self.ra_minutes) {
            return Err(SpectrumError::InvalidCoordinate(format!(
                "RA minutes {} outside [0, 60)",
                self.ra_minutes
            )));
        }
        if !(0.0..60.0).contains(&self.ra_seconds) {
            return Err(SpectrumError::InvalidCoordinate(format!(
                "RA seconds {} outside [0, 60)",
                self.ra_seconds
            )));
        }
        check_latitude("declination", self.dec_degrees)
    }
}

impl fmt::Display for EquatorialCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}h{:02}m{:05.2}s {:+.4}",
            self.ra_hours, self.ra_minutes, self.ra_seconds, self.dec_degrees
        )
    }
}

/// Equatorial position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaDec {
    pub ra_degrees: f64,
    pub dec_degrees: f64,
}

/// Galactic longitude / latitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GalacticCoord {
    pub lon_degrees: f64,
    pub lat_degrees: f64,
}

impl GalacticCoord {
    pub fn new(lon_degrees: f64, lat_degrees: f64) -> Self {
        Self {
            lon_degrees,
            lat_degrees,
        }
    }

    /// Finite longitude, latitude within [-90, 90].
    pub(crate) fn check(&self) -> Result<()> {
        if !self.lon_degrees.is_finite() {
            return Err(SpectrumError::InvalidCoordinate(format!(
                "longitude {} is not finite",
                self.lon_degrees
            )));
        }
        check_latitude("latitude", self.lat_degrees)
    }
}

fn check_latitude(what: &str, degrees: f64) -> Result<()> {
    if !degrees.is_finite() || degrees.abs() > 90.0 {
        return Err(SpectrumError::InvalidCoordinate(format!(
            "{what} {degrees} outside [-90, 90]"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Spherical helpers
// ---------------------------------------------------------------------------

fn unit_vector(lon_deg: f64, lat_deg: f64) -> Vector3<f64> {
    let (lon, lat) = (lon_deg.to_radians(), lat_deg.to_radians());
    Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

/// Returns (longitude in [0, 360), latitude) in degrees.
fn spherical(v: &Vector3<f64>) -> (f64, f64) {
    let lon = v.y.atan2(v.x).to_degrees().rem_euclid(360.0);
    let lat = v.z.clamp(-1.0, 1.0).asin().to_degrees();
    (lon, lat)
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

/// Convert an hour-angle-form equatorial position to Galactic coordinates.
///
/// RA/Dec is taken at face value: no precession or equinox correction is
/// applied.
pub fn equatorial_to_galactic(eq: &EquatorialCoord) -> Result<GalacticCoord> {
    eq.check()?;
    let v = icrs_to_galactic() * unit_vector(eq.ra_degrees(), eq.dec_degrees);
    let (lon, lat) = spherical(&v);
    Ok(GalacticCoord::new(lon, lat))
}

/// Convert Galactic coordinates to decimal RA/Dec.
pub fn galactic_to_equatorial(gal: &GalacticCoord) -> Result<RaDec> {
    gal.check()?;
    let v = icrs_to_galactic().transpose() * unit_vector(gal.lon_degrees, gal.lat_degrees);
    let (ra, dec) = spherical(&v);
    Ok(RaDec {
        ra_degrees: ra,
        dec_degrees: dec,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn angle_diff(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn known_fixture_to_galactic() {
        let gal = equatorial_to_galactic(&EquatorialCoord::new(21, 0, 0.0, 42.0)).unwrap();
        assert_abs_diff_eq!(gal.lon_degrees, 83.886, epsilon = 1e-2);
        assert_abs_diff_eq!(gal.lat_degrees, -2.67928, epsilon = 1e-2);
    }

    #[test]
    fn known_fixture_to_equatorial() {
        let eq = galactic_to_equatorial(&GalacticCoord::new(83.886, -2.67928)).unwrap();
        assert_abs_diff_eq!(eq.ra_degrees, 315.0, epsilon = 1e-1);
        assert_abs_diff_eq!(eq.dec_degrees, 42.0, epsilon = 1e-1);
    }

    #[test]
    fn round_trip_reproduces_input() {
        let cases = [
            EquatorialCoord::new(21, 0, 0.0, 42.0),
            EquatorialCoord::new(5, 35, 17.3, -5.39),
            EquatorialCoord::new(12, 10, 30.0, 52.0),
            EquatorialCoord::new(17, 45, 40.0, -29.0),
            EquatorialCoord::new(0, 30, 0.0, 85.5),
            EquatorialCoord::new(23, 59, 0.0, -70.0),
        ];
        for eq in cases {
            let gal = equatorial_to_galactic(&eq).unwrap();
            let back = galactic_to_equatorial(&gal).unwrap();
            assert!(angle_diff(back.ra_degrees, eq.ra_degrees()) < 1e-3, "{eq}");
            assert_abs_diff_eq!(back.dec_degrees, eq.dec_degrees, epsilon = 1e-3);
        }
    }

    #[test]
    fn galactic_center_lands_in_sagittarius() {
        let eq = galactic_to_equatorial(&GalacticCoord::new(0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(eq.ra_degrees, 266.405, epsilon = 1e-2);
        assert_abs_diff_eq!(eq.dec_degrees, -28.936, epsilon = 1e-2);
    }

    #[test]
    fn rejects_out_of_range_declination() {
        let err = equatorial_to_galactic(&EquatorialCoord::new(1, 0, 0.0, 91.0)).unwrap_err();
        assert!(matches!(err, SpectrumError::InvalidCoordinate(_)));
        let err = galactic_to_equatorial(&GalacticCoord::new(10.0, -90.5)).unwrap_err();
        assert!(matches!(err, SpectrumError::InvalidCoordinate(_)));
    }

    #[test]
    fn rejects_bad_ra_components() {
        assert!(equatorial_to_galactic(&EquatorialCoord::new(25, 0, 0.0, 0.0)).is_err());
        assert!(equatorial_to_galactic(&EquatorialCoord::new(3, 61, 0.0, 0.0)).is_err());
        assert!(equatorial_to_galactic(&EquatorialCoord::new(3, 0, -1.0, 0.0)).is_err());
    }

    #[test]
    fn from_degrees_splits_sexagesimal() {
        let eq = EquatorialCoord::from_degrees(315.0, 42.0);
        assert_eq!((eq.ra_hours, eq.ra_minutes), (21, 0));
        assert_abs_diff_eq!(eq.ra_seconds, 0.0, epsilon = 1e-6);

        let eq = EquatorialCoord::from_degrees(182.625, -3.0);
        assert_eq!((eq.ra_hours, eq.ra_minutes), (12, 10));
        assert_abs_diff_eq!(eq.ra_seconds, 30.0, epsilon = 1e-6);
        assert_abs_diff_eq!(eq.ra_degrees(), 182.625, epsilon = 1e-9);
    }

    #[test]
    fn from_degrees_carries_rounded_seconds() {
        let eq = EquatorialCoord::from_degrees(359.999_999_9, 0.0);
        assert_eq!((eq.ra_hours, eq.ra_minutes, eq.ra_seconds), (0, 0, 0.0));

        // 10h59m59.999s
        let eq = EquatorialCoord::from_degrees(164.999_995_833, 12.0);
        assert_eq!((eq.ra_hours, eq.ra_minutes, eq.ra_seconds), (11, 0, 0.0));
        assert_eq!(eq.to_string(), "11h00m00.00s +12.0000");
    }
}
