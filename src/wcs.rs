use serde::{Deserialize, Serialize};

use crate::data::model::CubeHeader;
use crate::error::{Result, SpectrumError};
use crate::sky::GalacticCoord;

/// Speed of light in km/s.
pub const SPEED_OF_LIGHT_KMS: f64 = 299_792.458;

/// Rest frequency of the 21 cm HI line in MHz.
pub const HI_REST_FREQUENCY_MHZ: f64 = 1420.405751786;

// ---------------------------------------------------------------------------
// AxisCalibration
//
// CRPIXn is one-based, pixel and channel indices are zero-based.
// ---------------------------------------------------------------------------

/// One linear axis: `CRPIXn`, `CRVALn` and `CDELTn`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisCalibration {
    /// One-based reference pixel (`CRPIXn`).
    pub ref_pixel: f64,
    /// World value at the reference pixel (`CRVALn`).
    pub ref_value: f64,
    /// World increment per pixel (`CDELTn`).
    pub step: f64,
}

impl AxisCalibration {
    pub fn new(ref_pixel: f64, ref_value: f64, step: f64) -> Self {
        Self {
            ref_pixel,
            ref_value,
            step,
        }
    }

    /// Read `CRPIXn`, `CRVALn` and `CDELTn` for `axis` (1-based).
    pub fn from_header(header: &CubeHeader, axis: usize) -> Result<Self> {
        Ok(Self::new(
            header.number(&format!("CRPIX{axis}"))?,
            header.number(&format!("CRVAL{axis}"))?,
            header.number(&format!("CDELT{axis}"))?,
        ))
    }

    fn checked(&self, axis: usize) -> Result<&Self> {
        if self.step == 0.0 {
            return Err(SpectrumError::InvalidAxisCalibration { axis });
        }
        Ok(self)
    }

    fn pixel_to_world(&self, pixel: f64) -> f64 {
        (pixel - self.ref_pixel + 1.0) * self.step + self.ref_value
    }

    fn world_to_pixel(&self, value: f64) -> f64 {
        (value - self.ref_value) / self.step + self.ref_pixel - 1.0
    }
}

/// Zero-based, possibly fractional pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelCoord {
    pub x: f64,
    pub y: f64,
}

impl PixelCoord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Truncate toward zero.
    pub fn truncate(&self) -> (i64, i64) {
        (self.x.trunc() as i64, self.y.trunc() as i64)
    }
}

// ---------------------------------------------------------------------------
// WcsModel
// ---------------------------------------------------------------------------

/// Axis 1 is Galactic longitude, axis 2 latitude, axis 3 velocity in m/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WcsModel {
    pub lon: AxisCalibration,
    pub lat: AxisCalibration,
    pub velocity: AxisCalibration,
}

impl WcsModel {
    pub fn new(lon: AxisCalibration, lat: AxisCalibration, velocity: AxisCalibration) -> Self {
        Self { lon, lat, velocity }
    }

    /// Read the three calibrations from a cube header.
    pub fn from_header(header: &CubeHeader) -> Result<Self> {
        Ok(Self::new(
            AxisCalibration::from_header(header, 1)?,
            AxisCalibration::from_header(header, 2)?,
            AxisCalibration::from_header(header, 3)?,
        ))
    }

    pub fn pixel_to_sky(&self, pixel: PixelCoord) -> Result<GalacticCoord> {
        let lon = self.lon.checked(1)?.pixel_to_world(pixel.x);
        let lat = self.lat.checked(2)?.pixel_to_world(pixel.y);
        Ok(GalacticCoord::new(lon, lat))
    }

    /// Fractional pixel position of a sky coordinate.
    pub fn sky_to_pixel(&self, sky: GalacticCoord) -> Result<PixelCoord> {
        let x = self.lon.checked(1)?.world_to_pixel(sky.lon_degrees);
        let y = self.lat.checked(2)?.world_to_pixel(sky.lat_degrees);
        Ok(PixelCoord::new(x, y))
    }

    /// Velocity in km/s of a zero-based channel; the axis is assumed in m/s.
    pub fn channel_to_velocity(&self, channel: usize) -> Result<f64> {
        Ok(self.velocity.checked(3)?.pixel_to_world(channel as f64) / 1000.0)
    }

    /// Velocities of channels `0..n_channels`.
    pub fn velocity_axis(&self, n_channels: usize) -> Result<Vec<f64>> {
        (0..n_channels)
            .map(|channel| self.channel_to_velocity(channel))
            .collect()
    }

    /// Channel width in km/s.
    pub fn channel_width(&self) -> Result<f64> {
        Ok(self.velocity.checked(3)?.step / 1000.0)
    }
}

/// Sky frequency (MHz) of a radio-convention velocity (km/s).
pub fn velocity_to_frequency_mhz(velocity_kms: f64, rest_mhz: f64) -> f64 {
    rest_mhz * (1.0 - velocity_kms / SPEED_OF_LIGHT_KMS)
}
