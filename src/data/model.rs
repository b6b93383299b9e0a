use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array3, ArrayD, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectrumError};
use crate::extract::validate;
use crate::wcs::{WcsModel, HI_REST_FREQUENCY_MHZ};

// ---------------------------------------------------------------------------
// HeaderValue – a single header card value
// ---------------------------------------------------------------------------

/// A header card value as found in FITS headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderValue::String(s) => write!(f, "{s}"),
            HeaderValue::Integer(i) => write!(f, "{i}"),
            HeaderValue::Float(v) => write!(f, "{v}"),
            HeaderValue::Bool(b) => write!(f, "{}", if *b { "T" } else { "F" }),
        }
    }
}

impl HeaderValue {
    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HeaderValue::Float(v) => Some(*v),
            HeaderValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            HeaderValue::String(s) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// CubeHeader
// ---------------------------------------------------------------------------

/// Header keywords of a cube, upper-cased.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CubeHeader {
    cards: BTreeMap<String, HeaderValue>,
}

impl CubeHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: HeaderValue) {
        self.cards.insert(key.to_ascii_uppercase(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<HeaderValue> {
        self.cards.remove(&key.to_ascii_uppercase())
    }

    pub fn get(&self, key: &str) -> Option<&HeaderValue> {
        self.cards.get(&key.to_ascii_uppercase())
    }

    /// Numeric keyword lookup; absent or non-numeric keys are missing calibration.
    pub fn number(&self, key: &str) -> Result<f64> {
        self.get(key)
            .and_then(HeaderValue::as_f64)
            .ok_or_else(|| SpectrumError::MissingCalibration(key.to_ascii_uppercase()))
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(HeaderValue::as_str)
    }

    /// Rest frequency in MHz from `RESTFREQ`/`RESTFRQ` (Hz), else the HI line.
    pub fn rest_frequency_mhz(&self) -> f64 {
        ["RESTFREQ", "RESTFRQ"]
            .iter()
            .find_map(|key| self.get(key).and_then(HeaderValue::as_f64))
            .filter(|hz| *hz > 0.0)
            .map(|hz| hz / 1.0e6)
            .unwrap_or(HI_REST_FREQUENCY_MHZ)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HeaderValue)> {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Cube – position-position-velocity data
// ---------------------------------------------------------------------------

/// A validated 3D cube indexed `[channel, lat_pixel, lon_pixel]`.
///
/// Read-only once built; share it by reference.
#[derive(Debug, Clone)]
pub struct Cube {
    data: Array3<f64>,
    wcs: WcsModel,
    header: CubeHeader,
}

impl Cube {
    /// Validate the raw array and attach its calibration.
    pub fn new(data: ArrayD<f64>, wcs: WcsModel, header: CubeHeader) -> Result<Self> {
        Ok(Self {
            data: validate(data)?,
            wcs,
            header,
        })
    }

    /// Build from a header carrying the `CDELTn/CRVALn/CRPIXn` keywords.
    ///
    /// The shape is checked before any keyword is read.
    pub fn from_header(data: ArrayD<f64>, header: CubeHeader) -> Result<Self> {
        let data = validate(data)?;
        let wcs = WcsModel::from_header(&header)?;
        Ok(Self { data, wcs, header })
    }

    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn wcs(&self) -> &WcsModel {
        &self.wcs
    }

    pub fn header(&self) -> &CubeHeader {
        &self.header
    }

    /// `(n_vel, n_lat_pix, n_lon_pix)`
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn n_channels(&self) -> usize {
        self.data.dim().0
    }

    /// Number of longitude pixels.
    pub fn width(&self) -> usize {
        self.data.dim().2
    }

    /// Number of latitude pixels.
    pub fn height(&self) -> usize {
        self.data.dim().1
    }

    /// Intensities along the velocity axis at a spatial pixel.
    pub(crate) fn line_of_sight(&self, x: usize, y: usize) -> ArrayView1<'_, f64> {
        self.data.slice(ndarray::s![.., y, x])
    }
}

// ---------------------------------------------------------------------------
// SpectrumResult – velocity / intensity pair
// ---------------------------------------------------------------------------

/// An extracted spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumResult {
    /// Doppler velocity in km/s, one per channel.
    pub velocity: Vec<f64>,
    /// Intensity, same length as `velocity`.
    pub intensity: Vec<f64>,
    /// Velocity spacing in km/s.
    pub channel_width: f64,
}

impl SpectrumResult {
    pub fn len(&self) -> usize {
        self.intensity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensity.is_empty()
    }

    /// `(velocity, intensity)` pairs in channel order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.velocity
            .iter()
            .copied()
            .zip(self.intensity.iter().copied())
    }
}
