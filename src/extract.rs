use std::fmt;

use ndarray::{Array1, Array3, ArrayD, Axis, Ix3};
use serde::{Deserialize, Serialize};

use crate::data::model::{Cube, SpectrumResult};
use crate::error::{Result, SpectrumError};
use crate::events::{ExtractionEvent, ExtractionLog};
use crate::location::Location;
use crate::sky::{equatorial_to_galactic, GalacticCoord};
use crate::wcs::PixelCoord;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reduce raw data to a `[channel, lat, lon]` array.
///
/// Length-1 axes are dropped, outermost first, while more than three axes
/// remain. Anything that does not end up with exactly three non-empty axes is
/// rejected.
pub fn validate(data: ArrayD<f64>) -> Result<Array3<f64>> {
    let shape = data.shape().to_vec();
    let mut data = data;
    while data.ndim() > 3 {
        match data.shape().iter().position(|&n| n == 1) {
            Some(axis) => data = data.index_axis_move(Axis(axis), 0),
            None => break,
        }
    }
    if data.ndim() != 3 || data.shape().contains(&0) {
        return Err(SpectrumError::NonCubicData { shape });
    }
    data.into_dimensionality::<Ix3>()
        .map_err(|_| SpectrumError::NonCubicData { shape })
}

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// How intensities are gathered around the resolved pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum ExtractionStrategy {
    /// The resolved pixel only.
    #[default]
    SinglePixel,
    /// Gaussian-weighted 3x3 neighbourhood with width parameter `b` (pixels).
    WeightedNeighborhood { b: f64 },
}

impl ExtractionStrategy {
    /// Minimum distance from the cube edge the strategy needs.
    pub fn edge_margin(&self) -> usize {
        match self {
            ExtractionStrategy::SinglePixel => 0,
            ExtractionStrategy::WeightedNeighborhood { .. } => 1,
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionStrategy::SinglePixel => write!(f, "single pixel"),
            ExtractionStrategy::WeightedNeighborhood { b } => write!(f, "3x3 pixels with b={b}"),
        }
    }
}

/// Weights of the 3x3 neighbourhood: centre, edge-adjacent and diagonal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborhoodWeights {
    pub center: f64,
    pub side: f64,
    pub corner: f64,
}

impl NeighborhoodWeights {
    pub fn new(b: f64) -> Self {
        let side = (-1.0 / (b * b)).exp();
        Self {
            center: 1.0,
            side,
            corner: side * side,
        }
    }

    pub fn at(&self, dx: i64, dy: i64) -> f64 {
        match dx.abs() + dy.abs() {
            0 => self.center,
            1 => self.side,
            _ => self.corner,
        }
    }

    pub fn total(&self) -> f64 {
        self.center + 4.0 * self.side + 4.0 * self.corner
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Integer spatial pixel inside the cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelIndex {
    pub x: usize,
    pub y: usize,
}

/// A resolved request and its spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub pixel: PixelIndex,
    /// Requested sky position, or the position of the pixel for pixel input.
    pub galactic: GalacticCoord,
    pub spectrum: SpectrumResult,
}

/// Resolves locations against a cube and slices spectra out of it.
#[derive(Clone, Copy, Default)]
pub struct Extractor<'a> {
    strategy: ExtractionStrategy,
    log: Option<&'a dyn ExtractionLog>,
}

impl<'a> Extractor<'a> {
    pub fn new(strategy: ExtractionStrategy) -> Self {
        Self {
            strategy,
            log: None,
        }
    }

    pub fn with_log(mut self, log: &'a dyn ExtractionLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn strategy(&self) -> ExtractionStrategy {
        self.strategy
    }

    fn emit(&self, event: ExtractionEvent) {
        if let Some(log) = self.log {
            log.record(&event);
        }
    }

    /// Sky position (if any) and fractional pixel of a location.
    fn locate(&self, location: &Location, cube: &Cube) -> Result<(Option<GalacticCoord>, PixelCoord)> {
        let sky = match *location {
            Location::Pixel(pixel) => return Ok((None, pixel)),
            Location::Galactic(gal) => {
                gal.check()?;
                gal
            }
            Location::Equatorial(eq) => {
                let gal = equatorial_to_galactic(&eq)?;
                self.emit(ExtractionEvent::SkyConverted { from: eq, to: gal });
                gal
            }
        };
        let pixel = cube.wcs().sky_to_pixel(sky)?;
        self.emit(ExtractionEvent::PixelFromSky { sky, pixel });
        Ok((Some(sky), pixel))
    }

    fn to_index(&self, pixel: PixelCoord, cube: &Cube, margin: usize) -> Result<PixelIndex> {
        if !pixel.x.is_finite() || !pixel.y.is_finite() {
            return Err(SpectrumError::InvalidCoordinate(format!(
                "pixel position ({}, {}) is not finite",
                pixel.x, pixel.y
            )));
        }
        let (x, y) = pixel.truncate();
        check_bounds(x, y, cube, margin)
    }

    /// Integer pixel for a location, truncating toward zero.
    pub fn resolve_pixel(&self, location: &Location, cube: &Cube) -> Result<PixelIndex> {
        let (_, pixel) = self.locate(location, cube)?;
        let index = self.to_index(pixel, cube, 0)?;
        self.emit(ExtractionEvent::PixelResolved(index));
        Ok(index)
    }

    /// Spectrum and velocity axis at a spatial pixel.
    pub fn extract_spectrum(&self, cube: &Cube, pixel: PixelIndex) -> Result<SpectrumResult> {
        let margin = self.strategy.edge_margin();
        check_bounds(pixel.x as i64, pixel.y as i64, cube, margin)?;
        self.emit(ExtractionEvent::Strategy(self.strategy));

        let intensity = match self.strategy {
            ExtractionStrategy::SinglePixel => cube.line_of_sight(pixel.x, pixel.y).to_vec(),
            ExtractionStrategy::WeightedNeighborhood { b } => {
                weighted_neighborhood(cube, pixel, &NeighborhoodWeights::new(b)).to_vec()
            }
        };

        let wcs = cube.wcs();
        let velocity = wcs.velocity_axis(cube.n_channels())?;
        let channel_width = match velocity.as_slice() {
            [first, second, ..] => second - first,
            _ => wcs.channel_width()?,
        };

        let (min, max) = velocity
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        self.emit(ExtractionEvent::VelocityRange { min, max });

        Ok(SpectrumResult {
            velocity,
            intensity,
            channel_width,
        })
    }

    /// Resolve a location and extract its spectrum.
    pub fn extract(&self, location: &Location, cube: &Cube) -> Result<Extraction> {
        let (sky, pixel) = self.locate(location, cube)?;
        let index = self.to_index(pixel, cube, 0)?;
        self.emit(ExtractionEvent::PixelResolved(index));
        let galactic = match sky {
            Some(sky) => sky,
            None => cube
                .wcs()
                .pixel_to_sky(PixelCoord::new(index.x as f64, index.y as f64))?,
        };
        let spectrum = self.extract_spectrum(cube, index)?;
        Ok(Extraction {
            pixel: index,
            galactic,
            spectrum,
        })
    }
}

fn check_bounds(x: i64, y: i64, cube: &Cube, margin: usize) -> Result<PixelIndex> {
    let (width, height) = (cube.width(), cube.height());
    let m = margin as i64;
    if x < m || y < m || x >= width as i64 - m || y >= height as i64 - m {
        return Err(SpectrumError::OutOfBounds {
            x,
            y,
            width,
            height,
            margin,
        });
    }
    Ok(PixelIndex {
        x: x as usize,
        y: y as usize,
    })
}

/// Caller guarantees `pixel` is at least one pixel away from every edge.
fn weighted_neighborhood(cube: &Cube, pixel: PixelIndex, weights: &NeighborhoodWeights) -> Array1<f64> {
    let mut sum = Array1::<f64>::zeros(cube.n_channels());
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            let x = (pixel.x as i64 + dx) as usize;
            let y = (pixel.y as i64 + dy) as usize;
            sum.scaled_add(weights.at(dx, dy), &cube.line_of_sight(x, y));
        }
    }
    sum / weights.total()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
