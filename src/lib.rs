//! # hi-observe
//!
//! Extract an HI spectrum (brightness vs. Doppler velocity) from a
//! position-position-velocity cube at a pixel, a Galactic position or an
//! LST/Dec pointing.
//!
//! ```no_run
//! use std::path::Path;
//! use hi_observe::{load_cube, Extractor, Location, SpectrumStats};
//!
//! let cube = load_cube(Path::new("BL.fits")).unwrap();
//! let location = Location::parse_line("21 0 0 42").unwrap();
//! let extraction = Extractor::default().extract(&location, &cube).unwrap();
//! let stats = SpectrumStats::compute(&extraction.spectrum);
//! println!("Mean and RMS of {} points: {} {}", stats.n_channels, stats.mean, stats.rms);
//! ```
//!
//! RA/Dec positions are used as given: no equinox or epoch correction is
//! applied.

pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod extract;
pub mod location;
pub mod sky;
pub mod wcs;

pub use config::ObserveConfig;
pub use data::export::save_spectrum;
pub use data::loader::{load_cube, save_cube};
pub use data::model::{Cube, CubeHeader, HeaderValue, SpectrumResult};
pub use data::stats::SpectrumStats;
pub use error::SpectrumError;
pub use events::{ExtractionEvent, ExtractionLog, LogSink};
pub use extract::{validate, Extraction, ExtractionStrategy, Extractor, PixelIndex};
pub use location::{Location, LocationParseError};
pub use sky::{equatorial_to_galactic, galactic_to_equatorial, EquatorialCoord, GalacticCoord, RaDec};
pub use wcs::{
    velocity_to_frequency_mhz, AxisCalibration, PixelCoord, WcsModel, HI_REST_FREQUENCY_MHZ,
    SPEED_OF_LIGHT_KMS,
};
