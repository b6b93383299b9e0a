use crate::extract::{ExtractionStrategy, PixelIndex};
use crate::sky::{EquatorialCoord, GalacticCoord};
use crate::wcs::PixelCoord;

/// One step of an extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionEvent {
    /// Equatorial input converted to Galactic.
    SkyConverted {
        from: EquatorialCoord,
        to: GalacticCoord,
    },
    /// Sky input mapped to a fractional pixel by the WCS.
    PixelFromSky {
        sky: GalacticCoord,
        pixel: PixelCoord,
    },
    /// Integer pixel the spectrum is taken at.
    PixelResolved(PixelIndex),
    /// Strategy used to slice the cube.
    Strategy(ExtractionStrategy),
    /// Velocity coverage of the extracted spectrum, km/s.
    VelocityRange { min: f64, max: f64 },
}

/// Receives the steps of an extraction. The core never prints; hand one to
/// [`Extractor::with_log`](crate::extract::Extractor::with_log).
pub trait ExtractionLog {
    fn record(&self, event: &ExtractionEvent);
}

/// Forwards events to `log::debug!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ExtractionLog for LogSink {
    fn record(&self, event: &ExtractionEvent) {
        match event {
            ExtractionEvent::SkyConverted { from, to } => log::debug!(
                "equatorial={from} glon={} glat={}",
                to.lon_degrees,
                to.lat_degrees
            ),
            ExtractionEvent::PixelFromSky { sky, pixel } => log::debug!(
                "glon={} glat={} pixel_x={} pixel_y={}",
                sky.lon_degrees,
                sky.lat_degrees,
                pixel.x,
                pixel.y
            ),
            ExtractionEvent::PixelResolved(p) => log::debug!("pixel x={} y={}", p.x, p.y),
            ExtractionEvent::Strategy(s) => log::debug!("strategy={s}"),
            ExtractionEvent::VelocityRange { min, max } => {
                log::debug!("velocity_min={min} velocity_max={max}")
            }
        }
    }
}
