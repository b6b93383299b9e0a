use thiserror::Error;

// ---------------------------------------------------------------------------
// Core error kinds
// ---------------------------------------------------------------------------

/// Failures of the coordinate / extraction core.
///
/// Every variant is deterministic given its inputs, so callers should report
/// rather than retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectrumError {
    /// Declination, latitude or RA components outside their valid range.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// A WCS axis has a zero step, so pixel <-> world inversion is undefined.
    #[error("axis {axis} has a zero step (CDELT{axis} = 0)")]
    InvalidAxisCalibration { axis: usize },

    /// A required header keyword is absent.
    #[error("missing calibration keyword {0}")]
    MissingCalibration(String),

    /// The data does not reduce to exactly three non-degenerate axes.
    #[error("data with shape {shape:?} is not a 3D cube")]
    NonCubicData { shape: Vec<usize> },

    /// Resolved pixel lies outside the spatial extent of the cube, or closer
    /// than `margin` pixels to an edge.
    #[error("pixel ({x}, {y}) is outside the usable {width}x{height} area (edge margin {margin})")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
        margin: usize,
    },
}

pub type Result<T> = std::result::Result<T, SpectrumError>;
