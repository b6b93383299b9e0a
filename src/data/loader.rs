use std::path::Path;

use anyhow::{bail, Context, Result};
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use super::fits;
use super::model::{Cube, CubeHeader};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a cube from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.fits` / `.fit` / `.fts` – primary HDU (recommended)
/// * `.json` – `{ "header": {...}, "shape": [n_vel, n_lat, n_lon], "data": [...] }`
///
/// The header must carry `CDELTn`, `CRVALn` and `CRPIXn` for n = 1..3.
pub fn load_cube(path: &Path) -> Result<Cube> {
    let (header, data) = match extension(path).as_str() {
        "fits" | "fit" | "fts" => load_fits(path)?,
        "json" => load_json(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::debug!("{}: shape {:?}, {} header cards", path.display(), data.shape(), header.len());

    Cube::from_header(data, header).with_context(|| format!("building cube from {}", path.display()))
}

/// Write raw cube data with its header.  Dispatch by extension, as for
/// [`load_cube`].
pub fn save_cube(path: &Path, header: &CubeHeader, data: &ArrayD<f64>) -> Result<()> {
    match extension(path).as_str() {
        "fits" | "fit" | "fts" => fits::write_primary(path, header, data)
            .with_context(|| format!("writing {}", path.display())),
        "json" => save_json(path, header, data),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// FITS
// ---------------------------------------------------------------------------

fn load_fits(path: &Path) -> Result<(CubeHeader, ArrayD<f64>)> {
    let image = fits::read_primary(path).with_context(|| format!("reading FITS file {}", path.display()))?;
    Ok((image.header, image.data))
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// JSON cube layout.  `data` is row-major over `shape`; `null` marks a
/// blank voxel.
///
/// ```json
/// {
///   "header": { "CRPIX1": 1, "CRVAL1": 120.0, "CDELT1": -0.5, ... },
///   "shape": [2, 1, 2],
///   "data": [0.1, 0.2, null, 0.4]
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
struct CubeDocument {
    header: CubeHeader,
    shape: Vec<usize>,
    data: Vec<Option<f64>>,
}

fn load_json(path: &Path) -> Result<(CubeHeader, ArrayD<f64>)> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let doc: CubeDocument = serde_json::from_str(&text).context("parsing JSON")?;

    let expected: usize = doc.shape.iter().product();
    if doc.data.len() != expected {
        bail!(
            "shape {:?} needs {expected} values but data has {}",
            doc.shape,
            doc.data.len()
        );
    }
    let values = doc.data.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
    let data = ArrayD::from_shape_vec(IxDyn(&doc.shape), values).context("shaping cube data")?;
    Ok((doc.header, data))
}

fn save_json(path: &Path, header: &CubeHeader, data: &ArrayD<f64>) -> Result<()> {
    let doc = CubeDocument {
        header: header.clone(),
        shape: data.shape().to_vec(),
        data: data
            .iter()
            .map(|&v| if v.is_nan() { None } else { Some(v) })
            .collect(),
    };
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer(std::io::BufWriter::new(file), &doc).context("writing JSON cube")?;
    Ok(())
}
