//! Write a synthetic HI survey cube for trying out `hi-observe`.
//!
//! The map is a Galactic longitude/latitude grid centred near the Cygnus
//! region, with a local emission component around 0 km/s and a fainter arm
//! component whose velocity drifts with longitude.
//!
//! Usage:
//! ```
//! cargo run --bin generate-cube -- --output sample_cube.fits
//! cargo run --bin hi-observe -- sample_cube.fits 21 0 0 42
//! ```

use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::Parser;
use ndarray::{Array3, Axis};

use hi_observe::{save_cube, CubeHeader, HeaderValue, HI_REST_FREQUENCY_MHZ};

#[derive(Parser)]
#[command(name = "generate-cube")]
#[command(about = "Write a synthetic position-position-velocity HI cube")]
#[command(version)]
struct Args {
    /// Output file (.fits or .json)
    #[arg(short, long, default_value = "sample_cube.fits")]
    output: PathBuf,

    /// Pixels along Galactic longitude
    #[arg(long, default_value_t = 41)]
    width: usize,

    /// Pixels along Galactic latitude
    #[arg(long, default_value_t = 21)]
    height: usize,

    /// Velocity channels
    #[arg(long, default_value_t = 244)]
    channels: usize,

    /// Longitude of the map centre in degrees
    #[arg(long, default_value_t = 84.0)]
    glon: f64,

    /// Latitude of the map centre in degrees
    #[arg(long, default_value_t = -2.5, allow_negative_numbers = true)]
    glat: f64,

    /// Add a degenerate Stokes axis, as single-dish survey cubes often carry
    #[arg(long)]
    stokes: bool,

    /// RMS of the added noise
    #[arg(long, default_value_t = 0.5)]
    noise: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const PIXEL_DEG: f64 = 0.5;
const V_START_MS: f64 = -200_000.0;
const DV_MS: f64 = 1030.5;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Brightness temperature at one sky position and velocity (km/s).
fn brightness(lon: f64, lat: f64, v: f64) -> f64 {
    let local = gaussian(v, 0.0, 8.0, 60.0 * (-lat.abs() / 6.0).exp());
    let arm_v = -45.0 - 0.8 * (lon - 80.0);
    let arm = gaussian(v, arm_v, 10.0, 25.0 * (-lat.abs() / 3.0).exp());
    local + arm
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn header(args: &Args) -> CubeHeader {
    let mut h = CubeHeader::new();
    let text = |s: &str| HeaderValue::String(s.to_string());

    h.insert("OBJECT", text("synthetic HI survey"));
    h.insert("BUNIT", text("K"));
    h.insert("RESTFREQ", HeaderValue::Float(HI_REST_FREQUENCY_MHZ * 1e6));

    // longitude increases to the left, as on the sky
    h.insert("CTYPE1", text("GLON-CAR"));
    h.insert("CRPIX1", HeaderValue::Float((args.width / 2 + 1) as f64));
    h.insert("CRVAL1", HeaderValue::Float(args.glon));
    h.insert("CDELT1", HeaderValue::Float(-PIXEL_DEG));

    h.insert("CTYPE2", text("GLAT-CAR"));
    h.insert("CRPIX2", HeaderValue::Float((args.height / 2 + 1) as f64));
    h.insert("CRVAL2", HeaderValue::Float(args.glat));
    h.insert("CDELT2", HeaderValue::Float(PIXEL_DEG));

    h.insert("CTYPE3", text("VELO-LSR"));
    h.insert("CRPIX3", HeaderValue::Float(1.0));
    h.insert("CRVAL3", HeaderValue::Float(V_START_MS));
    h.insert("CDELT3", HeaderValue::Float(DV_MS));

    if args.stokes {
        h.insert("CTYPE4", text("STOKES"));
        h.insert("CRPIX4", HeaderValue::Float(1.0));
        h.insert("CRVAL4", HeaderValue::Float(1.0));
        h.insert("CDELT4", HeaderValue::Float(1.0));
    }
    h
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    ensure!(
        args.width > 0 && args.height > 0 && args.channels > 0,
        "cube dimensions must be positive"
    );

    let mut rng = SimpleRng::new(args.seed);
    let x0 = (args.width / 2) as f64;
    let y0 = (args.height / 2) as f64;

    let cube = Array3::from_shape_fn((args.channels, args.height, args.width), |(c, y, x)| {
        let lon = args.glon - (x as f64 - x0) * PIXEL_DEG;
        let lat = args.glat + (y as f64 - y0) * PIXEL_DEG;
        let v = (V_START_MS + c as f64 * DV_MS) / 1000.0;
        brightness(lon, lat, v) + rng.gauss(0.0, args.noise)
    });

    let mut data = cube.into_dyn();
    if args.stokes {
        data = data.insert_axis(Axis(0));
    }

    save_cube(&args.output, &header(&args), &data)?;
    println!(
        "Wrote {:?} cube to {}",
        data.shape(),
        args.output.display()
    );
    Ok(())
}
