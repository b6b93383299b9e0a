use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use hi_observe::{ExtractionStrategy, ObserveConfig};

pub const USAGE: &str = "hi-observe <CUBE> <GLON> <GLAT>
       hi-observe <CUBE> -<XPOS> -<YPOS>
       hi-observe <CUBE> <RAH> <RAM> <RAS> <DEC>";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Extract an HI spectrum from a position-position-velocity cube",
    override_usage = USAGE
)]
pub struct Args {
    /// Data cube (.fits or .json)
    pub cube: PathBuf,

    /// GLON GLAT in degrees, -XPOS -YPOS pixels, or RAH RAM RAS DEC integers
    #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
    pub position: Vec<String>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Average a 3x3 neighbourhood with Gaussian width B (pixels)
    #[arg(long, value_name = "B")]
    pub neighborhood: Option<f64>,

    /// Write the spectrum to FILE (.csv, .json or .parquet)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Open the spectrum in the interactive viewer
    #[arg(long, default_value_t = false)]
    pub plot: bool,

    /// Lower edge of the plotted velocity range (km/s)
    #[arg(long, allow_negative_numbers = true)]
    pub vmin: Option<f64>,

    /// Upper edge of the plotted velocity range (km/s)
    #[arg(long, allow_negative_numbers = true)]
    pub vmax: Option<f64>,
}

impl Args {
    /// Configuration file (or defaults) with command-line overrides applied.
    pub fn observe_config(&self) -> Result<ObserveConfig> {
        let mut config = match &self.config {
            Some(path) => ObserveConfig::load(path)?,
            None => ObserveConfig::default(),
        };
        if let Some(b) = self.neighborhood {
            config.strategy = ExtractionStrategy::WeightedNeighborhood { b };
        }
        if let Some(vmin) = self.vmin {
            config.velocity_range[0] = vmin;
        }
        if let Some(vmax) = self.vmax {
            config.velocity_range[1] = vmax;
        }
        config.check()?;
        Ok(config)
    }
}
