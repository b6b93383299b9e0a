mod app;
mod cli;
mod color;
mod state;
mod ui;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;

use hi_observe::{
    galactic_to_equatorial, load_cube, save_spectrum, EquatorialCoord, Extraction, Extractor,
    Location, LocationParseError, LogSink, ObserveConfig, SpectrumError, SpectrumStats,
};

fn main() -> ExitCode {
    env_logger::init();

    let args = match cli::Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            log::debug!("{e}");
            return usage();
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.downcast_ref::<LocationParseError>().is_some() => {
            eprintln!("{e}");
            usage()
        }
        Err(e) => match e.downcast_ref::<SpectrumError>() {
            Some(SpectrumError::NonCubicData { shape }) => {
                eprintln!("Your cube is not 3D: shape {shape:?}");
                ExitCode::from(2)
            }
            _ => {
                log::error!("{e:#}");
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn usage() -> ExitCode {
    eprintln!("Usage: {}", cli::USAGE);
    ExitCode::FAILURE
}

fn run(args: cli::Args) -> Result<()> {
    let location = Location::from_args(&args.position)?;
    let config = args.observe_config()?;

    let cube = load_cube(&args.cube)?;
    println!("Shape of cube: {:?}", cube.shape());

    let sink = LogSink;
    let extraction = Extractor::new(config.strategy)
        .with_log(&sink)
        .extract(&location, &cube)?;
    report(&location, &extraction, &config);

    let rest_mhz = config
        .rest_frequency_mhz
        .unwrap_or_else(|| cube.header().rest_frequency_mhz());

    if let Some(path) = &args.output {
        save_spectrum(path, &extraction, rest_mhz)?;
        log::info!("Wrote {} channels to {}", extraction.spectrum.len(), path.display());
    }

    if args.plot {
        let label = location.to_string();
        app::run_viewer(state::AppState::with_cube(cube, args.cube, config, label, extraction))
            .context("running viewer")?;
    }
    Ok(())
}

/// Console summary of an extraction.
fn report(location: &Location, extraction: &Extraction, config: &ObserveConfig) {
    let gal = extraction.galactic;
    println!("GLON/GLAT: {} {}", gal.lon_degrees, gal.lat_degrees);

    match galactic_to_equatorial(&gal) {
        Ok(eq) => println!(
            "RA/DEC: {} {}  ({})",
            eq.ra_degrees,
            eq.dec_degrees,
            EquatorialCoord::from_degrees(eq.ra_degrees, eq.dec_degrees)
        ),
        Err(e) => log::warn!("no RA/DEC for this position: {e}"),
    }

    match location {
        Location::Pixel(_) => println!("Pixel: {} {}", extraction.pixel.x, extraction.pixel.y),
        _ => println!(
            "Pixel: {} {} (converted from {location})",
            extraction.pixel.x, extraction.pixel.y
        ),
    }
    println!("Using {}", config.strategy);

    let stats = SpectrumStats::compute(&extraction.spectrum);
    println!("MinMax in velocities: {} {}", stats.velocity_min, stats.velocity_max);
    println!("Total flux: {}", stats.integrated_flux);
    if let Some((v, peak)) = stats.peak {
        println!("Peak: {peak} at {v} km/s");
    }
    println!(
        "Mean and RMS of {} points: {} {}",
        stats.n_channels, stats.mean, stats.rms
    );
}
