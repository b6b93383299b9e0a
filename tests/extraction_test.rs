use std::path::{Path, PathBuf};

use approx::assert_abs_diff_eq;
use ndarray::{ArrayD, IxDyn};

use hi_observe::{
    load_cube, save_cube, save_spectrum, CubeHeader, ExtractionStrategy, Extractor, HeaderValue,
    Location, PixelIndex, SpectrumError, SpectrumStats,
};

const N_VEL: usize = 8;
const WIDTH: usize = 30;
const HEIGHT: usize = 20;

fn header() -> CubeHeader {
    let mut h = CubeHeader::new();
    for (axis, (crval, cdelt)) in [(80.0, 0.5), (-5.0, 0.5), (-100_000.0, 1000.0)]
        .into_iter()
        .enumerate()
    {
        let n = axis + 1;
        h.insert(&format!("CRPIX{n}"), HeaderValue::Float(1.0));
        h.insert(&format!("CRVAL{n}"), HeaderValue::Float(crval));
        h.insert(&format!("CDELT{n}"), HeaderValue::Float(cdelt));
    }
    h.insert("CTYPE4", HeaderValue::String("STOKES".into()));
    h
}

/// `[stokes, channel, lat, lon]` with intensity = 1000 * x + 10 * y + channel.
fn write_survey(dir: &Path) -> PathBuf {
    let data = ArrayD::from_shape_fn(IxDyn(&[1, N_VEL, HEIGHT, WIDTH]), |idx| {
        1000.0 * idx[3] as f64 + 10.0 * idx[2] as f64 + idx[1] as f64
    });
    let path = dir.join("survey.fits");
    save_cube(&path, &header(), &data).unwrap();
    path
}

#[test]
fn degenerate_stokes_axis_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let cube = load_cube(&write_survey(dir.path())).unwrap();
    assert_eq!(cube.shape(), (N_VEL, HEIGHT, WIDTH));
}

#[test]
fn all_location_forms_resolve() {
    let dir = tempfile::tempdir().unwrap();
    let cube = load_cube(&write_survey(dir.path())).unwrap();
    let ex = Extractor::default();

    let cases = [
        ("-3 -5", PixelIndex { x: 3, y: 5 }),
        ("84.2 -1.1", PixelIndex { x: 8, y: 7 }),
        ("21 0 0 42", PixelIndex { x: 7, y: 4 }),
    ];
    for (line, expected) in cases {
        let location = Location::parse_line(line).unwrap();
        let out = ex.extract(&location, &cube).unwrap();
        assert_eq!(out.pixel, expected, "{line}");
        assert_eq!(out.spectrum.len(), N_VEL);
        let base = 1000.0 * expected.x as f64 + 10.0 * expected.y as f64;
        for (c, &v) in out.spectrum.intensity.iter().enumerate() {
            assert_eq!(v, base + c as f64);
        }
    }
}

#[test]
fn velocity_axis_is_in_km_per_s() {
    let dir = tempfile::tempdir().unwrap();
    let cube = load_cube(&write_survey(dir.path())).unwrap();
    let out = Extractor::default()
        .extract(&Location::parse_line("-0 -0").unwrap(), &cube)
        .unwrap();
    assert_eq!(out.spectrum.velocity.first(), Some(&-100.0));
    assert_eq!(out.spectrum.velocity.last(), Some(&-93.0));
    assert_eq!(out.spectrum.channel_width, 1.0);
}

#[test]
fn flat_cube_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flat.fits");
    let data = ArrayD::from_elem(IxDyn(&[N_VEL, 5, 5]), 2.0);
    save_cube(&path, &header(), &data).unwrap();
    let cube = load_cube(&path).unwrap();

    for strategy in [
        ExtractionStrategy::SinglePixel,
        ExtractionStrategy::WeightedNeighborhood { b: 2.0 },
    ] {
        let out = Extractor::new(strategy)
            .extract(&Location::parse_line("-2 -2").unwrap(), &cube)
            .unwrap();
        let stats = SpectrumStats::compute(&out.spectrum);
        assert_eq!(stats.n_channels, N_VEL);
        assert_abs_diff_eq!(stats.mean, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.rms, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.integrated_flux, 16.0, epsilon = 1e-12);
    }
}

#[test]
fn non_cubic_data_is_reported_with_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("polarised.fits");
    save_cube(&path, &header(), &ArrayD::zeros(IxDyn(&[2, N_VEL, 4, 4]))).unwrap();

    let err = load_cube(&path).unwrap_err();
    assert_eq!(
        err.downcast_ref::<SpectrumError>(),
        Some(&SpectrumError::NonCubicData {
            shape: vec![2, N_VEL, 4, 4]
        })
    );
}

#[test]
fn positions_off_the_map_fail() {
    let dir = tempfile::tempdir().unwrap();
    let cube = load_cube(&write_survey(dir.path())).unwrap();
    let ex = Extractor::default();

    let err = ex
        .extract(&Location::parse_line("70 0").unwrap(), &cube)
        .unwrap_err();
    assert!(matches!(err, SpectrumError::OutOfBounds { x: -20, .. }));

    let err = ex
        .extract(&Location::parse_line("-30 -0").unwrap(), &cube)
        .unwrap_err();
    assert!(matches!(err, SpectrumError::OutOfBounds { x: 30, y: 0, .. }));
}

#[test]
fn extraction_exports_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let cube = load_cube(&write_survey(dir.path())).unwrap();
    let out = Extractor::default()
        .extract(&Location::parse_line("-3 -5").unwrap(), &cube)
        .unwrap();

    let csv_path = dir.path().join("spectrum.csv");
    save_spectrum(&csv_path, &out, cube.header().rest_frequency_mhz()).unwrap();
    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    assert_eq!(reader.records().count(), N_VEL);
}
