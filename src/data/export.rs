use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use super::stats::SpectrumStats;
use crate::extract::{Extraction, PixelIndex};
use crate::sky::GalacticCoord;
use crate::wcs::velocity_to_frequency_mhz;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Write an extracted spectrum to a file.  Dispatch by extension.
///
/// Every format carries one row per channel with the channel index, the
/// Doppler velocity (km/s), the sky frequency (MHz, radio convention about
/// `rest_mhz`) and the intensity.
/// * `.csv`     – plain columns
/// * `.json`    – columns plus position and summary statistics
/// * `.parquet` – Float64 / Int64 columns
pub fn save_spectrum(path: &Path, extraction: &Extraction, rest_mhz: f64) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = channel_rows(extraction, rest_mhz);
    let written = match ext.as_str() {
        "csv" => save_csv(path, &rows),
        "json" => save_json(path, extraction, rest_mhz, &rows),
        "parquet" | "pq" => save_parquet(path, &rows),
        other => bail!("Unsupported export extension: .{other}"),
    };
    written.with_context(|| format!("exporting spectrum to {}", path.display()))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct ChannelRow {
    channel: usize,
    velocity_kms: f64,
    frequency_mhz: f64,
    intensity: f64,
}

fn channel_rows(extraction: &Extraction, rest_mhz: f64) -> Vec<ChannelRow> {
    extraction
        .spectrum
        .points()
        .enumerate()
        .map(|(channel, (velocity_kms, intensity))| ChannelRow {
            channel,
            velocity_kms,
            frequency_mhz: velocity_to_frequency_mhz(velocity_kms, rest_mhz),
            intensity,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn save_csv(path: &Path, rows: &[ChannelRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SpectrumDocument<'a> {
    pixel: PixelIndex,
    galactic: GalacticCoord,
    rest_frequency_mhz: f64,
    stats: SpectrumStats,
    channels: &'a [ChannelRow],
}

fn save_json(path: &Path, extraction: &Extraction, rest_mhz: f64, rows: &[ChannelRow]) -> Result<()> {
    let doc = SpectrumDocument {
        pixel: extraction.pixel,
        galactic: extraction.galactic,
        rest_frequency_mhz: rest_mhz,
        stats: SpectrumStats::compute(&extraction.spectrum),
        channels: rows,
    };
    let file = std::fs::File::create(path).context("creating JSON file")?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), &doc).context("writing JSON")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

fn save_parquet(path: &Path, rows: &[ChannelRow]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("channel", DataType::Int64, false),
        Field::new("velocity_kms", DataType::Float64, false),
        Field::new("frequency_mhz", DataType::Float64, false),
        Field::new("intensity", DataType::Float64, false),
    ]));

    let channel = Int64Array::from_iter_values(rows.iter().map(|r| r.channel as i64));
    let velocity = Float64Array::from_iter_values(rows.iter().map(|r| r.velocity_kms));
    let frequency = Float64Array::from_iter_values(rows.iter().map(|r| r.frequency_mhz));
    let intensity = Float64Array::from_iter_values(rows.iter().map(|r| r.intensity));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(channel),
        Arc::new(velocity),
        Arc::new(frequency),
        Arc::new(intensity),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
