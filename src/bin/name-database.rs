use std::fs::File;
use std::io::{Read, Write};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Writer};
use nomenclature::*;
use tracing::*;

/// Read notations from `column` of the input CSV and write one
/// `notation,name,error` record per notation. Returns (named, failed).
fn name_records<R: Read, W: Write>(input: R, output: W, column: &str) -> Result<(usize, usize)> {
    let mut rdr = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(input);
    let index = rdr
        .headers()?
        .iter()
        .position(|header| header.trim() == column)
        .with_context(|| format!("No column named {:?} in input", column))?;

    let mut wtr = Writer::from_writer(output);
    wtr.write_record(["notation", "name", "error"])?;

    let (mut named, mut failed) = (0, 0);
    for result in rdr.records() {
        let record = result?;
        let notation = record.get(index).map(str::trim).unwrap_or_default();
        if notation.is_empty() {
            warn!("Skipping record without a notation: {:?}", record);
            continue;
        }
        match iupac_name(notation) {
            Ok(name) => {
                debug!("{} => {}", notation, name);
                wtr.write_record([notation, name.as_str(), ""])?;
                named += 1;
            }
            Err(e) => {
                warn!("Could not name {}: {}", notation, e);
                wtr.write_record([notation, "", e.to_string().as_str()])?;
                failed += 1;
            }
        }
    }
    wtr.flush()?;
    Ok((named, failed))
}

fn main() -> Result<()> {
    init_logging("info");
    let mut args = std::env::args().skip(1);
    let input_csv = args.next().unwrap_or_else(|| "molecules.csv".to_string());
    let output_csv = args.next().unwrap_or_else(|| "named-molecules.csv".to_string());
    let column = args.next().unwrap_or_else(|| "notation".to_string());

    let input = File::open(&input_csv).with_context(|| format!("Failed to open {}", input_csv))?;
    let output = File::create(&output_csv).with_context(|| format!("Failed to create {}", output_csv))?;
    let (named, failed) = name_records(input, output, &column)?;
    info!(
        "Named {} molecules from {} ({} failed), written to {}",
        named, input_csv, failed, output_csv
    );

    Ok(())
}
