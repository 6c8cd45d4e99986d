use anyhow::{bail, Context, Result};
use nomenclature::*;

const USAGE: &str = "usage: nomenclature [--log LEVEL] [--dot FILE] NOTATION...";

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let mut level = String::from("warn");
    let mut dot = None;
    let mut notations = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--log" => level = args.next().context("--log expects a level")?,
            "--dot" => dot = Some(args.next().context("--dot expects a file name")?),
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ => notations.push(arg),
        }
    }
    init_logging(&level);

    if notations.is_empty() {
        bail!(USAGE);
    }
    if dot.is_some() && notations.len() > 1 {
        bail!("--dot draws a single molecule, got {}", notations.len());
    }

    let mut failed = 0;
    for notation in &notations {
        let named = parse_smiles(notation).and_then(|molecule| {
            let name = molecule.to_iupac()?;
            Ok((molecule, name))
        });
        match named {
            Ok((molecule, name)) => {
                println!("{}\t{}", notation, name);
                if let Some(dot) = &dot {
                    molecule.visualize(dot, None)?;
                }
            }
            Err(e) => {
                eprintln!("{}\t{}", notation, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} notations could not be named", failed, notations.len());
    }
    Ok(())
}
