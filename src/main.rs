use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};

use bids_unpack::core::types::{ModalityClass, RunNumber, RunSpec};
use bids_unpack::core::SessionManifest;
use bids_unpack::unpack::{convert, copy, dataset};

/// Unpack DICOM images into BIDS format for one subject and session.
#[derive(Parser, Debug)]
#[command(name = "bids-unpack", version, about)]
struct Cli {
    /// Subject ID (e.g. RPMS2001)
    #[arg(short, long)]
    sub: String,

    /// Session number
    #[arg(short = 'e', long)]
    sess: String,

    /// Project directory where the DICOM images are stored
    #[arg(short, long)]
    input_dir: PathBuf,

    /// Output directory for NIFTI and JSON files in BIDS layout
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Run number and BIDS filename of an anatomical scan (repeatable)
    #[arg(short, long, num_args = 2, value_names = ["RUN_NUM", "FILENAME"], action = ArgAction::Append)]
    anat: Vec<String>,

    /// Run number and BIDS filename of a functional scan (repeatable)
    #[arg(short, long, num_args = 2, value_names = ["RUN_NUM", "FILENAME"], action = ArgAction::Append)]
    func: Vec<String>,

    /// Run number and BIDS filename of a diffusion weighted scan (repeatable)
    #[arg(short, long, num_args = 2, value_names = ["RUN_NUM", "FILENAME"], action = ArgAction::Append)]
    dwi: Vec<String>,

    /// Run number and BIDS filename of a fieldmap (repeatable)
    #[arg(short = 'm', long, num_args = 2, value_names = ["RUN_NUM", "FILENAME"], action = ArgAction::Append)]
    fmap: Vec<String>,

    /// Comma-separated run numbers: a fieldmap run followed by the runs it
    /// corrects, e.g. `-n 3,1,2` (repeatable, one entry per fieldmap)
    #[arg(short = 'n', long, value_name = "RUNS", action = ArgAction::Append)]
    intended_for: Vec<String>,

    /// Project name for dataset_description.json
    #[arg(short, long, default_value = "A neuroimaging project")]
    proj_name: String,

    /// Version number and description of changes for the CHANGES log (repeatable)
    #[arg(short, long, num_args = 2, value_names = ["VERSION", "DESCRIPTION"], action = ArgAction::Append)]
    change: Vec<String>,
}

fn parse_association(raw: &str) -> Result<Vec<RunNumber>> {
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<RunNumber>()
                .with_context(|| format!("bad --intended-for entry '{raw}': '{part}' is not an integer"))
        })
        .collect()
}

fn build_manifest(cli: &Cli) -> Result<SessionManifest> {
    let mut manifest = SessionManifest::new(&cli.sub, &cli.sess);

    for (class, raw) in [
        (ModalityClass::Anat, &cli.anat),
        (ModalityClass::Func, &cli.func),
        (ModalityClass::Dwi, &cli.dwi),
        (ModalityClass::Fmap, &cli.fmap),
    ] {
        for pair in raw.chunks_exact(2) {
            manifest.add_run(class, RunSpec::new(&pair[0], &pair[1]))?;
        }
    }

    for raw in &cli.intended_for {
        manifest.add_intended_for(parse_association(raw)?)?;
    }

    Ok(manifest)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    println!("Running bids-unpack");

    let manifest = build_manifest(&cli)?;

    let subject = manifest.bids_subject();
    if subject.is_empty() {
        bail!("subject id '{}' contains no alphanumeric characters", cli.sub);
    }
    if subject != cli.sub {
        eprintln!(
            "WARNING: subject id '{}' is not BIDS compliant, using '{subject}' instead",
            cli.sub
        );
    }

    if manifest.intended_for.len() < manifest.fmap.len() {
        eprintln!(
            "WARNING: --intended-for not specified for all fieldmaps. Unspecified fieldmaps \
             will be IntendedFor ALL functional runs"
        );
    }

    // fail fast on bad filenames before anything touches the filesystem
    for advisory in manifest.check_filenames()? {
        eprintln!("WARNING: {advisory}");
    }
    let fmap_rows = manifest.resolve_intended_for()?;

    println!("Converting DICOMs to NII");
    let unpacked = convert::run_dcm2niix(&cli.input_dir)?;

    let session_dir = dataset::ensure_layout(&cli.output_dir, &subject, &cli.sess)?;
    dataset::write_dataset_description(&cli.output_dir, &cli.proj_name)?;
    dataset::write_readme(&cli.output_dir, &cli.proj_name)?;
    let change = cli
        .change
        .chunks_exact(2)
        .last()
        .map(|pair| (pair[0].as_str(), pair[1].as_str()));
    dataset::update_changes(&cli.output_dir, change)?;

    copy::copy_runs(&unpacked, &session_dir, ModalityClass::Anat, &manifest.anat, &fmap_rows)?;
    copy::copy_runs(&unpacked, &session_dir, ModalityClass::Fmap, &manifest.fmap, &fmap_rows)?;
    copy::copy_runs(&unpacked, &session_dir, ModalityClass::Func, &manifest.func, &fmap_rows)?;
    copy::copy_runs(&unpacked, &session_dir, ModalityClass::Dwi, &manifest.dwi, &fmap_rows)?;

    println!(
        "Done. We recommend running the output through a BIDS validator to double-check formatting."
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn association_entries_parse_comma_separated_integers() {
        assert_eq!(parse_association("3,1,2").unwrap(), vec![3, 1, 2]);
        assert_eq!(parse_association(" 4 , 5 ").unwrap(), vec![4, 5]);
        assert!(parse_association("3,x").is_err());
    }

    #[test]
    fn cli_collects_repeated_run_pairs() {
        let cli = Cli::parse_from([
            "bids-unpack",
            "--sub", "01",
            "--sess", "01",
            "--input-dir", "in",
            "--output-dir", "out",
            "-a", "2", "sub-01_T1w",
            "-f", "3", "sub-01_task-rest_bold",
            "-f", "4", "sub-01_task-mem_bold",
            "-n", "5,3,4",
        ]);
        let manifest = build_manifest(&cli).unwrap();
        assert_eq!(manifest.anat.len(), 1);
        assert_eq!(manifest.func.len(), 2);
        assert_eq!(manifest.func[1].name, "sub-01_task-mem_bold");
        assert_eq!(manifest.intended_for, vec![vec![5, 3, 4]]);
    }
}
