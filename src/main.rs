use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, bail};
use shaded_dem_rs::dem_pipeline::{ExportConfig, ImageToDemPipeline, TiffCompression};
use shaded_dem_rs::logger;

use tracing::{error, info};

const USAGE: &str = "usage: shaded-dem <input> <output_dir> [job_id] [key=value ...]";

fn main() -> anyhow::Result<()> {
    logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output_dir)) = (args.next(), args.next()) else {
        bail!(USAGE);
    };
    let input = PathBuf::from(input);

    let mut job_id = None;
    let mut fields = HashMap::new();
    for arg in args {
        match arg.split_once('=') {
            Some((key, value)) => {
                fields.insert(key.to_string(), value.to_string());
            }
            None if job_id.is_none() => job_id = Some(arg),
            None => bail!("unexpected argument {:?}\n{}", arg, USAGE),
        }
    }
    let job_id = match job_id {
        Some(id) => id,
        None => input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .context("input path has no file name")?,
    };

    info!("Starting shaded-dem...");

    let config = ExportConfig::builder()
        .compression(TiffCompression::DeflateBalanced)
        .build();
    let pipeline = ImageToDemPipeline::new(config);

    info!(job_id = %job_id, input = %input.display(), "Processing");
    let bundle = pipeline.process_form(&input, &output_dir, &job_id, &fields);

    println!("{}", bundle.to_json()?);

    if !bundle.is_success() {
        error!("Job {} failed", job_id);
        std::process::exit(1);
    }
    info!("Wrote {} artifacts to {}", bundle.artifacts.len(), output_dir);
    Ok(())
}
