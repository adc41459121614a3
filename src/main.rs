use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use beatmix::error::{Error, Result};
use beatmix::table::LoadError;
use beatmix::{PipelineParams, RecordTable};
use structopt::StructOpt;

/// Cluster geolocated records by beat code with a Gaussian mixture
#[derive(Debug, StructOpt)]
#[structopt(name = "beatmix")]
struct Options {
    /// Records to cluster, a `.csv` file or a `.json` object or array of objects
    #[structopt(parse(from_os_str))]
    input: PathBuf,
    #[structopt(long = "min-points")]
    /// Desired minimum number of points per cluster, only used together with --max-points
    min_points: Option<i64>,
    #[structopt(long = "max-points")]
    /// Desired maximum number of points per cluster, only used together with --min-points
    max_points: Option<i64>,
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    /// Write the result to this file instead of stdout
    output: Option<PathBuf>,
    #[structopt(long = "summary")]
    /// Output the full report (cluster count and per-cluster summary) instead of the records
    summary: bool,
    #[structopt(long = "seed", default_value = "42")]
    /// Seed of the mixture initialization
    seed: u64,
    #[structopt(long = "max-rows", default_value = "1000000")]
    /// Refuse inputs with more rows than this
    max_rows: usize,
    #[structopt(long = "max-clusters", default_value = "10000")]
    /// Refuse requests that would need more clusters than this
    max_clusters: usize,
}

fn load(path: &Path) -> Result<RecordTable> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    let table = match extension.as_deref() {
        Some("csv") => {
            let file = File::open(path).map_err(LoadError::from)?;
            RecordTable::from_csv_reader(BufReader::new(file))?
        }
        Some("json") => {
            let file = File::open(path).map_err(LoadError::from)?;
            RecordTable::from_json_reader(BufReader::new(file))?
        }
        _ => {
            return Err(Error::Parameters(format!(
                "unsupported input format `{}`, expected a .csv or .json file",
                path.display()
            )))
        }
    };
    tracing::debug!(
        path = %path.display(),
        n_rows = table.nrows(),
        n_columns = table.ncols(),
        "input loaded"
    );
    Ok(table)
}

fn write_json(output: Option<&Path>, value: &impl serde::Serialize) -> io::Result<()> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()
}

fn run(opt: &Options) -> Result<()> {
    let table = load(&opt.input)?;
    let report = PipelineParams::new()
        .min_points(opt.min_points)
        .max_points(opt.max_points)
        .seed(opt.seed)
        .max_rows(opt.max_rows)
        .max_clusters(opt.max_clusters)
        .run(table)?;

    let written = if opt.summary {
        write_json(opt.output.as_deref(), &report)
    } else {
        write_json(opt.output.as_deref(), &report.records)
    };
    written.map_err(|err| Error::Internal(format!("could not write output: {}", err)))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beatmix=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let opt = Options::from_args();
    if let Err(err) = run(&opt) {
        tracing::error!(caller_error = err.is_caller_error(), "{}", err);
        process::exit(if err.is_caller_error() { 2 } else { 1 });
    }
}
