use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;

use analyze_quality::config::{DEFAULT_MAX_DETAIL_VALUES, ProfileConfig};
use analyze_quality::ingest::{ReadOptions, read_table};
use analyze_quality::logging::{LogConfig, init_logging};
use analyze_quality::render::{
    file_size, is_supported_extension, print_dataframe, summary_frame, write_details,
    write_output_file, write_workbook,
};
use analyze_quality::report::profile;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "aq",
    about = "Per-column data quality report for CSV and TSV files",
    long_about = "Reads a delimited text file, infers each column's type (integer, float,\n\
                  date, else string) and reports counts, nulls, uniqueness, extremes,\n\
                  percentiles and value-frequency tables for every column.",
    version = "0.0.0",
    after_help = "Examples:\n  \
      aq data.csv                                   # Writes data.xlsx: Summary + detail sheets\n  \
      aq --header 2 export.csv                      # Skip two lines above the header row\n  \
      aq --sample-percent 10 --seed 7 big.csv       # Profile a repeatable 10% sample\n  \
      aq --max-detail-values 10 -o out.parquet x.tsv  # Parquet summary plus x-detail/*.parquet\n  \
      aq -o - --no-detail data.csv                  # Print the summary, write nothing\n\n\
      Output format follows the extension: .xlsx, .csv, .tsv, .parquet, .json, .jsonl"
)]
struct Cli {
    /// Delimited text file to profile
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Rows before the header row to skip
    #[arg(long = "header", value_name = "NUM", default_value_t = 0)]
    header: usize,

    /// Longest value-frequency table to report per column
    #[arg(
        long,
        value_name = "INT",
        default_value_t = DEFAULT_MAX_DETAIL_VALUES as u64,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    max_detail_values: u64,

    /// Profile only this percentage of rows, chosen at random
    #[arg(
        long,
        value_name = "INT",
        value_parser = clap::value_parser!(u8).range(1..=99)
    )]
    sample_percent: Option<u8>,

    /// Seed for --sample-percent
    #[arg(long, value_name = "INT", requires = "sample_percent")]
    seed: Option<u64>,

    /// Field separator (default: from the file extension)
    #[arg(long, value_name = "CHAR")]
    delimiter: Option<char>,

    /// Output file, or '-' for the summary on stdout (default: <input stem>.xlsx)
    #[arg(short = 'o', long, help = "Output: -o summary.parquet")]
    output: Option<PathBuf>,

    /// Directory for the detail tables of non-workbook output (default: <input stem>-detail)
    #[arg(long, value_name = "DIR", conflicts_with = "no_detail")]
    detail_dir: Option<PathBuf>,

    /// Skip writing the per-column detail tables
    #[arg(long)]
    no_detail: bool,

    /// Log debug detail
    #[arg(short = 'v', long, conflicts_with = "terse")]
    verbose: bool,

    /// Log warnings only
    #[arg(short = 't', long)]
    terse: bool,
}

impl Cli {
    fn profile_config(&self) -> Result<ProfileConfig> {
        let max_detail_values = usize::try_from(self.max_detail_values)
            .context("--max-detail-values is too large")?;
        Ok(ProfileConfig::default()
            .with_skip_rows(self.header)
            .with_max_detail_values(max_detail_values)?
            .with_sample_percent(self.sample_percent)?
            .with_seed(self.seed))
    }

    fn separator(&self) -> Result<Option<u8>> {
        self.delimiter
            .map(|c| {
                u8::try_from(c)
                    .ok()
                    .filter(u8::is_ascii)
                    .with_context(|| {
                        format!("Delimiter must be a single ASCII character, got '{c}'")
                    })
            })
            .transpose()
    }

    /// Where the summary goes; `None` means stdout.
    fn summary_path(&self) -> Option<PathBuf> {
        match &self.output {
            Some(path) if path.as_os_str() == "-" => None,
            Some(path) => Some(path.clone()),
            None => Some(sibling_path(&self.input, ".xlsx")),
        }
    }

    /// Workbook output carries the detail tables as sheets.
    fn writes_workbook(&self) -> bool {
        self.summary_path()
            .is_some_and(|path| path.extension().is_some_and(|e| e == "xlsx"))
    }

    /// Where detail files go; `None` when there are none to write.
    fn detail_dir(&self) -> Option<PathBuf> {
        if self.no_detail || self.writes_workbook() {
            return None;
        }
        Some(
            self.detail_dir
                .clone()
                .unwrap_or_else(|| sibling_path(&self.input, "-detail")),
        )
    }
}

/// `<dir of input>/<stem of input><suffix>`
fn sibling_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    // data.csv.gz -> data
    let stem = Path::new(&stem)
        .file_stem()
        .filter(|_| matches!(input.extension().and_then(|e| e.to_str()), Some("gz" | "zst")))
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or(stem);
    input.with_file_name(format!("{stem}{suffix}"))
}

fn output_extension(summary_path: Option<&Path>) -> Result<String> {
    let Some(path) = summary_path else {
        return Ok("csv".to_string());
    };
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .context("Could not determine output file extension")?;
    if !is_supported_extension(extension) {
        anyhow::bail!("Unsupported output format: .{}", extension);
    }
    Ok(extension.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogConfig::from_flags(cli.verbose, cli.terse))
        .context("Failed to initialize logging")?;

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    if !cli.input.is_file() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }
    let config = cli.profile_config()?;
    let summary_path = cli.summary_path();
    let extension = output_extension(summary_path.as_deref())?;
    if cli.writes_workbook() && cli.detail_dir.is_some() {
        anyhow::bail!("--detail-dir does not apply to .xlsx output; detail tables become sheets");
    }

    let options = ReadOptions::from_config(&config).with_separator(cli.separator()?);
    let table = read_table(&cli.input, &options)
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;

    let report = profile(&table, &config)
        .with_context(|| format!("Failed to profile {}", cli.input.display()))?;

    if let Some(path) = summary_path.as_deref().filter(|_| cli.writes_workbook()) {
        info!("Writing workbook ...");
        write_workbook(&report, path, !cli.no_detail)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} bytes to '{}'.", file_size(path)?, path.display());
        return Ok(());
    }

    info!("Writing summary ...");
    let summary = summary_frame(&report)?;
    match &summary_path {
        Some(path) => {
            write_output_file(&summary, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} bytes to '{}'.", file_size(path)?, path.display());
        }
        None => print_dataframe(&summary, atty::is(atty::Stream::Stdout))?,
    }

    if let Some(dir) = cli.detail_dir() {
        let written = write_details(&report, &dir, &extension)
            .with_context(|| format!("Failed to write details to {}", dir.display()))?;
        let bytes = written
            .iter()
            .map(|path| file_size(path))
            .sum::<analyze_quality::Result<u64>>()?;
        info!(
            "Wrote {} detail files ({} bytes) to '{}'.",
            written.len(),
            bytes,
            dir.display()
        );
    }

    Ok(())
}
