use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tabplot::{Config, Error, OutputFormat, PlotRequest};

#[derive(Parser, Debug)]
#[command(name = "tabplot")]
#[command(about = "Summarize CSV files and chart their columns", long_about = None)]
struct Args {
    /// TOML config file (TABPLOT_* environment variables override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the schema, first rows and column names as JSON
    Summarize {
        /// CSV file, or '-' for stdin
        file: Option<PathBuf>,
    },
    /// Chart one column, optionally grouped by another
    Plot {
        /// CSV file, or '-' for stdin
        file: Option<PathBuf>,

        /// Column to chart
        #[arg(short, long)]
        column: String,

        /// Column to group by (bars show the mean or count per group)
        #[arg(short, long)]
        group_by: Option<String>,

        /// Chart type: bar, barh or pie
        #[arg(long, default_value = "bar")]
        chart: String,

        /// Output format (defaults to the configured image format)
        #[arg(short, long, value_enum)]
        format: Option<Format>,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Png,
    Svg,
    Pdf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = match err.downcast_ref::<Error>() {
                Some(e) => {
                    eprintln!("{}", e.to_json());
                    match e.status() {
                        400 => 2,
                        501 => 3,
                        _ => 1,
                    }
                }
                None => {
                    eprintln!("{}", serde_json::json!({ "error": format!("{:#}", err) }));
                    1
                }
            };
            ExitCode::from(code)
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = Config::load(args.config.as_deref()).context("Failed to load config")?;

    match args.command {
        Command::Summarize { file } => {
            let bytes = read_input(file.as_deref())?;
            let summary = tabplot::summarize(&bytes, &config)?;
            let json = serde_json::to_string_pretty(&summary).context("Failed to encode summary")?;
            println!("{}", json);
        }
        Command::Plot {
            file,
            column,
            group_by,
            chart,
            format,
            output,
        } => {
            let bytes = read_input(file.as_deref())?;
            let mut request = PlotRequest::new(column, chart);
            request.group_by = group_by;

            match format {
                Some(Format::Png) => config.render.format = OutputFormat::Png,
                Some(Format::Svg) => config.render.format = OutputFormat::Svg,
                Some(Format::Pdf) | None => {}
            }

            let (out, mime) = match format {
                Some(Format::Pdf) => (
                    tabplot::render_document(&bytes, &request, &config)?,
                    "application/pdf",
                ),
                _ => (
                    tabplot::render_image(&bytes, &request, &config)?,
                    config.render.format.mime_type(),
                ),
            };
            write_output(output.as_deref(), &out)?;
            log::info!("wrote {} bytes of {}", out.len(), mime);
        }
    }

    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    match file {
        Some(path) if path != Path::new("-") => {
            bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
        }
        _ => {
            io::stdin()
                .read_to_end(&mut bytes)
                .context("Failed to read CSV from stdin")?;
        }
    }
    Ok(bytes)
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(bytes).context("Failed to write to stdout")?;
            handle.flush().context("Failed to flush stdout")
        }
    }
}
