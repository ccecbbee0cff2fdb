use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use sheetgraph::app::{Action, App, Outcome};
use sheetgraph::command::{parse_command, Command, HELP};
use sheetgraph::config::RenderOptions;
use sheetgraph::error::ChartError;
use sheetgraph::export::chart_js_config;
use sheetgraph::selection::AxisSelection;
use sheetgraph::table::load_dataset;
use sheetgraph::view::ZoomMode;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sheetgraph")]
#[command(about = "Plot spreadsheet columns as line charts with left and right Y axes", long_about = None)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        help = "More log output on stderr (-v info, -vv debug); RUST_LOG overrides"
    )]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one chart as PNG
    Render(RenderArgs),
    /// Print the column names of a file with their indices
    Columns {
        #[arg(help = "Input file (xlsx, xlsm, xls, ods, csv; '-' for CSV on stdin)")]
        file: PathBuf,
    },
    /// Read commands from stdin, one per line (type 'help' for the list)
    Shell {
        #[arg(help = "File to load before the first command")]
        file: Option<PathBuf>,

        #[command(flatten)]
        chart: ChartArgs,
    },
}

#[derive(Args, Debug)]
struct ChartArgs {
    #[arg(long = "width", default_value = "800", value_parser = clap::value_parser!(u32).range(16..=16384), help = "Output width in pixels")]
    width: u32,

    #[arg(long = "height", default_value = "600", value_parser = clap::value_parser!(u32).range(16..=16384), help = "Output height in pixels")]
    height: u32,

    #[arg(short = 't', long = "title", help = "Chart title")]
    title: Option<String>,

    #[arg(long = "zoom", default_value = "x", help = "Axes that pan and zoom act on: x or xy")]
    zoom: ZoomMode,
}

impl ChartArgs {
    fn options(&self) -> RenderOptions {
        RenderOptions {
            width: self.width,
            height: self.height,
            title: self.title.clone(),
            zoom_mode: self.zoom,
        }
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(help = "Input file (xlsx, xlsm, xls, ods, csv; '-' for CSV on stdin)")]
    file: PathBuf,

    #[arg(short = 'x', long = "x", help = "X-axis column (name or 0-based index, defaults to the first column)")]
    x_column: Option<String>,

    #[arg(short = 'l', long = "left", value_delimiter = ',', help = "Columns plotted against the left Y axis")]
    left: Vec<String>,

    #[arg(short = 'r', long = "right", value_delimiter = ',', help = "Columns plotted against the right Y axis")]
    right: Vec<String>,

    #[arg(long = "start", requires = "end", help = "Only rows from this date/time (e.g. 2024-01-01T00:00)")]
    start: Option<String>,

    #[arg(long = "end", requires = "start", help = "Only rows up to this date/time")]
    end: Option<String>,

    #[arg(short = 'o', long = "output", help = "Write the PNG to this file instead of stdout")]
    output: Option<PathBuf>,

    #[arg(long = "emit-config", help = "Also write the chart configuration as JSON")]
    emit_config: Option<PathBuf>,

    #[command(flatten)]
    chart: ChartArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render(args) => render(args),
        Commands::Columns { file } => columns(&file),
        Commands::Shell { file, chart } => shell(file, chart.options()),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn render(args: RenderArgs) -> Result<()> {
    let mut app = App::new(args.chart.options());

    app.update(Action::LoadFile(args.file.clone()))
        .with_context(|| format!("Failed to load {}", args.file.display()))?;

    let x_axis = match args.x_column {
        Some(x) => x,
        None => app
            .dataset()
            .map(|dataset| AxisSelection::default_for(dataset).x_axis)
            .unwrap_or_default(),
    };
    app.update(Action::SetAxes {
        x_axis,
        left_y: args.left,
        right_y: args.right,
    })
    .context("Failed to select axes")?;

    app.update(Action::Display).context("Failed to build chart")?;

    if let (Some(start), Some(end)) = (args.start, args.end) {
        app.update(Action::ApplyRange { start, end })
            .context("Failed to apply date range")?;
    }

    if let Some(path) = &args.emit_config {
        write_config(&app, path)?;
    }

    match args.output {
        Some(path) => {
            app.update(Action::ExportImage(path))
                .context("Failed to write PNG")?;
        }
        None => {
            let chart = app.chart().ok_or(ChartError::NoChart)?;
            let png_bytes = chart.render_png().context("Failed to generate graph")?;

            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(&png_bytes)
                .context("Failed to write PNG to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}

fn columns(file: &Path) -> Result<()> {
    let dataset =
        load_dataset(file).with_context(|| format!("Failed to load {}", file.display()))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for (index, name) in dataset.columns().iter().enumerate() {
        writeln!(handle, "{}\t{}", index, name).context("Failed to write to stdout")?;
    }
    Ok(())
}

fn shell(file: Option<PathBuf>, options: RenderOptions) -> Result<()> {
    let mut app = App::new(options);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(file) = file {
        if file == Path::new("-") {
            bail!("the shell reads commands from stdin; load CSV data from a file instead");
        }
        let result = app.update(Action::LoadFile(file));
        report(&mut out, &app, result)?;
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read command from stdin")?;
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                eprintln!("error: {:#}", err);
                continue;
            }
        };
        debug!(?command, "shell command");

        match command {
            Command::Quit => break,
            Command::Help => writeln!(out, "{}", HELP)?,
            Command::Status => writeln!(out, "{}", status(&app))?,
            Command::Columns => match app.dataset() {
                Some(dataset) => {
                    for (index, name) in dataset.columns().iter().enumerate() {
                        writeln!(out, "{}\t{}", index, name)?;
                    }
                }
                None => eprintln!("error: {}", ChartError::NoDataset),
            },
            Command::ExportConfig(path) => {
                if let Err(err) = write_config(&app, &path) {
                    eprintln!("error: {:#}", err);
                } else {
                    writeln!(out, "wrote {}", path.display())?;
                }
            }
            Command::Action(Action::LoadFile(path)) if path == Path::new("-") => {
                eprintln!("error: the shell reads commands from stdin; load CSV data from a file instead");
            }
            Command::Action(action) => {
                let result = app.update(action);
                report(&mut out, &app, result)?;
            }
        }
        out.flush().context("Failed to flush stdout")?;
    }

    Ok(())
}

// Failed actions are reported and the session continues with the previous state.
fn report<W: Write>(out: &mut W, app: &App, result: Result<Outcome, ChartError>) -> Result<()> {
    match result {
        Ok(outcome) => writeln!(out, "{}", describe(&outcome, app))?,
        Err(err) => eprintln!("error: {}", err),
    }
    Ok(())
}

fn describe(outcome: &Outcome, app: &App) -> String {
    match outcome {
        Outcome::Loaded { columns, rows } => {
            format!("loaded {} rows; columns: {}", rows, columns.join(", "))
        }
        Outcome::AxesSet(selection) => format!(
            "x = {}; left = [{}]; right = [{}]",
            selection.x_axis,
            selection.left_y.join(", "),
            selection.right_y.join(", ")
        ),
        Outcome::Displayed {
            points,
            series,
            default_range,
        } => match default_range {
            Some(range) => format!("displayed {} series over {} points; range {}", series, points, range),
            None => format!("displayed {} series over {} points", series, points),
        },
        Outcome::RangeApplied { range, points } => {
            format!("range {} applied: {} points", range, points)
        }
        Outcome::ViewChanged => match app.chart() {
            Some(chart) => {
                let view = chart.view();
                format!("view x {:.2} .. {:.2}", view.x.min, view.x.max)
            }
            None => "view updated".to_string(),
        },
        Outcome::Exported { path, bytes } => format!("wrote {} ({} bytes)", path.display(), bytes),
        Outcome::Cleared => "cleared".to_string(),
    }
}

fn status(app: &App) -> String {
    let Some(dataset) = app.dataset() else {
        return "no file loaded".to_string();
    };
    let mut lines = vec![format!(
        "{} rows, {} columns",
        dataset.len(),
        dataset.columns().len()
    )];
    match app.selection() {
        Some(selection) => lines.push(format!(
            "x = {}; left = [{}]; right = [{}]",
            selection.x_axis,
            selection.left_y.join(", "),
            selection.right_y.join(", ")
        )),
        None => lines.push("axes not selected".to_string()),
    }
    if let Some(range) = app.range() {
        lines.push(format!("range {}", range));
    }
    match app.chart() {
        Some(chart) if chart.view().is_zoomed() => lines.push("chart displayed (zoomed)".to_string()),
        Some(_) => lines.push("chart displayed".to_string()),
        None => lines.push("no chart".to_string()),
    }
    lines.join("\n")
}

fn write_config(app: &App, path: &Path) -> Result<()> {
    let chart = app.chart().ok_or(ChartError::NoChart)?;
    let json = serde_json::to_string_pretty(&chart_js_config(chart.config()))
        .context("Failed to serialize chart configuration")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write chart configuration to {}", path.display()))?;
    Ok(())
}
