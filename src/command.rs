// Line commands for the interactive shell

use crate::app::Action;
use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;

pub const HELP: &str = "\
commands:
  load <file>                          load a spreadsheet (xlsx, xlsm, xls, ods, csv)
  columns                              list the loaded columns
  axes <x> [left=a,b] [right=c,d]      choose X and the Y columns for each side
  display                              draw the chart for all rows
  range <start> <end>                  redraw only rows between two date/times
  pan <dx> [dy]                        shift the view by a fraction of its span
  zoom <factor> [anchor]               zoom around anchor (0..1); factor < 1 zooms in
  reset-zoom                           show the whole chart again
  export <file.png>                    save the chart as a PNG image
  config <file.json>                   save the chart configuration as JSON
  status                               show the current selection and range
  reset                                forget the loaded file
  help | quit";

/// A parsed shell line: either an application action or a shell-only request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Action(Action),
    Columns,
    ExportConfig(PathBuf),
    Status,
    Help,
    Quit,
}

/// Parse one input line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let tokens = tokenize(line)?;
    let Some((head, args)) = tokens.split_first() else {
        return Ok(None);
    };
    if head.starts_with('#') {
        return Ok(None);
    }

    let command = match head.to_ascii_lowercase().as_str() {
        "load" => Command::Action(Action::LoadFile(one_path(args, "load")?)),
        "columns" => Command::Columns,
        "axes" => parse_axes(args)?,
        "display" => Command::Action(Action::Display),
        "range" => match args {
            [start, end] => Command::Action(Action::ApplyRange {
                start: start.clone(),
                end: end.clone(),
            }),
            _ => bail!("usage: range <start> <end> (quote values containing spaces)"),
        },
        "pan" => {
            let dx = number(args.first(), "pan", "dx")?;
            let dy = args.get(1).map(|v| number(Some(v), "pan", "dy")).transpose()?;
            Command::Action(Action::Pan {
                dx,
                dy: dy.unwrap_or(0.0),
            })
        }
        "zoom" => {
            let factor = number(args.first(), "zoom", "factor")?;
            if factor <= 0.0 {
                bail!("zoom factor must be positive");
            }
            let anchor = args.get(1).map(|v| number(Some(v), "zoom", "anchor")).transpose()?;
            Command::Action(Action::Zoom {
                factor,
                anchor: anchor.unwrap_or(0.5),
            })
        }
        "reset-zoom" | "resetzoom" => Command::Action(Action::ResetZoom),
        "export" => Command::Action(Action::ExportImage(one_path(args, "export")?)),
        "config" => Command::ExportConfig(one_path(args, "config")?),
        "status" => Command::Status,
        "reset" => Command::Action(Action::Reset),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command '{}' (try 'help')", other),
    };
    Ok(Some(command))
}

fn parse_axes(args: &[String]) -> Result<Command> {
    let (x_axis, rest) = args
        .split_first()
        .ok_or_else(|| anyhow!("usage: axes <x> [left=a,b] [right=c,d]"))?;

    let mut left_y = Vec::new();
    let mut right_y = Vec::new();
    for arg in rest {
        let (side, columns) = arg
            .split_once('=')
            .ok_or_else(|| anyhow!("expected left=... or right=..., got '{}'", arg))?;
        let target = match side.to_ascii_lowercase().as_str() {
            "left" => &mut left_y,
            "right" => &mut right_y,
            other => bail!("unknown axis side '{}'", other),
        };
        target.extend(
            columns
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from),
        );
    }

    Ok(Command::Action(Action::SetAxes {
        x_axis: x_axis.clone(),
        left_y,
        right_y,
    }))
}

fn one_path(args: &[String], command: &str) -> Result<PathBuf> {
    match args {
        [path] => Ok(PathBuf::from(path)),
        _ => bail!("usage: {} <file>", command),
    }
}

fn number(arg: Option<&String>, command: &str, name: &str) -> Result<f64> {
    let raw = arg.ok_or_else(|| anyhow!("{} needs a {} value", command, name))?;
    let value = raw
        .parse::<f64>()
        .with_context(|| format!("Failed to parse {} '{}' as number", name, raw))?;
    if !value.is_finite() {
        bail!("{} must be a finite number, got '{}'", name, raw);
    }
    Ok(value)
}

// Whitespace-separated words; double quotes group words containing spaces.
fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if in_quotes {
        bail!("unterminated quote");
    }
    if has_token {
        tokens.push(current);
    }
    Ok(tokens)
}
