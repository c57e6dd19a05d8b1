//! Line-oriented operator console standing in for the pointer and keyboard
//! of the graphical dashboard.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use client_core::{DashboardEvent, DashboardHandle, DashboardUpdate, TelemetrySource};
use serde_json::json;
use shared::{domain::Intent, protocol::Action};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use view_core::{FocusTarget, Key, KeyInput, ModalState};

pub const HELP: &str = "\
commands:
  next | prev                 step through the gallery
  zoom-in [left|right] [f]    zoom in, optionally toward a region
  zoom-out [f] | reset        zoom out / reset the view
  highlight <x> <y>           highlight a point
  action <INTENT>             dispatch a raw intent
  select <name>               select an image by name
  upload <path>               upload an image file
  key f|esc|tab|shift+tab|left|right
  focus <id> [text]           move focus (text marks a text input)
  sim on|off                  switch simulated telemetry
  help | quit";

#[derive(Debug)]
pub enum ConsoleCommand {
    Event(DashboardEvent),
    Help,
    Quit,
}

/// `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let event = match command.to_ascii_lowercase().as_str() {
        "quit" | "exit" => return Ok(Some(ConsoleCommand::Quit)),
        "help" | "?" => return Ok(Some(ConsoleCommand::Help)),
        "next" => local(Action::new(Intent::NextImage)),
        "prev" => local(Action::new(Intent::PrevImage)),
        "reset" => local(Action::new(Intent::ResetView)),
        "zoom-in" => {
            let mut action = Action::new(Intent::ZoomIn);
            for arg in &args {
                match arg.to_ascii_lowercase().as_str() {
                    "left" => action = action.with_param("region", "LEFT_REGION"),
                    "right" => action = action.with_param("region", "RIGHT_REGION"),
                    other => action = action.with_param("factor", parse_factor(other)?),
                }
            }
            local(action)
        }
        "zoom-out" => {
            let mut action = Action::new(Intent::ZoomOut);
            if let Some(raw) = args.first() {
                action = action.with_param("factor", parse_factor(raw)?);
            }
            local(action)
        }
        "highlight" => {
            let [x, y] = args.as_slice() else {
                bail!("usage: highlight <x> <y>");
            };
            let x: f64 = x.parse().map_err(|_| anyhow!("invalid x '{x}'"))?;
            let y: f64 = y.parse().map_err(|_| anyhow!("invalid y '{y}'"))?;
            local(Action::new(Intent::HighlightRegion).with_param("coordinates", json!({"x": x, "y": y})))
        }
        "action" => {
            let Some(raw) = args.first() else {
                bail!("usage: action <INTENT>");
            };
            local(Action::new(Intent::parse(raw)))
        }
        "select" => DashboardEvent::SelectImage(rest(line, "select <name>")?),
        "upload" => DashboardEvent::UploadRequested(PathBuf::from(rest(line, "upload <path>")?)),
        "key" => {
            let Some(raw) = args.first() else {
                bail!("usage: key f|esc|tab|shift+tab|left|right");
            };
            DashboardEvent::Key(parse_key(raw)?)
        }
        "focus" => match args.as_slice() {
            [id] => DashboardEvent::Focus(FocusTarget::control(*id)),
            [id, "text"] => DashboardEvent::Focus(FocusTarget::text_input(*id)),
            _ => bail!("usage: focus <id> [text]"),
        },
        "sim" => match args.first().map(|arg| arg.to_ascii_lowercase()) {
            Some(flag) if flag == "on" => DashboardEvent::SetSimulation(true),
            Some(flag) if flag == "off" => DashboardEvent::SetSimulation(false),
            _ => bail!("usage: sim on|off"),
        },
        other => bail!("unknown command '{other}', try 'help'"),
    };
    Ok(Some(ConsoleCommand::Event(event)))
}

fn local(action: Action) -> DashboardEvent {
    DashboardEvent::LocalAction(action)
}

fn parse_factor(raw: &str) -> Result<f64> {
    match raw.parse::<f64>() {
        Ok(factor) if factor.is_finite() && factor > 0.0 => Ok(factor),
        _ => bail!("invalid zoom factor '{raw}'"),
    }
}

/// Everything after the command word, so names may contain spaces.
fn rest(line: &str, usage: &str) -> Result<String> {
    let trimmed = line.trim_start();
    let after = trimmed
        .split_once(char::is_whitespace)
        .map(|(_, tail)| tail.trim())
        .unwrap_or_default();
    if after.is_empty() {
        bail!("usage: {usage}");
    }
    Ok(after.to_string())
}

pub fn parse_key(raw: &str) -> Result<KeyInput> {
    let input = match raw.to_ascii_lowercase().as_str() {
        "esc" | "escape" => KeyInput::new(Key::Escape),
        "left" => KeyInput::new(Key::ArrowLeft),
        "right" => KeyInput::new(Key::ArrowRight),
        "tab" => KeyInput::new(Key::Tab),
        "shift+tab" => KeyInput::shifted(Key::Tab),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => KeyInput::new(Key::Char(ch)),
                _ => bail!("unknown key '{raw}'"),
            }
        }
    };
    Ok(input)
}

/// Feeds console lines into the dashboard until `quit`, end of input, or the
/// dashboard going away.
pub async fn run_console<R>(reader: R, handle: DashboardHandle) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(Some(ConsoleCommand::Help)) => println!("{HELP}"),
            Ok(Some(ConsoleCommand::Event(event))) => {
                if !handle.send(event) {
                    break;
                }
            }
            Err(err) => eprintln!("{err}"),
        }
    }
    Ok(())
}

/// One printable line per update; `None` for updates not worth printing.
pub fn describe(update: &DashboardUpdate) -> Option<String> {
    match update {
        DashboardUpdate::Snapshot(snapshot) => {
            let t = snapshot.transform;
            let selected = snapshot.selected.as_deref().unwrap_or("-");
            let status = snapshot
                .status
                .as_ref()
                .map(|message| message.text.as_str())
                .unwrap_or("");
            let viewer = match snapshot.modal {
                ModalState::Open { index } => format!(" viewer={index}"),
                ModalState::Closed => String::new(),
            };
            let fusion = snapshot
                .fusion
                .as_ref()
                .map(|reading| {
                    let tag = match reading.source {
                        TelemetrySource::Live => "live",
                        TelemetrySource::Simulated => "sim",
                    };
                    format!(" fusion={}({tag})", reading.decision.action)
                })
                .unwrap_or_default();
            Some(format!(
                "[{}] image={selected} ({}/{}) scale={:.2} x={:.0} y={:.0}{viewer}{fusion} {status}",
                snapshot.connection.label(),
                snapshot
                    .images
                    .iter()
                    .position(|image| Some(image.name.as_str()) == snapshot.selected.as_deref())
                    .map(|idx| idx + 1)
                    .unwrap_or(0),
                snapshot.images.len(),
                t.scale,
                t.x,
                t.y,
            ))
        }
        DashboardUpdate::Highlight(highlight) => Some(match &highlight.coordinates {
            Some(coordinates) => format!("highlight at {coordinates}"),
            None => "highlight".to_string(),
        }),
        DashboardUpdate::UploadRejected { file, message } => {
            Some(format!("UPLOAD FAILED: {file}: {message}"))
        }
        DashboardUpdate::Connection { state, retry_in } => Some(match retry_in {
            Some(delay) => format!(
                "channel {}, retrying in {} ms",
                state.label(),
                delay.as_millis()
            ),
            None => format!("channel {}", state.label()),
        }),
    }
}

#[cfg(test)]
#[path = "tests/console_tests.rs"]
mod tests;
