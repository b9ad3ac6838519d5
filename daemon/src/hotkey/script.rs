//! Replay capture source
//!
//! Feeds key events from a line-oriented script instead of the OS:
//!
//! ```text
//! # press ctrl+shift+c
//! down ctrl
//! down shift
//! down 67
//! wait 500
//! up c
//! ```
//!
//! Keys are given by name or by decimal code.

use std::io::BufRead;
use std::time::Duration;

use tracing::debug;

use super::listener::{CaptureError, CaptureSource, EventSink, KeyEvent};
use crate::keys::{code_of, KeyCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Key(KeyEvent),
    Wait(Duration),
}

/// Capture source that replays a parsed script
#[derive(Debug, Clone)]
pub struct ScriptSource {
    steps: Vec<Step>,
}

impl ScriptSource {
    /// Read and validate a whole script up front
    pub fn from_reader(reader: impl BufRead) -> Result<Self, CaptureError> {
        let mut steps = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            if let Some(step) = parse_line(&line?, index + 1)? {
                steps.push(step);
            }
        }
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl CaptureSource for ScriptSource {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn run(self: Box<Self>, sink: EventSink) -> Result<(), CaptureError> {
        for step in self.steps {
            let open = match step {
                Step::Key(event) => sink.send(event),
                Step::Wait(duration) => sink.pause(duration),
            };
            if !open {
                debug!("replay interrupted");
                break;
            }
        }
        Ok(())
    }
}

fn parse_line(raw: &str, line: usize) -> Result<Option<Step>, CaptureError> {
    let content = raw.split('#').next().unwrap_or_default().trim();
    if content.is_empty() {
        return Ok(None);
    }

    let invalid = |message: String| CaptureError::Script { line, message };
    let mut parts = content.split_whitespace();
    let (Some(verb), Some(arg), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid(format!("expected `<verb> <argument>`, got `{content}`")));
    };

    let step = match verb {
        "down" => Step::Key(KeyEvent::Down(parse_key(arg).map_err(invalid)?)),
        "up" => Step::Key(KeyEvent::Up(parse_key(arg).map_err(invalid)?)),
        "wait" => {
            let millis = arg
                .parse::<u64>()
                .map_err(|_| invalid(format!("invalid wait duration `{arg}`")))?;
            Step::Wait(Duration::from_millis(millis))
        }
        other => return Err(invalid(format!("unknown verb `{other}`"))),
    };
    Ok(Some(step))
}

fn parse_key(arg: &str) -> Result<KeyCode, String> {
    if let Ok(code) = arg.parse::<u16>() {
        return Ok(KeyCode(code));
    }
    code_of(arg).ok_or_else(|| format!("unknown key `{arg}`"))
}
