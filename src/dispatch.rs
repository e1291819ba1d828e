//! Maps (mode, action) gesture pairs to commands and hands them to an executor.
//!
//! Gesture names come from the trained template set. Only the names below take
//! part in commands; anything else reaching dispatch is reported and ignored.

use std::collections::HashMap;
use std::time::Duration;

use colored::*;
use tracing::{debug, info, warn};

use crate::error::{GestureError, GestureResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gesture {
    One,
    Two,
    Three,
    ThumbUp,
    ThumbDown,
    Go,
    Rock,
    Stop,
}

impl Gesture {
    pub const ALL: [Gesture; 8] = [
        Gesture::One,
        Gesture::Two,
        Gesture::Three,
        Gesture::ThumbUp,
        Gesture::ThumbDown,
        Gesture::Go,
        Gesture::Rock,
        Gesture::Stop,
    ];

    /// Template name used when training this gesture
    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::One => "One",
            Gesture::Two => "Two",
            Gesture::Three => "Three",
            Gesture::ThumbUp => "Thumb-up",
            Gesture::ThumbDown => "Thumb-down",
            Gesture::Go => "Go",
            Gesture::Rock => "Rock",
            Gesture::Stop => "Stop",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| g.as_str() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    SmartHome,
    Presentation,
    Music,
}

impl Mode {
    pub fn from_gesture(gesture: Gesture) -> Option<Self> {
        match gesture {
            Gesture::One => Some(Mode::SmartHome),
            Gesture::Two => Some(Mode::Presentation),
            Gesture::Three => Some(Mode::Music),
            _ => None,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Gesture::from_label(label).and_then(Self::from_gesture)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Mode::SmartHome => "Smart Home Mode",
            Mode::Presentation => "Presentation Mode",
            Mode::Music => "Music Mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlideCommand {
    Start,
    Next,
    Previous,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaCommand {
    Play,
    Pause,
    NextTrack,
    VolumeUp,
    VolumeDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Smart-home routine trigger, identified by the gesture that fires it
    Trigger(Gesture),
    Presentation(SlideCommand),
    Media(MediaCommand),
}

impl Command {
    /// Key used in the endpoint map of the configuration
    pub fn key(&self) -> String {
        match self {
            Command::Trigger(g) => format!("smart_home.{}", g.as_str().to_lowercase().replace('-', "_")),
            Command::Presentation(c) => format!(
                "presentation.{}",
                match c {
                    SlideCommand::Start => "start",
                    SlideCommand::Next => "next",
                    SlideCommand::Previous => "previous",
                    SlideCommand::Exit => "exit",
                }
            ),
            Command::Media(c) => format!(
                "media.{}",
                match c {
                    MediaCommand::Play => "play",
                    MediaCommand::Pause => "pause",
                    MediaCommand::NextTrack => "next_track",
                    MediaCommand::VolumeUp => "volume_up",
                    MediaCommand::VolumeDown => "volume_down",
                }
            ),
        }
    }
}

/// Every command the gesture vocabulary can issue
pub const COMMAND_TABLE: &[(Mode, Gesture, Command)] = &[
    (Mode::SmartHome, Gesture::ThumbUp, Command::Trigger(Gesture::ThumbUp)),
    (Mode::SmartHome, Gesture::ThumbDown, Command::Trigger(Gesture::ThumbDown)),
    (Mode::SmartHome, Gesture::Go, Command::Trigger(Gesture::Go)),
    (Mode::SmartHome, Gesture::Rock, Command::Trigger(Gesture::Rock)),
    (Mode::Presentation, Gesture::Go, Command::Presentation(SlideCommand::Start)),
    (Mode::Presentation, Gesture::ThumbUp, Command::Presentation(SlideCommand::Next)),
    (Mode::Presentation, Gesture::ThumbDown, Command::Presentation(SlideCommand::Previous)),
    (Mode::Presentation, Gesture::Rock, Command::Presentation(SlideCommand::Exit)),
    (Mode::Music, Gesture::One, Command::Media(MediaCommand::Play)),
    (Mode::Music, Gesture::Rock, Command::Media(MediaCommand::Pause)),
    (Mode::Music, Gesture::Go, Command::Media(MediaCommand::NextTrack)),
    (Mode::Music, Gesture::ThumbUp, Command::Media(MediaCommand::VolumeUp)),
    (Mode::Music, Gesture::ThumbDown, Command::Media(MediaCommand::VolumeDown)),
];

pub fn lookup(mode: Mode, action: Gesture) -> Option<Command> {
    COMMAND_TABLE
        .iter()
        .find(|(m, a, _)| *m == mode && *a == action)
        .map(|(_, _, c)| *c)
}

/// Why a (mode, action) pair did not produce a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Command(Mode, Command),
    InvalidMode(String),
    Unmapped { mode: Mode, action: String },
}

pub fn resolve(mode_label: &str, action_label: &str) -> Resolution {
    let Some(mode) = Mode::from_label(mode_label) else {
        return Resolution::InvalidMode(mode_label.to_string());
    };
    match Gesture::from_label(action_label).and_then(|g| lookup(mode, g)) {
        Some(command) => Resolution::Command(mode, command),
        None => Resolution::Unmapped {
            mode,
            action: action_label.to_string(),
        },
    }
}

/// Downstream side of dispatch
pub trait ActionExecutor {
    fn name(&self) -> String;
    fn execute(&mut self, command: Command) -> GestureResult<()>;
}

/// Fires each command as an HTTP GET against the URL configured for its key.
pub struct HttpExecutor {
    client: reqwest::blocking::Client,
    endpoints: HashMap<String, String>,
}

impl HttpExecutor {
    pub fn new(endpoints: HashMap<String, String>, timeout: Duration) -> GestureResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GestureError::Dispatch(format!("HTTP client: {}", e)))?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoint(&self, command: Command) -> Option<&str> {
        self.endpoints
            .get(&command.key())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

impl ActionExecutor for HttpExecutor {
    fn name(&self) -> String {
        "HTTP trigger".to_string()
    }

    fn execute(&mut self, command: Command) -> GestureResult<()> {
        let Some(url) = self.endpoint(command) else {
            warn!("No endpoint configured for {}; skipping", command.key());
            return Ok(());
        };

        debug!("GET {} for {}", url, command.key());
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| GestureError::Dispatch(format!("{}: {}", command.key(), e)))?;
        if !response.status().is_success() {
            return Err(GestureError::Dispatch(format!(
                "{}: endpoint answered {}",
                command.key(),
                response.status()
            )));
        }
        Ok(())
    }
}

/// Turns finished (mode, action) pairs into executor calls.
pub struct Dispatcher<E: ActionExecutor> {
    executor: E,
}

impl<E: ActionExecutor> Dispatcher<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Unmapped pairs and executor failures are reported, never fatal.
    pub fn dispatch(&mut self, mode_label: &str, action_label: &str) -> Option<Command> {
        match resolve(mode_label, action_label) {
            Resolution::InvalidMode(mode) => {
                println!("{}", format!("Invalid command-mode {:?}, please try again.", mode).yellow());
                None
            }
            Resolution::Unmapped { mode, action } => {
                println!("{}", format!("-------- {} --------", mode.title()).cyan());
                warn!("No command for {:?} in {}", action, mode.title());
                None
            }
            Resolution::Command(mode, command) => {
                println!("{}", format!("-------- {} --------", mode.title()).cyan());
                match self.executor.execute(command) {
                    Ok(()) => info!("{} executed {}", self.executor.name(), command.key()),
                    Err(e) => warn!("{} failed: {}", self.executor.name(), e),
                }
                println!("{}", format!("Gesture issued: {}", action_label).green());
                Some(command)
            }
        }
    }
}
