use std::sync::Arc;
use std::thread;
use std::time::Instant;

use colored::*;
use image::{imageops::FilterType, ImageFormat, RgbImage};
use tracing::{debug, info, warn};

use crate::classifier::{GestureClassifier, Label};
use crate::command::{CommandMachine, CommandState, Outcome};
use crate::config::{AppConfig, ImageConfig, StreamConfig};
use crate::descriptor::GestureDescriptor;
use crate::detector::HandDetector;
use crate::dispatch::{ActionExecutor, Command, Dispatcher};
use crate::error::{GestureError, GestureResult};
use crate::stream::FrameExtractor;
use crate::templates::TemplateLibrary;
use crate::transport::ByteSource;
use crate::types::{Frame, Landmarks};

/// Decode a stream frame and bring it into the orientation and size the detector expects.
///
/// Returns `None` for frames that do not decode; corrupted frames are dropped.
pub fn prepare_image(frame: &Frame, config: &ImageConfig) -> Option<RgbImage> {
    let decoded = match image::load_from_memory_with_format(frame.as_bytes(), ImageFormat::Jpeg) {
        Ok(img) => img.to_rgb8(),
        Err(e) => {
            debug!("Dropping undecodable frame ({} bytes): {}", frame.len(), e);
            return None;
        }
    };

    let oriented = if config.rotate_clockwise {
        image::imageops::rotate90(&decoded)
    } else {
        decoded
    };

    Some(image::imageops::resize(
        &oriented,
        config.detector_input_width,
        config.detector_input_height,
        FilterType::Triangle,
    ))
}

/// Time source for debounce decisions
pub trait Clock {
    fn now(&mut self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> Instant {
        Instant::now()
    }
}

/// What became of one frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameResult {
    Undecodable,
    NoHand,
    /// Hand found but unusable (wrong landmark count, degenerate palm)
    Skipped,
    Classified(Label),
}

/// Frame to gesture label: decode, detect, describe, classify.
pub struct Recognizer<D: HandDetector> {
    detector: D,
    templates: Arc<TemplateLibrary>,
    classifier: GestureClassifier,
    image: ImageConfig,
    landmark_count: usize,
}

impl<D: HandDetector> Recognizer<D> {
    pub fn new(detector: D, templates: Arc<TemplateLibrary>, config: &AppConfig) -> Self {
        Self {
            detector,
            templates,
            classifier: GestureClassifier::from_config(&config.classifier),
            image: config.image.clone(),
            landmark_count: config.classifier.landmark_count,
        }
    }

    /// Only detector failures are errors; bad frames and bad hands are skipped.
    pub fn recognize(&mut self, frame: &Frame) -> GestureResult<FrameResult> {
        let Some(image) = prepare_image(frame, &self.image) else {
            return Ok(FrameResult::Undecodable);
        };

        let hands = self.detector.detect(&image)?;
        // With several hands in view the last one reported wins.
        let Some(hand) = hands.last() else {
            return Ok(FrameResult::NoHand);
        };

        if hand.points.len() != self.landmark_count {
            warn!(
                "Expected {} landmarks, got {}; skipping frame",
                self.landmark_count,
                hand.points.len()
            );
            return Ok(FrameResult::Skipped);
        }

        let landmarks = Landmarks::from_normalized(&hand.points, self.image.width, self.image.height);
        let descriptor = match GestureDescriptor::build(&landmarks) {
            Ok(d) => d,
            Err(e) => {
                debug!("Skipping frame: {}", e);
                return Ok(FrameResult::Skipped);
            }
        };

        Ok(FrameResult::Classified(
            self.classifier.classify(&descriptor, &self.templates),
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub undecodable: u64,
    pub no_hand: u64,
    pub skipped: u64,
    pub classified: u64,
    pub commands: Vec<Command>,
}

/// Drives recognized gestures through the command state machine into dispatch.
pub struct GestureEngine<D: HandDetector, E: ActionExecutor> {
    recognizer: Recognizer<D>,
    machine: CommandMachine,
    dispatcher: Dispatcher<E>,
    clock: Box<dyn Clock>,
    stats: SessionStats,
}

impl<D: HandDetector, E: ActionExecutor> GestureEngine<D, E> {
    pub fn new(recognizer: Recognizer<D>, machine: CommandMachine, dispatcher: Dispatcher<E>) -> Self {
        Self {
            recognizer,
            machine,
            dispatcher,
            clock: Box::new(SystemClock),
            stats: SessionStats::default(),
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn dispatcher(&self) -> &Dispatcher<E> {
        &self.dispatcher
    }

    /// Pull bytes from `source` until it fails. Every session starts with an empty
    /// frame buffer and a fresh command state; the returned error says why it ended.
    pub fn run_session<S: ByteSource>(&mut self, source: &mut S, stream: &StreamConfig) -> GestureError {
        let mut extractor = FrameExtractor::new(stream.max_buffered_bytes);
        let mut state = CommandState::new(self.clock.now());

        loop {
            let chunk = match source.read_chunk(stream.chunk_size) {
                Ok(chunk) => chunk,
                Err(e) => return e,
            };

            for frame in extractor.extend(&chunk) {
                match self.process_frame(state, &frame) {
                    Ok(next) => state = next,
                    Err(e) => return e,
                }
            }
        }
    }

    fn process_frame(&mut self, state: CommandState, frame: &Frame) -> GestureResult<CommandState> {
        self.stats.frames += 1;
        let label = match self.recognizer.recognize(frame)? {
            FrameResult::Classified(label) => label,
            FrameResult::Undecodable => {
                self.stats.undecodable += 1;
                return Ok(state);
            }
            FrameResult::NoHand => {
                self.stats.no_hand += 1;
                return Ok(state);
            }
            FrameResult::Skipped => {
                self.stats.skipped += 1;
                return Ok(state);
            }
        };
        self.stats.classified += 1;

        let now = self.clock.now();
        let (state, outcome) = self.machine.step(state, &label, now);
        self.report(outcome);
        Ok(state)
    }

    fn report(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Pending { label } => debug!("Saw {} while waiting out debounce", label),
            Outcome::ModeRejected => debug!("No mode gesture recognized"),
            Outcome::ModeSelected { mode } => {
                println!("{}", format!("COMMAND MODE = {}", mode).green().bold());
            }
            Outcome::Held { action } => debug!("Holding {}", action),
            Outcome::Dispatch { mode, action } => {
                if let Some(command) = self.dispatcher.dispatch(&mode, &action) {
                    self.stats.commands.push(command);
                }
            }
            Outcome::Reset => {
                println!(
                    "{}",
                    format!(
                        "Resetting system...issue new command mode in {} seconds",
                        self.machine.debounce().as_secs_f32()
                    )
                    .yellow()
                );
            }
            Outcome::RepeatGesture => println!("{}", "Re-enter gesture!".red()),
        }
    }

    /// Run sessions until a non-retryable error, reconnecting after transport failures.
    ///
    /// `max_reconnects` bounds the reconnects over the whole run; 0 keeps reconnecting forever.
    pub fn run_with_reconnect<S, F>(&mut self, stream: &StreamConfig, mut connect: F) -> GestureError
    where
        S: ByteSource,
        F: FnMut() -> GestureResult<S>,
    {
        let mut attempts: u32 = 0;
        loop {
            let error = match connect() {
                Ok(mut source) => self.run_session(&mut source, stream),
                Err(e) => e,
            };

            if !error.is_retryable() {
                return error;
            }

            attempts += 1;
            if stream.max_reconnects != 0 && attempts > stream.max_reconnects {
                warn!("Giving up after {} reconnect attempts", stream.max_reconnects);
                return error;
            }
            warn!("Stream lost ({}); reconnecting (attempt {})", error, attempts);
            info!("Session so far: {} frames, {} commands", self.stats.frames, self.stats.commands.len());
            thread::sleep(stream.reconnect_delay());
        }
    }
}
