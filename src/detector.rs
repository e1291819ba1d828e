//! Hand-landmark detection boundary.
//!
//! The landmark model runs out of process: a MediaPipe helper script receives
//! raw RGB frames on stdin and answers with one JSON line per frame.
//!
//! Wire format per frame, little endian:
//! `width: u32, height: u32, channels: u32` followed by `width * height * channels` bytes.
//! The helper prints `READY` once after start-up.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use image::RgbImage;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::DetectorConfig;
use crate::error::{GestureError, GestureResult};
use crate::types::NormalizedPoint;

/// One detected hand in normalized image coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedHand {
    pub points: Vec<NormalizedPoint>,
    pub score: f32,
    pub handedness: String,
}

pub trait HandDetector {
    fn name(&self) -> String;
    fn detect(&mut self, image: &RgbImage) -> GestureResult<Vec<DetectedHand>>;
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    score: f32,
    landmarks: Vec<NormalizedPoint>,
}

#[derive(Deserialize, Debug)]
struct DetectionResult {
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse one response line, keeping hands at or above `min_confidence`.
fn parse_response(line: &str, min_confidence: f32) -> GestureResult<Vec<DetectedHand>> {
    let result: DetectionResult = serde_json::from_str(line.trim())
        .map_err(|e| GestureError::Detector(format!("bad response {:?}: {}", line.trim(), e)))?;

    if let Some(error) = result.error {
        warn!("Hand detector reported: {}", error);
        return Ok(Vec::new());
    }

    Ok(result
        .hands
        .into_iter()
        .filter(|h| h.score >= min_confidence)
        .map(|h| DetectedHand {
            points: h.landmarks,
            score: h.score,
            handedness: h.handedness,
        })
        .collect())
}

/// Read one response line. An exited helper is an error; a line that does not
/// parse only costs the current frame.
fn read_hands<R: BufRead>(reader: &mut R, min_confidence: f32) -> GestureResult<Vec<DetectedHand>> {
    let mut line = String::new();
    let n = reader
        .read_line(&mut line)
        .map_err(|e| GestureError::Detector(e.to_string()))?;
    if n == 0 {
        return Err(GestureError::Detector("detector exited".into()));
    }

    match parse_response(&line, min_confidence) {
        Ok(hands) => Ok(hands),
        Err(e) => {
            warn!("Skipping frame: {}", e);
            Ok(Vec::new())
        }
    }
}

pub struct SubprocessDetector {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    min_confidence: f32,
}

impl SubprocessDetector {
    pub fn spawn(config: &DetectorConfig) -> GestureResult<Self> {
        Self::spawn_with(&config.python, &config.script, config.min_confidence)
    }

    pub fn spawn_with(python: &Path, script: &Path, min_confidence: f32) -> GestureResult<Self> {
        if !script.exists() {
            return Err(GestureError::Configuration(format!(
                "hand detection script not found at {}",
                script.display()
            )));
        }

        info!("Starting hand detector {} {}", python.display(), script.display());
        let mut process = Command::new(python)
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| GestureError::Configuration(format!("cannot start {}: {}", python.display(), e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| GestureError::Detector("detector stdin unavailable".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| GestureError::Detector("detector stdout unavailable".into()))?;
        let mut stdout = BufReader::new(stdout);

        let mut ready = String::new();
        stdout
            .read_line(&mut ready)
            .map_err(|e| GestureError::Detector(e.to_string()))?;
        if ready.trim() != "READY" {
            let _ = process.kill();
            return Err(GestureError::Detector(format!(
                "detector did not signal ready, got {:?}",
                ready.trim()
            )));
        }
        info!("Hand detector ready");

        Ok(Self {
            process,
            stdin,
            stdout,
            min_confidence: min_confidence.clamp(0.0, 1.0),
        })
    }
}

impl HandDetector for SubprocessDetector {
    fn name(&self) -> String {
        "MediaPipe subprocess".to_string()
    }

    fn detect(&mut self, image: &RgbImage) -> GestureResult<Vec<DetectedHand>> {
        let io = |e: std::io::Error| GestureError::Detector(e.to_string());

        self.stdin.write_all(&image.width().to_le_bytes()).map_err(io)?;
        self.stdin.write_all(&image.height().to_le_bytes()).map_err(io)?;
        self.stdin.write_all(&3u32.to_le_bytes()).map_err(io)?;
        self.stdin.write_all(image.as_raw()).map_err(io)?;
        self.stdin.flush().map_err(io)?;

        let hands = read_hands(&mut self.stdout, self.min_confidence)?;
        debug!("Detector returned {} hand(s)", hands.len());
        Ok(hands)
    }
}

impl Drop for SubprocessDetector {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}
