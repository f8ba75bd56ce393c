//! JSON-lines landmark traces
//!
//! Each non-blank line is one record:
//!
//! ```text
//! {"t": 0.033, "landmarks": [[0.51, 0.42], ...]}   // detector output
//! {"t": 0.066, "landmarks": null}                  // no face found
//! {"control": "reset"}
//! {"control": {"alert_threshold": 5.0}}
//! ```
//!
//! `t` is seconds since the start of the recording and may be omitted.

use std::io::BufRead;

use attention::Landmarks;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

/// Operator commands embedded in a trace
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Reset,
    AlertThreshold(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceRecord {
    /// Recorded detector output; `None` when no face was found
    Frame {
        t: Option<f64>,
        points: Option<Vec<[f64; 2]>>,
    },
    Control {
        t: Option<f64>,
        control: Control,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecord {
    t: Option<f64>,
    #[serde(default)]
    landmarks: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    control: Option<Control>,
}

/// Parse one trace line
pub fn parse_record(line: usize, text: &str) -> Result<TraceRecord, TraceError> {
    let raw: RawRecord =
        serde_json::from_str(text).map_err(|source| TraceError::Parse { line, source })?;

    if let Some(t) = raw.t {
        if !(t.is_finite() && t >= 0.0) {
            return Err(TraceError::InvalidRecord {
                line,
                reason: format!("timestamp must be a non-negative number, got {}", t),
            });
        }
    }

    match (raw.control, raw.landmarks) {
        (Some(_), Some(_)) => Err(TraceError::InvalidRecord {
            line,
            reason: "record carries both landmarks and a control".into(),
        }),
        (Some(control), None) => Ok(TraceRecord::Control { t: raw.t, control }),
        (None, points) => Ok(TraceRecord::Frame { t: raw.t, points }),
    }
}

/// Detector over recorded output: replays the stored keypoints
pub fn recorded_landmarks(points: &Option<Vec<[f64; 2]>>) -> Option<Landmarks> {
    points
        .as_ref()
        .map(|points| Landmarks::from_xy(points.iter().copied()))
}

/// Streaming reader over a JSON-lines trace
pub struct TraceReader<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    /// Line number of the last record returned
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let text = self.buf.trim();
                    if text.is_empty() {
                        continue;
                    }
                    return Some(parse_record(self.line, text));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
