//! Attention Monitor
//!
//! Replays recorded landmark traces through the attention estimator,
//! printing a periodic status line and a session summary.

pub mod config;
pub mod report;
pub mod trace;

use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use anyhow::Context;
use attention::{AttentionError, AttentionMonitor, FrameReport, SessionSummary};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub use config::MonitorConfig;
pub use trace::{Control, TraceError, TraceReader, TraceRecord};

use crate::config::LogConfig;
use crate::report::status_line;
use crate::trace::recorded_landmarks;

/// Initialize logging; `RUST_LOG` takes precedence over the configured level
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.context("Failed to set tracing subscriber")
}

/// Drives an [`AttentionMonitor`] from trace records on a replayed clock
pub struct Replay {
    monitor: AttentionMonitor,
    origin: Instant,
    fps: f64,
    frames: u64,
    clock: f64,
}

impl Replay {
    pub fn new(config: &MonitorConfig) -> Result<Self, AttentionError> {
        let origin = Instant::now();
        Ok(Self {
            monitor: AttentionMonitor::new_at(config.attention_config(), origin)?,
            origin,
            fps: config.camera.fps,
            frames: 0,
            clock: 0.0,
        })
    }

    fn instant(&self, t: f64) -> Instant {
        self.origin + Duration::try_from_secs_f64(t).unwrap_or_default()
    }

    /// Apply one record; frames yield a report, controls yield `None`
    pub fn apply(&mut self, record: &TraceRecord) -> Result<Option<FrameReport>, AttentionError> {
        match record {
            TraceRecord::Frame { t, points } => {
                let t = t.unwrap_or(self.frames as f64 / self.fps);
                self.frames += 1;
                self.clock = t;
                let now = self.instant(t);
                let report = self
                    .monitor
                    .step_at(&mut recorded_landmarks, points, now)?;
                Ok(Some(report))
            }
            TraceRecord::Control { t, control } => {
                if let Some(t) = t {
                    self.clock = *t;
                }
                let now = self.instant(self.clock);
                match control {
                    Control::Reset => self.monitor.reset_statistics_at(now),
                    Control::AlertThreshold(seconds) => self.monitor.set_alert_threshold(*seconds)?,
                }
                Ok(None)
            }
        }
    }

    pub fn monitor(&self) -> &AttentionMonitor {
        &self.monitor
    }

    /// Seconds into the recording of the latest record
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn summary(&self) -> SessionSummary {
        self.monitor.summary_at(self.instant(self.clock))
    }
}

/// Replay a whole trace, optionally writing each frame report as a JSON line
pub fn run<R, W>(
    config: &MonitorConfig,
    input: R,
    out: &mut W,
    json: bool,
) -> anyhow::Result<SessionSummary>
where
    R: BufRead,
    W: Write,
{
    let mut replay = Replay::new(config).context("Invalid attention configuration")?;
    let mut reader = TraceReader::new(input);
    info!(
        "Replaying trace at {}x{} ({} fps nominal)",
        config.camera.width, config.camera.height, config.camera.fps
    );

    while let Some(record) = reader.next() {
        let record = record?;
        let report = replay
            .apply(&record)
            .with_context(|| format!("Trace line {}", reader.line()))?;

        let Some(report) = report else {
            debug!("Applied control at line {}", reader.line());
            continue;
        };

        if json {
            serde_json::to_writer(&mut *out, &report)?;
            writeln!(out)?;
        }

        let frames = replay.monitor().session().total_frames();
        if frames % config.status_interval == 0 {
            info!("{}", status_line(&report, frames));
        }
    }

    out.flush()?;
    Ok(replay.summary())
}
