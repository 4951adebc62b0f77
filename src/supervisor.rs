//! Capture supervisor.
//!
//! The one long-lived worker that owns the camera connection. Each
//! tick it takes a single consistent configuration snapshot, then in
//! priority order: reconnects if disconnected, tears down on a stream
//! switch, reads a frame, and runs the detect/evaluate/annotate/publish
//! pipeline. Stream loss is never fatal; the loop retries with a fixed
//! backoff until shutdown is signalled.
//!
//! Resolution and model-tier changes apply in place on the next tick.
//! Only a stream-id change (or a read failure) closes the source. A
//! failed detection call is treated exactly like a read failure: the
//! session is torn down and reopened.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Result;

use crate::annotate;
use crate::config::{ConfigStore, StreamConfig, StreamId};
use crate::detect::TierRegistry;
use crate::frame::{Frame, FrameResult};
use crate::ingest::{SourceOpener, StreamSource};
use crate::state::LatestFrameState;

/// Fixed reconnect delay. Deliberately not exponential: the original
/// operator workflow expects the camera to come back within seconds.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Pause between processed frames, to bound CPU use.
pub const FRAME_PAUSE: Duration = Duration::from_millis(20);

/// Fixed detection confidence floor for the single person class.
pub const MIN_CONFIDENCE: f32 = 0.5;

/// URLs for the closed set of camera feeds.
#[derive(Clone, Debug)]
pub struct StreamUrls {
    pub main: String,
    pub sub: String,
}

impl StreamUrls {
    pub fn url_for(&self, stream: StreamId) -> &str {
        match stream {
            StreamId::Main => &self.main,
            StreamId::Sub => &self.sub,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupervisorState {
    Disconnected,
    Connected,
}

/// What one tick did. `run` uses this to decide how long to sleep;
/// tests use it to observe transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Opened a source and entered `Connected`.
    Opened,
    /// Open attempt failed; still `Disconnected`, backoff applies.
    OpenFailed,
    /// Live stream id differed from the session's; source closed.
    StreamSwitched,
    /// Frame read or detection failed; source closed.
    ReadFailed,
    /// Frame processed and published.
    Published,
}

struct Session {
    source: Box<dyn StreamSource>,
    stream: StreamId,
}

pub struct CaptureSupervisor {
    opener: Box<dyn SourceOpener>,
    urls: StreamUrls,
    registry: Arc<TierRegistry>,
    config: Arc<ConfigStore>,
    latest: Arc<LatestFrameState>,
    session: Option<Session>,
}

impl CaptureSupervisor {
    pub fn new(
        opener: Box<dyn SourceOpener>,
        urls: StreamUrls,
        registry: Arc<TierRegistry>,
        config: Arc<ConfigStore>,
        latest: Arc<LatestFrameState>,
    ) -> Self {
        Self {
            opener,
            urls,
            registry,
            config,
            latest,
            session: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        if self.session.is_some() {
            SupervisorState::Connected
        } else {
            SupervisorState::Disconnected
        }
    }

    /// One iteration of the supervisor loop.
    pub fn tick(&mut self) -> TickOutcome {
        let cfg = self.config.snapshot();

        let Some(session) = self.session.as_mut() else {
            return self.try_open(cfg.stream);
        };

        if session.stream != cfg.stream {
            log::info!(
                "stream switched {} -> {}, closing source",
                session.stream.as_str(),
                cfg.stream.as_str()
            );
            self.session = None;
            return TickOutcome::StreamSwitched;
        }

        let frame = match session.source.read_frame() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("stream lost ({}), reconnecting", err);
                self.session = None;
                return TickOutcome::ReadFailed;
            }
        };

        match self.evaluate(frame, &cfg) {
            Ok(result) => {
                log::debug!(
                    "frame published: people={} intruders={} alert={}",
                    result.people_count,
                    result.intruder_count,
                    result.alert
                );
                self.latest.publish(result);
                TickOutcome::Published
            }
            Err(err) => {
                // Detector stall counts as a lost iteration; reset the
                // session the same way as a read failure.
                log::warn!("frame evaluation failed ({}), reconnecting", err);
                self.session = None;
                TickOutcome::ReadFailed
            }
        }
    }

    fn try_open(&mut self, stream: StreamId) -> TickOutcome {
        let url = self.urls.url_for(stream).to_string();
        match self.opener.open(&url) {
            Ok(source) => {
                log::info!("connected to {} stream ({})", stream.as_str(), url);
                self.session = Some(Session { source, stream });
                TickOutcome::Opened
            }
            Err(err) => {
                log::warn!("failed to open {} stream: {}", stream.as_str(), err);
                TickOutcome::OpenFailed
            }
        }
    }

    /// Resize, detect, count against the zone, annotate.
    fn evaluate(&self, frame: Frame, cfg: &StreamConfig) -> Result<FrameResult> {
        let mut image = frame.resize(cfg.width, cfg.height);

        let boxes = self.registry.detect(
            cfg.tier,
            image.data(),
            image.width(),
            image.height(),
            MIN_CONFIDENCE,
        )?;

        annotate::draw_zone(&mut image, &cfg.zone);

        let mut intruder_count = 0u32;
        for bbox in &boxes {
            let inside = cfg.zone.contains(bbox.center());
            if inside {
                intruder_count += 1;
            }
            annotate::draw_detection(&mut image, bbox, inside);
        }

        Ok(FrameResult::new(image, boxes.len() as u32, intruder_count))
    }

    /// Run until `shutdown` is set. Never exits on stream errors.
    pub fn run(mut self, shutdown: Arc<AtomicBool>) {
        log::info!("capture supervisor started");
        while !shutdown.load(Ordering::SeqCst) {
            match self.tick() {
                TickOutcome::OpenFailed => std::thread::sleep(RETRY_BACKOFF),
                TickOutcome::Published => std::thread::sleep(FRAME_PAUSE),
                TickOutcome::Opened | TickOutcome::StreamSwitched | TickOutcome::ReadFailed => {}
            }
        }
        log::info!("capture supervisor stopped");
    }

    pub fn spawn(self, shutdown: Arc<AtomicBool>) -> JoinHandle<()> {
        std::thread::spawn(move || self.run(shutdown))
    }
}
