//! Frame ingestion.
//!
//! The supervisor owns exactly one open source at a time and is the
//! only component that touches it. Sources are addressed by URL:
//! `stub://` URLs resolve to a synthetic in-process generator (the
//! default for tests and builds without camera support), anything else
//! is treated as a real RTSP stream and requires the `rtsp-gstreamer`
//! feature.
//!
//! Open failures and read failures are both transient by contract; the
//! supervisor retries forever with a fixed backoff.

pub mod rtsp;

pub use rtsp::RtspSource;

use anyhow::Result;

use crate::frame::Frame;

/// One open video feed. Dropping the source closes it.
pub trait StreamSource: Send {
    /// Decode the next frame, blocking until one is available or the
    /// stream fails.
    fn read_frame(&mut self) -> Result<Frame>;
}

/// Opens a source for a stream URL. The production opener builds
/// `RtspSource`s; tests inject scripted openers to drive the
/// supervisor's reconnect machinery.
pub trait SourceOpener: Send {
    fn open(&mut self, url: &str) -> Result<Box<dyn StreamSource>>;
}

/// Default opener backed by `RtspSource`.
#[derive(Default)]
pub struct RtspOpener;

impl SourceOpener for RtspOpener {
    fn open(&mut self, url: &str) -> Result<Box<dyn StreamSource>> {
        Ok(Box::new(RtspSource::open(url)?))
    }
}
