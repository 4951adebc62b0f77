//! zonewatch
//!
//! Single-camera zone-intrusion monitor. One long-running capture
//! supervisor owns the camera connection, evaluates every frame
//! against an operator-drawn polygon, and republishes the annotated
//! feed plus a status summary over HTTP.
//!
//! # Architecture
//!
//! Data flows one way through two shared containers:
//!
//! ```text
//! ConfigStore ──> CaptureSupervisor ──> LatestFrameState ──> HTTP readers
//!                   │          │
//!                   ▼          ▼
//!             TierRegistry   Zone geometry
//! ```
//!
//! - The supervisor is the sole owner of the open `StreamSource` and
//!   the sole writer of `LatestFrameState`.
//! - HTTP handlers write `ConfigStore` and read `LatestFrameState`;
//!   configuration changes land at iteration boundaries, never
//!   mid-frame.
//! - Stream loss, open failure, and detector failure are all
//!   retryable; the supervisor only stops when the process shuts down.
//!
//! # Module Structure
//!
//! - `supervisor`: the capture/evaluate/publish state machine
//! - `ingest`: stream sources (synthetic stub, RTSP via GStreamer)
//! - `detect`: person-detector backends keyed by model tier
//! - `geometry`: zone polygon containment
//! - `state` / `config`: the two shared containers
//! - `annotate`: zone and detection overlay drawing
//! - `api`: MJPEG + JSON HTTP surface

pub mod annotate;
pub mod api;
pub mod config;
pub mod detect;
pub mod frame;
pub mod geometry;
pub mod ingest;
pub mod state;
pub mod supervisor;

pub use config::{ConfigStore, ModelTier, Resolution, StreamConfig, StreamId, ZonewatchConfig};
pub use detect::{BoundingBox, DetectorBackend, ScriptedBackend, SyntheticBackend, TierRegistry};
pub use frame::{Frame, FrameResult};
pub use geometry::{point_in_polygon, Point, Zone};
pub use ingest::{RtspOpener, RtspSource, SourceOpener, StreamSource};
pub use state::LatestFrameState;
pub use supervisor::{
    CaptureSupervisor, StreamUrls, SupervisorState, TickOutcome, FRAME_PAUSE, MIN_CONFIDENCE,
    RETRY_BACKOFF,
};
