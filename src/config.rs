//! Configuration.
//!
//! Two layers live here:
//!
//! - `ZonewatchConfig`: process startup settings (API address, camera
//!   URLs, initial resolution and tier), loaded from an optional JSON
//!   file with environment overrides.
//! - `ConfigStore`: the live, mutable runtime configuration shared
//!   between HTTP handlers (writers) and the capture supervisor (one
//!   whole-struct snapshot per iteration). The stream-change decision
//!   must never act on a torn mix of old and new fields, so the store
//!   hands out the full `StreamConfig` under a single lock.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use crate::geometry::{Point, Zone};

const DEFAULT_API_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_STREAM_MAIN: &str = "stub://camera_main";
const DEFAULT_STREAM_SUB: &str = "stub://camera_sub";
const DEFAULT_HEALTH_LOG_SECS: u64 = 5;

// -------------------- Closed identifier sets --------------------

/// Which of the camera's feeds the supervisor is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamId {
    Main,
    Sub,
}

impl StreamId {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "main" => Some(Self::Main),
            "sub" => Some(Self::Sub),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Sub => "sub",
        }
    }
}

/// Output resolution presets. Fixed pixel dimensions, no free-form sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Low,
    Medium,
    High,
}

impl Resolution {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Low => (640, 360),
            Self::Medium => (1280, 720),
            Self::High => (1920, 1080),
        }
    }
}

/// Detection quality/speed tier. Unknown tier names are rejected at
/// parse time, so the store can never hold an unsupported tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelTier {
    Fast,
    Balanced,
    Accurate,
}

impl ModelTier {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fast" => Some(Self::Fast),
            "balanced" => Some(Self::Balanced),
            "accurate" => Some(Self::Accurate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Accurate => "accurate",
        }
    }
}

// -------------------- Live runtime configuration --------------------

/// Self-consistent snapshot of everything the supervisor reads per tick.
#[derive(Clone, Debug)]
pub struct StreamConfig {
    pub stream: StreamId,
    pub width: u32,
    pub height: u32,
    pub tier: ModelTier,
    pub zone: Zone,
}

/// Shared mutable runtime configuration.
///
/// Writers are HTTP handlers; the primary reader is the supervisor,
/// once per iteration. Changes land at the next iteration start at the
/// earliest, never mid-iteration.
pub struct ConfigStore {
    inner: Mutex<StreamConfig>,
}

impl ConfigStore {
    pub fn new(initial: StreamConfig) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }

    pub fn snapshot(&self) -> StreamConfig {
        self.lock().clone()
    }

    pub fn set_stream(&self, stream: StreamId) {
        self.lock().stream = stream;
    }

    pub fn set_resolution(&self, resolution: Resolution) {
        let (width, height) = resolution.dimensions();
        let mut cfg = self.lock();
        cfg.width = width;
        cfg.height = height;
    }

    pub fn set_tier(&self, tier: ModelTier) {
        self.lock().tier = tier;
    }

    /// Wholesale zone replacement. Degenerate point lists are accepted;
    /// a zone with fewer than three points simply never matches.
    pub fn set_zone(&self, points: Vec<Point>) {
        self.lock().zone = Zone::new(points);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StreamConfig> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        let (width, height) = Resolution::Medium.dimensions();
        Self::new(StreamConfig {
            stream: StreamId::Main,
            width,
            height,
            tier: ModelTier::Fast,
            zone: Zone::default(),
        })
    }
}

// -------------------- Startup configuration --------------------

#[derive(Debug, Deserialize, Default)]
struct ZonewatchConfigFile {
    api: Option<ApiConfigFile>,
    streams: Option<StreamConfigFile>,
    resolution: Option<String>,
    model: Option<String>,
    health_log_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiConfigFile {
    addr: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct StreamConfigFile {
    main: Option<String>,
    sub: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ZonewatchConfig {
    pub api_addr: String,
    pub stream_main: String,
    pub stream_sub: String,
    pub resolution: Resolution,
    pub tier: ModelTier,
    pub health_log_interval: Duration,
}

impl ZonewatchConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ZONEWATCH_CONFIG").ok();
        Self::load_from(config_path.as_deref().map(Path::new))
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => ZonewatchConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg)?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ZonewatchConfigFile) -> Result<Self> {
        let api_addr = file
            .api
            .and_then(|api| api.addr)
            .unwrap_or_else(|| DEFAULT_API_ADDR.to_string());
        let stream_main = file
            .streams
            .as_ref()
            .and_then(|streams| streams.main.clone())
            .unwrap_or_else(|| DEFAULT_STREAM_MAIN.to_string());
        let stream_sub = file
            .streams
            .and_then(|streams| streams.sub)
            .unwrap_or_else(|| DEFAULT_STREAM_SUB.to_string());
        let resolution = match file.resolution {
            Some(name) => Resolution::parse(&name)
                .ok_or_else(|| anyhow!("unknown resolution '{}' in config file", name))?,
            None => Resolution::Medium,
        };
        let tier = match file.model {
            Some(name) => ModelTier::parse(&name)
                .ok_or_else(|| anyhow!("unknown model tier '{}' in config file", name))?,
            None => ModelTier::Fast,
        };
        let health_log_interval =
            Duration::from_secs(file.health_log_secs.unwrap_or(DEFAULT_HEALTH_LOG_SECS));
        Ok(Self {
            api_addr,
            stream_main,
            stream_sub,
            resolution,
            tier,
            health_log_interval,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(addr) = std::env::var("ZONEWATCH_API_ADDR") {
            if !addr.trim().is_empty() {
                self.api_addr = addr;
            }
        }
        if let Ok(url) = std::env::var("ZONEWATCH_STREAM_MAIN") {
            if !url.trim().is_empty() {
                self.stream_main = url;
            }
        }
        if let Ok(url) = std::env::var("ZONEWATCH_STREAM_SUB") {
            if !url.trim().is_empty() {
                self.stream_sub = url;
            }
        }
        if let Ok(secs) = std::env::var("ZONEWATCH_HEALTH_LOG_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                anyhow!("ZONEWATCH_HEALTH_LOG_SECS must be an integer number of seconds")
            })?;
            self.health_log_interval = Duration::from_secs(secs);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.stream_main.trim().is_empty() || self.stream_sub.trim().is_empty() {
            return Err(anyhow!("stream URLs must not be empty"));
        }
        if self.health_log_interval.as_secs() == 0 {
            return Err(anyhow!("health log interval must be greater than zero"));
        }
        Ok(())
    }

    /// Initial runtime configuration derived from startup settings.
    pub fn initial_stream_config(&self) -> StreamConfig {
        let (width, height) = self.resolution.dimensions();
        StreamConfig {
            stream: StreamId::Main,
            width,
            height,
            tier: self.tier,
            zone: Zone::default(),
        }
    }
}

fn read_config_file(path: &Path) -> Result<ZonewatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
