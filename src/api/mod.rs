//! HTTP surface.
//!
//! Thin glue over the shared containers: an MJPEG republish of the
//! latest annotated frame, a JSON status summary, and the two
//! configuration endpoints. Hand-rolled on `std::net::TcpListener`;
//! each connection gets its own thread so a long-lived `/video` stream
//! never starves `/status` or configuration requests.
//!
//! Routes:
//! - `GET /video`        multipart MJPEG stream, boundary `frame`
//! - `GET /status`       counts, alert flag, active configuration
//! - `POST /set_polygon` wholesale zone replacement
//! - `POST /set_config`  stream / resolution / model changes
//! - `GET /health`       liveness probe

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::{ConfigStore, ModelTier, Resolution, StreamId};
use crate::frame::FrameResult;
use crate::geometry::Point;
use crate::state::LatestFrameState;

const MAX_REQUEST_BYTES: usize = 65536;
const MJPEG_BOUNDARY: &str = "frame";
const JPEG_QUALITY: u8 = 80;

/// Poll interval while `/video` waits for the first published frame.
const NO_FRAME_WAIT: Duration = Duration::from_millis(10);

/// Pacing between MJPEG parts; matches the supervisor's frame pause.
const STREAM_PACE: Duration = Duration::from_millis(20);

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5000".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ApiHandle {
    pub addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ApiHandle {
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("api server thread panicked"))?;
        }
        Ok(())
    }
}

pub struct ApiServer {
    cfg: ApiConfig,
    config: Arc<ConfigStore>,
    latest: Arc<LatestFrameState>,
}

impl ApiServer {
    pub fn new(cfg: ApiConfig, config: Arc<ConfigStore>, latest: Arc<LatestFrameState>) -> Self {
        Self {
            cfg,
            config,
            latest,
        }
    }

    pub fn spawn(self, shutdown: Arc<AtomicBool>) -> Result<ApiHandle> {
        let listener = TcpListener::bind(self.cfg.addr.as_str())?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let shutdown_thread = shutdown.clone();
        let config = self.config;
        let latest = self.latest;
        let join = std::thread::spawn(move || {
            run_api(listener, config, latest, shutdown_thread);
        });

        Ok(ApiHandle {
            addr,
            shutdown,
            join: Some(join),
        })
    }
}

fn run_api(
    listener: TcpListener,
    config: Arc<ConfigStore>,
    latest: Arc<LatestFrameState>,
    shutdown: Arc<AtomicBool>,
) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match listener.accept() {
            Ok((stream, _)) => {
                let config = config.clone();
                let latest = latest.clone();
                let shutdown = shutdown.clone();
                std::thread::spawn(move || {
                    if let Err(err) = handle_connection(stream, &config, &latest, &shutdown) {
                        log::debug!("api request failed: {}", err);
                    }
                });
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(err) => {
                log::error!("api accept failed: {}", err);
                break;
            }
        }
    }
}

fn handle_connection(
    mut stream: TcpStream,
    config: &ConfigStore,
    latest: &LatestFrameState,
    shutdown: &AtomicBool,
) -> Result<()> {
    let request = read_request(&mut stream)?;
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/health") => write_json_response(&mut stream, 200, r#"{"status":"ok"}"#),
        ("GET", "/status") => {
            let body = status_json(config, latest).to_string();
            write_json_response(&mut stream, 200, &body)
        }
        ("GET", "/video") => stream_video(stream, latest, shutdown),
        ("POST", "/set_polygon") => match parse_polygon(&request.body) {
            Ok(points) => {
                log::info!("zone replaced ({} points)", points.len());
                config.set_zone(points);
                write_json_response(&mut stream, 200, r#"{"status":"ok"}"#)
            }
            Err(err) => {
                log::warn!("rejected polygon update: {}", err);
                write_json_response(&mut stream, 400, r#"{"error":"invalid_body"}"#)
            }
        },
        ("POST", "/set_config") => match serde_json::from_slice::<ConfigBody>(&request.body) {
            Ok(body) => {
                apply_config(config, &body);
                write_json_response(&mut stream, 200, r#"{"status":"updated"}"#)
            }
            Err(err) => {
                log::warn!("rejected config update: {}", err);
                write_json_response(&mut stream, 400, r#"{"error":"invalid_body"}"#)
            }
        },
        ("GET", _) | ("POST", _) => {
            write_json_response(&mut stream, 404, r#"{"error":"not_found"}"#)
        }
        _ => write_json_response(&mut stream, 405, r#"{"error":"method_not_allowed"}"#),
    }
}

// -------------------- Routes --------------------

fn status_json(config: &ConfigStore, latest: &LatestFrameState) -> serde_json::Value {
    let cfg = config.snapshot();
    let result = latest.read();
    let (people, intruders, alert) = match result.as_deref() {
        Some(FrameResult {
            people_count,
            intruder_count,
            alert,
            ..
        }) => (*people_count, *intruder_count, *alert),
        None => (0, 0, false),
    };
    serde_json::json!({
        "people_detected": people,
        "intruders": intruders,
        "alert": alert,
        "stream": cfg.stream.as_str(),
        "model": cfg.tier.as_str(),
        "output": format!("{}x{}", cfg.width, cfg.height),
    })
}

/// Push JPEG snapshots of the latest frame until the client hangs up
/// or the server shuts down. Waits, rather than erroring, while no
/// frame has been published yet.
fn stream_video(
    mut stream: TcpStream,
    latest: &LatestFrameState,
    shutdown: &AtomicBool,
) -> Result<()> {
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: multipart/x-mixed-replace; boundary={}\r\nCache-Control: no-store\r\n\r\n",
        MJPEG_BOUNDARY
    );
    stream.write_all(header.as_bytes())?;

    while !shutdown.load(Ordering::SeqCst) {
        let Some(result) = latest.read() else {
            std::thread::sleep(NO_FRAME_WAIT);
            continue;
        };
        let jpeg = encode_jpeg(&result)?;
        let part = format!(
            "--{}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
            MJPEG_BOUNDARY,
            jpeg.len()
        );
        if stream.write_all(part.as_bytes()).is_err()
            || stream.write_all(&jpeg).is_err()
            || stream.write_all(b"\r\n").is_err()
        {
            // Client disconnected; not an error worth surfacing.
            break;
        }
        std::thread::sleep(STREAM_PACE);
    }
    Ok(())
}

fn encode_jpeg(result: &FrameResult) -> Result<Vec<u8>> {
    let image = &result.image;
    let mut out = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder.encode(
        image.data(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}

#[derive(Debug, Deserialize)]
struct PolygonBody {
    points: Vec<[i32; 2]>,
}

fn parse_polygon(body: &[u8]) -> Result<Vec<Point>> {
    let body: PolygonBody = serde_json::from_slice(body)?;
    Ok(body
        .points
        .into_iter()
        .map(|[x, y]| Point::new(x, y))
        .collect())
}

#[derive(Debug, Default, Deserialize)]
struct ConfigBody {
    stream: Option<String>,
    resolution: Option<String>,
    model: Option<String>,
}

/// Apply recognized fields; unrecognized values are per-field no-ops
/// so one bad field never corrupts the rest of the request.
fn apply_config(config: &ConfigStore, body: &ConfigBody) {
    if let Some(name) = &body.stream {
        match StreamId::parse(name) {
            Some(stream) => config.set_stream(stream),
            None => log::warn!("ignoring unknown stream '{}'", name),
        }
    }
    if let Some(name) = &body.resolution {
        match Resolution::parse(name) {
            Some(resolution) => config.set_resolution(resolution),
            None => log::warn!("ignoring unknown resolution '{}'", name),
        }
    }
    if let Some(name) = &body.model {
        match ModelTier::parse(name) {
            Some(tier) => config.set_tier(tier),
            None => log::warn!("ignoring unknown model tier '{}'", name),
        }
    }
}

// -------------------- Request plumbing --------------------

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

fn read_request(stream: &mut TcpStream) -> Result<HttpRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(2)))?;
    let mut buf = [0u8; 1024];
    let mut data = Vec::new();
    let header_end = loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break data
                .windows(4)
                .position(|w| w == b"\r\n\r\n")
                .ok_or_else(|| anyhow!("connection closed mid-request"))?;
        }
        data.extend_from_slice(&buf[..n]);
        if data.len() > MAX_REQUEST_BYTES {
            return Err(anyhow!("request too large"));
        }
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().ok_or_else(|| anyhow!("empty request"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().ok_or_else(|| anyhow!("missing method"))?;
    let raw_path = parts.next().ok_or_else(|| anyhow!("missing path"))?;
    let mut headers = HashMap::new();
    for line in lines {
        if let Some((k, v)) = line.split_once(':') {
            headers.insert(k.trim().to_lowercase(), v.trim().to_string());
        }
    }

    let content_length: usize = headers
        .get("content-length")
        .map(|v| v.parse())
        .transpose()
        .map_err(|_| anyhow!("invalid content-length"))?
        .unwrap_or(0);
    if content_length > MAX_REQUEST_BYTES {
        return Err(anyhow!("request body too large"));
    }

    let mut body = data[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            return Err(anyhow!("connection closed mid-body"));
        }
        body.extend_from_slice(&buf[..n]);
    }
    body.truncate(content_length);

    let path = raw_path.split('?').next().unwrap_or(raw_path).to_string();
    Ok(HttpRequest {
        method: method.to_string(),
        path,
        body,
    })
}

fn write_json_response(stream: &mut TcpStream, status: u16, body: &str) -> Result<()> {
    let status_line = match status {
        200 => "HTTP/1.1 200 OK",
        400 => "HTTP/1.1 400 Bad Request",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let header = format!(
        "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {len}\r\nCache-Control: no-store\r\n\r\n",
        status_line = status_line,
        len = body.len()
    );
    stream.write_all(header.as_bytes())?;
    stream.write_all(body.as_bytes())?;
    Ok(())
}
