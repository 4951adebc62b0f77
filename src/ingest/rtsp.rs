//! RTSP frame source.
//!
//! `RtspSource` connects to an IP camera feed and decodes frames to
//! RGB24. Real decoding goes through GStreamer behind the
//! `rtsp-gstreamer` feature; `stub://` URLs fall back to a synthetic
//! generator so the rest of the pipeline runs without a camera.

#[cfg(feature = "rtsp-gstreamer")]
use anyhow::Context;
use anyhow::Result;

use crate::frame::Frame;
use crate::ingest::StreamSource;

/// Native size of synthetic frames. Real sources deliver whatever the
/// camera negotiates; the supervisor resizes either way.
const SYNTHETIC_WIDTH: u32 = 640;
const SYNTHETIC_HEIGHT: u32 = 480;

pub struct RtspSource {
    backend: RtspBackend,
}

enum RtspBackend {
    Synthetic(SyntheticSource),
    #[cfg(feature = "rtsp-gstreamer")]
    Gstreamer(GstreamerSource),
}

impl RtspSource {
    /// Open and connect a source for `url`.
    pub fn open(url: &str) -> Result<Self> {
        if url.starts_with("stub://") {
            log::info!("RtspSource: connected to {} (synthetic)", url);
            return Ok(Self {
                backend: RtspBackend::Synthetic(SyntheticSource::new()),
            });
        }
        #[cfg(feature = "rtsp-gstreamer")]
        {
            let source = GstreamerSource::open(url)?;
            log::info!("RtspSource: connected to {}", url);
            Ok(Self {
                backend: RtspBackend::Gstreamer(source),
            })
        }
        #[cfg(not(feature = "rtsp-gstreamer"))]
        {
            anyhow::bail!("RTSP url '{}' requires the rtsp-gstreamer feature", url)
        }
    }
}

impl StreamSource for RtspSource {
    fn read_frame(&mut self) -> Result<Frame> {
        match &mut self.backend {
            RtspBackend::Synthetic(source) => source.read_frame(),
            #[cfg(feature = "rtsp-gstreamer")]
            RtspBackend::Gstreamer(source) => source.read_frame(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://)
// ----------------------------------------------------------------------------

/// Generates a slowly shifting gradient so the synthetic detector has
/// changing content to react to.
struct SyntheticSource {
    frame_count: u64,
    drift: u8,
}

impl SyntheticSource {
    fn new() -> Self {
        Self {
            frame_count: 0,
            drift: rand::random(),
        }
    }

    fn read_frame(&mut self) -> Result<Frame> {
        self.frame_count += 1;
        if self.frame_count % 40 == 0 {
            self.drift = self.drift.wrapping_add(17);
        }
        let pixel_count = (SYNTHETIC_WIDTH * SYNTHETIC_HEIGHT * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count / 8 + self.drift as u64) % 256) as u8;
        }
        Frame::new(pixels, SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT)
    }
}

// ----------------------------------------------------------------------------
// Production source using GStreamer
// ----------------------------------------------------------------------------

#[cfg(feature = "rtsp-gstreamer")]
struct GstreamerSource {
    pipeline: gstreamer::Pipeline,
    appsink: gstreamer_app::AppSink,
}

#[cfg(feature = "rtsp-gstreamer")]
impl GstreamerSource {
    /// Pipeline: rtspsrc ! decodebin ! videoconvert ! RGB appsink with
    /// a one-buffer queue so stale frames are dropped, not buffered.
    fn open(url: &str) -> Result<Self> {
        gstreamer::init().context("initialize gstreamer")?;

        let pipeline_description = format!(
            "rtspsrc location={} latency=0 ! decodebin ! videoconvert ! video/x-raw,format=RGB ! \
             appsink name=appsink sync=false max-buffers=1 drop=true",
            url
        );
        let pipeline = gstreamer::parse_launch(&pipeline_description)
            .context("build RTSP pipeline")?
            .downcast::<gstreamer::Pipeline>()
            .map_err(|_| anyhow::anyhow!("RTSP pipeline is not a Pipeline"))?;

        let appsink = pipeline
            .by_name("appsink")
            .context("appsink element missing from pipeline")?
            .downcast::<gstreamer_app::AppSink>()
            .map_err(|_| anyhow::anyhow!("appsink element has unexpected type"))?;

        let caps = gstreamer::Caps::builder("video/x-raw")
            .field("format", "RGB")
            .build();
        appsink.set_caps(Some(&caps));
        appsink.set_max_buffers(1);
        appsink.set_drop(true);
        appsink.set_sync(false);

        pipeline
            .set_state(gstreamer::State::Playing)
            .context("set RTSP pipeline to Playing")?;

        Ok(Self { pipeline, appsink })
    }

    fn read_frame(&mut self) -> Result<Frame> {
        let sample = self
            .appsink
            .try_pull_sample(gstreamer::ClockTime::from_seconds(2))
            .context("pull RTSP sample")?
            .ok_or_else(|| anyhow::anyhow!("RTSP stream stalled"))?;
        sample_to_frame(&sample)
    }
}

#[cfg(feature = "rtsp-gstreamer")]
impl Drop for GstreamerSource {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gstreamer::State::Null);
    }
}

#[cfg(feature = "rtsp-gstreamer")]
fn sample_to_frame(sample: &gstreamer::Sample) -> Result<Frame> {
    let buffer = sample.buffer().context("RTSP sample missing buffer")?;
    let caps = sample.caps().context("RTSP sample missing caps")?;
    let info =
        gstreamer_video::VideoInfo::from_caps(caps).context("parse RTSP caps as video info")?;

    let width = info.width();
    let height = info.height();
    let row_bytes = (width as usize) * 3;
    let stride = info.stride(0) as usize;

    let map = buffer.map_readable().context("map RTSP buffer")?;
    let data = map.as_slice();

    if stride == row_bytes {
        return Frame::new(data.to_vec(), width, height);
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("RTSP buffer row is out of bounds")?,
        );
    }
    Frame::new(pixels, width, height)
}
