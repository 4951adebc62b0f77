//! Frame containers.
//!
//! `Frame` holds one decoded RGB24 image. Sources produce frames at
//! whatever size the camera delivers; the supervisor resizes them to
//! the configured output resolution before detection and annotation.
//!
//! `FrameResult` is the per-iteration publication unit: the annotated
//! image plus the counters derived from it. It is immutable after
//! construction and handed to readers as a whole, never field-by-field.

use anyhow::{anyhow, Result};

/// Decoded RGB24 image. Row-major, 3 bytes per pixel, no padding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))? as usize;
        if data.len() != expected {
            return Err(anyhow!(
                "frame length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Set one pixel. Out-of-bounds coordinates are ignored so that
    /// annotation primitives can clip at the frame edge.
    pub fn put_pixel(&mut self, x: i32, y: i32, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        self.data[offset..offset + 3].copy_from_slice(&rgb);
    }

    /// Nearest-neighbor resize to the requested output resolution.
    ///
    /// Returns a clone when the size already matches.
    pub fn resize(&self, width: u32, height: u32) -> Frame {
        if width == self.width && height == self.height {
            return self.clone();
        }
        let mut out = vec![0u8; width as usize * height as usize * 3];
        for y in 0..height as usize {
            let src_y = y * self.height as usize / height as usize;
            let src_row = src_y * self.width as usize;
            let dst_row = y * width as usize;
            for x in 0..width as usize {
                let src_x = x * self.width as usize / width as usize;
                let src = (src_row + src_x) * 3;
                let dst = (dst_row + x) * 3;
                out[dst..dst + 3].copy_from_slice(&self.data[src..src + 3]);
            }
        }
        Frame {
            width,
            height,
            data: out,
        }
    }
}

/// One iteration's worth of output, published atomically.
#[derive(Clone, Debug)]
pub struct FrameResult {
    pub image: Frame,
    pub people_count: u32,
    pub intruder_count: u32,
    pub alert: bool,
}

impl FrameResult {
    /// `alert` is derived, never stored independently of the counts.
    pub fn new(image: Frame, people_count: u32, intruder_count: u32) -> Self {
        debug_assert!(intruder_count <= people_count);
        Self {
            image,
            people_count,
            intruder_count,
            alert: intruder_count > 0,
        }
    }
}
