use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::BoundingBox;

/// Synthetic person detector.
///
/// Stands in for the real model tiers in default builds and demos.
/// It derives a deterministic "walking person" box from a hash of the
/// frame content, so identical frames detect identically and moving
/// synthetic scenes produce a moving detection. Roughly one frame in
/// four reports nobody present.
pub struct SyntheticBackend {
    name: &'static str,
    base_confidence: f32,
}

impl SyntheticBackend {
    pub fn new(name: &'static str, base_confidence: f32) -> Self {
        Self {
            name,
            base_confidence,
        }
    }
}

impl DetectorBackend for SyntheticBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn detect(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        min_confidence: f32,
    ) -> Result<Vec<BoundingBox>> {
        let digest: [u8; 32] = Sha256::digest(pixels).into();

        if digest[0] % 4 == 0 {
            return Ok(vec![]);
        }

        // Place a box roughly a quarter of the frame in size, anchored
        // by hash bytes so position is stable for a given frame.
        let box_w = (width / 4).max(1) as i32;
        let box_h = (height / 3).max(1) as i32;
        let max_x = (width as i32 - box_w).max(1);
        let max_y = (height as i32 - box_h).max(1);
        let x1 = (u16::from_le_bytes([digest[1], digest[2]]) as i32) % max_x;
        let y1 = (u16::from_le_bytes([digest[3], digest[4]]) as i32) % max_y;

        let confidence =
            (self.base_confidence + f32::from(digest[5]) / 255.0 * 0.1).clamp(0.0, 1.0);
        if confidence < min_confidence {
            return Ok(vec![]);
        }

        Ok(vec![BoundingBox::new(
            x1,
            y1,
            x1 + box_w,
            y1 + box_h,
            confidence,
        )])
    }
}
