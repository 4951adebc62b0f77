use anyhow::Result;

use crate::detect::result::BoundingBox;

/// Person-detector backend.
///
/// One implementation backs each model tier. The pipeline is
/// single-class: backends report person detections only, already
/// filtered to the requested minimum confidence.
///
/// Implementations must treat the pixel slice as read-only and
/// ephemeral; frames are not retained across calls.
pub trait DetectorBackend: Send {
    /// Backend identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Run detection on one RGB24 frame.
    fn detect(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        min_confidence: f32,
    ) -> Result<Vec<BoundingBox>>;
}
