use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::BoundingBox;

/// Scripted detector for tests and demos.
///
/// Replays a queue of per-frame outcomes; once the queue is exhausted
/// the final outcome repeats. `Err` steps model a stalled or failing
/// detection call.
#[derive(Default)]
pub struct ScriptedBackend {
    steps: VecDeque<ScriptedStep>,
    last: Option<ScriptedStep>,
}

#[derive(Clone, Debug)]
enum ScriptedStep {
    Boxes(Vec<BoundingBox>),
    Fail,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_boxes(&mut self, boxes: Vec<BoundingBox>) -> &mut Self {
        self.steps.push_back(ScriptedStep::Boxes(boxes));
        self
    }

    pub fn push_failure(&mut self) -> &mut Self {
        self.steps.push_back(ScriptedStep::Fail);
        self
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(
        &mut self,
        _pixels: &[u8],
        _width: u32,
        _height: u32,
        min_confidence: f32,
    ) -> Result<Vec<BoundingBox>> {
        let step = match self.steps.pop_front() {
            Some(step) => {
                self.last = Some(step.clone());
                step
            }
            None => self
                .last
                .clone()
                .unwrap_or(ScriptedStep::Boxes(Vec::new())),
        };
        match step {
            ScriptedStep::Boxes(boxes) => Ok(boxes
                .into_iter()
                .filter(|b| b.confidence >= min_confidence)
                .collect()),
            ScriptedStep::Fail => Err(anyhow!("scripted detector failure")),
        }
    }
}
