//! End-to-end recovery behavior of the capture supervisor, driven
//! through the public tick API with scripted sources and detectors.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use zonewatch::{
    BoundingBox, CaptureSupervisor, ConfigStore, Frame, LatestFrameState, ModelTier, Point,
    Resolution, ScriptedBackend, SourceOpener, StreamId, StreamSource, StreamUrls, SupervisorState,
    TickOutcome, TierRegistry,
};

/// Source whose reads follow a script: `true` yields a frame, `false`
/// fails the read.
struct ScriptedSource {
    reads: VecDeque<bool>,
}

impl StreamSource for ScriptedSource {
    fn read_frame(&mut self) -> Result<Frame> {
        if self.reads.pop_front().unwrap_or(true) {
            Frame::new(vec![10u8; 32 * 24 * 3], 32, 24)
        } else {
            anyhow::bail!("simulated stream loss")
        }
    }
}

struct ScriptedOpener {
    sources: VecDeque<Option<Vec<bool>>>,
    opened: Arc<Mutex<Vec<String>>>,
}

impl SourceOpener for ScriptedOpener {
    fn open(&mut self, url: &str) -> Result<Box<dyn StreamSource>> {
        self.opened.lock().unwrap().push(url.to_string());
        match self.sources.pop_front() {
            Some(Some(reads)) => Ok(Box::new(ScriptedSource {
                reads: reads.into(),
            })),
            Some(None) => anyhow::bail!("simulated open failure"),
            None => Ok(Box::new(ScriptedSource {
                reads: VecDeque::new(),
            })),
        }
    }
}

struct Harness {
    supervisor: CaptureSupervisor,
    config: Arc<ConfigStore>,
    latest: Arc<LatestFrameState>,
    opened: Arc<Mutex<Vec<String>>>,
}

fn harness(sources: Vec<Option<Vec<bool>>>, backend: ScriptedBackend) -> Harness {
    let opened = Arc::new(Mutex::new(Vec::new()));
    let opener = ScriptedOpener {
        sources: sources.into(),
        opened: opened.clone(),
    };
    let mut registry = TierRegistry::new();
    registry.register(ModelTier::Fast, backend);
    let config = Arc::new(ConfigStore::default());
    config.set_resolution(Resolution::Low);
    let latest = Arc::new(LatestFrameState::new());
    let supervisor = CaptureSupervisor::new(
        Box::new(opener),
        StreamUrls {
            main: "stub://front_main".into(),
            sub: "stub://front_sub".into(),
        },
        Arc::new(registry),
        config.clone(),
        latest.clone(),
    );
    Harness {
        supervisor,
        config,
        latest,
        opened,
    }
}

#[test]
fn recovers_after_three_consecutive_read_failures() {
    // Three sources that die on their first read, then a healthy one.
    let mut h = harness(
        vec![
            Some(vec![false]),
            Some(vec![false]),
            Some(vec![false]),
            Some(vec![]),
        ],
        ScriptedBackend::new(),
    );

    for _ in 0..3 {
        assert_eq!(h.supervisor.tick(), TickOutcome::Opened);
        assert_eq!(h.supervisor.tick(), TickOutcome::ReadFailed);
        assert_eq!(h.supervisor.state(), SupervisorState::Disconnected);
    }

    assert_eq!(h.supervisor.tick(), TickOutcome::Opened);
    assert_eq!(h.supervisor.tick(), TickOutcome::Published);
    assert_eq!(h.supervisor.state(), SupervisorState::Connected);
    // One session per open attempt, none left dangling.
    assert_eq!(h.opened.lock().unwrap().len(), 4);
}

#[test]
fn stream_change_lands_within_one_polling_cycle() {
    let mut h = harness(vec![Some(vec![]), Some(vec![])], ScriptedBackend::new());
    assert_eq!(h.supervisor.tick(), TickOutcome::Opened);

    h.config.set_stream(StreamId::Sub);
    assert_eq!(h.supervisor.tick(), TickOutcome::StreamSwitched);
    assert_eq!(h.supervisor.tick(), TickOutcome::Opened);
    assert_eq!(
        h.opened.lock().unwrap().as_slice(),
        ["stub://front_main", "stub://front_sub"]
    );
}

#[test]
fn in_place_changes_keep_the_session_alive() {
    let mut backend = ScriptedBackend::new();
    backend.push_boxes(vec![]);
    let mut h = harness(vec![Some(vec![])], backend);
    h.supervisor.tick();

    h.config.set_resolution(Resolution::High);
    h.config.set_tier(ModelTier::Fast);
    for _ in 0..4 {
        assert_eq!(h.supervisor.tick(), TickOutcome::Published);
    }
    assert_eq!(h.supervisor.state(), SupervisorState::Connected);
    assert_eq!(h.opened.lock().unwrap().len(), 1);

    let result = h.latest.read().expect("published frame");
    assert_eq!(result.image.width(), 1920);
    assert_eq!(result.image.height(), 1080);
}

#[test]
fn intrusion_counts_and_alert_follow_the_zone() {
    let mut backend = ScriptedBackend::new();
    backend
        .push_boxes(vec![BoundingBox::new(2, 2, 4, 4, 0.9)])
        .push_boxes(vec![BoundingBox::new(20, 20, 24, 24, 0.9)]);
    let mut h = harness(vec![Some(vec![])], backend);
    h.config.set_zone(vec![
        Point::new(0, 0),
        Point::new(0, 10),
        Point::new(10, 10),
        Point::new(10, 0),
    ]);
    h.supervisor.tick();

    h.supervisor.tick();
    let inside = h.latest.read().expect("published frame");
    assert_eq!(
        (inside.people_count, inside.intruder_count, inside.alert),
        (1, 1, true)
    );

    h.supervisor.tick();
    let outside = h.latest.read().expect("published frame");
    assert_eq!(
        (outside.people_count, outside.intruder_count, outside.alert),
        (1, 0, false)
    );
}

#[test]
fn clearing_the_zone_silences_alerts() {
    let mut backend = ScriptedBackend::new();
    backend.push_boxes(vec![
        BoundingBox::new(2, 2, 4, 4, 0.9),
        BoundingBox::new(50, 50, 70, 90, 0.8),
    ]);
    let mut h = harness(vec![Some(vec![])], backend);
    h.config.set_zone(vec![
        Point::new(0, 0),
        Point::new(0, 100),
        Point::new(100, 100),
    ]);
    h.supervisor.tick();
    h.supervisor.tick();
    assert!(h.latest.read().expect("published frame").alert);

    h.config.set_zone(vec![]);
    h.supervisor.tick();
    let result = h.latest.read().expect("published frame");
    assert_eq!(result.people_count, 2);
    assert_eq!(result.intruder_count, 0);
    assert!(!result.alert);
}
