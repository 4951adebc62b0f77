use std::sync::Mutex;

use tempfile::NamedTempFile;

use zonewatch::{ModelTier, Resolution, StreamId, ZonewatchConfig};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "ZONEWATCH_CONFIG",
        "ZONEWATCH_API_ADDR",
        "ZONEWATCH_STREAM_MAIN",
        "ZONEWATCH_STREAM_SUB",
        "ZONEWATCH_HEALTH_LOG_SECS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = ZonewatchConfig::load_from(None).expect("load config");
    assert_eq!(cfg.api_addr, "127.0.0.1:5000");
    assert_eq!(cfg.stream_main, "stub://camera_main");
    assert_eq!(cfg.stream_sub, "stub://camera_sub");
    assert_eq!(cfg.resolution, Resolution::Medium);
    assert_eq!(cfg.tier, ModelTier::Fast);

    let initial = cfg.initial_stream_config();
    assert_eq!(initial.stream, StreamId::Main);
    assert_eq!((initial.width, initial.height), (1280, 720));
    assert!(!initial.zone.is_active());

    clear_env();
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "api": { "addr": "0.0.0.0:8080" },
        "streams": {
            "main": "rtsp://camera-1:554/h264_main",
            "sub": "rtsp://camera-1:554/h264_sub"
        },
        "resolution": "high",
        "model": "balanced",
        "health_log_secs": 30
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("ZONEWATCH_API_ADDR", "127.0.0.1:9000");
    std::env::set_var("ZONEWATCH_STREAM_SUB", "rtsp://camera-2:554/h264_sub");
    std::env::set_var("ZONEWATCH_HEALTH_LOG_SECS", "10");

    let cfg = ZonewatchConfig::load_from(Some(file.path())).expect("load config");

    assert_eq!(cfg.api_addr, "127.0.0.1:9000");
    assert_eq!(cfg.stream_main, "rtsp://camera-1:554/h264_main");
    assert_eq!(cfg.stream_sub, "rtsp://camera-2:554/h264_sub");
    assert_eq!(cfg.resolution, Resolution::High);
    assert_eq!(cfg.tier, ModelTier::Balanced);
    assert_eq!(cfg.health_log_interval.as_secs(), 10);

    clear_env();
}

#[test]
fn unknown_tier_in_file_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{ "model": "turbo" }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    assert!(ZonewatchConfig::load_from(Some(file.path())).is_err());

    clear_env();
}
