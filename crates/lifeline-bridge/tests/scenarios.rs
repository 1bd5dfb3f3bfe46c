//! End-to-end behavior of the bridge over on-disk storage and the channel gateway

use std::sync::Arc;

use lifeline_bridge::{
    Bridge, BridgeContext, CacheOutcome, EmittedEvent, EventEmitter, InitOutcome, ManualClock,
    ManualLifecycleSource, NamedUnit, RecordingCrashClient,
};
use lifeline_core::config::ConfigBuilder;
use lifeline_core::domain::{SessionState, UnitSignal, User};
use lifeline_telemetry::{FileKeyValueStore, LocalEnvironment};
use serde_json::{json, Map};
use tokio::sync::mpsc::UnboundedReceiver;

struct Harness {
    bridge: Bridge,
    source: Arc<ManualLifecycleSource>,
    clock: Arc<ManualClock>,
    events: UnboundedReceiver<EmittedEvent>,
}

fn harness(dir: &std::path::Path, capacity: i64) -> Harness {
    let (emitter, events) = EventEmitter::channel();
    let source = Arc::new(ManualLifecycleSource::new());
    let clock = Arc::new(ManualClock::starting_at(1_700_000_000_000));
    let context = BridgeContext::new(
        Arc::new(FileKeyValueStore::new(dir)),
        Arc::new(RecordingCrashClient::new()),
        Arc::new(emitter),
        source.clone(),
    )
    .with_environment(Arc::new(LocalEnvironment::with_device_id("it-device")))
    .with_clock(clock.clone())
    .with_cache_capacity(capacity);

    Harness {
        bridge: Bridge::new(context).unwrap(),
        source,
        clock,
        events,
    }
}

fn drain(rx: &mut UnboundedReceiver<EmittedEvent>) -> Vec<EmittedEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn test_capacity_three_retains_the_last_three_reports() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), 3);

    for id in ["a", "b", "c", "d"] {
        let outcome = h
            .bridge
            .cache_report(json!({ "id": id }).to_string())
            .await
            .unwrap();
        assert!(matches!(outcome, CacheOutcome::Stored { .. }));
    }

    // A fresh bridge over the same directory sees the persisted log
    let reopened = harness(dir.path(), 3);
    let ids: Vec<String> = reopened
        .bridge
        .flush_report_cache()
        .await
        .unwrap()
        .iter()
        .map(|r| r.as_value()["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["b", "c", "d"]);
    assert!(reopened.bridge.is_cache_empty().await.unwrap());
}

#[tokio::test]
async fn test_single_unit_session_emits_the_full_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = harness(dir.path(), 10);
    assert_eq!(
        h.bridge.init_lifecycle_tracking(None).unwrap(),
        InitOutcome::Initialized
    );

    let x = NamedUnit::shared("X");
    h.clock.advance(50);
    h.source.dispatch(UnitSignal::Created, &x);
    h.source.dispatch(UnitSignal::Started, &x);
    h.clock.advance(200);
    h.source.dispatch(UnitSignal::Resumed, &x);
    assert_eq!(h.bridge.session_state(), SessionState::Active);
    assert_eq!(h.bridge.current_view_name(), "X");
    h.source.dispatch(UnitSignal::Paused, &x);
    h.source.dispatch(UnitSignal::Stopped, &x);
    h.source.dispatch(UnitSignal::Destroyed, &x);

    let events = drain(&mut h.events);
    let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "ON_VIEW_LOADING",
            "ON_SESSION_RESUME",
            "ON_SESSION_PAUSE",
            "ON_SESSION_END"
        ]
    );
    assert_eq!(
        events[0].payload,
        json!({"viewname": "X", "time": 1_700_000_000_050u64})
    );
    assert_eq!(events[1].payload, json!({"viewname": "X", "duration": 250}));
    assert_eq!(h.bridge.current_view_name(), "");
}

#[tokio::test]
async fn test_second_lifecycle_init_does_not_duplicate_events() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = harness(dir.path(), 10);
    let main = NamedUnit::shared("Main");

    h.bridge.init_lifecycle_tracking(Some(main.clone())).unwrap();
    assert_eq!(
        h.bridge.init_lifecycle_tracking(Some(main.clone())).unwrap(),
        InitOutcome::AlreadyInitialized
    );
    h.source.dispatch(UnitSignal::Resumed, &main);

    let names: Vec<String> = drain(&mut h.events).into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["ON_VIEW_LOADING", "ON_SESSION_RESUME"]);
    assert_eq!(h.source.registrations(), 1);
}

#[tokio::test]
async fn test_script_runtime_reports_are_vetoed_and_others_pass() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), 10);

    let scripted = json!({
        "OccurredOn": "2024-03-01T10:00:00Z",
        "Details": {"Error": {"ClassName": "Error", "Message": "JavascriptException: undefined"}}
    });
    let native = json!({
        "OccurredOn": "2024-03-01T10:00:01Z",
        "Details": {"Error": {"ClassName": "OutOfMemoryError", "Message": "heap exhausted"}}
    });

    assert_eq!(
        h.bridge.cache_report(scripted.to_string()).await.unwrap(),
        CacheOutcome::Vetoed
    );
    assert_eq!(
        h.bridge.cache_report(native.to_string()).await.unwrap(),
        CacheOutcome::Stored { evicted: 0 }
    );

    let flushed = h.bridge.flush_report_cache().await.unwrap();
    assert_eq!(flushed.len(), 1);
    assert_eq!(flushed[0].as_value(), &native);
}

#[tokio::test]
async fn test_clear_session_resets_metadata_for_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), 10);
    let config = ConfigBuilder::new().api_key("k").version("3.0.0").build();
    h.bridge.init(&config.crash_reporting).unwrap();

    h.bridge
        .set_user(User::new("jane").with_full_name("Jane Doe"))
        .unwrap();
    h.bridge.set_tags(["vip"]).unwrap();
    let mut data = Map::new();
    data.insert("cart".into(), json!(3));
    h.bridge.add_custom_data(data).unwrap();
    h.bridge
        .record_breadcrumb("checkout", Some("flow"), "Error", Map::new())
        .unwrap();

    h.bridge.clear_session().unwrap();

    let metadata = h.bridge.session_metadata();
    assert_eq!(metadata.user, User::default());
    assert!(metadata.tags.is_empty());
    assert!(metadata.custom_data.is_empty());
    assert!(metadata.breadcrumbs.is_empty());
}

#[tokio::test]
async fn test_consumer_going_away_does_not_disturb_tracking() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(dir.path(), 10);
    drop(h.events);

    h.bridge.init_lifecycle_tracking(None).unwrap();
    let x = NamedUnit::shared("X");
    h.source.dispatch(UnitSignal::Created, &x);
    h.source.dispatch(UnitSignal::Resumed, &x);
    assert_eq!(h.bridge.session_state(), SessionState::Active);
}
