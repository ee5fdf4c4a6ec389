mod support;

use instant::Instant;
use mapframe::{MapConfig, MapEvent, MapId, MapOptions, Mode};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use support::{Harness, RecordingContainer};

fn mode_changes(harness: &Harness) -> Vec<(MapId, Mode)> {
    harness
        .host
        .process_events()
        .into_iter()
        .filter_map(|event| match event {
            MapEvent::ModeChanged { map, mode } => Some((map, mode)),
            _ => None,
        })
        .collect()
}

fn debounced(ms: u64) -> MapConfig {
    let mut config = MapConfig::for_testing();
    config.responsive.debounce_ms = ms;
    config
}

#[tokio::test]
async fn test_narrow_viewport_switches_to_static_once() {
    let harness = Harness::new(1200.0);
    let (container, log) = RecordingContainer::new(600.0, 400.0);
    let id = harness
        .host
        .build_map(MapOptions::default(), container)
        .await
        .unwrap();
    assert_eq!(harness.host.with_map(id, |map| map.mode()), Some(Mode::Interactive));
    harness.host.process_events();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    harness.host.on("modechanged", move |event| {
        sink.borrow_mut().push(event.clone());
    });

    let now = Instant::now();
    harness.host.on_viewport_resize(400.0, now);
    assert_eq!(harness.host.tick(now), 1);
    harness.host.on_viewport_resize(350.0, now);
    assert_eq!(harness.host.tick(now), 0);

    assert_eq!(mode_changes(&harness), vec![(id, Mode::Static)]);
    assert_eq!(seen.borrow().len(), 1);
    assert_eq!(harness.host.with_map(id, |map| map.mode()), Some(Mode::Static));
    assert_eq!(log.borrow().last_interaction(), Some(Mode::Static.flags()));
}

#[tokio::test]
async fn test_widening_viewport_restores_interaction() {
    let harness = Harness::new(400.0);
    let (container, log) = RecordingContainer::new(300.0, 200.0);
    let id = harness
        .host
        .build_map(MapOptions::default(), container)
        .await
        .unwrap();
    assert_eq!(harness.host.with_map(id, |map| map.mode()), Some(Mode::Static));

    let now = Instant::now();
    harness.host.on_viewport_resize(1400.0, now);
    harness.host.tick(now);

    assert_eq!(
        harness.host.with_map(id, |map| map.mode()),
        Some(Mode::Interactive)
    );
    let flags = log.borrow().last_interaction().unwrap();
    assert!(flags.dragging && flags.scroll_wheel_zoom && !flags.sleep);
}

#[tokio::test]
async fn test_container_spanning_the_page_is_static() {
    let harness = Harness::new(1200.0);
    let (container, log) = RecordingContainer::new(1100.0, 400.0);
    let id = harness
        .host
        .build_map(MapOptions::default(), container)
        .await
        .unwrap();

    assert_eq!(harness.host.with_map(id, |map| map.mode()), Some(Mode::Static));
    let flags = log.borrow().last_interaction().unwrap();
    assert!(!flags.dragging);
    assert!(!flags.scroll_wheel_zoom);
    assert!(flags.sleep);
}

#[tokio::test]
async fn test_resize_burst_evaluates_last_width_only() {
    let harness = Harness::with_config(debounced(200), 1200.0);
    let (container, _) = RecordingContainer::new(600.0, 400.0);
    let id = harness
        .host
        .build_map(MapOptions::default(), container)
        .await
        .unwrap();

    let start = Instant::now();
    harness.host.on_viewport_resize(400.0, start);
    harness
        .host
        .on_viewport_resize(1300.0, start + Duration::from_millis(150));

    assert_eq!(
        harness.host.next_resize_deadline(),
        Some(start + Duration::from_millis(350))
    );
    assert_eq!(harness.host.tick(start + Duration::from_millis(250)), 0);
    assert_eq!(harness.host.tick(start + Duration::from_millis(350)), 0);
    assert_eq!(harness.host.next_resize_deadline(), None);

    assert!(mode_changes(&harness).is_empty());
    assert_eq!(
        harness.host.with_map(id, |map| map.mode()),
        Some(Mode::Interactive)
    );
}

#[tokio::test]
async fn test_always_interactive_maps_ignore_resizes() {
    let harness = Harness::new(1200.0);
    let options = MapOptions {
        always_interactive: true,
        ..Default::default()
    };
    let (container, _) = RecordingContainer::new(1100.0, 400.0);
    let id = harness.host.build_map(options, container).await.unwrap();

    let now = Instant::now();
    harness.host.on_viewport_resize(320.0, now);

    assert_eq!(harness.host.tick(now), 0);
    assert_eq!(
        harness.host.with_map(id, |map| map.mode()),
        Some(Mode::Interactive)
    );
    assert!(!harness
        .host
        .with_map(id, |map| map.interaction().is_responsive())
        .unwrap());
}

#[tokio::test]
async fn test_full_screen_child_stays_interactive() {
    let harness = Harness::new(1200.0);
    let options = MapOptions {
        allow_full_screen: true,
        center: Some([48.85, 2.35]),
        zoom: Some(12.0),
        ..Default::default()
    };
    let (container, _) = RecordingContainer::new(600.0, 400.0);
    let parent = harness.host.build_map(options, container).await.unwrap();
    let child = harness
        .host
        .open_full_screen(parent, None)
        .await
        .unwrap()
        .unwrap();
    harness.host.process_events();

    let now = Instant::now();
    harness.host.on_viewport_resize(320.0, now);
    harness.host.tick(now);

    assert_eq!(mode_changes(&harness), vec![(parent, Mode::Static)]);
    assert_eq!(
        harness.host.with_map(child, |map| map.mode()),
        Some(Mode::Interactive)
    );
}

#[cfg(feature = "tokio-runtime")]
#[tokio::test]
async fn test_settle_resize_waits_for_quiet_period() {
    let harness = Harness::with_config(debounced(20), 1200.0);
    let (container, _) = RecordingContainer::new(600.0, 400.0);
    let id = harness
        .host
        .build_map(MapOptions::default(), container)
        .await
        .unwrap();

    harness.host.on_viewport_resize(300.0, Instant::now());
    assert_eq!(harness.host.tick(Instant::now()), 0);

    assert_eq!(harness.host.settle_resize().await, 1);
    assert_eq!(harness.host.with_map(id, |map| map.mode()), Some(Mode::Static));
}
