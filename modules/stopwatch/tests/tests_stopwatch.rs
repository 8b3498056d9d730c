use common::snapshot::StopwatchSnapshot;
use module_core::{
    Event, EventBus, EventKind, EventKindType, Module, Response, SnapshotPtr, payload_ref,
    test_helper::{register_response_event, stop_module, wait_for_event},
};
use std::sync::Arc;
use std::time::Duration;
use stopwatch::StopwatchModule;
use tracing::debug;

fn create_module(
    eb: &EventBus,
    restored: StopwatchSnapshot,
) -> tokio::task::JoinHandle<Result<(), ()>> {
    let module = StopwatchModule::new(eb.context());
    if register_response_event(
        EventKindType::LoadSnapshotRequestEvent,
        Event {
            kind: EventKind::LoadSnapshotResponseEvent(Arc::new(Response::new(11, 50, restored))),
        },
        eb.context(),
    )
    .is_err()
    {
        panic!("Failed to register LoadSnapshotResponseEvent");
    }

    tokio::spawn(async move {
        let mut module = module;
        module.run().await
    })
}

/// Waits until the restore round trip of the freshly started module settled.
///
/// The module applies a restored mode before any published transition, so
/// tests wait for the load response before they emit transitions of their own.
async fn wait_for_restore(rx: &mut tokio::sync::broadcast::Receiver<Event>) {
    let _ = wait_for_event(
        rx,
        Duration::from_millis(100),
        EventKindType::LoadSnapshotResponseEvent,
    )
    .await;
}

fn publish_snapshot(eb: &EventBus, snapshot: StopwatchSnapshot) {
    eb.publish(&Event {
        kind: EventKind::SnapshotChangedEvent(SnapshotPtr::new(snapshot)),
    });
}

/// Waits for the next persisted mode, skipping all other traffic on the bus.
async fn wait_for_saved_snapshot(
    rx: &mut tokio::sync::broadcast::Receiver<Event>,
) -> StopwatchSnapshot {
    let event = wait_for_event(
        rx,
        Duration::from_millis(500),
        EventKindType::SaveSnapshotRequestEvent,
    )
    .await;
    match payload_ref!(event.kind, EventKind::SaveSnapshotRequestEvent) {
        Some(request) => {
            assert_eq!(request.id, 12);
            assert_eq!(request.sender_addr, 50);
            request.data
        }
        None => panic!("Received save request doesn't have a payload"),
    }
}

async fn wait_for_display(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> String {
    let event = wait_for_event(
        rx,
        Duration::from_millis(500),
        EventKindType::DisplayUpdatedEvent,
    )
    .await;
    match payload_ref!(event.kind, EventKind::DisplayUpdatedEvent) {
        Some(text) => text.to_string(),
        None => panic!("Received display update doesn't have a payload"),
    }
}

fn assert_clock_string(text: &str) {
    assert_eq!(text.len(), 9, "Unexpected display text {text}");
    assert_eq!(&text[2..3], ":", "Unexpected display text {text}");
    assert_eq!(&text[5..6], ".", "Unexpected display text {text}");
}

#[tokio::test]
#[test_log::test]
async fn running_mode_publishes_periodic_display_updates() {
    let eb = EventBus::default();
    let mut receiver = eb.subscribe();
    let mut module = create_module(&eb, StopwatchSnapshot::Initial);
    wait_for_restore(&mut receiver).await;

    publish_snapshot(&eb, StopwatchSnapshot::Running { since_ms: 5000 });

    // A single transition yields a stream of refreshes, not a one-shot render.
    for _ in 0..4 {
        let text = wait_for_display(&mut receiver).await;
        assert_clock_string(&text);
    }

    stop_module(&eb, &mut module).await;
}

#[tokio::test]
#[test_log::test]
async fn transitions_are_persisted() {
    let eb = EventBus::default();
    let mut receiver = eb.subscribe();
    let mut module = create_module(&eb, StopwatchSnapshot::Initial);
    wait_for_restore(&mut receiver).await;

    publish_snapshot(&eb, StopwatchSnapshot::Running { since_ms: 1000 });
    assert_eq!(
        wait_for_saved_snapshot(&mut receiver).await,
        StopwatchSnapshot::Running { since_ms: 1000 }
    );

    publish_snapshot(&eb, StopwatchSnapshot::Stopped { since_ms: 2000 });
    assert_eq!(
        wait_for_saved_snapshot(&mut receiver).await,
        StopwatchSnapshot::Stopped { since_ms: 2000 }
    );

    stop_module(&eb, &mut module).await;
}

#[tokio::test]
#[test_log::test]
async fn repeated_snapshot_is_not_applied_twice() {
    let eb = EventBus::default();
    let mut receiver = eb.subscribe();
    let mut module = create_module(&eb, StopwatchSnapshot::Initial);
    wait_for_restore(&mut receiver).await;

    publish_snapshot(&eb, StopwatchSnapshot::Stopped { since_ms: 2000 });
    assert_eq!(
        wait_for_saved_snapshot(&mut receiver).await,
        StopwatchSnapshot::Stopped { since_ms: 2000 }
    );

    // The same snapshot again must not trigger another save request.
    publish_snapshot(&eb, StopwatchSnapshot::Stopped { since_ms: 2000 });
    publish_snapshot(&eb, StopwatchSnapshot::Initial);
    assert_eq!(
        wait_for_saved_snapshot(&mut receiver).await,
        StopwatchSnapshot::Initial
    );

    stop_module(&eb, &mut module).await;
}

#[tokio::test]
#[test_log::test]
async fn reset_renders_the_zero_display() {
    let eb = EventBus::default();
    let mut receiver = eb.subscribe();
    let mut module = create_module(&eb, StopwatchSnapshot::Initial);
    wait_for_restore(&mut receiver).await;

    publish_snapshot(&eb, StopwatchSnapshot::Running { since_ms: 1000 });
    assert_clock_string(&wait_for_display(&mut receiver).await);
    publish_snapshot(&eb, StopwatchSnapshot::Initial);

    // Refresh updates of the superseded run may still be queued, the reset
    // display shows up among them.
    let mut found = false;
    for _ in 0..10 {
        let text = wait_for_display(&mut receiver).await;
        if text == "00:00.000" {
            found = true;
            break;
        }
        debug!("Skipping display update {text}");
    }
    assert!(found, "Reset display was never rendered");

    stop_module(&eb, &mut module).await;
}

#[tokio::test]
#[test_log::test]
async fn restored_running_mode_resumes_the_refresh_loop() {
    let eb = EventBus::default();
    let mut receiver = eb.subscribe();
    let mut module = create_module(&eb, StopwatchSnapshot::Running { since_ms: 5000 });
    wait_for_restore(&mut receiver).await;

    // No transition is published, the refresh loop runs from the restored mode.
    for _ in 0..3 {
        let text = wait_for_display(&mut receiver).await;
        assert_clock_string(&text);
    }

    stop_module(&eb, &mut module).await;
}
