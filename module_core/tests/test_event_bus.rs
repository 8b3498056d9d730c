use common::snapshot::StopwatchSnapshot;
use module_core::test_helper::{register_response_event, wait_for_event};
use module_core::*;
use std::sync::Arc;

#[tokio::test]
#[test_log::test]
pub async fn events_delivered() {
    let event_bus = EventBus::new();
    let mut receiver = event_bus.subscribe();
    let event = Event {
        kind: EventKind::QuitEvent,
    };
    event_bus.publish(&event);
    let received_event =
        tokio::time::timeout(std::time::Duration::from_millis(100), receiver.recv())
            .await
            .expect("Failed to receive event in required time")
            .unwrap();
    assert_eq!(received_event.event_type(), event.event_type());
}

#[tokio::test]
#[test_log::test]
pub async fn registered_response_answers_request() {
    let event_bus = EventBus::new();
    let ctx = event_bus.context();
    let mut receiver = event_bus.subscribe();
    if register_response_event(
        EventKindType::LoadSnapshotRequestEvent,
        Event {
            kind: EventKind::LoadSnapshotResponseEvent(Arc::new(Response::new(
                0,
                0xFA,
                StopwatchSnapshot::Stopped { since_ms: 5000 },
            ))),
        },
        event_bus.context(),
    )
    .is_err()
    {
        panic!("Failed to register response event");
    }
    if ctx
        .publish_event(EventKind::LoadSnapshotRequestEvent(Request::empty_request(
            0, 0xFA,
        )))
        .is_err()
    {
        panic!("Failed to publish request event");
    }
    let event = wait_for_event(
        &mut receiver,
        std::time::Duration::from_millis(100),
        EventKindType::LoadSnapshotResponseEvent,
    )
    .await;
    let response = payload_ref!(event.kind, EventKind::LoadSnapshotResponseEvent).unwrap();
    assert_eq!(response.id, 0);
    assert_eq!(response.receiver_addr, 0xFA);
    assert_eq!(
        response.data,
        StopwatchSnapshot::Stopped { since_ms: 5000 }
    );
}
