use crate::{Event, EventBus, EventKind, EventKindType, ModuleCtx};
use std::{
    collections::HashMap,
    io::ErrorKind,
    sync::{LazyLock, RwLock},
};
use tokio::time::timeout;
use tracing::{debug, error};

/// Sends a quit signal to a running module and waits for it to stop gracefully.
///
/// Publishes a [`QuitEvent`](EventKind::QuitEvent) through the given
/// [`EventBus`] and then waits for the module's task to complete within a
/// fixed timeout.
///
/// # Panics
/// This function panics if:
/// - The module does not stop within the timeout duration.
/// - The task returns an error (`Err(())`).
pub async fn stop_module(
    event_bus: &EventBus,
    handle: &mut tokio::task::JoinHandle<Result<(), ()>>,
) {
    event_bus.publish(&Event {
        kind: EventKind::QuitEvent,
    });
    let _ = timeout(std::time::Duration::from_millis(100), handle)
        .await
        .expect("Module doesn't handle quit event in timeout")
        .unwrap();
}

/// Waits for an [`Event`] of the expected type on a broadcast receiver.
///
/// The total waiting time is divided into small polling steps, each one-tenth
/// of the given duration, so events of other types received in between do not
/// exhaust the whole waiting time at once. Only the variant type is compared,
/// payload data is ignored.
///
/// # Panics
///
/// Panics if no matching event is received within `duration`.
pub async fn wait_for_event(
    rx: &mut tokio::sync::broadcast::Receiver<Event>,
    duration: std::time::Duration,
    exp_event: EventKindType,
) -> Event {
    let steps = duration.as_millis() / 10;
    let step_duration = duration / 10;
    for _ in 0..steps {
        if let Ok(Ok(event)) = timeout(step_duration, rx.recv()).await
            && EventKindType::from(&event.kind) == exp_event
        {
            return event;
        }
    }
    panic!("Failed to receive event of type {:?}", exp_event);
}

static RESPONSE_HANDLERS_CACHE: LazyLock<RwLock<HashMap<(usize, EventKindType), ResponseHandler>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Registers an automatic response handler for a given request event type.
///
/// When an incoming event whose discriminant matches `request_type` is
/// received on `ctx`, the predefined `response_event` is sent back through
/// the same context. Handlers are cached per event bus, so parallel tests on
/// separate buses do not interfere.
///
/// Returns `Err` with [`ErrorKind::AlreadyExists`] if a handler for
/// `request_type` is already registered on this bus.
pub fn register_response_event(
    request_type: EventKindType,
    response_event: Event,
    ctx: ModuleCtx,
) -> Result<(), std::io::Error> {
    let bus_id = ctx.bus_id();
    let handler = ResponseHandler::new(ctx, request_type, response_event);
    let mut cache = RESPONSE_HANDLERS_CACHE.write().unwrap();
    if cache.insert((bus_id, request_type), handler).is_some() {
        error!(
            "Response handler for request type {:?} already exists in cache after insertion",
            (bus_id, request_type)
        );
        return Err(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!(
                "Response handler for request type {:?} already exists",
                request_type
            ),
        ));
    }
    debug!(
        "Registered response handler for request type {:?}",
        request_type
    );
    Ok(())
}

/// Unregisters a previously registered automatic response handler.
///
/// Removing a handler aborts its background task. Unregistering a handler
/// that does not exist is a no-op.
pub fn unregister_response_event(bus_id: usize, request_type: &EventKindType) {
    let mut cache = RESPONSE_HANDLERS_CACHE.write().unwrap();
    if let Some(handler) = cache.remove(&(bus_id, *request_type)) {
        debug!(
            "Unregistered response handler for request type {:?}",
            request_type
        );
        handler.handle.abort();
    }
}

struct ResponseHandlerRuntime {
    pub resp: Event,
    pub request_type: EventKindType,
    pub ctx: ModuleCtx,
}

/// Owns the background task that answers matching requests with a canned
/// response.
///
/// When the handler is dropped, its background task is aborted so no task
/// outlives the test that registered it.
#[derive(Debug)]
struct ResponseHandler {
    handle: tokio::task::JoinHandle<()>,
}

impl ResponseHandler {
    fn new(ctx: ModuleCtx, request_type: EventKindType, response_event: Event) -> Self {
        let rt = ResponseHandlerRuntime {
            resp: response_event,
            request_type,
            ctx,
        };
        let handle = run(rt);
        ResponseHandler { handle }
    }
}

fn run(mut rt: ResponseHandlerRuntime) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = rt.ctx.receiver.recv() =>
                match event {
                    Ok(event) => {
                        if EventKindType::from(&event.kind) == rt.request_type {
                            debug!("ResponseHandler sending response for request type {:?}", rt.request_type);
                            let _ = rt.ctx.sender.send(rt.resp.clone());
                        }
                    }
                    Err(e) => error!("Failed to receive request. Error: {}", e),
                }
            }
        }
    })
}

impl Drop for ResponseHandler {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("ResponseHandler dropped and background task aborted.");
    }
}
