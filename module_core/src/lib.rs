use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum_macros::EnumDiscriminants;

/// Represents a high-level event in the system.
///
/// Each `Event` wraps an [`EventKind`], which defines the actual type
/// and data carried by the event.
///
/// This structure is designed to be passed through an [`EventBus`]
/// between asynchronous modules.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// The inner event type and associated data.
    pub kind: EventKind,
}

impl Event {
    /// Returns the discriminant of the carried [`EventKind`].
    pub fn event_type(&self) -> EventKindType {
        EventKindType::from(&self.kind)
    }
}

/// A thread-safe, reference-counted pointer to a [`StopwatchSnapshot`](common::snapshot::StopwatchSnapshot).
///
/// This type alias wraps a snapshot inside an [`Arc`], allowing multiple
/// parts of the program (or multiple modules) to share ownership of the
/// same mode snapshot without copying it.
pub type SnapshotPtr = Arc<common::snapshot::StopwatchSnapshot>;

/// A thread-safe, reference-counted pointer to a rendered elapsed-time string.
pub type DisplayPtr = Arc<String>;

/// A request without payload data.
pub type EmptyRequestPtr = Arc<Request<()>>;

/// A request to persist the given mode snapshot.
pub type SaveSnapshotRequestPtr = Arc<Request<common::snapshot::StopwatchSnapshot>>;

/// The response to a [`SaveSnapshotRequestPtr`], carrying the io outcome.
pub type SaveSnapshotResponsePtr = Arc<Response<Result<(), std::io::ErrorKind>>>;

/// The response to a snapshot load request, carrying the restored snapshot.
pub type LoadSnapshotResponsePtr = Arc<Response<common::snapshot::StopwatchSnapshot>>;

/// Enumerates the different kinds of events that can be emitted
/// and transmitted via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(EventKindType), derive(Hash))]
pub enum EventKind {
    /// Indicates that a module shall terminate.
    QuitEvent,

    /// The UI-facing mode of the stopwatch changed.
    ///
    /// This event carries the new [`StopwatchSnapshot`](common::snapshot::StopwatchSnapshot)
    /// the timekeeping has to follow.
    SnapshotChangedEvent(SnapshotPtr),

    /// A freshly formatted elapsed time is available for rendering.
    DisplayUpdatedEvent(DisplayPtr),

    /// Requests that the carried mode snapshot is persisted.
    SaveSnapshotRequestEvent(SaveSnapshotRequestPtr),

    /// The outcome of a [`SaveSnapshotRequestEvent`](EventKind::SaveSnapshotRequestEvent).
    SaveSnapshotResponseEvent(SaveSnapshotResponsePtr),

    /// Requests the persisted mode snapshot.
    LoadSnapshotRequestEvent(EmptyRequestPtr),

    /// The restored mode snapshot of a [`LoadSnapshotRequestEvent`](EventKind::LoadSnapshotRequestEvent).
    LoadSnapshotResponseEvent(LoadSnapshotResponsePtr),
}

/// A request sent from one module to another via the [`EventBus`].
///
/// The `id` together with the `sender_addr` correlates a request with its
/// response. Responses mirror the request `id` and address the sender.
#[derive(Clone, Debug, PartialEq)]
pub struct Request<T> {
    /// Identifier chosen by the sender to correlate the response.
    pub id: u32,
    /// Address of the requesting module.
    pub sender_addr: u32,
    /// The request payload.
    pub data: T,
}

impl Request<()> {
    /// Creates a payload-free request wrapped for event transmission.
    pub fn empty_request(id: u32, sender_addr: u32) -> EmptyRequestPtr {
        Arc::new(Request {
            id,
            sender_addr,
            data: (),
        })
    }
}

/// A response to a [`Request`], mirroring its `id` and addressing the
/// original sender.
#[derive(Clone, Debug, PartialEq)]
pub struct Response<T> {
    /// The `id` of the request this response belongs to.
    pub id: u32,
    /// Address of the module the response is directed at.
    pub receiver_addr: u32,
    /// The response payload.
    pub data: T,
}

impl<T> Response<T> {
    pub fn new(id: u32, receiver_addr: u32, data: T) -> Self {
        Response {
            id,
            receiver_addr,
            data,
        }
    }
}

/// Extracts a reference to the payload of an [`EventKind`] variant.
///
/// Evaluates to `Some(&payload)` if the expression matches the given
/// variant, `None` otherwise.
#[macro_export]
macro_rules! payload_ref {
    ($kind:expr, $variant:path) => {
        match &$kind {
            $variant(payload) => Some(payload),
            _ => None,
        }
    };
}

static NEXT_BUS_ID: AtomicUsize = AtomicUsize::new(0);

/// A simple asynchronous event bus for publishing and subscribing to [`Event`]s.
///
/// The event bus uses a [`tokio::sync::broadcast::channel`] under the hood,
/// allowing multiple receivers to listen for the same stream of events.
///
/// Each published event is cloned and distributed to all active subscribers.
/// If no subscribers exist at the time of publication, the event is discarded silently.
pub struct EventBus {
    /// The broadcast sender used internally to distribute events.
    sender: tokio::sync::broadcast::Sender<Event>,

    /// Process-wide unique identifier of this bus instance.
    id: usize,
}

impl EventBus {
    /// Creates a new [`EventBus`] with a fixed buffer capacity of 100 messages.
    ///
    /// When the buffer is full, the oldest messages are dropped automatically
    /// as new ones are published.
    pub fn new() -> Self {
        let (sender, _) = tokio::sync::broadcast::channel(100);
        EventBus {
            sender,
            id: NEXT_BUS_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Subscribes to the event bus and returns a [`tokio::sync::broadcast::Receiver`].
    ///
    /// The returned receiver will receive all future events published after the
    /// subscription is created.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Publishes an [`Event`] to all active subscribers.
    ///
    /// This method clones the event and attempts to send it to each receiver.
    /// If no subscribers exist, the event is discarded silently.
    ///
    /// # Arguments
    ///
    /// * `event` - The event instance to be published.
    pub fn publish(&self, event: &Event) {
        let _ = self.sender.send(event.clone());
    }

    /// Creates a [`ModuleCtx`] bound to this [`EventBus`].
    ///
    /// The returned context can be used by modules implementing [`Module`]
    /// to send and receive events within their execution scope.
    pub fn context(&self) -> ModuleCtx {
        ModuleCtx::new(self)
    }
}

/// Provides a default instance of [`EventBus`].
impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Defines the common interface for an asynchronous module
/// that can be executed and communicate via the [`EventBus`].
#[async_trait::async_trait]
pub trait Module {
    /// Runs the module asynchronously until completion.
    ///
    /// This function typically contains the module's main event loop,
    /// reacting to messages received through the [`ModuleCtx`].
    async fn run(&mut self) -> Result<(), ()>;
}

/// Provides a module-scoped context for interacting with the [`EventBus`].
///
/// Each `ModuleCtx` owns both a sender and a receiver, allowing the module
/// to both publish and listen for events concurrently.
pub struct ModuleCtx {
    /// The broadcast sender used to publish events.
    pub sender: tokio::sync::broadcast::Sender<Event>,

    /// The broadcast receiver used to listen for events.
    pub receiver: tokio::sync::broadcast::Receiver<Event>,

    /// The identifier of the [`EventBus`] this context belongs to.
    bus_id: usize,
}

impl ModuleCtx {
    /// Constructs a new [`ModuleCtx`] from the given [`EventBus`].
    ///
    /// Clones the internal broadcast sender and creates a new receiver.
    pub fn new(event_bus: &EventBus) -> Self {
        ModuleCtx {
            sender: event_bus.sender.clone(),
            receiver: event_bus.subscribe(),
            bus_id: event_bus.id,
        }
    }

    /// Publishes an event with the given kind on the bus of this context.
    pub fn publish_event(
        &self,
        kind: EventKind,
    ) -> Result<usize, tokio::sync::broadcast::error::SendError<Event>> {
        self.sender.send(Event { kind })
    }

    /// Returns the identifier of the bus this context belongs to.
    pub fn bus_id(&self) -> usize {
        self.bus_id
    }
}

pub mod test_helper;
