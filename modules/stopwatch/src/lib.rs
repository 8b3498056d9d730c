// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use async_trait::async_trait;
use common::clock_source::{ClockSource, SystemClockSource};
use common::snapshot::StopwatchSnapshot;
use common::stopwatch::Stopwatch;
use module_core::{
    Event, EventKind, LoadSnapshotResponsePtr, Module, ModuleCtx, Request, SaveSnapshotRequestPtr,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info};

const LOAD_REQUEST_ID: u32 = 11;
const SAVE_REQUEST_ID: u32 = 12;
const MODULE_ADDR: u32 = 50;

const REFRESH_INTERVAL: Duration = Duration::from_millis(10);

/// The module that drives the stopwatch timekeeping.
///
/// The module owns one [`Stopwatch`] accumulator and follows the UI-facing
/// mode published as [`SnapshotChangedEvent`](EventKind::SnapshotChangedEvent):
/// a running snapshot starts the accumulator and a periodic display refresh,
/// a stopped one freezes it, the initial snapshot resets it. Every applied
/// transition is forwarded to the storage module so the mode survives a
/// suspend/resume cycle of the host.
///
/// # Type Parameters
/// - `T`: The clock source implementation (e.g., [`SystemClockSource`]) used to
///   sample the wall clock. Defaults to [`SystemClockSource`].
pub struct StopwatchModule<T: ClockSource = SystemClockSource> {
    ctx: ModuleCtx,
    stopwatch: Arc<Mutex<Stopwatch<T>>>,
    snapshot: StopwatchSnapshot,
    refresh_task: Option<tokio::task::JoinHandle<()>>,
}

impl StopwatchModule<SystemClockSource> {
    /// Creates a new stopwatch module using the default [`SystemClockSource`].
    pub fn new(ctx: ModuleCtx) -> Self {
        StopwatchModule::new_with_clock(SystemClockSource, ctx)
    }
}

impl<T: ClockSource + Send + 'static> StopwatchModule<T> {
    /// Creates a new stopwatch module with a custom clock source.
    pub fn new_with_clock(clock_source: T, ctx: ModuleCtx) -> Self {
        StopwatchModule {
            ctx,
            stopwatch: Arc::new(Mutex::new(Stopwatch::new_with_clock(clock_source))),
            snapshot: StopwatchSnapshot::Initial,
            refresh_task: None,
        }
    }

    fn on_snapshot_changed(&mut self, snapshot: StopwatchSnapshot) {
        if snapshot == self.snapshot {
            debug!("Snapshot {:?} already applied", snapshot);
            return;
        }
        self.apply_snapshot(snapshot);
        let request = SaveSnapshotRequestPtr::new(Request {
            id: SAVE_REQUEST_ID,
            sender_addr: MODULE_ADDR,
            data: snapshot,
        });
        let _ = self
            .ctx
            .publish_event(EventKind::SaveSnapshotRequestEvent(request));
    }

    fn on_snapshot_restored(&mut self, response: &LoadSnapshotResponsePtr) {
        if response.id != LOAD_REQUEST_ID || response.receiver_addr != MODULE_ADDR {
            return;
        }
        info!("Restoring persisted stopwatch mode {:?}", response.data);
        self.apply_snapshot(response.data);
    }

    /// Drives the accumulator into the mode the snapshot demands.
    ///
    /// A running snapshot owns exactly one refresh loop: the loop of a
    /// superseded run is aborted before the new one is spawned.
    fn apply_snapshot(&mut self, snapshot: StopwatchSnapshot) {
        match snapshot {
            StopwatchSnapshot::Initial => {
                debug!("Timer reset");
                self.abort_refresh_task();
                let mut stopwatch = self.lock_stopwatch();
                stopwatch.reset();
                let text = stopwatch.format();
                drop(stopwatch);
                self.publish_display(text);
            }
            StopwatchSnapshot::Running { .. } => {
                debug!("Starting timer");
                self.abort_refresh_task();
                self.lock_stopwatch().start();
                let sender = self.ctx.sender.clone();
                let stopwatch = self.stopwatch.clone();
                self.refresh_task = Some(tokio::spawn(async move {
                    display_refresh_task(sender, stopwatch).await;
                }));
            }
            StopwatchSnapshot::Stopped { .. } => {
                debug!("Timer stopped");
                self.abort_refresh_task();
                let mut stopwatch = self.lock_stopwatch();
                stopwatch.stop();
                let text = stopwatch.format();
                drop(stopwatch);
                self.publish_display(text);
            }
        }
        self.snapshot = snapshot;
    }

    fn publish_display(&self, text: String) {
        let _ = self
            .ctx
            .publish_event(EventKind::DisplayUpdatedEvent(Arc::new(text)));
    }

    fn abort_refresh_task(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
    }

    fn lock_stopwatch(&self) -> MutexGuard<'_, Stopwatch<T>> {
        self.stopwatch.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Periodically re-renders the elapsed time while the stopwatch is running.
///
/// The running flag is checked at the top of each iteration so the loop
/// terminates as soon as the stopwatch stops. A stop issued mid-sleep causes
/// at most one extra wakeup without a refresh.
async fn display_refresh_task<T: ClockSource>(
    sender: tokio::sync::broadcast::Sender<Event>,
    stopwatch: Arc<Mutex<Stopwatch<T>>>,
) {
    let mut timer = tokio::time::interval(REFRESH_INTERVAL);
    loop {
        let text = {
            let stopwatch = stopwatch.lock().unwrap_or_else(|e| e.into_inner());
            if !stopwatch.is_running() {
                break;
            }
            stopwatch.format()
        };
        let _ = sender.send(Event {
            kind: EventKind::DisplayUpdatedEvent(Arc::new(text)),
        });
        timer.tick().await;
    }
}

#[async_trait]
impl<T: ClockSource + Send + 'static> Module for StopwatchModule<T> {
    async fn run(&mut self) -> Result<(), ()> {
        self.apply_snapshot(StopwatchSnapshot::Initial);
        let request = Request::empty_request(LOAD_REQUEST_ID, MODULE_ADDR);
        let _ = self
            .ctx
            .publish_event(EventKind::LoadSnapshotRequestEvent(request));
        let mut run = true;
        while run {
            tokio::select! {
                event = self.ctx.receiver.recv() => {
                    match event {
                        Ok(event) => {
                            match event.kind {
                                EventKind::QuitEvent => {
                                    self.abort_refresh_task();
                                    run = false;
                                }
                                EventKind::SnapshotChangedEvent(snapshot) => {
                                    self.on_snapshot_changed(*snapshot);
                                }
                                EventKind::LoadSnapshotResponseEvent(response) => {
                                    self.on_snapshot_restored(&response);
                                }
                                _ => (),
                            }
                        }
                        Err(e) => {
                            error!("Failed to receive event in module Stopwatch. Error:{e}");
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
