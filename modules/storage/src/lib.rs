// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Storage module for the stopwatch
//!
//! Provides the interface and implementation to persist and restore the
//! stopwatch mode snapshot on linux based systems.

use common::snapshot::StopwatchSnapshot;
use module_core::{
    EmptyRequestPtr, Event, EventKind, LoadSnapshotResponsePtr, ModuleCtx, Response,
    SaveSnapshotRequestPtr, SaveSnapshotResponsePtr,
};
use std::{
    fs::DirBuilder,
    io,
    path::{Path, PathBuf},
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, error, info};

/// A file system–based implementation of the snapshot storage.
///
/// The mode snapshot is stored as a single file with the `.snapshot`
/// extension in the folder snapshot below the given root directory.
///
/// ## Important
///
/// `FileSystemStorage` **does not implement any internal synchronization or
/// locking mechanisms**. Therefore, **only one instance should be used per
/// `root_dir` in the application at any time**.
pub struct FileSystemStorage {
    snapshot_file: String,
    module_ctx: ModuleCtx,
}

impl FileSystemStorage {
    pub fn new(root_dir: &Path, ctx: ModuleCtx) -> Self {
        let mut snapshot_dir = PathBuf::from(root_dir);
        snapshot_dir.push("snapshot");
        if let Err(e) = DirBuilder::new().recursive(true).create(&snapshot_dir) {
            error!(
                "Failed to create snapshot dir folder {}. Error: {}",
                snapshot_dir.to_string_lossy(),
                e
            );
        }
        info!(
            "Using snapshot storage folder: {}",
            snapshot_dir.to_string_lossy()
        );
        let mut snapshot_file = snapshot_dir;
        snapshot_file.push("state");
        snapshot_file.set_extension("snapshot");
        FileSystemStorage {
            snapshot_file: snapshot_file.to_string_lossy().to_string(),
            module_ctx: ctx,
        }
    }

    /// Persists the given snapshot as its JSON payload.
    ///
    /// The file is created or truncated, the payload is written and flushed
    /// to disk via `sync_all`.
    ///
    /// Errors:
    /// - Propagates I/O errors from file creation, writing, or syncing.
    async fn save(&self, snapshot: &StopwatchSnapshot) -> io::Result<()> {
        let json = StopwatchSnapshot::to_json(snapshot)?;
        self.save_bytes(&self.snapshot_file, json.as_bytes()).await
    }

    async fn save_bytes(&self, path: &str, data: &[u8]) -> io::Result<()> {
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn load_file(&self, file_path: &str) -> io::Result<String> {
        let mut file = tokio::fs::File::open(file_path).await?;
        let mut json = String::default();
        file.read_to_string(&mut json).await?;
        Ok(json)
    }

    /// Loads the persisted snapshot.
    ///
    /// A missing or malformed snapshot file restores
    /// [`StopwatchSnapshot::Initial`], loading never fails.
    async fn load(&self) -> StopwatchSnapshot {
        match self.load_file(&self.snapshot_file).await {
            Ok(json) => StopwatchSnapshot::from_json(&json),
            Err(e) => {
                debug!(
                    "No snapshot loaded from {}. Reason: {}",
                    self.snapshot_file, e
                );
                StopwatchSnapshot::Initial
            }
        }
    }

    /// Handles a save request and replies with the io outcome.
    ///
    /// The response mirrors the original request id and sender address.
    async fn handle_save_request(&self, req: &SaveSnapshotRequestPtr) {
        let data = match self.save(&req.data).await {
            Ok(()) => {
                debug!("Stored snapshot {:?} in {}", req.data, self.snapshot_file);
                Ok(())
            }
            Err(e) => {
                error!(
                    "Failed to store snapshot in {}. Error: {}",
                    self.snapshot_file, e
                );
                Err(e.kind())
            }
        };
        let resp = SaveSnapshotResponsePtr::new(Response {
            id: req.id,
            receiver_addr: req.sender_addr,
            data,
        });
        let _ = self.module_ctx.sender.send(Event {
            kind: EventKind::SaveSnapshotResponseEvent(resp),
        });
    }

    async fn handle_load_request(&self, req: &EmptyRequestPtr) {
        let snapshot = self.load().await;
        debug!("Loaded snapshot {:?} from {}", snapshot, self.snapshot_file);
        let resp = LoadSnapshotResponsePtr::new(Response {
            id: req.id,
            receiver_addr: req.sender_addr,
            data: snapshot,
        });
        let _ = self.module_ctx.sender.send(Event {
            kind: EventKind::LoadSnapshotResponseEvent(resp),
        });
    }
}

#[async_trait::async_trait]
impl module_core::Module for FileSystemStorage {
    async fn run(&mut self) -> Result<(), ()> {
        let mut run = true;
        while run {
            tokio::select! {
                event = self.module_ctx.receiver.recv() => {
                    match event {
                        Ok(event) => {
                            match event.kind {
                                EventKind::QuitEvent => run = false,
                                EventKind::SaveSnapshotRequestEvent(request) => {
                                    self.handle_save_request(&request).await;
                                },
                                EventKind::LoadSnapshotRequestEvent(request) => {
                                    self.handle_load_request(&request).await;
                                },
                                _ => ()
                            }
                        }
                        Err(e) => error!("Failed to receive event in module Storage. Error:{e}"),
                    }
                }
            }
        }
        Ok(())
    }
}
