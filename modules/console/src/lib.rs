use chrono::Utc;
use common::snapshot::StopwatchSnapshot;
use futures::StreamExt;
use module_core::{EventKind, Module, ModuleCtx, SnapshotPtr};
use std::io::Write;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, error, warn};

/// A user action entered on the console.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Start,
    Stop,
    Reset,
    Quit,
}

impl Command {
    /// Parses a console input line into a command.
    ///
    /// Matching is case-insensitive and surrounding whitespace is ignored.
    /// Returns `None` for anything that is not a known command.
    pub fn parse(line: &str) -> Option<Command> {
        match line.trim().to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "stop" => Some(Command::Stop),
            "reset" => Some(Command::Reset),
            "quit" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// The console front end of the stopwatch.
///
/// Reads commands from stdin, publishes the matching mode transitions and
/// renders display updates in place on stdout. Stands in for the visual
/// presentation layer of a host UI, it contains no timekeeping itself.
pub struct Console {
    ctx: ModuleCtx,
}

impl Console {
    pub fn new(ctx: ModuleCtx) -> Self {
        Console { ctx }
    }

    /// Publishes the mode transition a command stands for.
    ///
    /// Returns `false` when the module shall terminate.
    fn on_command(&self, command: Command) -> bool {
        let snapshot = match command {
            Command::Start => StopwatchSnapshot::Running {
                since_ms: Utc::now().timestamp_millis(),
            },
            Command::Stop => StopwatchSnapshot::Stopped {
                since_ms: Utc::now().timestamp_millis(),
            },
            Command::Reset => StopwatchSnapshot::Initial,
            Command::Quit => {
                let _ = self.ctx.publish_event(EventKind::QuitEvent);
                return false;
            }
        };
        let _ = self
            .ctx
            .publish_event(EventKind::SnapshotChangedEvent(SnapshotPtr::new(snapshot)));
        true
    }

    fn render(&self, text: &str) {
        print!("\r{text}");
        let _ = std::io::stdout().flush();
    }
}

#[async_trait::async_trait]
impl Module for Console {
    async fn run(&mut self) -> Result<(), ()> {
        let mut lines = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
        println!("Commands: start, stop, reset, quit");
        let mut run = true;
        while run {
            tokio::select! {
                event = self.ctx.receiver.recv() => {
                    match event {
                        Ok(event) => {
                            match event.kind {
                                EventKind::QuitEvent => run = false,
                                EventKind::DisplayUpdatedEvent(text) => self.render(&text),
                                _ => (),
                            }
                        }
                        Err(e) => error!("Failed to receive event in module Console. Error:{e}"),
                    }
                }
                line = lines.next() => {
                    match line {
                        Some(Ok(line)) => {
                            match Command::parse(&line) {
                                Some(command) => run = self.on_command(command),
                                None => warn!("Unknown command: {line}"),
                            }
                        }
                        Some(Err(e)) => error!("Failed to read console input. Error: {e}"),
                        None => {
                            debug!("Console input closed");
                            let _ = self.ctx.publish_event(EventKind::QuitEvent);
                            run = false;
                        }
                    }
                }
            }
        }
        println!();
        Ok(())
    }
}
