//! Channel-backed sink for front ends.

use crate::di::EventSink;
use crate::events::{LogLine, Progress};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Event delivered to a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallerEvent {
    Progress(Progress),
    Log(String),
}

/// Forwards events to an unbounded channel. Sending never blocks the engine;
/// events are dropped once the receiver is gone.
#[derive(Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<InstallerEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, UnboundedReceiver<InstallerEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn progress(&self, progress: Progress) {
        let _ = self.tx.send(InstallerEvent::Progress(progress));
    }

    fn log(&self, line: &LogLine) {
        let _ = self.tx.send(InstallerEvent::Log(line.to_string()));
    }
}
