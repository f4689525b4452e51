//! DisplayWriter - actor owning the display output
//!
//! The LCD drops writes that arrive back to back, so row writes are queued and
//! released one at a time, `row_delay` apart. A write replaces a queued one
//! only when it starts at the same address and covers at least as many
//! characters; otherwise it goes to the back so partial updates land on top of
//! full rows.

use std::collections::VecDeque;
use std::ops::Range;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, trace, warn};

use super::{blank_row, lcd_sysex, row_address};
use crate::controls::LcdRow;
use crate::midi::MidiOut;
use crate::state::RowUpdate;

/// Minimum gap between two row writes
pub const DEFAULT_ROW_DELAY: Duration = Duration::from_millis(400);

/// Commands for the display writer actor
#[derive(Debug)]
pub enum DisplayCommand {
    /// Queue a row write
    WriteRow(RowUpdate),

    /// Blank the upper then the lower row of a channel
    Clear { channel: u8 },

    /// Drop queued writes, close the port and acknowledge
    Shutdown { done: oneshot::Sender<()> },
}

/// Handle for queueing display writes
#[derive(Clone, Debug)]
pub struct DisplayHandle {
    cmd_tx: mpsc::UnboundedSender<DisplayCommand>,
}

impl DisplayHandle {
    pub fn new(cmd_tx: mpsc::UnboundedSender<DisplayCommand>) -> Self {
        Self { cmd_tx }
    }

    pub fn write_row(&self, channel: u8, row: LcdRow, text: impl Into<String>) {
        self.submit(DisplayCommand::WriteRow(RowUpdate {
            channel,
            row,
            text: text.into(),
        }));
    }

    pub fn clear_channel(&self, channel: u8) {
        self.submit(DisplayCommand::Clear { channel });
    }

    /// Stop the actor and wait until it has released its port
    pub async fn shutdown(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(DisplayCommand::Shutdown { done: done_tx })
            .is_ok()
        {
            let _ = done_rx.await;
        }
    }

    pub fn is_running(&self) -> bool {
        !self.cmd_tx.is_closed()
    }

    fn submit(&self, cmd: DisplayCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            debug!("Display writer stopped, dropping write");
        }
    }
}

/// Actor that owns the display port
pub struct DisplayWriter {
    output: Option<Box<dyn MidiOut>>,
    row_delay: Duration,
    pending: VecDeque<RowUpdate>,
    last_write: Option<Instant>,
    command_rx: mpsc::UnboundedReceiver<DisplayCommand>,
}

impl DisplayWriter {
    /// Spawn the actor on the current tokio runtime and return its handle
    pub fn spawn(output: Box<dyn MidiOut>, row_delay: Duration) -> DisplayHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        info!(
            "Display writer started on '{}' (row delay {:?})",
            output.name(),
            row_delay
        );

        let actor = DisplayWriter {
            output: Some(output),
            row_delay,
            pending: VecDeque::new(),
            last_write: None,
            command_rx: cmd_rx,
        };

        tokio::spawn(actor.run());

        DisplayHandle::new(cmd_tx)
    }

    async fn run(mut self) {
        loop {
            if self.pending.is_empty() {
                match self.command_rx.recv().await {
                    Some(cmd) => {
                        if !self.handle_command(cmd) {
                            break;
                        }
                    }
                    None => break,
                }
                continue;
            }

            let ready_at = self.ready_at();
            tokio::select! {
                biased;
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => {
                        if !self.handle_command(cmd) {
                            break;
                        }
                    }
                    None => {
                        self.flush().await;
                        break;
                    }
                },
                _ = sleep_until(ready_at) => self.write_next(),
            }
        }

        debug!("Display writer stopped");
    }

    /// Returns false once the actor should stop
    fn handle_command(&mut self, cmd: DisplayCommand) -> bool {
        match cmd {
            DisplayCommand::WriteRow(update) => self.enqueue(update),
            DisplayCommand::Clear { channel } => {
                let blanks = [LcdRow::Upper, LcdRow::Lower].map(|row| RowUpdate {
                    channel,
                    row,
                    text: blank_row(),
                });

                // Blanks go last so nothing queued earlier is drawn over them
                let before = self.pending.len();
                self.pending
                    .retain(|queued| !blanks.iter().any(|blank| covers(blank, queued)));
                trace!(channel, dropped = before - self.pending.len(), "Clearing display channel");

                self.pending.extend(blanks);
            }
            DisplayCommand::Shutdown { done } => {
                self.pending.clear();
                if let Some(output) = self.output.take() {
                    info!("Display writer released '{}'", output.name());
                }
                let _ = done.send(());
                return false;
            }
        }
        true
    }

    /// Queue a write, folding it into the newest queued write it overlaps
    /// when that one starts at the same address and is no longer
    fn enqueue(&mut self, update: RowUpdate) {
        let newest_overlap = self
            .pending
            .iter()
            .rposition(|queued| overlaps(queued, &update));

        let merge_at = newest_overlap.filter(|&index| {
            let queued = &self.pending[index];
            span(queued).start == span(&update).start && span(queued).len() <= span(&update).len()
        });

        match merge_at {
            Some(index) => {
                trace!(channel = update.channel, row = ?update.row, "Coalescing display write");
                self.pending[index] = update;
            }
            None => self.pending.push_back(update),
        }
    }

    fn ready_at(&self) -> Instant {
        match self.last_write {
            Some(at) => at + self.row_delay,
            None => Instant::now(),
        }
    }

    fn write_next(&mut self) {
        let Some(update) = self.pending.pop_front() else {
            return;
        };
        self.last_write = Some(Instant::now());

        let Some(output) = self.output.as_mut() else {
            return;
        };
        let message = lcd_sysex(update.channel, update.row, &update.text);
        match output.send(&message) {
            Ok(()) => debug!("LCD ch{} {:?}: '{}'", update.channel, update.row, update.text),
            Err(e) => warn!("Failed to write display row to '{}': {}", output.name(), e),
        }
    }

    async fn flush(&mut self) {
        while !self.pending.is_empty() {
            sleep_until(self.ready_at()).await;
            self.write_next();
        }
    }
}

/// LCD character cells a write touches
fn span(update: &RowUpdate) -> Range<usize> {
    let start = usize::from(row_address(update.channel, update.row));
    start..start + update.text.chars().count()
}

fn overlaps(a: &RowUpdate, b: &RowUpdate) -> bool {
    let (a, b) = (span(a), span(b));
    a.start < b.end && b.start < a.end
}

/// True when `outer` rewrites every cell `inner` touches
fn covers(outer: &RowUpdate, inner: &RowUpdate) -> bool {
    let (outer, inner) = (span(outer), span(inner));
    outer.start <= inner.start && inner.end <= outer.end
}
