//! CommandDispatcher - actor owning the control output
//!
//! Processes send requests one at a time and multiplexes them with a single
//! repeat timer. The timer only exists while the repeat table is non-empty.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use super::commands::{Command, DispatchCommand};
use super::handle::DispatcherHandle;
use super::repeat::RepeatTable;
use crate::midi::{MidiMessage, MidiOut};

/// Highest value that is put on the wire
const MAX_DATA_VALUE: u8 = 127;

/// Maximum number of times a repeated message is sent
pub const DEFAULT_MAX_REPEAT: u32 = 50;
/// Period between repeats
pub const DEFAULT_REPEAT_INTERVAL: Duration = Duration::from_millis(300);

/// Dispatcher settings
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// MIDI channel for all control changes (0-15)
    pub channel: u8,
    pub repeat_interval: Duration,
    pub max_repeat: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            repeat_interval: DEFAULT_REPEAT_INTERVAL,
            max_repeat: DEFAULT_MAX_REPEAT,
        }
    }
}

/// Actor that owns the control output port and the repeat schedule
pub struct CommandDispatcher {
    output: Option<Box<dyn MidiOut>>,
    config: DispatcherConfig,
    repeats: RepeatTable,
    timer: Option<Interval>,
    command_rx: mpsc::UnboundedReceiver<DispatchCommand>,
    sent_count: u64,
}

impl CommandDispatcher {
    /// Spawn the actor on the current tokio runtime and return its handle
    pub fn spawn(output: Box<dyn MidiOut>, config: DispatcherConfig) -> DispatcherHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        info!(
            "Dispatcher started on '{}' (channel {}, repeat every {:?}, max {})",
            output.name(),
            config.channel + 1,
            config.repeat_interval,
            config.max_repeat
        );

        let actor = CommandDispatcher {
            output: Some(output),
            repeats: RepeatTable::new(config.max_repeat),
            config,
            timer: None,
            command_rx: cmd_rx,
            sent_count: 0,
        };

        tokio::spawn(actor.run());

        DispatcherHandle::new(cmd_tx)
    }

    async fn run(mut self) {
        debug!("Dispatcher run loop started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(DispatchCommand::Send(command)) => self.handle_send(command),
                    Some(DispatchCommand::Shutdown { done }) => {
                        self.stop();
                        let _ = done.send(());
                        break;
                    }
                    None => {
                        self.stop();
                        break;
                    }
                },
                _ = next_tick(&mut self.timer) => self.handle_tick(),
            }
        }

        debug!("Dispatcher run loop stopped after {} messages", self.sent_count);
    }

    fn handle_send(&mut self, command: Command) {
        trace!(?command, "Dispatching");

        if command.value <= MAX_DATA_VALUE {
            self.transmit(command.controller, command.value);
        }

        if command.repeat && command.value <= MAX_DATA_VALUE {
            self.repeats.arm(command.controller, command.value);
            self.arm_timer();
        } else {
            self.repeats.cancel(command.controller);
            if self.repeats.is_empty() {
                self.timer = None;
            }
        }
    }

    fn handle_tick(&mut self) {
        for (controller, value) in self.repeats.tick() {
            self.transmit(controller, value);
        }
        if self.repeats.is_empty() {
            trace!("Repeat table empty, disarming timer");
            self.timer = None;
        }
    }

    /// (Re)start the repeat timer; first tick one period from now
    fn arm_timer(&mut self) {
        let period = self.config.repeat_interval.max(Duration::from_millis(1));
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.timer = Some(interval);
    }

    fn transmit(&mut self, controller: u8, value: u8) {
        let Some(output) = self.output.as_mut() else {
            return;
        };

        let message = MidiMessage::ControlChange {
            channel: self.config.channel,
            cc: controller,
            value,
        };

        match output.send(&message) {
            Ok(()) => self.sent_count += 1,
            Err(e) => warn!("Failed to send {} to '{}': {}", message, output.name(), e),
        }
    }

    fn stop(&mut self) {
        self.repeats.clear();
        self.timer = None;
        if let Some(output) = self.output.take() {
            info!("Dispatcher released '{}'", output.name());
        }
    }
}

/// Resolves on the next timer tick, or never while the timer is disarmed
async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::testing::RecordingOutput;
    use tokio::time::sleep;

    fn config(max_repeat: u32) -> DispatcherConfig {
        DispatcherConfig {
            channel: 0,
            repeat_interval: Duration::from_millis(300),
            max_repeat,
        }
    }

    /// Actor driven by hand, without its run loop
    fn idle_actor(max_repeat: u32) -> (CommandDispatcher, RecordingOutput) {
        let output = RecordingOutput::new();
        let (_cmd_tx, command_rx) = mpsc::unbounded_channel();
        let actor = CommandDispatcher {
            output: Some(Box::new(output.clone())),
            config: config(max_repeat),
            repeats: RepeatTable::new(max_repeat),
            timer: None,
            command_rx,
            sent_count: 0,
        };
        (actor, output)
    }

    fn cmd(controller: u8, value: u8, repeat: bool) -> Command {
        Command {
            controller,
            value,
            repeat,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_follows_repeat_table() {
        let (mut actor, _output) = idle_actor(50);
        assert!(actor.timer.is_none());

        actor.handle_send(cmd(0, 90, true));
        assert!(actor.timer.is_some());

        actor.handle_send(cmd(0, 255, false));
        assert!(actor.repeats.is_empty());
        assert!(actor.timer.is_none());

        actor.handle_send(cmd(1, 255, true));
        assert!(actor.timer.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_stays_armed_while_entries_remain() {
        let (mut actor, _output) = idle_actor(50);

        actor.handle_send(cmd(0, 90, true));
        actor.handle_send(cmd(1, 36, true));
        actor.handle_send(cmd(0, 255, false));
        assert_eq!(actor.repeats.len(), 1);
        assert!(actor.timer.is_some());

        actor.handle_send(cmd(1, 255, false));
        assert!(actor.timer.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_disarmed_by_exhausting_tick() {
        let (mut actor, output) = idle_actor(2);

        actor.handle_send(cmd(0, 90, true));
        actor.handle_tick();
        assert!(actor.timer.is_some());

        actor.handle_send(cmd(1, 36, true));
        actor.handle_tick();
        // controller 0 ran out, controller 1 still has one repeat
        assert!(actor.repeats.get(0).is_none());
        assert!(actor.timer.is_some());

        actor.handle_tick();
        assert!(actor.repeats.is_empty());
        assert!(actor.timer.is_none());

        assert_eq!(
            output.control_changes(),
            vec![(0, 90), (0, 90), (1, 36), (1, 36)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_send() {
        let output = RecordingOutput::new();
        let handle = CommandDispatcher::spawn(Box::new(output.clone()), config(50));

        handle.send(70, 127, false);
        sleep(Duration::from_millis(10)).await;

        assert_eq!(
            output.messages(),
            vec![MidiMessage::ControlChange {
                channel: 0,
                cc: 70,
                value: 127
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_is_bounded() {
        let output = RecordingOutput::new();
        let handle = CommandDispatcher::spawn(Box::new(output.clone()), config(5));

        handle.send(0, 90, true);
        sleep(Duration::from_secs(10)).await;

        // initial send plus max_repeat - 1 repeats
        assert_eq!(output.control_changes(), vec![(0, 90); 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_timing() {
        let output = RecordingOutput::new();
        let handle = CommandDispatcher::spawn(Box::new(output.clone()), config(50));

        handle.send(0, 90, true);
        sleep(Duration::from_millis(250)).await;
        assert_eq!(output.control_changes().len(), 1);

        sleep(Duration::from_millis(100)).await; // t = 350ms
        assert_eq!(output.control_changes().len(), 2);

        sleep(Duration::from_millis(300)).await; // t = 650ms
        assert_eq!(output.control_changes().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_neutral_value_cancels_repeat() {
        let output = RecordingOutput::new();
        let handle = CommandDispatcher::spawn(Box::new(output.clone()), config(50));

        handle.send(0, 90, true);
        sleep(Duration::from_millis(650)).await;
        handle.send(0, 255, false);
        sleep(Duration::from_secs(5)).await;

        assert_eq!(output.control_changes(), vec![(0, 90); 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_neutral_value_is_never_sent_or_repeated() {
        let output = RecordingOutput::new();
        let handle = CommandDispatcher::spawn(Box::new(output.clone()), config(50));

        handle.send(1, 255, true);
        sleep(Duration::from_secs(2)).await;

        assert!(output.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_controllers_repeat_independently() {
        let output = RecordingOutput::new();
        let handle = CommandDispatcher::spawn(Box::new(output.clone()), config(3));

        handle.send(0, 18, true);
        handle.send(1, 36, true);
        sleep(Duration::from_secs(5)).await;

        let sent = output.control_changes();
        assert_eq!(sent.iter().filter(|(cc, _)| *cc == 0).count(), 3);
        assert_eq!(sent.iter().filter(|(cc, _)| *cc == 1).count(), 3);
        assert!(sent.iter().all(|&(cc, v)| (cc == 0 && v == 18) || (cc == 1 && v == 36)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drops_pending_repeats() {
        let output = RecordingOutput::new();
        let handle = CommandDispatcher::spawn(Box::new(output.clone()), config(50));

        handle.send(0, 90, true);
        sleep(Duration::from_millis(10)).await;
        handle.shutdown().await;
        assert!(!handle.is_running());

        handle.send(70, 127, false);
        sleep(Duration::from_secs(5)).await;

        assert_eq!(output.control_changes(), vec![(0, 90)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_failure_does_not_stop_actor() {
        let output = RecordingOutput::failing();
        let handle = CommandDispatcher::spawn(Box::new(output.clone()), config(50));

        handle.send(70, 127, false);
        handle.send(71, 0, false);
        sleep(Duration::from_millis(10)).await;

        assert!(handle.is_running());
        assert_eq!(output.control_changes(), vec![(70, 127), (71, 0)]);
    }
}
