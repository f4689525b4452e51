//! Router module - Event loop core
//!
//! The Router is the only owner of control state. It consumes decoded
//! ShuttlePRO events one at a time and turns them into:
//! - control changes through the dispatcher
//! - LCD row writes through the display writer
//! - transport actions through the media keys

mod buttons;
mod refresh;
mod wheel;

pub use wheel::{WheelMapping, WheelOutput};


use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::config::AppConfig;
use crate::controls::ControlTable;
use crate::dispatcher::DispatcherHandle;
use crate::display::DisplayHandle;
use crate::media_keys::MediaKeys;
use crate::shuttle::ShuttleEvent;
use crate::state::{ButtonCommand, ButtonStates, ControlState, RowUpdate, VolumeState};

/// Event loop state and collaborators
pub struct Router {
    /// Button descriptors
    pub(crate) table: ControlTable,
    /// Latch states and volumes
    pub(crate) state: ControlState,
    pub(crate) wheel: WheelMapping,
    /// Control output
    pub(crate) dispatcher: DispatcherHandle,
    /// LCD output, if connected
    pub(crate) display: Option<DisplayHandle>,
    pub(crate) media_keys: Arc<dyn MediaKeys>,
    pub(crate) display_enabled: bool,
    pub(crate) media_keys_enabled: bool,
}

impl Router {
    pub fn new(
        table: ControlTable,
        state: ControlState,
        wheel: WheelMapping,
        dispatcher: DispatcherHandle,
        media_keys: Arc<dyn MediaKeys>,
    ) -> Self {
        Self {
            table,
            state,
            wheel,
            dispatcher,
            display: None,
            media_keys,
            display_enabled: false,
            media_keys_enabled: false,
        }
    }

    /// Build a router for the standard control table from configuration
    pub fn from_config(
        config: &AppConfig,
        dispatcher: DispatcherHandle,
        media_keys: Arc<dyn MediaKeys>,
    ) -> Self {
        let table = ControlTable::standard();
        let volume = &config.volume;
        let state = ControlState::new(
            ButtonStates::new(&table),
            VolumeState::with_levels(
                (volume.main.initial, volume.main.step, volume.main.controller),
                (
                    volume.headphone.initial,
                    volume.headphone.step,
                    volume.headphone.controller,
                ),
            ),
        );

        let mut router = Self::new(
            table,
            state,
            WheelMapping::from(&config.wheel),
            dispatcher,
            media_keys,
        );
        router.display_enabled = config.display.enabled;
        router.media_keys_enabled = config.media_keys.enabled;
        router
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// Process one decoded event
    pub async fn handle_event(&mut self, event: ShuttleEvent) {
        trace!(?event, "Shuttle event");

        match event {
            ShuttleEvent::Wheel(position) => self.on_wheel(position),
            ShuttleEvent::Dial(direction) => self.on_dial(direction),
            ShuttleEvent::Button { id, pressed: true } => self.on_button_press(id).await,
            ShuttleEvent::Button { .. } => {}
        }
    }

    /// Stop the current dispatcher and wait until its port is released
    pub async fn stop_dispatcher(&self) {
        self.dispatcher.shutdown().await;
    }

    /// Install a new dispatcher. The previous one must be stopped first.
    pub fn set_dispatcher(&mut self, dispatcher: DispatcherHandle) {
        self.dispatcher = dispatcher;
    }

    /// Stop the current display writer, if any
    pub async fn stop_display(&mut self) {
        if let Some(display) = self.display.take() {
            display.shutdown().await;
        }
    }

    pub fn set_display(&mut self, display: Option<DisplayHandle>) {
        self.display = display;
    }

    pub fn has_display(&self) -> bool {
        self.display.is_some()
    }

    /// Turn LCD output on (full refresh) or off (blank the display)
    pub fn set_display_enabled(&mut self, enabled: bool) {
        if enabled == self.display_enabled {
            return;
        }
        info!("Display output {}", if enabled { "enabled" } else { "disabled" });

        if enabled {
            self.display_enabled = true;
            self.refresh_display();
        } else {
            self.clear_display();
            self.display_enabled = false;
        }
    }

    pub fn set_media_keys_enabled(&mut self, enabled: bool) {
        if enabled != self.media_keys_enabled {
            info!(
                "Transport buttons {}",
                if enabled { "drive Music.app" } else { "send control changes" }
            );
        }
        self.media_keys_enabled = enabled;
    }

    /// Apply a button command and forward its emission
    pub(crate) fn apply(&mut self, id: usize, command: ButtonCommand) {
        let Some(emission) = self.state.buttons.apply(&self.table, id, command) else {
            debug!(id, ?command, "Button command had no effect");
            return;
        };

        self.dispatcher.send(emission.controller, emission.value, false);
        if let Some(update) = emission.display {
            self.show(update);
        }
    }

    /// Write a cell when the display is enabled and connected
    pub(crate) fn show(&self, update: RowUpdate) {
        if !self.display_enabled {
            return;
        }
        if let Some(display) = &self.display {
            display.write_row(update.channel, update.row, update.text);
        }
    }
}
