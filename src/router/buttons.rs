//! Button press policy
//!
//! Cross-button rules between speaker sets, headphone mode and surround mode.
//! Only press edges reach this code.

use tracing::{debug, warn};

use super::Router;
use crate::controls::{
    BUTTON_COUNT, HEADPHONES, LFE, MAIN_SPEAKERS, STEREO_SURROUND, SURROUND_PAIR,
    TRANSPORT_PLAY, TRANSPORT_PREVIOUS,
};
use crate::media_keys::TransportAction;
use crate::state::ButtonCommand;

/// Buttons silenced while headphone mode is on
const SPEAKER_BUTTONS: [usize; 3] = [MAIN_SPEAKERS, LFE, SURROUND_PAIR];

impl Router {
    pub(crate) async fn on_button_press(&mut self, id: usize) {
        if id >= BUTTON_COUNT {
            debug!(id, "Ignoring unknown button");
            return;
        }

        match id {
            MAIN_SPEAKERS => {
                if self.state.buttons.is_on(HEADPHONES) {
                    debug!("Main speakers locked while headphones are on");
                } else {
                    self.apply(MAIN_SPEAKERS, ButtonCommand::Toggle);
                }
            }
            HEADPHONES => self.toggle_headphones(),
            STEREO_SURROUND => self.toggle_surround(),
            TRANSPORT_PREVIOUS..=TRANSPORT_PLAY => self.transport(id).await,
            _ => self.apply(id, ButtonCommand::Toggle),
        }
    }

    /// Entering headphone mode silences the speakers. Leaving it re-asserts
    /// every speaker button that is still latched on.
    fn toggle_headphones(&mut self) {
        if self.state.buttons.is_on(HEADPHONES) {
            for id in SPEAKER_BUTTONS {
                if self.state.buttons.is_on(id) {
                    self.apply(id, ButtonCommand::On);
                }
            }
        } else {
            for id in SPEAKER_BUTTONS {
                self.apply(id, ButtonCommand::Off);
            }
        }
        self.apply(HEADPHONES, ButtonCommand::Toggle);
    }

    /// Surround mode forces the surround pair on. Leaving it only turns the
    /// pair off if it was not latched on by hand.
    fn toggle_surround(&mut self) {
        if self.state.buttons.is_on(STEREO_SURROUND) {
            if !self.state.buttons.is_on(SURROUND_PAIR) {
                self.apply(SURROUND_PAIR, ButtonCommand::Off);
            }
        } else {
            self.apply(SURROUND_PAIR, ButtonCommand::On);
        }
        self.apply(STEREO_SURROUND, ButtonCommand::Toggle);
    }

    async fn transport(&mut self, id: usize) {
        if self.media_keys_enabled {
            if let Some(action) = TransportAction::for_button(id) {
                if let Err(e) = self.media_keys.send(action).await {
                    warn!("Media key {:?} failed: {:#}", action, e);
                }
                return;
            }
        }
        self.apply(id, ButtonCommand::On);
    }
}
