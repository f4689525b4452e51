//! Full display refresh and output resync

use tracing::debug;

use crate::controls::{LcdRow, MAIN_SPEAKERS};
use crate::display::compose_rows;
use crate::state::VolumeTarget;

impl super::Router {
    /// Bring the receiving side in line with local state: redraw the display
    /// and re-send both volumes. Called at startup and after a reconnect.
    pub fn resync(&self) {
        if self.display_enabled {
            self.refresh_display();
        }

        for target in [VolumeTarget::Main, VolumeTarget::Headphone] {
            let volume = self.state.volume.current(target);
            self.dispatcher.send(volume.controller, volume.value, false);
        }
    }

    /// Rewrite both LCD rows from the current state
    pub fn refresh_display(&self) {
        if !self.display_enabled {
            return;
        }
        let Some(display) = &self.display else {
            debug!("No display connected, skipping refresh");
            return;
        };

        let rows = compose_rows(&self.table, &self.state);
        let channel = self.table.button(MAIN_SPEAKERS).lcd_channel;
        debug!("Refreshing display: '{}' / '{}'", rows.upper, rows.lower);

        display.write_row(channel, LcdRow::Upper, rows.upper);
        display.write_row(channel, LcdRow::Lower, rows.lower);
    }

    /// Blank both LCD rows
    pub fn clear_display(&self) {
        if let Some(display) = &self.display {
            display.clear_channel(self.table.button(MAIN_SPEAKERS).lcd_channel);
        }
    }
}
