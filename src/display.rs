//! Mackie Control LCD output
//!
//! Composes the two display rows from the current control state and encodes
//! row writes as MCU LCD SysEx messages.

mod writer;

pub use writer::{DisplayCommand, DisplayHandle, DisplayWriter, DEFAULT_ROW_DELAY};

use crate::controls::{ControlTable, LcdRow, LCD_CELL_WIDTH, LFE};
use crate::midi::MidiMessage;
use crate::state::{ControlState, VolumeTarget};

/// MCU header (Behringer X-Touch device id) followed by the LCD command
pub const MCU_LCD_HEADER: [u8; 5] = [0x00, 0x00, 0x66, 0x14, 0x12];

/// Characters written per row when clearing a channel
pub const CLEAR_ROW_WIDTH: usize = 28;

/// Address of the first character of `row` at 1-based display `channel`
pub fn row_address(channel: u8, row: LcdRow) -> u8 {
    let cell = channel.saturating_sub(1).wrapping_mul(LCD_CELL_WIDTH as u8);
    row.offset().wrapping_add(cell) & 0x7F
}

/// Build the SysEx that writes `text` starting at the given cell
pub fn lcd_sysex(channel: u8, row: LcdRow, text: &str) -> MidiMessage {
    let mut data = Vec::with_capacity(MCU_LCD_HEADER.len() + 1 + text.len());
    data.extend_from_slice(&MCU_LCD_HEADER);
    data.push(row_address(channel, row));
    data.extend(text.chars().map(|c| if c.is_ascii() { c as u8 } else { b'?' }));

    MidiMessage::SysEx { data }
}

/// Row of spaces used to blank a channel
pub fn blank_row() -> String {
    " ".repeat(CLEAR_ROW_WIDTH)
}

/// Full text of both rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRows {
    pub upper: String,
    pub lower: String,
}

/// Compose both rows from the control state.
///
/// Upper: every latching upper-row button with a display cell, in button
/// order. Lower: main volume, LFE state, headphone volume.
pub fn compose_rows(table: &ControlTable, state: &ControlState) -> DisplayRows {
    let upper: String = table
        .buttons()
        .filter(|b| b.latch && b.has_display() && b.lcd_row == LcdRow::Upper)
        .map(|b| b.message(state.buttons.is_on(b.id)))
        .collect();

    let mut lower = String::with_capacity(3 * LCD_CELL_WIDTH);
    lower.push_str(state.volume.current(VolumeTarget::Main).text);
    lower.push_str(table.button(LFE).message(state.buttons.is_on(LFE)));
    lower.push_str(state.volume.current(VolumeTarget::Headphone).text);

    DisplayRows { upper, lower }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{ControlTable, HEADPHONES};
    use crate::state::{ButtonCommand, ButtonStates, VolumeState};

    fn state(table: &ControlTable) -> ControlState {
        ControlState::new(
            ButtonStates::new(table),
            VolumeState::with_levels((40.0, 1.3, 7), (60.0, 1.4, 102)),
        )
    }

    #[test]
    fn test_row_address() {
        assert_eq!(row_address(6, LcdRow::Lower), 91);
        assert_eq!(row_address(1, LcdRow::Upper), 0);
        assert_eq!(row_address(5, LcdRow::Upper), 28);
        assert_eq!(row_address(8, LcdRow::Lower), 105);
    }

    #[test]
    fn test_lcd_sysex_layout() {
        let msg = lcd_sysex(7, LcdRow::Upper, "Phn on ");
        assert_eq!(
            msg.encode(),
            vec![
                0xF0, 0x00, 0x00, 0x66, 0x14, 0x12, 42, b'P', b'h', b'n', b' ', b'o', b'n', b' ',
                0xF7
            ]
        );
    }

    #[test]
    fn test_lcd_sysex_replaces_non_ascii() {
        let MidiMessage::SysEx { data } = lcd_sysex(1, LcdRow::Upper, "é") else {
            panic!("expected sysex");
        };
        assert_eq!(data.last(), Some(&b'?'));
    }

    #[test]
    fn test_compose_default_rows() {
        let table = ControlTable::standard();
        let rows = compose_rows(&table, &state(&table));

        assert_eq!(rows.upper, " LR on LRs on Phn offStereo ");
        assert_eq!(rows.upper.len(), 28);
        assert_eq!(rows.lower, " -26.0 LFE on  47.24 ");
    }

    #[test]
    fn test_compose_follows_state() {
        let table = ControlTable::standard();
        let mut state = state(&table);
        state.buttons.apply(&table, HEADPHONES, ButtonCommand::Toggle);
        state.buttons.apply(&table, LFE, ButtonCommand::Toggle);

        let rows = compose_rows(&table, &state);
        assert_eq!(rows.upper, " LR on LRs on Phn on Stereo ");
        assert_eq!(rows.lower, " -26.0 LFE off 47.24 ");
    }

    #[test]
    fn test_blank_row() {
        assert_eq!(blank_row().len(), CLEAR_ROW_WIDTH);
        assert!(blank_row().chars().all(|c| c == ' '));
    }
}
