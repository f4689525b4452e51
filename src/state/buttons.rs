//! Button state machine
//!
//! Applies on/off/toggle commands to the per-button latch state and returns
//! what has to be sent: one CC value and, when the button has a display cell,
//! the text for it. Cross-button rules live in the router.

use crate::controls::{ButtonDescriptor, ControlTable, LcdRow, BUTTON_COUNT, CC_OFF, CC_ON};

/// Command applied to a single button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonCommand {
    /// Emit the "on" transition without touching the stored state
    On,
    /// Emit the "off" transition without touching the stored state
    Off,
    /// Flip a latching button and emit its new state
    Toggle,
}

/// Text to write into one display cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowUpdate {
    pub channel: u8,
    pub row: LcdRow,
    pub text: String,
}

/// Output of a button command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonEmission {
    pub controller: u8,
    pub value: u8,
    pub display: Option<RowUpdate>,
}

impl ButtonEmission {
    fn new(button: &ButtonDescriptor, on: bool) -> Self {
        let text = button.message(on);
        let display = (!text.is_empty() && button.has_display()).then(|| RowUpdate {
            channel: button.lcd_channel,
            row: button.lcd_row,
            text: text.to_string(),
        });

        Self {
            controller: button.controller,
            value: if on { CC_ON } else { CC_OFF },
            display,
        }
    }
}

/// Stored latch state of every button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonStates {
    states: [bool; BUTTON_COUNT],
}

impl ButtonStates {
    /// Start from the table defaults
    pub fn new(table: &ControlTable) -> Self {
        Self {
            states: table.default_states(),
        }
    }

    pub fn is_on(&self, id: usize) -> bool {
        self.states[id]
    }

    /// Apply a command. Returns None when the command has no effect
    /// (toggling a momentary button).
    pub fn apply(
        &mut self,
        table: &ControlTable,
        id: usize,
        command: ButtonCommand,
    ) -> Option<ButtonEmission> {
        let button = table.button(id);

        match command {
            ButtonCommand::On => Some(ButtonEmission::new(button, true)),
            ButtonCommand::Off => Some(ButtonEmission::new(button, false)),
            ButtonCommand::Toggle => {
                if !button.latch {
                    return None;
                }
                let next = !self.states[id];
                self.states[id] = next;
                Some(ButtonEmission::new(button, next))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{HEADPHONES, LFE, MAIN_SPEAKERS, TRANSPORT_PLAY};

    #[test]
    fn test_toggle_flips_and_emits_new_state() {
        let table = ControlTable::standard();
        let mut states = ButtonStates::new(&table);
        assert!(!states.is_on(HEADPHONES));

        let emission = states.apply(&table, HEADPHONES, ButtonCommand::Toggle).unwrap();
        assert!(states.is_on(HEADPHONES));
        assert_eq!(emission.controller, 73);
        assert_eq!(emission.value, CC_ON);
        assert_eq!(
            emission.display,
            Some(RowUpdate {
                channel: 7,
                row: LcdRow::Upper,
                text: "Phn on ".to_string()
            })
        );
    }

    #[test]
    fn test_double_toggle_reproduces_off() {
        let table = ControlTable::standard();
        let mut states = ButtonStates::new(&table);

        let initial_off = states.apply(&table, HEADPHONES, ButtonCommand::Off).unwrap();
        states.apply(&table, HEADPHONES, ButtonCommand::Toggle);
        let back_off = states.apply(&table, HEADPHONES, ButtonCommand::Toggle).unwrap();

        assert!(!states.is_on(HEADPHONES));
        assert_eq!(back_off, initial_off);
    }

    #[test]
    fn test_on_off_leave_state_untouched() {
        let table = ControlTable::standard();
        let mut states = ButtonStates::new(&table);

        let off = states.apply(&table, MAIN_SPEAKERS, ButtonCommand::Off).unwrap();
        assert_eq!(off.value, CC_OFF);
        assert_eq!(off.display.unwrap().text, " LR off");
        assert!(states.is_on(MAIN_SPEAKERS));

        let on = states.apply(&table, LFE, ButtonCommand::On).unwrap();
        assert_eq!(on.controller, 71);
        assert_eq!(on.display.unwrap().row, LcdRow::Lower);
    }

    #[test]
    fn test_momentary_ignores_toggle() {
        let table = ControlTable::standard();
        let mut states = ButtonStates::new(&table);
        let before = states.clone();

        assert!(states.apply(&table, TRANSPORT_PLAY, ButtonCommand::Toggle).is_none());
        assert_eq!(states, before);
    }

    #[test]
    fn test_momentary_pulse_has_no_display() {
        let table = ControlTable::standard();
        let mut states = ButtonStates::new(&table);

        for _ in 0..3 {
            let pulse = states.apply(&table, TRANSPORT_PLAY, ButtonCommand::On).unwrap();
            assert_eq!((pulse.controller, pulse.value), (77, CC_ON));
            assert!(pulse.display.is_none());
        }
        assert_eq!(states, ButtonStates::new(&table));
    }
}
