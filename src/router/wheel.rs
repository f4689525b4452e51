//! Jog wheel and dial handling

use tracing::debug;

use super::Router;
use crate::config::WheelConfig;
use crate::controls::{LcdRow, HEADPHONES, MAIN_SPEAKERS, NEUTRAL};
use crate::shuttle::DialDirection;
use crate::state::{RowUpdate, VolumeDirection, VolumeTarget};

/// Highest CC data value
const MAX_VALUE: u16 = 127;

/// What a wheel position sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelOutput {
    /// Value for the forward controller
    Forward(u8),
    /// Value for the reverse controller
    Reverse(u8),
    /// Wheel at rest: neutral on both controllers
    Rest,
}

/// Wheel position to control change mapping
///
/// Positions 1..=max drive the forward controller, inverted so the first
/// detent sends the largest value. Positions -max..=-1 drive the reverse
/// controller proportionally. Anything else counts as rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelMapping {
    pub max_position: i8,
    pub step: u8,
    pub forward_controller: u8,
    pub reverse_controller: u8,
}

impl Default for WheelMapping {
    fn default() -> Self {
        Self {
            max_position: 7,
            step: 18,
            forward_controller: 0,
            reverse_controller: 1,
        }
    }
}

impl From<&WheelConfig> for WheelMapping {
    fn from(config: &WheelConfig) -> Self {
        Self {
            max_position: config.max_position,
            step: config.step,
            forward_controller: config.forward_controller,
            reverse_controller: config.reverse_controller,
        }
    }
}

impl WheelMapping {
    pub fn output(&self, position: i8) -> WheelOutput {
        let max = self.max_position;
        if (1..=max).contains(&position) {
            WheelOutput::Forward(self.scale(max.saturating_add(1) - position))
        } else if (-max..=-1).contains(&position) {
            WheelOutput::Reverse(self.scale(-position))
        } else {
            WheelOutput::Rest
        }
    }

    fn scale(&self, detents: i8) -> u8 {
        let value = u16::from(self.step) * u16::from(detents.unsigned_abs());
        value.min(MAX_VALUE) as u8
    }
}

impl Router {
    pub(crate) fn on_wheel(&mut self, position: i8) {
        match self.wheel.output(position) {
            WheelOutput::Forward(value) => {
                self.dispatcher.send(self.wheel.forward_controller, value, true)
            }
            WheelOutput::Reverse(value) => {
                self.dispatcher.send(self.wheel.reverse_controller, value, true)
            }
            WheelOutput::Rest => {
                self.dispatcher.send(self.wheel.forward_controller, NEUTRAL, false);
                self.dispatcher.send(self.wheel.reverse_controller, NEUTRAL, false);
            }
        }
    }

    /// One dial detent steps the headphone volume in headphone mode and the
    /// main volume otherwise
    pub(crate) fn on_dial(&mut self, direction: DialDirection) {
        let target = VolumeTarget::for_headphone_mode(self.state.buttons.is_on(HEADPHONES));
        let direction = match direction {
            DialDirection::Clockwise => VolumeDirection::Up,
            DialDirection::CounterClockwise => VolumeDirection::Down,
        };

        let update = self.state.volume.adjust(target, direction);
        debug!("{:?} volume {} ({})", target, update.value, update.text.trim());

        self.show(RowUpdate {
            channel: self.volume_channel(target),
            row: LcdRow::Lower,
            text: update.text.to_string(),
        });
        self.dispatcher.send(update.controller, update.value, false);
    }

    /// Display channel whose lower cell shows a volume
    pub(crate) fn volume_channel(&self, target: VolumeTarget) -> u8 {
        let owner = match target {
            VolumeTarget::Main => MAIN_SPEAKERS,
            VolumeTarget::Headphone => HEADPHONES,
        };
        self.table.button(owner).lcd_channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_positions_are_inverted() {
        let wheel = WheelMapping::default();
        assert_eq!(wheel.output(1), WheelOutput::Forward(126));
        assert_eq!(wheel.output(4), WheelOutput::Forward(72));
        assert_eq!(wheel.output(7), WheelOutput::Forward(18));
    }

    #[test]
    fn test_reverse_positions_scale() {
        let wheel = WheelMapping::default();
        assert_eq!(wheel.output(-1), WheelOutput::Reverse(18));
        assert_eq!(wheel.output(-3), WheelOutput::Reverse(54));
        assert_eq!(wheel.output(-7), WheelOutput::Reverse(126));
    }

    #[test]
    fn test_rest_positions() {
        let wheel = WheelMapping::default();
        for position in [0, 8, -8, i8::MIN, i8::MAX] {
            assert_eq!(wheel.output(position), WheelOutput::Rest, "position {}", position);
        }
    }

    #[test]
    fn test_custom_threshold() {
        let wheel = WheelMapping {
            max_position: 3,
            step: 40,
            ..WheelMapping::default()
        };
        assert_eq!(wheel.output(1), WheelOutput::Forward(120));
        assert_eq!(wheel.output(3), WheelOutput::Forward(40));
        assert_eq!(wheel.output(4), WheelOutput::Rest);
        assert_eq!(wheel.output(-4), WheelOutput::Rest);
    }

    #[test]
    fn test_scale_saturates() {
        let wheel = WheelMapping {
            step: 100,
            ..WheelMapping::default()
        };
        assert_eq!(wheel.output(-7), WheelOutput::Reverse(127));
    }
}
