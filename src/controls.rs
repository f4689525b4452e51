//! ShuttlePRO v2 control table
//!
//! Static descriptors for the 15 hardware buttons and the display text lookup
//! tables for the two volume controls. Built once at startup and never mutated.

/// Number of buttons on the ShuttlePRO v2
pub const BUTTON_COUNT: usize = 15;

/// CC value sent for an "on" transition
pub const CC_ON: u8 = 127;
/// CC value sent for an "off" transition
pub const CC_OFF: u8 = 0;
/// Reserved value meaning "neutral/stop" for continuous controls; never transmitted
pub const NEUTRAL: u8 = 255;

/// Width of one display cell in characters
pub const LCD_CELL_WIDTH: usize = 7;

pub const MAIN_SPEAKERS: usize = 0;
pub const LFE: usize = 1;
pub const SURROUND_PAIR: usize = 2;
pub const HEADPHONES: usize = 3;
pub const TRANSPORT_PREVIOUS: usize = 4;
pub const TRANSPORT_NEXT: usize = 5;
pub const TRANSPORT_STOP: usize = 6;
pub const TRANSPORT_PLAY: usize = 7;
pub const STEREO_SURROUND: usize = 8;

/// Row of the two-line LCD. The discriminant is the address offset of the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LcdRow {
    Upper = 0,
    Lower = 56,
}

impl LcdRow {
    /// Address offset of the first cell of this row
    pub fn offset(self) -> u8 {
        self as u8
    }
}

/// Immutable description of one hardware button
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonDescriptor {
    pub id: usize,
    /// CC number sent for this button
    pub controller: u8,
    /// Latching buttons keep their state across presses
    pub latch: bool,
    /// State at startup
    pub default_state: bool,
    pub msg_on: &'static str,
    pub msg_off: &'static str,
    /// 1-based display channel, 0 = no display
    pub lcd_channel: u8,
    pub lcd_row: LcdRow,
}

impl ButtonDescriptor {
    /// Display text for a given state
    pub fn message(&self, on: bool) -> &'static str {
        if on {
            self.msg_on
        } else {
            self.msg_off
        }
    }

    pub fn has_display(&self) -> bool {
        self.lcd_channel != 0
    }
}

const fn latching(
    id: usize,
    controller: u8,
    default_state: bool,
    msg_on: &'static str,
    msg_off: &'static str,
    lcd_channel: u8,
    lcd_row: LcdRow,
) -> ButtonDescriptor {
    ButtonDescriptor {
        id,
        controller,
        latch: true,
        default_state,
        msg_on,
        msg_off,
        lcd_channel,
        lcd_row,
    }
}

const fn momentary(id: usize, controller: u8) -> ButtonDescriptor {
    ButtonDescriptor {
        id,
        controller,
        latch: false,
        default_state: true,
        msg_on: "",
        msg_off: "",
        lcd_channel: 0,
        lcd_row: LcdRow::Upper,
    }
}

/// The full set of button descriptors
#[derive(Debug, Clone)]
pub struct ControlTable {
    buttons: [ButtonDescriptor; BUTTON_COUNT],
}

impl ControlTable {
    /// Monitor-controller layout: speaker sets, headphones, transport and solo modes
    pub fn standard() -> Self {
        use LcdRow::{Lower, Upper};

        Self {
            buttons: [
                latching(0, 70, true, " LR on ", " LR off", 5, Upper),
                latching(1, 71, true, "LFE on ", "LFE off", 6, Lower),
                latching(2, 72, true, "LRs on ", "LRs off", 6, Upper),
                latching(3, 73, false, "Phn on ", "Phn off", 7, Upper),
                momentary(4, 74),
                momentary(5, 75),
                momentary(6, 76),
                momentary(7, 77),
                latching(8, 78, false, "Surrnd ", "Stereo ", 8, Upper),
                latching(9, 79, false, " -Left-", "       ", 8, Lower),
                latching(10, 80, false, "-Right-", "       ", 8, Lower),
                latching(11, 81, false, " -Mid- ", "       ", 8, Lower),
                latching(12, 82, false, " -Side-", "       ", 8, Lower),
                latching(13, 83, false, " -Dim- ", "       ", 8, Lower),
                latching(14, 84, false, " -Mono-", "       ", 8, Lower),
            ],
        }
    }

    /// Descriptor for a button id. Panics on ids outside 0..15, which the
    /// decoder never produces.
    pub fn button(&self, id: usize) -> &ButtonDescriptor {
        &self.buttons[id]
    }

    pub fn buttons(&self) -> impl Iterator<Item = &ButtonDescriptor> {
        self.buttons.iter()
    }

    /// Default state of every button
    pub fn default_states(&self) -> [bool; BUTTON_COUNT] {
        let mut states = [false; BUTTON_COUNT];
        for (state, button) in states.iter_mut().zip(self.buttons.iter()) {
            *state = button.default_state;
        }
        states
    }
}

impl Default for ControlTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// dB readout of the main monitor fader per CC 7 step
pub static MAIN_VOLUME_TEXT: [&str; 128] = [
    "  -oo  ", " -63.2 ", " -62.0 ", " -60.9 ", " -59.7 ", " -58.6 ", " -57.5 ", " -56.3 ", " -55.2 ", " -54.1 ",
    " -53.1 ", " -52.0 ", " -50.9 ", " -49.9 ", " -48.9 ", " -47.8 ", " -46.8 ", " -45.8 ", " -44.8 ", " -43.8 ",
    " -42.9 ", " -41.9 ", " -41.0 ", " -40.1 ", " -39.1 ", " -38.2 ", " -37.3 ", " -36.4 ", " -35.6 ", " -34.7 ",
    " -33.9 ", " -33.0 ", " -32.2 ", " -31.4 ", " -30.6 ", " -29.8 ", " -29.0 ", " -28.2 ", " -27.5 ", " -26.7 ",
    " -26.0 ", " -25.3 ", " -24.6 ", " -23.9 ", " -23.2 ", " -22.5 ", " -21.8 ", " -21.2 ", " -20.5 ", " -19.9 ",
    " -19.3 ", " -18.7 ", " -18.1 ", " -17.5 ", " -16.9 ", " -16.4 ", " -15.8 ", " -15.3 ", " -14.8 ", " -14.3 ",
    " -13.8 ", " -13.3 ", " -12.8 ", " -12.3 ", " -11.9 ", " -11.4 ", " -11.0 ", " -10.6 ", " -10.2 ", "  -9.8 ",
    "  -9.4 ", "  -9.0 ", "  -8.6 ", "  -8.3 ", "  -8.0 ", "  -7.6 ", "  -7.3 ", "  -7.0 ", "  -6.7 ", "  -6.4 ",
    "  -6.2 ", "  -5.9 ", "  -5.6 ", "  -5.4 ", "  -5.1 ", "  -4.9 ", "  -4.6 ", "  -4.4 ", "  -4.1 ", "  -3.9 ",
    "  -3.6 ", "  -3.3 ", "  -3.1 ", "  -2.8 ", "  -2.6 ", "  -2.3 ", "  -2.1 ", "  -1.8 ", "  -1.5 ", "  -1.3 ",
    "  -1.0 ", "  -0.8 ", "  -0.5 ", "  -0.3 ", "   0.0 ", "   0.3 ", "   0.5 ", "   0.8 ", "   1.0 ", "   1.3 ",
    "   1.5 ", "   1.8 ", "   2.1 ", "   2.3 ", "   2.6 ", "   2.8 ", "   3.1 ", "   3.3 ", "   3.6 ", "   3.9 ",
    "   4.1 ", "   4.4 ", "   4.6 ", "   4.9 ", "   5.1 ", "   5.4 ", "   5.6 ", "  6.0  ",
];

/// Headphone volume readout in percent
pub static HEADPHONE_VOLUME_TEXT: [&str; 128] = [
    "  0.00 ", "  0.79 ", "  1.57 ", "  2.36 ", "  3.15 ", "  3.94 ", "  4.72 ", "  5.51 ", "  6.30 ", "  7.09 ",
    "  7.87 ", "  8.66 ", "  9.45 ", " 10.24 ", " 11.02 ", " 11.81 ", " 12.60 ", " 13.39 ", " 14.17 ", " 14.96 ",
    " 15.75 ", " 16.54 ", " 17.32 ", " 18.11 ", " 18.90 ", " 19.69 ", " 20.47 ", " 21.26 ", " 22.05 ", " 22.83 ",
    " 23.62 ", " 24.41 ", " 25.20 ", " 25.98 ", " 26.77 ", " 27.56 ", " 28.35 ", " 29.13 ", " 29.92 ", " 30.71 ",
    " 31.50 ", " 32.28 ", " 33.07 ", " 33.86 ", " 34.65 ", " 35.43 ", " 36.22 ", " 37.01 ", " 37.80 ", " 38.58 ",
    " 39.37 ", " 40.16 ", " 40.94 ", " 41.73 ", " 42.52 ", " 43.31 ", " 44.09 ", " 44.88 ", " 45.67 ", " 46.46 ",
    " 47.24 ", " 48.03 ", " 48.82 ", " 49.61 ", " 50.39 ", " 51.18 ", " 51.97 ", " 52.76 ", " 53.54 ", " 54.33 ",
    " 55.12 ", " 55.91 ", " 56.69 ", " 57.48 ", " 58.27 ", " 59.06 ", " 59.84 ", " 60.63 ", " 61.42 ", " 62.20 ",
    " 62.99 ", " 63.78 ", " 64.57 ", " 65.35 ", " 66.14 ", " 66.93 ", " 67.72 ", " 68.50 ", " 69.29 ", " 70.08 ",
    " 70.87 ", " 71.65 ", " 72.44 ", " 73.23 ", " 74.02 ", " 74.80 ", " 75.59 ", " 76.38 ", " 77.17 ", " 77.95 ",
    " 78.74 ", " 79.53 ", " 80.31 ", " 81.10 ", " 81.89 ", " 82.68 ", " 83.46 ", " 84.25 ", " 85.04 ", " 85.83 ",
    " 86.61 ", " 87.40 ", " 88.19 ", " 88.98 ", " 89.76 ", " 90.55 ", " 91.34 ", " 92.13 ", " 92.91 ", " 93.70 ",
    " 94.49 ", " 95.28 ", " 96.06 ", " 96.85 ", " 97.64 ", " 98.43 ", " 99.21 ", "100.00 ",
];
