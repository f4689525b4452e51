//! Input report decoding
//!
//! Turns raw ShuttlePRO v2 HID reports into edge events by diffing each field
//! against the previously seen snapshot.

use tracing::debug;

use crate::controls::BUTTON_COUNT;

/// Minimum number of bytes a report needs to carry every control
pub const REPORT_MIN_LEN: usize = 5;

const WHEEL_BYTE: usize = 0;
const DIAL_BYTE: usize = 1;
const BUTTONS_LOW_BYTE: usize = 3;
const BUTTONS_HIGH_BYTE: usize = 4;

/// Direction of a single dial step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialDirection {
    Clockwise,
    CounterClockwise,
}

/// Edge event produced by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShuttleEvent {
    /// New spring-loaded wheel position
    Wheel(i8),
    /// One dial detent
    Dial(DialDirection),
    /// Button pressed or released
    Button { id: usize, pressed: bool },
}

/// Last seen value of every control
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub wheel: i8,
    pub dial: u8,
    pub buttons: [bool; BUTTON_COUNT],
}

impl DeviceSnapshot {
    /// Parse a raw report. Returns None if the report is too short.
    pub fn from_report(report: &[u8]) -> Option<Self> {
        if report.len() < REPORT_MIN_LEN {
            return None;
        }

        let packed = u16::from(report[BUTTONS_LOW_BYTE]) | (u16::from(report[BUTTONS_HIGH_BYTE]) << 8);
        let mut buttons = [false; BUTTON_COUNT];
        for (bit, pressed) in buttons.iter_mut().enumerate() {
            *pressed = packed & (1 << bit) != 0;
        }

        Some(Self {
            wheel: report[WHEEL_BYTE] as i8,
            dial: report[DIAL_BYTE],
            buttons,
        })
    }
}

/// Stateful report decoder
#[derive(Debug, Default)]
pub struct ReportDecoder {
    snapshot: DeviceSnapshot,
}

impl ReportDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot
    pub fn snapshot(&self) -> &DeviceSnapshot {
        &self.snapshot
    }

    /// Decode one report into edge events and replace the snapshot.
    ///
    /// The dial only produces an event for a delta of exactly one detent; any
    /// other jump (first read, dropped report) just resynchronises.
    pub fn decode(&mut self, report: &[u8]) -> Vec<ShuttleEvent> {
        let Some(next) = DeviceSnapshot::from_report(report) else {
            debug!("Ignoring short report ({} bytes)", report.len());
            return Vec::new();
        };

        let prev = self.snapshot;
        let mut events = Vec::new();

        if next.wheel != prev.wheel {
            events.push(ShuttleEvent::Wheel(next.wheel));
        }

        if next.dial != prev.dial {
            match next.dial.wrapping_sub(prev.dial) as i8 {
                1 => events.push(ShuttleEvent::Dial(DialDirection::Clockwise)),
                -1 => events.push(ShuttleEvent::Dial(DialDirection::CounterClockwise)),
                delta => debug!("Dial jumped by {}, resynchronising", delta),
            }
        }

        for (id, (&now, &before)) in next.buttons.iter().zip(prev.buttons.iter()).enumerate() {
            if now != before {
                events.push(ShuttleEvent::Button { id, pressed: now });
            }
        }

        self.snapshot = next;
        events
    }
}
