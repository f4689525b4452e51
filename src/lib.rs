//! ShuttleMidi - Contour ShuttlePRO v2 to MIDI bridge
//!
//! Turns jog wheel, dial and button input into MIDI control changes for a
//! monitor controller and mirrors the control state on a Mackie Control LCD.

pub mod config;
pub mod controls;
pub mod dispatcher;
pub mod display;
pub mod media_keys;
pub mod midi;
pub mod router;
pub mod shuttle;
pub mod state;
