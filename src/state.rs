//! Control state owned by the router
//!
//! Latching button states and the two volume accumulators. Only the router
//! mutates this, from its single event-processing path.

mod buttons;
mod volume;

pub use buttons::{ButtonCommand, ButtonEmission, ButtonStates, RowUpdate};
pub use volume::{VolumeChannel, VolumeDirection, VolumeState, VolumeTarget, VolumeUpdate};

/// Everything the event loop tracks between events
#[derive(Debug, Clone)]
pub struct ControlState {
    pub buttons: ButtonStates,
    pub volume: VolumeState,
}

impl ControlState {
    pub fn new(buttons: ButtonStates, volume: VolumeState) -> Self {
        Self { buttons, volume }
    }
}
