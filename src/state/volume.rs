//! Volume accumulators
//!
//! Main monitor and headphone volume are fractional accumulators stepped by
//! the dial and clamped to the 7-bit CC range.

use crate::controls::{HEADPHONE_VOLUME_TEXT, MAIN_VOLUME_TEXT};

const VOLUME_MAX: f32 = 127.0;

/// Which accumulator a dial step goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeTarget {
    Main,
    Headphone,
}

impl VolumeTarget {
    /// Dial routing: headphones while headphone mode is on, main otherwise
    pub fn for_headphone_mode(headphones_on: bool) -> Self {
        if headphones_on {
            VolumeTarget::Headphone
        } else {
            VolumeTarget::Main
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeDirection {
    Up,
    Down,
}

/// One bounded accumulator
#[derive(Debug, Clone)]
pub struct VolumeChannel {
    value: f32,
    step: f32,
    controller: u8,
    texts: &'static [&'static str; 128],
}

impl VolumeChannel {
    pub fn new(initial: f32, step: f32, controller: u8, texts: &'static [&'static str; 128]) -> Self {
        Self {
            value: initial.clamp(0.0, VOLUME_MAX),
            step,
            controller,
            texts,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// CC value, truncated
    pub fn level(&self) -> u8 {
        self.value as u8
    }

    pub fn text(&self) -> &'static str {
        self.texts[usize::from(self.level()).min(self.texts.len() - 1)]
    }

    fn step(&mut self, direction: VolumeDirection) {
        let next = match direction {
            VolumeDirection::Up => self.value + self.step,
            VolumeDirection::Down => self.value - self.step,
        };
        self.value = next.clamp(0.0, VOLUME_MAX);
    }
}

/// Result of a volume change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeUpdate {
    pub target: VolumeTarget,
    pub controller: u8,
    pub value: u8,
    pub text: &'static str,
}

/// Main and headphone volume
#[derive(Debug, Clone)]
pub struct VolumeState {
    main: VolumeChannel,
    headphone: VolumeChannel,
}

impl VolumeState {
    pub fn new(main: VolumeChannel, headphone: VolumeChannel) -> Self {
        Self { main, headphone }
    }

    /// Main volume in dB readout, headphones in percent
    pub fn with_levels(
        main: (f32, f32, u8),
        headphone: (f32, f32, u8),
    ) -> Self {
        Self::new(
            VolumeChannel::new(main.0, main.1, main.2, &MAIN_VOLUME_TEXT),
            VolumeChannel::new(headphone.0, headphone.1, headphone.2, &HEADPHONE_VOLUME_TEXT),
        )
    }

    pub fn channel(&self, target: VolumeTarget) -> &VolumeChannel {
        match target {
            VolumeTarget::Main => &self.main,
            VolumeTarget::Headphone => &self.headphone,
        }
    }

    /// Step one accumulator and report its new value
    pub fn adjust(&mut self, target: VolumeTarget, direction: VolumeDirection) -> VolumeUpdate {
        match target {
            VolumeTarget::Main => self.main.step(direction),
            VolumeTarget::Headphone => self.headphone.step(direction),
        }
        self.current(target)
    }

    /// Current value of one accumulator
    pub fn current(&self, target: VolumeTarget) -> VolumeUpdate {
        let channel = self.channel(target);
        VolumeUpdate {
            target,
            controller: channel.controller,
            value: channel.level(),
            text: channel.text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state() -> VolumeState {
        VolumeState::with_levels((40.0, 1.3, 7), (60.0, 1.4, 102))
    }

    #[test]
    fn test_adjust_main() {
        let mut volume = state();

        let update = volume.adjust(VolumeTarget::Main, VolumeDirection::Up);
        assert_eq!(update.controller, 7);
        assert_eq!(update.value, 41); // 41.3 truncated
        assert_eq!(update.text, MAIN_VOLUME_TEXT[41]);

        let update = volume.adjust(VolumeTarget::Main, VolumeDirection::Down);
        assert_eq!(update.value, 40);
    }

    #[test]
    fn test_targets_are_independent() {
        let mut volume = state();
        volume.adjust(VolumeTarget::Headphone, VolumeDirection::Down);

        assert_eq!(volume.current(VolumeTarget::Main).value, 40);
        let headphone = volume.current(VolumeTarget::Headphone);
        assert_eq!(headphone.controller, 102);
        assert_eq!(headphone.value, 58); // 58.6
        assert_eq!(headphone.text, " 45.67 ");
    }

    #[test]
    fn test_clamps_at_bounds() {
        let mut volume = state();
        for _ in 0..200 {
            volume.adjust(VolumeTarget::Main, VolumeDirection::Up);
        }
        assert_eq!(volume.channel(VolumeTarget::Main).value(), 127.0);
        assert_eq!(volume.current(VolumeTarget::Main).text, "  6.0  ");

        for _ in 0..200 {
            volume.adjust(VolumeTarget::Main, VolumeDirection::Down);
        }
        assert_eq!(volume.channel(VolumeTarget::Main).value(), 0.0);
        assert_eq!(volume.current(VolumeTarget::Main).text, "  -oo  ");
    }

    #[test]
    fn test_routing() {
        assert_eq!(VolumeTarget::for_headphone_mode(true), VolumeTarget::Headphone);
        assert_eq!(VolumeTarget::for_headphone_mode(false), VolumeTarget::Main);
    }

    proptest! {
        #[test]
        fn prop_always_clamped(
            initial in 0.0f32..=127.0,
            step in 0.1f32..20.0,
            moves in proptest::collection::vec(any::<bool>(), 0..400),
        ) {
            let mut volume = VolumeState::with_levels((initial, step, 7), (initial, step, 102));
            for up in moves {
                let direction = if up { VolumeDirection::Up } else { VolumeDirection::Down };
                let update = volume.adjust(VolumeTarget::Main, direction);
                let value = volume.channel(VolumeTarget::Main).value();
                prop_assert!((0.0..=127.0).contains(&value));
                prop_assert!(update.value <= 127);
                prop_assert_eq!(update.text, MAIN_VOLUME_TEXT[usize::from(update.value)]);
            }
        }
    }
}
