//! Hardware agnostic LED control.
//!
//! The echo handler only ever toggles its LED, but board code and tests also
//! want to drive or inspect it directly, so [Led] carries on/off as well.

/// A single indicator LED
pub trait Led {
    fn on(&mut self);
    fn off(&mut self);
    fn toggle(&mut self);

    /// the logical state the LED was last driven to
    fn is_on(&self) -> bool;
}

/// Logical LED state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedState {
    #[default]
    Off,
    On,
}

impl LedState {
    pub fn toggled(self) -> Self {
        match self {
            LedState::Off => LedState::On,
            LedState::On => LedState::Off,
        }
    }
}

impl From<bool> for LedState {
    fn from(on: bool) -> Self {
        if on {
            LedState::On
        } else {
            LedState::Off
        }
    }
}

/// An LED without hardware behind it, keeping only its logical state.
///
/// Used as the LED of the simulated board and counts its toggles.
#[derive(Debug, Default)]
pub struct VirtualLed {
    state: LedState,
    toggles: u32,
}

impl VirtualLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LedState {
        self.state
    }

    /// number of toggles since creation
    pub fn toggles(&self) -> u32 {
        self.toggles
    }
}

impl Led for VirtualLed {
    fn on(&mut self) {
        self.state = LedState::On;
    }

    fn off(&mut self) {
        self.state = LedState::Off;
    }

    fn toggle(&mut self) {
        self.state = self.state.toggled();
        self.toggles += 1;
    }

    fn is_on(&self) -> bool {
        self.state == LedState::On
    }
}
