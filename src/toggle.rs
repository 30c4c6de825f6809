//! The vending machine ON/OFF state. See [`ToggleState`].

use std::fmt;

/// The process-local record of whether the vending machine is on.
///
/// Starts [`Off`][ToggleState::Off] and is flipped by the control loop after each toggle send
/// attempt. Purely in-memory; not persisted across runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToggleState {
    #[default]
    Off,
    On,
}

impl ToggleState {
    /// Returns whether the state is `On`.
    pub fn is_on(&self) -> bool {
        matches!(self, ToggleState::On)
    }

    /// Flips the state and returns the new value.
    pub fn flip(&mut self) -> ToggleState {
        *self = match self {
            ToggleState::Off => ToggleState::On,
            ToggleState::On => ToggleState::Off,
        };

        *self
    }
}

impl fmt::Display for ToggleState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ToggleState::Off => write!(f, "OFF"),
            ToggleState::On => write!(f, "ON"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        assert_eq!(ToggleState::Off, ToggleState::default());
        assert!(!ToggleState::default().is_on());
    }

    #[test]
    fn test_flip_pairs() {
        let mut state = ToggleState::default();

        // Two sequential flips return to the starting value, never skipping one
        assert_eq!(ToggleState::On, state.flip());
        assert_eq!(ToggleState::Off, state.flip());
        assert_eq!(ToggleState::On, state.flip());
    }

    #[test]
    fn test_display() {
        assert_eq!("OFF", ToggleState::Off.to_string());
        assert_eq!("ON", ToggleState::On.to_string());
    }
}
