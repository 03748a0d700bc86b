use egui::Key;

/// Which key strikes which lane.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub lane_keys: [Key; 4],
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            lane_keys: [Key::A, Key::S, Key::D, Key::F],
        }
    }
}

impl KeyBindings {
    /// Map a key to its lane (0-3). None if the key is not bound.
    pub fn key_to_lane(&self, key: Key) -> Option<u8> {
        self.lane_keys
            .iter()
            .position(|&k| k == key)
            .map(|i| i as u8)
    }

    /// Collect this frame's lane presses from the egui input state.
    ///
    /// `key_pressed` is edge-triggered (key-down this frame only), so a held
    /// key never scores twice.
    pub fn pressed_lanes(&self, input: &egui::InputState) -> Vec<u8> {
        self.lane_keys
            .iter()
            .enumerate()
            .filter(|(_, &key)| input.key_pressed(key))
            .map(|(lane, _)| lane as u8)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_key_to_lane() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.key_to_lane(Key::A), Some(0));
        assert_eq!(bindings.key_to_lane(Key::S), Some(1));
        assert_eq!(bindings.key_to_lane(Key::D), Some(2));
        assert_eq!(bindings.key_to_lane(Key::F), Some(3));
        assert_eq!(bindings.key_to_lane(Key::X), None);
    }

    #[test]
    fn test_custom_bindings() {
        let bindings = KeyBindings {
            lane_keys: [Key::H, Key::J, Key::K, Key::L],
        };
        assert_eq!(bindings.key_to_lane(Key::J), Some(1));
        assert_eq!(bindings.key_to_lane(Key::A), None);
    }
}
