use std::hash::Hash;
use glam::Vec2;
use crate::HashSet;

/// Abstract key the player can press.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    /// Uses the held item.
    Use,
    /// Cycles the held item.
    Switch,
}

/// Keyboard state fed to the game every frame.
#[derive(Default, Debug)]
pub struct Input {
    keys: ButtonState<Key>,
}

impl Input {

    pub fn press(&mut self, key: Key) {
        self.keys.press(key);
    }

    pub fn release(&mut self, key: Key) {
        self.keys.release(key);
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.keys.is_pressed(key)
    }

    /// True if a key is pressed, but wasn't in the previous frame.
    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.keys.is_just_pressed(key)
    }

    /// Normalized direction of the held movement keys.
    /// Opposing keys cancel each other out.
    pub fn direction(&self) -> Vec2 {
        let axis = |negative: Key, positive: Key| -> f32 {
            match (self.is_pressed(negative), self.is_pressed(positive)) {
                (true, false) => -1.0,
                (false, true) => 1.0,
                _ => 0.0,
            }
        };
        Vec2::new(axis(Key::Left, Key::Right), axis(Key::Up, Key::Down)).normalize_or_zero()
    }

    /// Sync previous key state with current key state.
    pub fn sync_previous_state(&mut self) {
        self.keys.sync_previous_state();
    }
}

/**
 * The state of a collection of buttons coming from some device.
 */
#[derive(Debug)]
pub struct ButtonState<B> {
    previous_state: HashSet<B>,
    current_state: HashSet<B>,
}

impl<B> Default for ButtonState<B> {
    fn default() -> Self {
        Self {
            previous_state: HashSet::default(),
            current_state: HashSet::default(),
        }
    }
}

impl<B> ButtonState<B>
where
    B: Copy + Clone + Eq + Hash
{
    pub fn press(&mut self, button: B) {
        self.current_state.insert(button);
    }

    pub fn release(&mut self, button: B) {
        self.current_state.remove(&button);
    }

    pub fn is_pressed(&self, button: B) -> bool {
        self.current_state.contains(&button)
    }

    pub fn is_just_pressed(&self, button: B) -> bool {
        self.current_state.contains(&button) && !self.previous_state.contains(&button)
    }

    pub fn sync_previous_state(&mut self) {
        self.previous_state.clone_from(&self.current_state);
    }
}


#[cfg(test)]
mod test {
    use glam::Vec2;
    use crate::game::{Input, Key};

    #[test]
    fn opposing_keys_cancel() {
        let mut input = Input::default();
        input.press(Key::Left);
        input.press(Key::Right);
        input.press(Key::Down);
        assert_eq!(Vec2::new(0.0, 1.0), input.direction());
    }

    #[test]
    fn diagonal_is_normalized() {
        let mut input = Input::default();
        input.press(Key::Up);
        input.press(Key::Right);
        let direction = input.direction();
        assert!((direction.length() - 1.0).abs() < 1e-6);
        assert!(direction.x > 0.0 && direction.y < 0.0);
    }

    #[test]
    fn just_pressed_lasts_one_frame() {
        let mut input = Input::default();
        input.press(Key::Use);
        assert!(input.is_just_pressed(Key::Use));
        input.sync_previous_state();
        assert!(input.is_pressed(Key::Use));
        assert!(!input.is_just_pressed(Key::Use));
        input.release(Key::Use);
        input.sync_previous_state();
        input.press(Key::Use);
        assert!(input.is_just_pressed(Key::Use));
    }
}
