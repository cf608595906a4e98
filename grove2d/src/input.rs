use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use winit::{event::MouseButton, keyboard::KeyCode};

/// Engine-facing input event, decoupled from the windowing backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    MouseDown(MouseButton),
    MouseUp(MouseButton),
    CursorMoved { x: f32, y: f32 },
}

/// Something that reacts to input events.
pub trait InputProcessor {
    /// Handle an event. Return `true` if the event was consumed and should not
    /// reach processors further down the chain.
    fn handle_event(&mut self, event: &InputEvent) -> bool;

    /// Called once at the start of every frame, before new events arrive.
    fn begin_frame(&mut self) {}
}

impl<T: InputProcessor> InputProcessor for Rc<RefCell<T>> {
    fn handle_event(&mut self, event: &InputEvent) -> bool {
        self.borrow_mut().handle_event(event)
    }

    fn begin_frame(&mut self) {
        self.borrow_mut().begin_frame();
    }
}

/// Dispatches events to an ordered chain of processors.
///
/// Processors are offered each event in insertion order until one consumes it.
#[derive(Default)]
pub struct InputMultiplexer {
    processors: Vec<Box<dyn InputProcessor>>,
}

impl InputMultiplexer {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Append a processor to the end of the chain.
    pub fn add(&mut self, processor: Box<dyn InputProcessor>) {
        self.processors.push(processor);
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    pub fn begin_frame(&mut self) {
        for processor in &mut self.processors {
            processor.begin_frame();
        }
    }
}

impl InputProcessor for InputMultiplexer {
    fn handle_event(&mut self, event: &InputEvent) -> bool {
        self.processors
            .iter_mut()
            .any(|processor| processor.handle_event(event))
    }

    fn begin_frame(&mut self) {
        InputMultiplexer::begin_frame(self);
    }
}

/// Tracks keyboard and mouse state across frames.
///
/// This is the primary input source. It observes every event but never
/// consumes one, so processors behind it (the UI) still see them.
pub struct InputState {
    keys_down: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,

    mouse_x: f32,
    mouse_y: f32,
    mouse_down: [bool; 8],
    mouse_pressed: [bool; 8],
    mouse_released: [bool; 8],
}

impl InputState {
    pub fn new() -> Self {
        Self {
            keys_down: HashSet::new(),
            keys_pressed: HashSet::new(),
            keys_released: HashSet::new(),
            mouse_x: 0.0,
            mouse_y: 0.0,
            mouse_down: [false; 8],
            mouse_pressed: [false; 8],
            mouse_released: [false; 8],
        }
    }

    /// Shared handle, for wiring one input state into both the game loop and
    /// the states that read it.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Returns true if the key is currently held down.
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Returns true if the key was pressed this frame.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Returns true if the key was released this frame.
    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Returns true if the mouse button is currently held down.
    pub fn is_mouse_down(&self, button: MouseButton) -> bool {
        mouse_button_index(button)
            .map(|idx| self.mouse_down[idx])
            .unwrap_or(false)
    }

    /// Returns true if the mouse button was pressed this frame.
    pub fn is_mouse_pressed(&self, button: MouseButton) -> bool {
        mouse_button_index(button)
            .map(|idx| self.mouse_pressed[idx])
            .unwrap_or(false)
    }

    /// Returns true if the mouse button was released this frame.
    pub fn is_mouse_released(&self, button: MouseButton) -> bool {
        mouse_button_index(button)
            .map(|idx| self.mouse_released[idx])
            .unwrap_or(false)
    }

    /// Current mouse cursor position as a Vec2.
    pub fn mouse_position(&self) -> crate::math::Vec2 {
        crate::math::Vec2::new(self.mouse_x, self.mouse_y)
    }

    fn set_key(&mut self, key: KeyCode, down: bool) {
        if down {
            if !self.keys_down.contains(&key) {
                self.keys_pressed.insert(key);
            }
            self.keys_down.insert(key);
        } else {
            self.keys_down.remove(&key);
            self.keys_released.insert(key);
        }
    }

    fn set_mouse(&mut self, button: MouseButton, down: bool) {
        if let Some(idx) = mouse_button_index(button) {
            if down {
                if !self.mouse_down[idx] {
                    self.mouse_pressed[idx] = true;
                }
                self.mouse_down[idx] = true;
            } else {
                self.mouse_down[idx] = false;
                self.mouse_released[idx] = true;
            }
        }
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputProcessor for InputState {
    fn handle_event(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::KeyDown(key) => self.set_key(key, true),
            InputEvent::KeyUp(key) => self.set_key(key, false),
            InputEvent::MouseDown(button) => self.set_mouse(button, true),
            InputEvent::MouseUp(button) => self.set_mouse(button, false),
            InputEvent::CursorMoved { x, y } => {
                self.mouse_x = x;
                self.mouse_y = y;
            }
        }
        false
    }

    /// Clear per-frame pressed/released flags.
    fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.mouse_pressed.fill(false);
        self.mouse_released.fill(false);
    }
}

fn mouse_button_index(button: MouseButton) -> Option<usize> {
    match button {
        MouseButton::Left => Some(0),
        MouseButton::Right => Some(1),
        MouseButton::Middle => Some(2),
        MouseButton::Back => Some(3),
        MouseButton::Forward => Some(4),
        MouseButton::Other(raw) => {
            let mapped = 5 + raw as usize;
            (mapped < 8).then_some(mapped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        seen: Rc<RefCell<Vec<InputEvent>>>,
        consume: bool,
    }

    impl InputProcessor for Recorder {
        fn handle_event(&mut self, event: &InputEvent) -> bool {
            self.seen.borrow_mut().push(*event);
            self.consume
        }
    }

    #[test]
    fn test_key_pressed_only_for_one_frame() {
        let mut input = InputState::new();
        input.handle_event(&InputEvent::KeyDown(KeyCode::Space));
        assert!(input.is_key_down(KeyCode::Space));
        assert!(input.is_key_pressed(KeyCode::Space));

        input.begin_frame();
        input.handle_event(&InputEvent::KeyDown(KeyCode::Space));
        assert!(input.is_key_down(KeyCode::Space));
        assert!(!input.is_key_pressed(KeyCode::Space));

        input.handle_event(&InputEvent::KeyUp(KeyCode::Space));
        assert!(!input.is_key_down(KeyCode::Space));
        assert!(input.is_key_released(KeyCode::Space));
    }

    #[test]
    fn test_mouse_tracking() {
        let mut input = InputState::new();
        input.handle_event(&InputEvent::CursorMoved { x: 4.0, y: 8.0 });
        input.handle_event(&InputEvent::MouseDown(MouseButton::Left));
        assert!(input.is_mouse_pressed(MouseButton::Left));
        assert!(!input.is_mouse_down(MouseButton::Right));
        assert_eq!(input.mouse_position(), crate::math::Vec2::new(4.0, 8.0));
    }

    #[test]
    fn test_multiplexer_stops_at_consumer() {
        let first = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(Vec::new()));
        let third = Rc::new(RefCell::new(Vec::new()));

        let mut mux = InputMultiplexer::new();
        mux.add(Box::new(Recorder { seen: first.clone(), consume: false }));
        mux.add(Box::new(Recorder { seen: second.clone(), consume: true }));
        mux.add(Box::new(Recorder { seen: third.clone(), consume: false }));

        assert!(mux.handle_event(&InputEvent::KeyDown(KeyCode::Enter)));
        assert_eq!(first.borrow().len(), 1);
        assert_eq!(second.borrow().len(), 1);
        assert!(third.borrow().is_empty());
    }

    #[test]
    fn test_shared_state_sees_events_through_multiplexer() {
        let input = InputState::shared();
        let mut mux = InputMultiplexer::new();
        mux.add(Box::new(input.clone()));

        assert!(!mux.handle_event(&InputEvent::KeyDown(KeyCode::KeyA)));
        assert!(input.borrow().is_key_pressed(KeyCode::KeyA));

        mux.begin_frame();
        assert!(!input.borrow().is_key_pressed(KeyCode::KeyA));
    }
}
