use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use crate::input::InputProcessor;

/// The on-screen UI layer that sits on top of every game state.
///
/// The game loop steps it once per fixed step, renders it after the active
/// state and forwards resizes to it. Because it is also an
/// [`InputProcessor`], it receives the input events the primary input source
/// lets through.
pub trait UiLayer: InputProcessor {
    fn step(&mut self, fixed_dt: f32) -> Result<()>;

    fn render(&mut self) -> Result<()>;

    fn resize(&mut self, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }

    fn dispose(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Shared handle to the UI layer.
///
/// State factories receive a reference to it and may keep a clone, so states
/// can add to or query the UI while they run.
pub type UiHandle<U> = Rc<RefCell<U>>;

/// UI layer that draws nothing and ignores input.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUi;

impl InputProcessor for NoUi {
    fn handle_event(&mut self, _event: &crate::input::InputEvent) -> bool {
        false
    }
}

impl UiLayer for NoUi {
    fn step(&mut self, _fixed_dt: f32) -> Result<()> {
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        Ok(())
    }
}
