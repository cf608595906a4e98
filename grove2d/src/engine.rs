use std::time::Instant;

use anyhow::Result;
use log::{error, info};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use crate::{
    game::GameLoop, input::InputEvent, render::RenderTarget, state::StateKind, ui::UiLayer,
};

/// Configuration values for the host window.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Close the window when Escape is pressed.
    pub exit_on_escape: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "Grove2D Game".into(),
            width: 1280,
            height: 720,
            exit_on_escape: true,
        }
    }
}

/// Desktop host that drives a [`GameLoop`] from a winit window.
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Override the initial window size in logical pixels.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.config.width = width;
        self.config.height = height;
        self
    }

    #[must_use]
    pub fn with_exit_on_escape(mut self, exit: bool) -> Self {
        self.config.exit_on_escape = exit;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open the window, build the game loop with `build` and run it until the
    /// window is closed or a callback fails.
    ///
    /// `build` receives the window so a rendering backend can attach to it.
    /// The loop is disposed when the event loop exits; the first error seen
    /// is returned.
    pub fn run<K, U, R, F>(self, build: F) -> Result<()>
    where
        K: StateKind,
        U: UiLayer + 'static,
        R: RenderTarget,
        F: FnOnce(&Window) -> Result<GameLoop<K, U, R>>,
    {
        let config = self.config;

        let event_loop = EventLoop::new()?;
        let mut window_attributes = Window::default_attributes();
        window_attributes.title = config.title.clone();
        window_attributes.inner_size = Some(LogicalSize::new(config.width, config.height).into());
        #[allow(deprecated)]
        let window = event_loop.create_window(window_attributes)?;

        let size = window.inner_size();
        let mut game = Some(fit_to_window(build(&window)?, size.width, size.height)?);
        info!("Running '{}' at {}x{}", config.title, size.width, size.height);

        let mut failure: Option<anyhow::Error> = None;
        let mut last_frame = Instant::now();

        #[allow(deprecated)]
        event_loop.run(|event, elwt| {
            let mut fail = |err: anyhow::Error| {
                error!("Stopping after error: {err:?}");
                failure.get_or_insert(err);
                elwt.exit();
            };

            match event {
                Event::NewEvents(_) => {
                    if let Some(game) = game.as_mut() {
                        game.begin_input_frame();
                    }
                }
                Event::WindowEvent { event, .. } => {
                    let Some(game) = game.as_mut() else {
                        return;
                    };
                    if let Some(input) = translate_window_event(&event) {
                        game.handle_input(&input);
                    }

                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if config.exit_on_escape && is_escape_pressed(&event) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::Resized(new_size) => {
                            if let Err(err) = game.resize(new_size.width, new_size.height) {
                                fail(err.into());
                            }
                        }
                        WindowEvent::RedrawRequested => {
                            let now = Instant::now();
                            let delta = now - last_frame;
                            last_frame = now;
                            if let Err(err) = game.process(delta) {
                                fail(err.into());
                            }
                        }
                        _ => {}
                    }
                }
                Event::AboutToWait => window.request_redraw(),
                Event::LoopExiting => {
                    if let Some(game) = game.take() {
                        if let Err(err) = game.dispose() {
                            fail(err.into());
                        }
                    }
                }
                _ => {}
            }
        })?;

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Resize a freshly built loop to the window. If that fails the loop is
/// disposed before the error is returned.
fn fit_to_window<K, U, R>(
    mut game: GameLoop<K, U, R>,
    width: u32,
    height: u32,
) -> Result<GameLoop<K, U, R>>
where
    K: StateKind,
    U: UiLayer + 'static,
    R: RenderTarget,
{
    match game.resize(width, height) {
        Ok(()) => Ok(game),
        Err(err) => {
            if let Err(dispose_err) = game.dispose() {
                error!("Failed to dispose game loop: {dispose_err:?}");
            }
            Err(err.into())
        }
    }
}

fn is_escape_pressed(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && matches!(event.physical_key, PhysicalKey::Code(KeyCode::Escape))
}

/// Convert the window events the game loop cares about into [`InputEvent`]s.
pub fn translate_window_event(event: &WindowEvent) -> Option<InputEvent> {
    match event {
        WindowEvent::KeyboardInput { event, .. } => {
            key_input(event.state, event.physical_key, event.repeat)
        }
        WindowEvent::MouseInput { state, button, .. } => Some(mouse_input(*state, *button)),
        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::CursorMoved {
            x: position.x as f32,
            y: position.y as f32,
        }),
        _ => None,
    }
}

// Key repeats are dropped; held keys are tracked by the input state.
fn key_input(state: ElementState, key: PhysicalKey, repeat: bool) -> Option<InputEvent> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match state {
        ElementState::Pressed if repeat => None,
        ElementState::Pressed => Some(InputEvent::KeyDown(code)),
        ElementState::Released => Some(InputEvent::KeyUp(code)),
    }
}

fn mouse_input(state: ElementState, button: MouseButton) -> InputEvent {
    match state {
        ElementState::Pressed => InputEvent::MouseDown(button),
        ElementState::Released => InputEvent::MouseUp(button),
    }
}
