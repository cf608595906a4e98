//! Grove2D - a small 2D game framework built around cached game states.
//!
//! A [`GameLoop`] owns one active [`GameState`] at a time, advances it on a
//! fixed timestep and renders it with an interpolation alpha. States are built
//! on demand from a [`StateRegistry`] and cached until they are disposed.
//! The [`map`] module turns Tiled maps into gameplay data.

pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod input;
pub mod map;
pub mod math;
pub mod render;
pub mod state;
pub mod timestep;
pub mod ui;

pub use crate::config::LoopConfig;
pub use crate::engine::{Engine, EngineConfig};
pub use crate::error::{GameError, MapError, Phase};
pub use crate::game::{GameLoop, GameLoopBuilder};
pub use crate::input::{InputEvent, InputMultiplexer, InputProcessor, InputState};
pub use crate::map::{CamBoundary, CollisionArea, GameObject, MapModel, TiledMap};
pub use crate::math::{Rect, Vec2};
pub use crate::render::{NullTarget, RenderTarget};
pub use crate::state::{GameState, StateCache, StateKind, StateRegistry, Transition, Transitions};
pub use crate::timestep::FixedTimestep;
pub use crate::ui::{NoUi, UiHandle, UiLayer};
pub use winit::{event::MouseButton, keyboard::KeyCode};
