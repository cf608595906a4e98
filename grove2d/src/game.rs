use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use log::debug;

use crate::{
    config::LoopConfig,
    error::{GameError, Phase, Result},
    input::{InputEvent, InputMultiplexer, InputProcessor},
    render::RenderTarget,
    state::{BoxedState, StateCache, StateKind, StateRegistry, Transitions},
    timestep::FixedTimestep,
    ui::{UiHandle, UiLayer},
};

/// The frame driver: owns the state cache, the active state and the
/// fixed-timestep accumulator.
///
/// A host calls [`process`](Self::process) once per rendered frame,
/// [`resize`](Self::resize) when the viewport changes and
/// [`dispose`](Self::dispose) once at shutdown.
pub struct GameLoop<K: StateKind, U: UiLayer + 'static, R: RenderTarget> {
    cache: StateCache<K, U>,
    active: K,
    timestep: FixedTimestep,
    transitions: Transitions<K>,
    ui: UiHandle<U>,
    input: InputMultiplexer,
    target: R,
    viewport: (u32, u32),
    clear_color: [f32; 4],
}

impl<K: StateKind, U: UiLayer + 'static, R: RenderTarget> GameLoop<K, U, R> {
    /// Start building a game loop around a UI layer and a render target.
    pub fn builder(ui: U, target: R) -> GameLoopBuilder<K, U, R> {
        GameLoopBuilder {
            config: LoopConfig::default(),
            registry: StateRegistry::new(),
            ui,
            target,
            inputs: Vec::new(),
        }
    }

    /// Switch the active state.
    ///
    /// The current state is deactivated and, if `dispose_previous` is set,
    /// evicted from the cache so the next request for its kind builds a fresh
    /// one. The target state is then fetched (or built), activated and resized
    /// to the current viewport. Switching to the already active kind runs a
    /// full deactivate/activate cycle.
    ///
    /// A kind with no registered factory is rejected before the current state
    /// is touched. Any later failure (a factory or callback error) leaves the
    /// loop without a usable active state; treat it as fatal.
    pub fn set_state(&mut self, kind: K, dispose_previous: bool) -> Result<()> {
        if !self.cache.can_provide(kind) {
            return Err(GameError::UnregisteredState {
                kind: format!("{kind:?}"),
            });
        }

        let previous = self.active;
        debug!(
            "Deactivating game state {}{previous:?}",
            if dispose_previous { "and disposing " } else { "" }
        );

        self.active_state()?
            .deactivate()
            .map_err(|source| GameError::callback(format!("{previous:?}"), Phase::Deactivate, source))?;
        if dispose_previous {
            self.cache.evict(previous)?;
        }

        self.enter(kind)
    }

    /// Advance the simulation by the elapsed wall time and render one frame.
    ///
    /// `wall_delta` is clamped to the configured ceiling (0.25s by default)
    /// before it is accumulated. The UI layer and the active state are then
    /// stepped once per whole fixed step, and the leftover fraction of a step
    /// is handed to `render` as the interpolation alpha.
    pub fn process(&mut self, wall_delta: Duration) -> Result<()> {
        self.timestep.accumulate(wall_delta);
        let fixed_dt = self.timestep.step().as_secs_f32();

        while self.timestep.consume_step() {
            self.ui
                .borrow_mut()
                .step(fixed_dt)
                .map_err(|source| GameError::callback("ui layer", Phase::Step, source))?;

            let kind = self.active;
            let state = self
                .cache
                .get(kind)
                .ok_or_else(|| GameError::MissingActiveState {
                    kind: format!("{kind:?}"),
                })?;
            state
                .step(fixed_dt, &mut self.transitions)
                .map_err(|source| GameError::callback(format!("{kind:?}"), Phase::Step, source))?;

            if let Some(transition) = self.transitions.take() {
                self.set_state(transition.kind, transition.dispose_current)?;
            }
        }

        self.target
            .clear(self.clear_color)
            .map_err(|source| GameError::callback("render target", Phase::Render, source))?;

        let alpha = self.timestep.alpha();
        let kind = self.active;
        self.active_state()?
            .render(alpha)
            .map_err(|source| GameError::callback(format!("{kind:?}"), Phase::Render, source))?;
        self.ui
            .borrow_mut()
            .render()
            .map_err(|source| GameError::callback("ui layer", Phase::Render, source))?;

        Ok(())
    }

    /// [`process`](Self::process) for hosts that measure frame time in
    /// seconds. Negative or non-finite deltas count as zero.
    pub fn process_secs(&mut self, wall_delta: f32) -> Result<()> {
        self.process(FixedTimestep::delta_from_secs(wall_delta))
    }

    /// Record the new viewport and forward it to the active state and the UI.
    ///
    /// Cached but inactive states are not resized here; they pick up the
    /// viewport when they are next activated.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.viewport = (width, height);
        let kind = self.active;
        self.active_state()?
            .resize(width, height)
            .map_err(|source| GameError::callback(format!("{kind:?}"), Phase::Resize, source))?;
        self.ui
            .borrow_mut()
            .resize(width, height)
            .map_err(|source| GameError::callback("ui layer", Phase::Resize, source))
    }

    /// Deactivate and dispose every cached state, then dispose the UI layer.
    ///
    /// Teardown continues past failures so nothing is leaked; the first error
    /// is returned.
    pub fn dispose(mut self) -> Result<()> {
        debug!("Disposing game loop ({} cached states)", self.cache.len());
        let states = self.cache.dispose_all();
        let ui = self
            .ui
            .borrow_mut()
            .dispose()
            .map_err(|source| GameError::callback("ui layer", Phase::Dispose, source));
        states.and(ui)
    }

    /// Offer an input event to the primary input sources, then the UI layer.
    ///
    /// Returns `true` if a processor consumed it.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        self.input.handle_event(event)
    }

    /// Reset per-frame input flags. Hosts call this before delivering the
    /// events of a new frame.
    pub fn begin_input_frame(&mut self) {
        self.input.begin_frame();
    }

    pub fn active_kind(&self) -> K {
        self.active
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn timestep(&self) -> &FixedTimestep {
        &self.timestep
    }

    pub fn cache(&self) -> &StateCache<K, U> {
        &self.cache
    }

    pub fn ui(&self) -> &UiHandle<U> {
        &self.ui
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut R {
        &mut self.target
    }

    fn active_state(&mut self) -> Result<&mut BoxedState<K>> {
        let kind = self.active;
        self.cache
            .get(kind)
            .ok_or_else(|| GameError::MissingActiveState {
                kind: format!("{kind:?}"),
            })
    }

    fn enter(&mut self, kind: K) -> Result<()> {
        let (width, height) = self.viewport;
        let state = self.cache.get_or_create(kind)?;
        debug!("Activating game state {kind:?}");
        state
            .activate()
            .map_err(|source| GameError::callback(format!("{kind:?}"), Phase::Activate, source))?;
        state
            .resize(width, height)
            .map_err(|source| GameError::callback(format!("{kind:?}"), Phase::Resize, source))?;
        self.active = kind;
        Ok(())
    }
}

/// Collects the pieces of a [`GameLoop`] before the initial state starts.
pub struct GameLoopBuilder<K: StateKind, U: UiLayer + 'static, R: RenderTarget> {
    config: LoopConfig,
    registry: StateRegistry<K, U>,
    ui: U,
    target: R,
    inputs: Vec<Box<dyn InputProcessor>>,
}

impl<K: StateKind, U: UiLayer + 'static, R: RenderTarget> GameLoopBuilder<K, U, R> {
    /// Use the given loop configuration.
    #[must_use]
    pub fn config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Register the factory that builds states of `kind`.
    #[must_use]
    pub fn register<F>(mut self, kind: K, factory: F) -> Self
    where
        F: Fn(K, &UiHandle<U>) -> anyhow::Result<BoxedState<K>> + 'static,
    {
        self.registry = self.registry.register(kind, factory);
        self
    }

    /// Replace the registry wholesale.
    #[must_use]
    pub fn registry(mut self, registry: StateRegistry<K, U>) -> Self {
        self.registry = registry;
        self
    }

    /// Add a primary input source. Sources see events before the UI layer,
    /// in the order they were added.
    #[must_use]
    pub fn input(mut self, processor: impl InputProcessor + 'static) -> Self {
        self.inputs.push(Box::new(processor));
        self
    }

    /// Build the loop and activate `initial`.
    pub fn start(self, initial: K) -> Result<GameLoop<K, U, R>> {
        let ui: UiHandle<U> = Rc::new(RefCell::new(self.ui));

        let mut input = InputMultiplexer::new();
        for processor in self.inputs {
            input.add(processor);
        }
        input.add(Box::new(ui.clone()));

        let mut game = GameLoop {
            cache: StateCache::new(self.registry, ui.clone()),
            active: initial,
            timestep: FixedTimestep::new(self.config.fixed_step(), self.config.max_frame_delta()),
            transitions: Transitions::new(),
            ui,
            input,
            target: self.target,
            viewport: (self.config.width, self.config.height),
            clear_color: self.config.clear_color,
        };
        game.enter(initial)?;
        Ok(game)
    }
}
