use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use anyhow::Result;
use log::{debug, warn};

use crate::error::{GameError, Phase};
use crate::ui::{UiHandle, UiLayer};

/// Tag identifying a kind of game state (menu, playing, ...).
///
/// Games normally use a fieldless `enum`; anything `Copy + Eq + Hash + Debug`
/// qualifies.
pub trait StateKind: Copy + Eq + Hash + Debug + 'static {}

impl<T: Copy + Eq + Hash + Debug + 'static> StateKind for T {}

/// A state change requested by gameplay code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition<K> {
    pub kind: K,
    /// Dispose the state being left instead of keeping it cached.
    pub dispose_current: bool,
}

/// Lets a state request a transition while it is being stepped.
///
/// The game loop applies the request right after the step that made it.
/// If several requests are made during one step, the last one wins.
#[derive(Debug)]
pub struct Transitions<K> {
    pending: Option<Transition<K>>,
}

impl<K: StateKind> Transitions<K> {
    pub(crate) fn new() -> Self {
        Self { pending: None }
    }

    /// Switch to `kind` once the current step finishes.
    pub fn request(&mut self, kind: K, dispose_current: bool) {
        if let Some(previous) = self.pending.replace(Transition {
            kind,
            dispose_current,
        }) {
            debug!("Transition to {:?} replaced by {:?}", previous.kind, kind);
        }
    }

    pub(crate) fn take(&mut self) -> Option<Transition<K>> {
        self.pending.take()
    }
}

/// One unit of gameplay driven by the game loop.
///
/// A state is built lazily the first time its kind is requested. While cached
/// it can be deactivated and reactivated any number of times. `dispose`
/// consumes the state, so it runs at most once and a disposed state can never
/// be activated again.
pub trait GameState<K: StateKind> {
    /// The kind this state was constructed for.
    fn kind(&self) -> K;

    /// Called when this state becomes the active one.
    fn activate(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called when another state takes over, and once more at shutdown.
    fn deactivate(&mut self) -> Result<()> {
        Ok(())
    }

    /// Advance the simulation by exactly one fixed step.
    fn step(&mut self, fixed_dt: f32, transitions: &mut Transitions<K>) -> Result<()>;

    /// Draw the state. `alpha` in `[0, 1)` is how far the wall clock is between
    /// the last simulated step and the next one.
    fn render(&mut self, alpha: f32) -> Result<()>;

    /// Called after activation and whenever the viewport changes while active.
    fn resize(&mut self, _width: u32, _height: u32) -> Result<()> {
        Ok(())
    }

    /// Release everything the state holds.
    fn dispose(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

pub type BoxedState<K> = Box<dyn GameState<K>>;

/// Builds a state for a kind, given the kind and the shared UI handle.
pub type StateFactory<K, U> = Box<dyn Fn(K, &UiHandle<U>) -> Result<BoxedState<K>>>;

/// Maps every state kind to the one factory that builds it.
///
/// # Example
///
/// ```rust
/// use anyhow::Result;
/// use grove2d::{GameState, NoUi, StateRegistry, Transitions};
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// enum Kind {
///     Menu,
/// }
///
/// struct MenuState;
///
/// impl GameState<Kind> for MenuState {
///     fn kind(&self) -> Kind {
///         Kind::Menu
///     }
///     fn step(&mut self, _dt: f32, _transitions: &mut Transitions<Kind>) -> Result<()> {
///         Ok(())
///     }
///     fn render(&mut self, _alpha: f32) -> Result<()> {
///         Ok(())
///     }
/// }
///
/// let registry: StateRegistry<Kind, NoUi> =
///     StateRegistry::new().register(Kind::Menu, |_kind, _ui| {
///         Ok(Box::new(MenuState) as Box<dyn GameState<Kind>>)
///     });
/// assert!(registry.contains(Kind::Menu));
/// ```
pub struct StateRegistry<K: StateKind, U> {
    factories: HashMap<K, StateFactory<K, U>>,
}

impl<K: StateKind, U: 'static> StateRegistry<K, U> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register the factory for `kind`, replacing any earlier one.
    #[must_use]
    pub fn register<F>(mut self, kind: K, factory: F) -> Self
    where
        F: Fn(K, &UiHandle<U>) -> Result<BoxedState<K>> + 'static,
    {
        if self.factories.insert(kind, Box::new(factory)).is_some() {
            warn!("Replacing state factory for {kind:?}");
        }
        self
    }

    pub fn contains(&self, kind: K) -> bool {
        self.factories.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    fn build(&self, kind: K, ui: &UiHandle<U>) -> Result<BoxedState<K>, GameError> {
        let factory = self
            .factories
            .get(&kind)
            .ok_or_else(|| GameError::UnregisteredState {
                kind: format!("{kind:?}"),
            })?;

        let state = factory(kind, ui).map_err(|source| GameError::StateConstruction {
            kind: format!("{kind:?}"),
            source,
        })?;

        if state.kind() != kind {
            return Err(GameError::KindMismatch {
                requested: format!("{kind:?}"),
                produced: format!("{:?}", state.kind()),
            });
        }
        Ok(state)
    }
}

impl<K: StateKind, U: 'static> Default for StateRegistry<K, U> {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds at most one live state per kind.
///
/// Entries are created on first request and leave the cache only through
/// [`evict`](Self::evict) or [`dispose_all`](Self::dispose_all), both of which
/// remove the entry before disposing it.
pub struct StateCache<K: StateKind, U: UiLayer + 'static> {
    registry: StateRegistry<K, U>,
    ui: UiHandle<U>,
    states: HashMap<K, BoxedState<K>>,
    created: HashMap<K, usize>,
}

impl<K: StateKind, U: UiLayer + 'static> StateCache<K, U> {
    pub fn new(registry: StateRegistry<K, U>, ui: UiHandle<U>) -> Self {
        Self {
            registry,
            ui,
            states: HashMap::new(),
            created: HashMap::new(),
        }
    }

    /// Return the cached state for `kind`, building it first if needed.
    pub fn get_or_create(&mut self, kind: K) -> Result<&mut BoxedState<K>, GameError> {
        match self.states.entry(kind) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                debug!("Creating new game state: {kind:?}");
                let state = self.registry.build(kind, &self.ui)?;
                *self.created.entry(kind).or_default() += 1;
                Ok(entry.insert(state))
            }
        }
    }

    /// The cached state for `kind`, if any.
    pub fn get(&mut self, kind: K) -> Option<&mut BoxedState<K>> {
        self.states.get_mut(&kind)
    }

    /// Remove and dispose the cached state for `kind`.
    ///
    /// Returns `false` if nothing was cached for that kind.
    pub fn evict(&mut self, kind: K) -> Result<bool, GameError> {
        let Some(state) = self.states.remove(&kind) else {
            return Ok(false);
        };
        debug!("Disposing game state {kind:?}");
        state
            .dispose()
            .map_err(|source| GameError::callback(format!("{kind:?}"), Phase::Dispose, source))?;
        Ok(true)
    }

    /// Deactivate and dispose every cached state, leaving the cache empty.
    ///
    /// Every entry is visited even when one of them fails; the first error is
    /// returned.
    pub fn dispose_all(&mut self) -> Result<(), GameError> {
        let mut first_error = None;

        for (kind, mut state) in self.states.drain() {
            debug!("Disposing game state {kind:?}");
            if let Err(source) = state.deactivate() {
                first_error.get_or_insert(GameError::callback(
                    format!("{kind:?}"),
                    Phase::Deactivate,
                    source,
                ));
            }
            if let Err(source) = state.dispose() {
                first_error.get_or_insert(GameError::callback(
                    format!("{kind:?}"),
                    Phase::Dispose,
                    source,
                ));
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// True if `kind` is cached or has a registered factory.
    pub fn can_provide(&self, kind: K) -> bool {
        self.states.contains_key(&kind) || self.registry.contains(kind)
    }

    pub fn is_cached(&self, kind: K) -> bool {
        self.states.contains_key(&kind)
    }

    /// Number of live cached states.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Kinds that currently have a live cached state.
    pub fn cached_kinds(&self) -> impl Iterator<Item = K> + '_ {
        self.states.keys().copied()
    }

    /// How many instances of `kind` were ever constructed by this cache.
    pub fn created_count(&self, kind: K) -> usize {
        self.created.get(&kind).copied().unwrap_or(0)
    }

    pub fn ui(&self) -> &UiHandle<U> {
        &self.ui
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::ui::NoUi;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub(crate) enum Kind {
        Menu,
        Playing,
        Paused,
    }

    #[derive(Clone, Debug, PartialEq)]
    pub(crate) enum Call {
        Activate,
        Deactivate,
        Step,
        Render(f32),
        Resize(u32, u32),
        Dispose,
    }

    /// (instance id, kind, call)
    pub(crate) type Journal = Rc<RefCell<Vec<(usize, Kind, Call)>>>;

    /// Test state that records every lifecycle call.
    pub(crate) struct Probe {
        pub id: usize,
        pub kind: Kind,
        pub journal: Journal,
        pub fail_on: Option<&'static str>,
        pub on_step: Option<(Kind, bool)>,
    }

    impl Probe {
        fn record(&self, call: Call) {
            self.journal.borrow_mut().push((self.id, self.kind, call));
        }

        fn check(&self, hook: &'static str) -> Result<()> {
            if self.fail_on == Some(hook) {
                anyhow::bail!("{hook} failed for {:?}", self.kind);
            }
            Ok(())
        }
    }

    impl GameState<Kind> for Probe {
        fn kind(&self) -> Kind {
            self.kind
        }

        fn activate(&mut self) -> Result<()> {
            self.record(Call::Activate);
            self.check("activate")
        }

        fn deactivate(&mut self) -> Result<()> {
            self.record(Call::Deactivate);
            self.check("deactivate")
        }

        fn step(&mut self, _fixed_dt: f32, transitions: &mut Transitions<Kind>) -> Result<()> {
            self.record(Call::Step);
            if let Some((kind, dispose)) = self.on_step.take() {
                transitions.request(kind, dispose);
            }
            self.check("step")
        }

        fn render(&mut self, alpha: f32) -> Result<()> {
            self.record(Call::Render(alpha));
            self.check("render")
        }

        fn resize(&mut self, width: u32, height: u32) -> Result<()> {
            self.record(Call::Resize(width, height));
            Ok(())
        }

        fn dispose(self: Box<Self>) -> Result<()> {
            self.record(Call::Dispose);
            self.check("dispose")
        }
    }

    /// Registry building a `Probe` for every kind, numbering instances in
    /// construction order.
    pub(crate) fn probe_registry<U: 'static>(
        journal: &Journal,
        fail_on: Option<(Kind, &'static str)>,
    ) -> StateRegistry<Kind, U> {
        let counter = Rc::new(RefCell::new(0usize));
        let mut registry = StateRegistry::new();
        for kind in [Kind::Menu, Kind::Playing, Kind::Paused] {
            let journal = journal.clone();
            let counter = counter.clone();
            registry = registry.register(kind, move |kind, _ui: &UiHandle<U>| {
                let mut next = counter.borrow_mut();
                *next += 1;
                Ok(Box::new(Probe {
                    id: *next,
                    kind,
                    journal: journal.clone(),
                    fail_on: fail_on.filter(|(k, _)| *k == kind).map(|(_, hook)| hook),
                    on_step: None,
                }) as BoxedState<Kind>)
            });
        }
        registry
    }

    fn cache(journal: &Journal) -> StateCache<Kind, NoUi> {
        StateCache::new(probe_registry(journal, None), Rc::new(RefCell::new(NoUi)))
    }

    #[test]
    fn test_get_or_create_reuses_instance() {
        let journal = Journal::default();
        let mut cache = cache(&journal);

        cache.get_or_create(Kind::Menu).unwrap();
        cache.get_or_create(Kind::Menu).unwrap();
        cache.get_or_create(Kind::Playing).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.created_count(Kind::Menu), 1);
        assert_eq!(cache.created_count(Kind::Playing), 1);
        assert_eq!(cache.created_count(Kind::Paused), 0);
    }

    #[test]
    fn test_evict_disposes_once() {
        let journal = Journal::default();
        let mut cache = cache(&journal);
        cache.get_or_create(Kind::Menu).unwrap();

        assert!(cache.evict(Kind::Menu).unwrap());
        assert!(!cache.evict(Kind::Menu).unwrap());
        assert!(!cache.is_cached(Kind::Menu));

        let disposals = journal
            .borrow()
            .iter()
            .filter(|(_, _, call)| *call == Call::Dispose)
            .count();
        assert_eq!(disposals, 1);

        cache.get_or_create(Kind::Menu).unwrap();
        assert_eq!(cache.created_count(Kind::Menu), 2);
    }

    #[test]
    fn test_unregistered_kind_is_fatal() {
        let registry: StateRegistry<Kind, NoUi> =
            StateRegistry::new().register(Kind::Menu, |kind, _ui| {
                Ok(Box::new(Probe {
                    id: 1,
                    kind,
                    journal: Journal::default(),
                    fail_on: None,
                    on_step: None,
                }) as BoxedState<Kind>)
            });
        let mut cache = StateCache::new(registry, Rc::new(RefCell::new(NoUi)));
        assert!(cache.can_provide(Kind::Menu));
        assert!(!cache.can_provide(Kind::Paused));

        let err = cache.get_or_create(Kind::Paused).err().unwrap();
        assert!(matches!(err, GameError::UnregisteredState { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_factory_error_is_wrapped() {
        let registry: StateRegistry<Kind, NoUi> = StateRegistry::new()
            .register(Kind::Menu, |_kind, _ui| anyhow::bail!("missing texture atlas"));
        let mut cache = StateCache::new(registry, Rc::new(RefCell::new(NoUi)));

        let err = cache.get_or_create(Kind::Menu).err().unwrap();
        assert!(matches!(err, GameError::StateConstruction { .. }));
        assert_eq!(cache.created_count(Kind::Menu), 0);
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let registry: StateRegistry<Kind, NoUi> = StateRegistry::new().register(Kind::Menu, |_kind, _ui| {
            Ok(Box::new(Probe {
                id: 1,
                kind: Kind::Playing,
                journal: Journal::default(),
                fail_on: None,
                on_step: None,
            }) as BoxedState<Kind>)
        });
        let mut cache = StateCache::new(registry, Rc::new(RefCell::new(NoUi)));

        let err = cache.get_or_create(Kind::Menu).err().unwrap();
        assert!(matches!(err, GameError::KindMismatch { .. }));
        assert!(!cache.is_cached(Kind::Menu));
    }

    #[test]
    fn test_dispose_all_visits_every_entry() {
        let journal = Journal::default();
        let mut cache = StateCache::<Kind, NoUi>::new(
            probe_registry(&journal, Some((Kind::Menu, "dispose"))),
            Rc::new(RefCell::new(NoUi)),
        );
        for kind in [Kind::Menu, Kind::Playing, Kind::Paused] {
            cache.get_or_create(kind).unwrap();
        }

        let err = cache.dispose_all().err().unwrap();
        assert!(matches!(err, GameError::Callback { phase: Phase::Dispose, .. }));
        assert!(cache.is_empty());

        for kind in [Kind::Menu, Kind::Playing, Kind::Paused] {
            let calls: Vec<Call> = journal
                .borrow()
                .iter()
                .filter(|(_, k, _)| *k == kind)
                .map(|(_, _, call)| call.clone())
                .collect();
            assert_eq!(calls, vec![Call::Deactivate, Call::Dispose]);
        }
    }

    #[test]
    fn test_transitions_last_request_wins() {
        let mut transitions = Transitions::new();
        transitions.request(Kind::Playing, false);
        transitions.request(Kind::Paused, true);
        assert_eq!(
            transitions.take(),
            Some(Transition {
                kind: Kind::Paused,
                dispose_current: true
            })
        );
        assert_eq!(transitions.take(), None);
    }
}
