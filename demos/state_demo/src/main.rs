use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use grove2d::{
    Engine, GameLoop, GameState, InputEvent, InputProcessor, InputState, KeyCode, LoopConfig,
    MapModel, NullTarget, RenderTarget, StateRegistry, TiledMap, Transitions, UiHandle, UiLayer,
    Vec2,
};
use log::info;

const GARDEN_MAP: &str = include_str!("../assets/garden.tmj");

/// Player speed in tiles per second.
const WALK_SPEED: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Screen {
    Menu,
    Playing,
    Paused,
}

type SharedInput = Rc<RefCell<InputState>>;

/// Toast-style overlay. F1 toggles a help line and is swallowed so states
/// never see it.
#[derive(Default)]
struct Hud {
    messages: Vec<(String, f32)>,
    show_help: bool,
}

impl Hud {
    fn toast(&mut self, message: impl Into<String>) {
        let message = message.into();
        println!("[hud] {message}");
        self.messages.push((message, 2.0));
    }
}

impl InputProcessor for Hud {
    fn handle_event(&mut self, event: &InputEvent) -> bool {
        if *event == InputEvent::KeyDown(KeyCode::F1) {
            self.show_help = !self.show_help;
            if self.show_help {
                println!("[hud] Enter: start  P: pause  Arrows: walk  M: menu  Esc: quit");
            }
            return true;
        }
        false
    }
}

impl UiLayer for Hud {
    fn step(&mut self, fixed_dt: f32) -> Result<()> {
        for (_, remaining) in &mut self.messages {
            *remaining -= fixed_dt;
        }
        self.messages.retain(|(_, remaining)| *remaining > 0.0);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        Ok(())
    }

    fn dispose(&mut self) -> Result<()> {
        println!("[hud] Goodbye");
        Ok(())
    }
}

/// Press of a key that both enters and leaves a state. The key has to be
/// released once after activation, otherwise the press that opened the state
/// would close it again in the same frame.
fn toggle_pressed(input: &InputState, key: KeyCode, armed: &mut bool) -> bool {
    if !input.is_key_down(key) {
        *armed = true;
        return false;
    }
    *armed && input.is_key_pressed(key)
}

struct MenuState {
    input: SharedInput,
    ui: UiHandle<Hud>,
    idle: f32,
}

impl GameState<Screen> for MenuState {
    fn kind(&self) -> Screen {
        Screen::Menu
    }

    fn activate(&mut self) -> Result<()> {
        self.idle = 0.0;
        self.ui.borrow_mut().toast("Press Enter to start");
        Ok(())
    }

    fn step(&mut self, fixed_dt: f32, transitions: &mut Transitions<Screen>) -> Result<()> {
        self.idle += fixed_dt;
        if self.idle >= 10.0 {
            self.idle = 0.0;
            self.ui.borrow_mut().toast("Still there? Press Enter to start");
        }
        if self.input.borrow().is_key_pressed(KeyCode::Enter) {
            transitions.request(Screen::Playing, false);
        }
        Ok(())
    }

    fn render(&mut self, _alpha: f32) -> Result<()> {
        Ok(())
    }
}

struct PlayingState {
    input: SharedInput,
    ui: UiHandle<Hud>,
    map: MapModel,
    previous: Vec2,
    player: Vec2,
    steps: u64,
    pause_armed: bool,
}

impl PlayingState {
    fn new(input: SharedInput, ui: UiHandle<Hud>) -> Result<Self> {
        let tiled = TiledMap::from_json(GARDEN_MAP).context("Failed to load garden map")?;
        let map = MapModel::new(tiled);
        info!(
            "Loaded garden: {} objects, {} collision areas, {} camera boundaries",
            map.game_objects().len(),
            map.collision_areas().len(),
            map.cam_boundaries().len()
        );
        for object in map.game_objects() {
            info!("  {} (tile {}) at {:?}", object.name, object.tile.gid, object.position);
        }

        let start = map.start_location();
        Ok(Self {
            input,
            ui,
            map,
            previous: start,
            player: start,
            steps: 0,
            pause_armed: false,
        })
    }

    fn walk_direction(&self) -> Vec2 {
        let input = self.input.borrow();
        let axis = |negative: KeyCode, positive: KeyCode| {
            (input.is_key_down(positive) as i32 - input.is_key_down(negative) as i32) as f32
        };
        Vec2::new(
            axis(KeyCode::ArrowLeft, KeyCode::ArrowRight),
            axis(KeyCode::ArrowUp, KeyCode::ArrowDown),
        )
    }
}

impl GameState<Screen> for PlayingState {
    fn kind(&self) -> Screen {
        Screen::Playing
    }

    fn activate(&mut self) -> Result<()> {
        self.pause_armed = false;
        self.ui.borrow_mut().toast("Welcome to the garden");
        Ok(())
    }

    fn step(&mut self, fixed_dt: f32, transitions: &mut Transitions<Screen>) -> Result<()> {
        self.steps += 1;
        self.previous = self.player;

        let target = self.player + self.walk_direction() * (WALK_SPEED * fixed_dt);
        self.player = match self.map.boundary_at(self.player) {
            Some(boundary) => boundary.clamp_point(target),
            None => target,
        };

        if toggle_pressed(&self.input.borrow(), KeyCode::KeyP, &mut self.pause_armed) {
            transitions.request(Screen::Paused, false);
        }
        Ok(())
    }

    fn render(&mut self, alpha: f32) -> Result<()> {
        let _drawn_at = self.previous.lerp(self.player, alpha);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        info!("Garden view is now {width}x{height}");
        Ok(())
    }

    fn dispose(self: Box<Self>) -> Result<()> {
        info!("Leaving the garden after {} steps", self.steps);
        Ok(())
    }
}

struct PausedState {
    input: SharedInput,
    ui: UiHandle<Hud>,
    resume_armed: bool,
}

impl GameState<Screen> for PausedState {
    fn kind(&self) -> Screen {
        Screen::Paused
    }

    fn activate(&mut self) -> Result<()> {
        self.resume_armed = false;
        self.ui.borrow_mut().toast("Paused (P: resume, M: menu)");
        Ok(())
    }

    fn step(&mut self, _fixed_dt: f32, transitions: &mut Transitions<Screen>) -> Result<()> {
        let input = self.input.borrow();
        if toggle_pressed(&input, KeyCode::KeyP, &mut self.resume_armed) {
            transitions.request(Screen::Playing, true);
        } else if input.is_key_pressed(KeyCode::KeyM) {
            transitions.request(Screen::Menu, true);
        }
        Ok(())
    }

    fn render(&mut self, _alpha: f32) -> Result<()> {
        Ok(())
    }
}

fn registry(input: &SharedInput) -> StateRegistry<Screen, Hud> {
    let menu_input = input.clone();
    let playing_input = input.clone();
    let paused_input = input.clone();

    StateRegistry::new()
        .register(Screen::Menu, move |_, ui| {
            Ok(Box::new(MenuState {
                input: menu_input.clone(),
                ui: ui.clone(),
                idle: 0.0,
            }) as Box<dyn GameState<Screen>>)
        })
        .register(Screen::Playing, move |_, ui| {
            Ok(Box::new(PlayingState::new(playing_input.clone(), ui.clone())?)
                as Box<dyn GameState<Screen>>)
        })
        .register(Screen::Paused, move |_, ui| {
            Ok(Box::new(PausedState {
                input: paused_input.clone(),
                ui: ui.clone(),
                resume_armed: false,
            }) as Box<dyn GameState<Screen>>)
        })
}

fn build_loop<R: RenderTarget>(target: R, config: LoopConfig) -> Result<GameLoop<Screen, Hud, R>> {
    let input = InputState::shared();
    let game = GameLoop::builder(Hud::default(), target)
        .config(config)
        .registry(registry(&input))
        .input(input)
        .start(Screen::Menu)?;
    Ok(game)
}

/// Drive the loop without a window, feeding a scripted key sequence.
fn run_headless() -> Result<()> {
    let mut game = build_loop(NullTarget, LoopConfig::default())?;
    // (key, frame pressed, frame released)
    let script = [
        (KeyCode::Enter, 10, 11),
        (KeyCode::ArrowRight, 20, 50),
        (KeyCode::KeyP, 60, 61),
        (KeyCode::KeyM, 80, 81),
    ];

    for frame in 0..120 {
        game.begin_input_frame();
        for &(key, down, up) in &script {
            if frame == down {
                game.handle_input(&InputEvent::KeyDown(key));
            } else if frame == up {
                game.handle_input(&InputEvent::KeyUp(key));
            }
        }
        game.process(Duration::from_millis(20))?;
    }

    println!(
        "Headless run finished on {:?} with {} cached states",
        game.active_kind(),
        game.cache().len()
    );
    game.dispose()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    if std::env::args().any(|arg| arg == "--headless") {
        return run_headless();
    }

    Engine::new()
        .with_title("Grove2D - State Demo")
        .with_size(1024, 768)
        .run(|_window| build_loop(NullTarget, LoopConfig::default().with_size(1024, 768)))
}
