use thiserror::Error;

/// Lifecycle phase a failing callback was running in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Activate,
    Deactivate,
    Step,
    Render,
    Resize,
    Dispose,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Activate => "activate",
            Phase::Deactivate => "deactivate",
            Phase::Step => "step",
            Phase::Render => "render",
            Phase::Resize => "resize",
            Phase::Dispose => "dispose",
        };
        f.write_str(name)
    }
}

/// Errors raised by the state cache and the game loop.
///
/// Configuration errors (`UnregisteredState`, `StateConstruction`,
/// `KindMismatch`) are fatal and never retried.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("no state factory registered for {kind}")]
    UnregisteredState { kind: String },
    #[error("could not create game state {kind}")]
    StateConstruction {
        kind: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("factory for {requested} produced a state of kind {produced}")]
    KindMismatch { requested: String, produced: String },
    #[error("active state {kind} is no longer cached")]
    MissingActiveState { kind: String },
    #[error("{owner} failed during {phase}")]
    Callback {
        owner: String,
        phase: Phase,
        #[source]
        source: anyhow::Error,
    },
}

impl GameError {
    pub(crate) fn callback(owner: impl Into<String>, phase: Phase, source: anyhow::Error) -> Self {
        GameError::Callback {
            owner: owner.into(),
            phase,
            source,
        }
    }
}

/// Errors raised while reading a Tiled map asset.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed map json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported map orientation '{0}', only orthogonal maps are supported")]
    UnsupportedOrientation(String),
    #[error("tile layer '{layer}' uses {encoding} data; only uncompressed arrays are supported")]
    UnsupportedTileData { layer: String, encoding: String },
    #[error("tile layer '{layer}' has an invalid gid {value} at index {index}")]
    InvalidTile {
        layer: String,
        index: usize,
        value: String,
    },
}

pub type Result<T, E = GameError> = std::result::Result<T, E>;
