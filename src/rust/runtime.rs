use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::Result as OrtResult;
use std::env;
use std::sync::Once;

pub const INTER_THREADS_ENV_VAR: &str = "EMOTION_RADAR_INTER_THREADS";
pub const INTRA_THREADS_ENV_VAR: &str = "EMOTION_RADAR_INTRA_THREADS";

static INIT: Once = Once::new();

/// ONNX Runtime session settings. Zero thread counts leave the choice to ONNX Runtime.
#[derive(Debug)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: GraphOptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0,
            intra_threads: 0,
            optimization_level: GraphOptimizationLevel::Level3,
        }
    }
}

impl Clone for RuntimeConfig {
    fn clone(&self) -> Self {
        Self {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            optimization_level: copy_level(&self.optimization_level),
        }
    }
}

fn copy_level(level: &GraphOptimizationLevel) -> GraphOptimizationLevel {
    match level {
        GraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
        GraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
        GraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        GraphOptimizationLevel::Disable => GraphOptimizationLevel::Disable,
    }
}

fn threads_from_env(var: &str) -> Option<usize> {
    let raw = env::var(var).ok()?;
    match raw.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a thread count", var, raw);
            None
        }
    }
}

impl RuntimeConfig {
    /// Defaults, overridden by `EMOTION_RADAR_INTER_THREADS` / `EMOTION_RADAR_INTRA_THREADS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(n) = threads_from_env(INTER_THREADS_ENV_VAR) {
            config.inter_threads = n;
        }
        if let Some(n) = threads_from_env(INTRA_THREADS_ENV_VAR) {
            config.intra_threads = n;
        }
        config
    }

    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = threads;
        self
    }
}

fn init_onnx_environment() -> OrtResult<()> {
    ort::init().with_name("emotion_radar").commit()?;
    Ok(())
}

pub fn ensure_initialized() -> OrtResult<()> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = init_onnx_environment();
    });
    result
}

pub fn create_session_builder(config: &RuntimeConfig) -> OrtResult<SessionBuilder> {
    ensure_initialized()?;
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    builder = builder.with_optimization_level(copy_level(&config.optimization_level))?;

    Ok(builder)
}
