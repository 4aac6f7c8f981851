use std::{fmt, sync::Arc};

use gateway_config::RandomItemConfig;
use gateway_engine::{Engine, EngineError, UpstreamResolver};
use schema_composition::{compose, restrict, CompositionError, ExtensionError, FieldWhitelist, VisibilityError};
use upstream_client::{UpstreamClient, UpstreamError};

use crate::extension;

/// The phases the gateway goes through before it serves anything. Startup runs once: a failure
/// is final and a changed upstream schema is only picked up by a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    Uninitialized,
    Introspecting,
    Composing,
    Restricting,
    Ready,
    Failed,
}

impl fmt::Display for StartupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            StartupPhase::Uninitialized => "uninitialized",
            StartupPhase::Introspecting => "introspecting",
            StartupPhase::Composing => "composing",
            StartupPhase::Restricting => "restricting",
            StartupPhase::Ready => "ready",
            StartupPhase::Failed => "failed",
        };

        f.write_str(phase)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("introspecting the upstream schema: {0}")]
    Introspection(#[source] UpstreamError),
    #[error("invalid schema extension: {0}")]
    Extension(#[from] ExtensionError),
    #[error("composing the schema: {0}")]
    Composition(#[from] CompositionError),
    #[error("restricting the schema: {0}")]
    Visibility(#[from] VisibilityError),
    #[error("building the executable schema: {0}")]
    Engine(#[from] EngineError),
    #[error("startup already ran and ended {0}")]
    AlreadyRan(StartupPhase),
}

/// Acquires the upstream schema, composes it with the schema extension and restricts it.
pub struct Startup {
    client: Arc<dyn UpstreamClient>,
    visibility: FieldWhitelist,
    random_item: RandomItemConfig,
    history: Vec<StartupPhase>,
}

impl Startup {
    pub fn new(client: Arc<dyn UpstreamClient>, visibility: FieldWhitelist, random_item: RandomItemConfig) -> Self {
        Startup {
            client,
            visibility,
            random_item,
            history: vec![StartupPhase::Uninitialized],
        }
    }

    pub fn phase(&self) -> StartupPhase {
        self.history.last().copied().unwrap_or(StartupPhase::Uninitialized)
    }

    /// Every phase entered so far, in order.
    pub fn history(&self) -> &[StartupPhase] {
        &self.history
    }

    /// Reporting a failure is left to the caller, which decides whether it is fatal.
    pub async fn run(&mut self) -> Result<Engine, StartupError> {
        if self.phase() != StartupPhase::Uninitialized {
            return Err(StartupError::AlreadyRan(self.phase()));
        }

        match self.phases().await {
            Ok(engine) => {
                self.enter(StartupPhase::Ready);
                Ok(engine)
            }
            Err(err) => {
                self.enter(StartupPhase::Failed);
                Err(err)
            }
        }
    }

    async fn phases(&mut self) -> Result<Engine, StartupError> {
        self.enter(StartupPhase::Introspecting);

        let remote = self.client.introspect().await.map_err(StartupError::Introspection)?;

        self.enter(StartupPhase::Composing);

        let extension = extension::schema_extension()?;
        let resolvers = extension::resolvers(Arc::clone(&self.client), &self.random_item);
        let composed = compose(remote, &extension, resolvers)?;

        tracing::debug!("composed schema:\n{}", composed.to_sdl());

        self.enter(StartupPhase::Restricting);

        let restricted = restrict(composed, &self.visibility)?;
        let upstream = Arc::new(UpstreamResolver::new(Arc::clone(&self.client)));

        Ok(Engine::build(&restricted, upstream)?)
    }

    fn enter(&mut self, phase: StartupPhase) {
        tracing::info!("startup: {} -> {phase}", self.phase());
        self.history.push(phase);
    }
}
