use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Identifies one agent run. Frames and analysis results tagged with an older
/// generation are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(&self) -> Self {
        Generation(self.0 + 1)
    }
}

/// Single-slot owner of the in-flight run's cancellation token.
#[derive(Debug, Default)]
pub struct CancellationRegistry {
    generation: Generation,
    active: Option<CancellationToken>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersedes the current run: cancels its token and hands out a fresh one.
    pub fn begin(&mut self) -> (Generation, CancellationToken) {
        self.cancel();
        self.generation = self.generation.next();
        let token = CancellationToken::new();
        self.active = Some(token.clone());
        (self.generation, token)
    }

    /// Returns true if a run was in flight.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drops the token of a run that ended on its own.
    pub fn release(&mut self, generation: Generation) {
        if generation == self.generation {
            self.active = None;
        }
    }

    pub fn current(&self) -> Generation {
        self.generation
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation
    }

    pub fn in_flight(&self) -> bool {
        self.active.is_some()
    }
}
