use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::error::PeriodicGraphError;

/// Cooperative cancellation for long-running computations
///
/// Clones share the same flag, so a token can be handed to another
/// thread and cancelled from there. Symmetry and invariant
/// computations poll the token once per characteristic basis and
/// return [PeriodicGraphError::Cancelled] without caching anything.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn check(&self) -> Result<(), PeriodicGraphError> {
        if self.is_cancelled() {
            Err(PeriodicGraphError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(token.check().is_ok());
        other.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(PeriodicGraphError::Cancelled));
    }
}
