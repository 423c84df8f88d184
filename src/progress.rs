//! Progress notifications for long scans.

use serde::Serialize;

/// Which part of a computation a [`Progress`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Coarse,
    Fine,
    Correlation,
}

/// Work completed so far within a stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub stage: Stage,
    pub completed: u64,
    pub total: u64,
}

impl Progress {
    /// Fraction of the stage done, in [0, 1]. An empty stage counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Work is evaluated in chunks of this many items between progress reports.
pub(crate) const CHUNK_SIZE: u64 = 4096;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_handles_empty_stage() {
        let p = Progress {
            stage: Stage::Correlation,
            completed: 0,
            total: 0,
        };
        assert_eq!(p.fraction(), 1.0);
    }

    #[test]
    fn fraction_midway() {
        let p = Progress {
            stage: Stage::Coarse,
            completed: 50,
            total: 200,
        };
        assert!((p.fraction() - 0.25).abs() < 1e-12);
    }
}
