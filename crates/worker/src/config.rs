use std::time::Duration;

/// Worker configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Pause between step transitions in the finishing cascade, so a
    /// polling client can observe the final steps individually. Zero
    /// disables the pause without changing the transition order.
    pub step_hold: Duration,
    /// Buffer capacity of the phase event channel between the engine
    /// and the worker.
    pub phase_buffer: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            step_hold: Duration::from_millis(200),
            phase_buffer: 64,
        }
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default |
    /// |-----------------------|---------|
    /// | `SENSIA_STEP_HOLD_MS` | `200`   |
    /// | `SENSIA_PHASE_BUFFER` | `64`    |
    pub fn from_env() -> Self {
        let step_hold_ms: u64 = std::env::var("SENSIA_STEP_HOLD_MS")
            .unwrap_or_else(|_| "200".into())
            .parse()
            .expect("SENSIA_STEP_HOLD_MS must be a valid u64");

        let phase_buffer: usize = std::env::var("SENSIA_PHASE_BUFFER")
            .unwrap_or_else(|_| "64".into())
            .parse()
            .expect("SENSIA_PHASE_BUFFER must be a valid usize");

        Self {
            step_hold: Duration::from_millis(step_hold_ms),
            phase_buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_nonzero() {
        let config = WorkerConfig::default();
        assert_eq!(config.step_hold, Duration::from_millis(200));
        assert_eq!(config.phase_buffer, 64);
    }
}
