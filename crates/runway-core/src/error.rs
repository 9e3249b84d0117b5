use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunwayError {
    #[error("step '{step}' failed with exit code {code}")]
    StepFailed { step: String, code: i32 },

    #[error("step '{step}' has an empty command")]
    EmptyCommand { step: String },

    #[error("failed to spawn '{program}' for step '{step}': {source}")]
    SpawnFailed {
        step: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{addr} not reachable after {timeout_s:.1}s")]
    WaitTimeout { addr: String, timeout_s: f64 },

    #[error("interrupted by signal {signal} during step '{step}'")]
    Interrupted { step: String, signal: i32 },

    #[error("config file not found: {0}")]
    ConfigNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RunwayError {
    /// The process exit status this error propagates.
    ///
    /// `StepFailed` carries the child's own code unchanged. A program
    /// that could not be spawned maps to 127, the shell convention for
    /// "command not found". Everything else is a generic failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunwayError::StepFailed { code, .. } => *code,
            RunwayError::SpawnFailed { .. } => 127,
            RunwayError::Interrupted { signal, .. } => 128 + signal,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunwayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_failed_propagates_child_code() {
        let err = RunwayError::StepFailed {
            step: "migrate".to_string(),
            code: 7,
        };
        assert_eq!(err.exit_code(), 7);
        assert_eq!(err.to_string(), "step 'migrate' failed with exit code 7");
    }

    #[test]
    fn spawn_failure_maps_to_127() {
        let err = RunwayError::SpawnFailed {
            step: "collect-static".to_string(),
            program: "no-such-binary".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn wait_timeout_is_generic_failure() {
        let err = RunwayError::WaitTimeout {
            addr: "127.0.0.1:5432".to_string(),
            timeout_s: 60.0,
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("not reachable after 60.0s"));
    }
}
