/// Errors that can occur during simulator operations.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("Simulator not connected")]
    NotConnected,

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Scenario timed out waiting for {phase} after {elapsed_us} us")]
    ScenarioTimeout { phase: &'static str, elapsed_us: u64 },
}
