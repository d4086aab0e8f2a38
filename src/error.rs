use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttackError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed n-gram table: {0}")]
    Table(#[from] csv::Error),

    #[error("Malformed JSON config: {0}")]
    ConfigFile(#[from] serde_json::Error),

    /// Settings, statistics or key material that cannot drive an attack.
    #[error("Invalid attack setup: {0}")]
    Setup(String),

    /// Ciphertext, crib or pin text that does not parse.
    #[error("Invalid ciphertext or crib: {0}")]
    Input(String),

    #[error("Worker {task_id} failed: {message}")]
    WorkerFailure { task_id: usize, message: String },
}

pub type AttackResult<T> = Result<T, AttackError>;
