use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlagError {
    #[error("field {field} is an unexported field")]
    UnexportedField { field: String },

    #[error("flag '{path}' is declared more than once")]
    DuplicateFlag { path: String },

    #[error("short flag '-{short}' is used by both '{first}' and '{second}'")]
    DuplicateShort {
        short: char,
        first: String,
        second: String,
    },

    #[error("type {type_name} contains itself at '{path}'")]
    RecursiveType { type_name: String, path: String },

    #[error("parser not found for flag '{flag}' of type {type_name}")]
    ParserNotFound { flag: String, type_name: String },

    #[error("invalid argument \"{value}\" for --{flag}: {reason}")]
    InvalidArgument {
        flag: String,
        value: String,
        reason: String,
    },

    #[error("unknown flag: {flag}")]
    UnknownFlag { flag: String },

    #[error("help requested")]
    HelpRequested,

    #[error("Failed to encode configuration: {0}")]
    Encode(String),

    #[error("Failed to decode configuration: {0}")]
    Decode(String),

    #[error("command {name} not found")]
    CommandNotFound { name: String },

    #[error("command {name} failed: {reason}")]
    Run { name: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlagError {
    /// Whether this error came out of argument binding. Binding errors leave
    /// a best-effort configuration behind; every other error aborts the load.
    pub fn is_binding(&self) -> bool {
        matches!(
            self,
            FlagError::ParserNotFound { .. }
                | FlagError::InvalidArgument { .. }
                | FlagError::UnknownFlag { .. }
                | FlagError::HelpRequested
        )
    }
}
