use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Malformed invocation block: {0}")]
    InvocationParse(String),

    #[error("Parameters for tool '{tool}' failed validation: {}", problems.join("; "))]
    ParameterValidation { tool: String, problems: Vec<String> },

    #[error("Could not resolve parameters for tool '{tool}': {message}")]
    ParameterResolution { tool: String, message: String },

    #[error("Tool '{tool}' execution failed: {source}")]
    ToolFailed {
        tool: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Provider request failed: {0}")]
    Provider(String),

    #[error("Event stream already consumed")]
    StreamConsumed,

    #[error("Round budget exhausted after {rounds} rounds")]
    RoundBudgetExceeded { rounds: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Helper for creating provider errors
    ///
    /// # Example
    /// ```
    /// use tooltalk_core::Error;
    /// let err = Error::provider_error("connection reset");
    /// ```
    pub fn provider_error(msg: impl Into<String>) -> Self {
        Error::Provider(msg.into())
    }

    /// Helper for creating general errors with a message
    ///
    /// # Example
    /// ```
    /// use tooltalk_core::Error;
    /// let err = Error::message("Something went wrong");
    /// ```
    pub fn message(msg: impl Into<String>) -> Self {
        Error::Other(anyhow::anyhow!("{}", msg.into()))
    }

    /// Helper for creating invocation parse errors
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Error::InvocationParse(msg.into())
    }
}
