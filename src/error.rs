use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Custom(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("`{command}` failed with exit code: {}", describe_code(.code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        /// Captured stdout/stderr of the command (empty when it was streamed)
        output: String,
    },

    #[error("Project root not found: no manifest in {0} or any parent directory")]
    RootNotFound(String),

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    #[error("Build output directory not found: {0}")]
    BuildOutputMissing(String),

    #[error("Manifest not found: {0}")]
    ManifestNotFound(String),

    #[error("Refusing unsafe layout: {0}")]
    UnsafePath(String),
}

impl Error {
    pub fn custom<T: Into<String>>(msg: T) -> Self {
        Error::Custom(msg.into())
    }

    /// Process exit code for this error; a failed build command hands back its own code
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::CommandFailed { code: Some(code), .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string())
}
