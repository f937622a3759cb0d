use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecipeError {
    #[error("Unsupported compiler {compiler} {version}: {reason}")]
    UnsupportedCompiler {
        compiler: String,
        version: String,
        reason: String,
    },

    #[error("Unknown option '{name}'{}", suggestion_hint(.suggestion))]
    UnknownOption {
        name: String,
        suggestion: Option<String>,
    },

    #[error("Invalid value '{value}' for option '{option}' (possible values: {legal})")]
    InvalidOptionValue {
        option: String,
        value: String,
        legal: String,
    },

    #[error("Options '{first}' and '{second}' cannot be enabled together")]
    ConflictingOptions { first: String, second: String },

    #[error("Option '{option}' requires option '{prerequisite}' to be enabled")]
    MissingPrerequisite {
        option: String,
        prerequisite: String,
    },

    #[error("Invalid setting {key}='{value}': {reason}")]
    InvalidSetting {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    #[error("System package installation failed: {0}")]
    SystemPackage(String),

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("Patch not applied to {path}: pattern not found: {pattern}")]
    PatchNotApplied { path: String, pattern: String },

    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse profile: {0}")]
    Profile(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

impl RecipeError {
    /// The option a configuration error is about, if any
    pub fn option(&self) -> Option<&str> {
        match self {
            Self::UnknownOption { name, .. } => Some(name),
            Self::InvalidOptionValue { option, .. }
            | Self::MissingPrerequisite { option, .. } => Some(option),
            Self::ConflictingOptions { second, .. } => Some(second),
            _ => None,
        }
    }

    /// True for errors raised while resolving options and settings,
    /// before anything is fetched or built
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedCompiler { .. }
                | Self::UnknownOption { .. }
                | Self::InvalidOptionValue { .. }
                | Self::ConflictingOptions { .. }
                | Self::MissingPrerequisite { .. }
                | Self::InvalidSetting { .. }
                | Self::MissingSetting(_)
        )
    }
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(", did you mean '{}'?", name),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, RecipeError>;
