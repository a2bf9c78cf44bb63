use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad column, out-of-range score, etc.).
    ConfigValidation(String),
    /// Catalog rows or candidate records that cannot enter the resolver.
    MalformedInput {
        source: String,
        index: usize,
        reason: String,
    },
}

impl ReconError {
    pub fn malformed(source: impl Into<String>, index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            source: source.into(),
            index,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MalformedInput { source, index, reason } => {
                write!(f, "malformed input in '{source}', record {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for ReconError {}
