use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    Parse(#[from] serde_yaml::Error),
    CheckErrors(Vec<(String, String)>),
}

impl fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, .. } => write!(f, "Could not load configuration file: {path}")?,
            Self::Parse(_) => write!(f, "Failed to parse configuration")?,
            Self::CheckErrors(errors) => {
                write!(f, "Configuration validation error(s):")?;
                for err in errors {
                    write!(f, "\n  - {}", err.1)?;
                }
            }
        }

        Ok(())
    }
}
