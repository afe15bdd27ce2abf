//! Console transport configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Where exported documents are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Chat identity used for the console conversation
    #[serde(default = "default_identity")]
    pub chat_id: i64,

    #[serde(default = "default_identity")]
    pub user_id: i64,
}

impl ConsoleConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("CONSOLE__OUTPUT_DIR"));
        }
        Ok(())
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            chat_id: default_identity(),
            user_id: default_identity(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_identity() -> i64 {
    1
}
