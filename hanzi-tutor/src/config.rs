//! Tutor bootstrap configuration
//!
//! Resolves where the database and reference data live, which port to
//! serve on and which recognizer to call. Everything else is a runtime
//! tunable in the `settings` table.
//!
//! Priority for each value: command line, environment, TOML file, default.

use hanzi_common::config::{self as common_config, TomlConfig};
use std::path::PathBuf;

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "HANZI_ROOT_FOLDER";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5760;

/// Resolved bootstrap configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TutorConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    /// Per-character reference stroke files
    pub data_dir: PathBuf,
    pub port: u16,
    /// Base URL of the handwriting recognizer; None disables recognition
    pub recognizer_url: Option<String>,
}

impl TutorConfig {
    /// Resolve from command-line values (clap has already applied env
    /// fallbacks for port and recognizer) and an optional TOML file
    pub fn resolve(
        cli_root_folder: Option<&str>,
        cli_port: Option<u16>,
        cli_recognizer_url: Option<&str>,
        toml: Option<&TomlConfig>,
    ) -> Self {
        let root_folder = common_config::resolve_root_folder(cli_root_folder, ROOT_FOLDER_ENV, toml);

        let port = cli_port
            .or_else(|| toml.and_then(|t| t.port))
            .unwrap_or(DEFAULT_PORT);

        let recognizer_url = cli_recognizer_url
            .map(str::to_string)
            .or_else(|| toml.and_then(|t| t.recognizer_url.clone()))
            .filter(|url| !url.trim().is_empty());

        Self {
            database_path: common_config::database_path(&root_folder),
            data_dir: common_config::stroke_data_dir(&root_folder),
            root_folder,
            port,
            recognizer_url,
        }
    }
}
