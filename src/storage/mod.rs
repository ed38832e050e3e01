//! # Storage Layer
//!
//! Everything that touches the filesystem: reading pipeline and interface
//! documents, discovering pipeline files and loading configuration.
//!
//! ## Input Formats
//!
//! | Data | Format | Default location |
//! |------|--------|------------------|
//! | Pipelines | JSON, one object of nodes per file | `assets/resource/pipeline/*.json` |
//! | Interface | JSON with `//` and `/* */` comments | `assets/interface.json` |
//! | Templates | Image files referenced by nodes | `assets/resource/image/` |
//! | Config | TOML | `pipecheck.toml` |
//!
//! ## Key Types
//!
//! - [`ParsedJson`] - A pipeline document plus its repeated keys
//! - [`LoadedFile`] - Per-file load outcome; failures never abort a run
//! - [`Interface`] - Task entries and `pipeline_override` keys
//! - [`Config`] - Project and global configuration

mod config;
mod document;
mod interface;
mod scan;

pub use config::{
    Config, ConfigError, GlobalConfig, OutputFormat, PriorityConfig, ProjectConfig,
    CONFIG_DIR_ENV, PROJECT_CONFIG_FILE,
};
pub use document::{
    decode, load_json, load_jsonc, parse_json, parse_jsonc, strip_comments, DocumentError,
    ParsedJson,
};
pub use interface::{Interface, InterfaceError};
pub use scan::{find_pipeline_files, load_all, LoadedFile, ScanMode};
