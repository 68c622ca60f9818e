//! Config module.
//! Provides configuration types, default paths, XML loading, and setup validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{config_path_from_env, default_config_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel};
pub use validate::validate_and_normalize;
pub use xml::{XmlOverrides, create_template_config, load_config_from_xml, load_config_from_xml_path};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SORTDIR_CONFIG";
/// Output directory used when neither CLI nor config name one.
pub const OUTPUT_DEFAULT: &str = "sorted";
/// Bucket for files without an extension.
pub const NO_EXTENSION_DIR_DEFAULT: &str = "no_extension";
/// Extra processing workers on top of available parallelism, to cover I/O wait.
pub const WORKER_HEADROOM: usize = 4;
