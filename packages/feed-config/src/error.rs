use std::{io, path::PathBuf};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures while loading the recall service TOML.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Cannot read recall service config {path:?}.")]
	ReadConfig {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("Recall service config {path:?} is not valid TOML for this schema: {source}")]
	ParseConfig {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
	/// A key holds a value outside its allowed range; the message names the key.
	#[error("Invalid recall service config: {message}")]
	Validation { message: String },
}
