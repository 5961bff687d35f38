use crate::StrategyId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Collaborator error: {message}")]
	Collaborator { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Strategy {strategy} timed out after {after_ms} ms.")]
	Timeout { strategy: StrategyId, after_ms: u64 },
}
impl Error {
	pub fn collaborator(message: impl Into<String>) -> Self {
		Self::Collaborator { message: message.into() }
	}
}
