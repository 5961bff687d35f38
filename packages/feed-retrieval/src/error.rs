pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Retrieval handler {handler} failed: {message}")]
	Handler { handler: String, message: String },
	#[error("Collaborator error: {message}")]
	Collaborator { message: String },
}
impl Error {
	pub fn collaborator(message: impl Into<String>) -> Self {
		Self::Collaborator { message: message.into() }
	}
}
