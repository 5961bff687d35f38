use std::sync::Arc;

use crate::{BoxFuture, RecallRequest, Result, SequenceStore, UserContext};

pub trait UserContextFactory
where
	Self: Send + Sync,
{
	fn create<'a>(&'a self, request: &'a RecallRequest) -> BoxFuture<'a, Result<UserContext>>;
}

/// Builds the context from the user's recent interactions. A failing sequence store yields a
/// context with no history rather than an error.
pub struct DefaultUserContextFactory {
	sequence_store: Arc<dyn SequenceStore>,
	interaction_limit: usize,
}
impl DefaultUserContextFactory {
	pub fn new(sequence_store: Arc<dyn SequenceStore>, interaction_limit: usize) -> Self {
		Self { sequence_store, interaction_limit }
	}
}

impl UserContextFactory for DefaultUserContextFactory {
	fn create<'a>(&'a self, request: &'a RecallRequest) -> BoxFuture<'a, Result<UserContext>> {
		Box::pin(async move {
			let interactions = match self
				.sequence_store
				.recent_interactions(request.user_id, self.interaction_limit)
				.await
			{
				Ok(interactions) => interactions,
				Err(err) => {
					tracing::warn!(
						error = %err,
						user_id = request.user_id,
						"Recent interactions lookup failed; continuing without history."
					);

					Vec::new()
				},
			};

			Ok(UserContext::from_request(request, interactions))
		})
	}
}
