//! Catalog endpoints: available actions and the story listing

use crate::DeckClient;
use crate::error::Result;
use jobdeck_core::domain::action::ActionMeta;
use jobdeck_core::domain::story::StoryCollection;
use jobdeck_core::dto::story::StoryQuery;

impl DeckClient {
    /// List all actions the job runner offers
    pub async fn list_actions(&self) -> Result<Vec<ActionMeta>> {
        let url = self.url("/api/actions");
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List stories with owner aggregates
    ///
    /// # Arguments
    /// * `query` - Limit and quick owner shortcuts
    pub async fn list_stories(&self, query: &StoryQuery) -> Result<StoryCollection> {
        let url = self.url("/api/stories");
        let response = self
            .client
            .get(&url)
            .query(&query.to_pairs())
            .send()
            .await?;

        self.handle_response(response).await
    }
}
