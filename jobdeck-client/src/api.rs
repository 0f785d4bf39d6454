//! Job API abstraction
//!
//! The trait the engine is written against. [`DeckClient`] is the HTTP
//! implementation; tests provide scripted ones.

use async_trait::async_trait;
use jobdeck_core::domain::action::ActionMeta;
use jobdeck_core::domain::story::StoryCollection;
use jobdeck_core::dto::job::{CreateJob, CreatedJob, JobUpdate};
use jobdeck_core::dto::story::StoryQuery;

use crate::DeckClient;
use crate::error::Result;

/// Remote job API consumed by the engine
///
/// Futures returned by these methods may be dropped at any time to abort
/// the request; implementations must not rely on running to completion.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Start a job; see [`DeckClient::create_job`]
    async fn create_job(&self, req: &CreateJob) -> Result<CreatedJob>;

    /// Poll a job from `cursor`; see [`DeckClient::poll_job`]
    async fn poll_job(&self, job_id: &str, cursor: u64) -> Result<JobUpdate>;

    /// Request termination; see [`DeckClient::terminate_job`]
    async fn terminate_job(&self, job_id: &str, cursor: u64) -> Result<JobUpdate>;

    /// List available actions
    async fn list_actions(&self) -> Result<Vec<ActionMeta>>;

    /// List stories
    async fn list_stories(&self, query: &StoryQuery) -> Result<StoryCollection>;
}

#[async_trait]
impl JobApi for DeckClient {
    async fn create_job(&self, req: &CreateJob) -> Result<CreatedJob> {
        DeckClient::create_job(self, req).await
    }

    async fn poll_job(&self, job_id: &str, cursor: u64) -> Result<JobUpdate> {
        DeckClient::poll_job(self, job_id, cursor).await
    }

    async fn terminate_job(&self, job_id: &str, cursor: u64) -> Result<JobUpdate> {
        DeckClient::terminate_job(self, job_id, cursor).await
    }

    async fn list_actions(&self) -> Result<Vec<ActionMeta>> {
        DeckClient::list_actions(self).await
    }

    async fn list_stories(&self, query: &StoryQuery) -> Result<StoryCollection> {
        DeckClient::list_stories(self, query).await
    }
}
