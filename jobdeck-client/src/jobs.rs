//! Job-related API endpoints

use crate::DeckClient;
use crate::error::Result;
use jobdeck_core::dto::job::{CreateJob, CreatedJob, JobUpdate};

impl DeckClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Start a job for an action
    ///
    /// # Arguments
    /// * `req` - The job creation request
    ///
    /// # Returns
    /// The initial snapshot, the first log batch and the cursor to resume from
    pub async fn create_job(&self, req: &CreateJob) -> Result<CreatedJob> {
        let url = self.url("/api/jobs");
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Fetch job state and the log entries at or after `cursor`
    ///
    /// # Arguments
    /// * `job_id` - The job id
    /// * `cursor` - Log offset to resume from
    pub async fn poll_job(&self, job_id: &str, cursor: u64) -> Result<JobUpdate> {
        let url = self.url(&format!("/api/jobs/{}", job_id));
        let response = self
            .client
            .get(&url)
            .query(&[("cursor", cursor)])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Ask the job runner to terminate a job
    ///
    /// # Arguments
    /// * `job_id` - The job id
    /// * `cursor` - Log offset to resume from, so the reply carries new output
    pub async fn terminate_job(&self, job_id: &str, cursor: u64) -> Result<JobUpdate> {
        let url = self.url(&format!("/api/jobs/{}/terminate", job_id));
        let response = self
            .client
            .post(&url)
            .query(&[("cursor", cursor)])
            .send()
            .await?;

        self.handle_response(response).await
    }
}
