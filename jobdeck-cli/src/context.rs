//! Console context
//!
//! Everything a command needs: the job API client, the state store and the
//! engine configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use jobdeck_client::{DeckClient, JobApi};
use jobdeck_core::domain::action::ActionMeta;
use jobdeck_core::domain::story::StoryCollection;
use jobdeck_core::dto::story::StoryQuery;
use jobdeck_engine::store::{FileStore, MemoryStore, StateStore};
use jobdeck_engine::{Config, EngineError, JobController, Selections};
use tracing::debug;

pub struct Console {
    pub config: Config,
    api: Arc<DeckClient>,
    store: Arc<dyn StateStore>,
}

impl Console {
    /// Set up the job API client and the state store
    ///
    /// # Arguments
    /// * `config` - Validated engine configuration
    /// * `ephemeral` - Keep state in memory instead of under `state_dir`
    pub fn open(config: Config, ephemeral: bool) -> Self {
        let store: Arc<dyn StateStore> = if ephemeral {
            Arc::new(MemoryStore::new())
        } else {
            debug!("Using state directory {}", config.state_dir.display());
            Arc::new(FileStore::new(config.state_dir.clone()))
        };

        Self {
            api: Arc::new(DeckClient::new(config.api_url.clone())),
            store,
            config,
        }
    }

    pub fn controller(&self) -> JobController {
        JobController::new(
            Arc::clone(&self.api) as Arc<dyn JobApi>,
            Arc::clone(&self.store),
            &self.config,
        )
    }

    pub fn selections(&self) -> Selections {
        Selections::new(Arc::clone(&self.store))
    }

    /// Fetch the offered actions and reconcile option selections with them
    pub async fn actions(&self, selections: &mut Selections) -> Result<Vec<ActionMeta>> {
        let actions = self
            .api
            .list_actions()
            .await
            .context("Failed to fetch actions")?;
        selections.sync_actions(&actions);
        Ok(actions)
    }

    /// Fetch one action by id
    pub async fn action(&self, selections: &mut Selections, action_id: &str) -> Result<ActionMeta> {
        self.actions(selections)
            .await?
            .into_iter()
            .find(|action| action.id == action_id)
            .ok_or_else(|| EngineError::UnknownAction(action_id.to_string()).into())
    }

    /// Fetch the story listing and drop owners it no longer knows
    pub async fn stories(&self, selections: &mut Selections) -> Result<StoryCollection> {
        let query = StoryQuery {
            limit: self.config.story_limit,
            quick: self.config.quick_owners.clone(),
        };
        let stories = self
            .api
            .list_stories(&query)
            .await
            .context("Failed to fetch stories")?;
        selections.sync_owners(&stories.owners);
        Ok(stories)
    }
}
