//! Action domain types
//!
//! Actions are the automation entry points the job runner offers. Their
//! metadata is static from the client's point of view.

use serde::{Deserialize, Serialize};

/// A runnable automation action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMeta {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub default_args: Vec<String>,
    #[serde(default)]
    pub command_preview: String,
    #[serde(default)]
    pub options: Vec<ActionOption>,
}

/// A toggleable option that contributes extra arguments to an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOption {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default_selected: bool,
}

impl ActionMeta {
    /// Look up an option by id
    pub fn option(&self, option_id: &str) -> Option<&ActionOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// Ids of the options selected by default
    pub fn default_option_ids(&self) -> Vec<String> {
        self.options
            .iter()
            .filter(|option| option.default_selected)
            .map(|option| option.id.clone())
            .collect()
    }
}
