//! Story DTOs

use serde::{Deserialize, Serialize};

/// Query parameters for the story listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryQuery {
    /// Maximum number of stories to return; `None` lets the server decide
    pub limit: Option<usize>,
    /// Quick owner shortcut names to aggregate
    pub quick: Vec<String>,
}

impl StoryQuery {
    /// Encode as URL query pairs
    ///
    /// Blank shortcut names are skipped and a zero limit is left out.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(limit) = self.limit.filter(|limit| *limit > 0) {
            pairs.push(("limit", limit.to_string()));
        }

        for name in &self.quick {
            let name = name.trim();
            if !name.is_empty() {
                pairs.push(("quick", name.to_string()));
            }
        }

        pairs
    }
}
