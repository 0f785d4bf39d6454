//! Story domain types
//!
//! Stories are the requirement records an action works on. The console only
//! uses them to decide whether a job may be submitted and which ids to send.

use serde::{Deserialize, Serialize};

/// Owner name used for stories nobody is assigned to
pub const UNASSIGNED_OWNER: &str = "未指派";

/// Summary of a single story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub frontend: Option<String>,
    #[serde(default)]
    pub iteration: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl StorySummary {
    /// Trimmed, non-empty owner names, or the unassigned marker
    pub fn effective_owners(&self) -> Vec<&str> {
        let owners: Vec<&str> = self
            .owners
            .iter()
            .map(|owner| owner.trim())
            .filter(|owner| !owner.is_empty())
            .collect();

        if owners.is_empty() {
            vec![UNASSIGNED_OWNER]
        } else {
            owners
        }
    }
}

/// Story count per owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerAggregate {
    pub name: String,
    pub count: usize,
}

/// A named shortcut selecting several owners at once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickOwnerAggregate {
    pub name: String,
    #[serde(default)]
    pub owners: Vec<String>,
    pub count: usize,
}

/// Story listing returned by the job API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryCollection {
    #[serde(default)]
    pub stories: Vec<StorySummary>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub owners: Vec<OwnerAggregate>,
    #[serde(default)]
    pub quick_owners: Vec<QuickOwnerAggregate>,
    #[serde(default)]
    pub truncated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(owners: &[&str]) -> StorySummary {
        StorySummary {
            id: "1001".to_string(),
            title: "Login page".to_string(),
            status: None,
            owners: owners.iter().map(|o| o.to_string()).collect(),
            frontend: None,
            iteration: None,
            updated_at: None,
            url: None,
        }
    }

    #[test]
    fn test_effective_owners_trims() {
        let s = story(&[" alice ", "", "bob"]);
        assert_eq!(s.effective_owners(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_effective_owners_unassigned() {
        assert_eq!(story(&[]).effective_owners(), vec![UNASSIGNED_OWNER]);
        assert_eq!(story(&["  "]).effective_owners(), vec![UNASSIGNED_OWNER]);
    }
}
