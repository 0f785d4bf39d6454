//! Story filtering and submission gating
//!
//! Actions work on the stories owned by the selected owners. A job may only
//! be submitted when at least one owner is selected and at least one story
//! matches the selection.

use std::collections::HashSet;

use jobdeck_core::domain::story::{QuickOwnerAggregate, StorySummary};
use thiserror::Error;

/// Reasons a submission is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("select at least one story owner before running an action")]
    NoOwners,

    #[error("no stories match the selected owners")]
    NoStories,
}

/// Stories owned by any of `owners`
///
/// With no owners selected every story matches. Stories without owners are
/// treated as owned by the unassigned marker.
pub fn filter_by_owners<'a>(stories: &'a [StorySummary], owners: &[String]) -> Vec<&'a StorySummary> {
    if owners.is_empty() {
        return stories.iter().collect();
    }

    let selected: HashSet<&str> = owners.iter().map(String::as_str).collect();
    stories
        .iter()
        .filter(|story| {
            story
                .effective_owners()
                .iter()
                .any(|owner| selected.contains(owner))
        })
        .collect()
}

/// Check that a submission may go ahead
pub fn gate(owners: &[String], matching: &[&StorySummary]) -> Result<(), GateError> {
    if owners.is_empty() {
        return Err(GateError::NoOwners);
    }
    if matching.is_empty() {
        return Err(GateError::NoStories);
    }
    Ok(())
}

/// Display state of a quick owner shortcut
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickOwnerStatus {
    pub name: String,
    /// Stories the shortcut covers overall
    pub count: usize,
    /// Every owner of the shortcut is selected
    pub active: bool,
    /// Matching stories owned by one of the shortcut's owners
    pub selected_count: usize,
}

pub fn quick_owner_status(
    quick: &QuickOwnerAggregate,
    selected: &[String],
    matching: &[&StorySummary],
) -> QuickOwnerStatus {
    let active = !quick.owners.is_empty() && quick.owners.iter().all(|name| selected.contains(name));
    let selected_count = matching
        .iter()
        .filter(|story| {
            story
                .effective_owners()
                .iter()
                .any(|owner| quick.owners.iter().any(|name| name == owner))
        })
        .count();

    QuickOwnerStatus {
        name: quick.name.clone(),
        count: quick.count,
        active,
        selected_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobdeck_core::domain::story::UNASSIGNED_OWNER;

    fn story(id: &str, owners: &[&str]) -> StorySummary {
        StorySummary {
            id: id.to_string(),
            title: format!("Story {}", id),
            status: None,
            owners: owners.iter().map(|o| o.to_string()).collect(),
            frontend: None,
            iteration: None,
            updated_at: None,
            url: None,
        }
    }

    fn owners(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn ids(stories: &[&StorySummary]) -> Vec<String> {
        stories.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn test_filter_matches_trimmed_owners() {
        let stories = vec![
            story("1", &[" alice "]),
            story("2", &["bob"]),
            story("3", &["carol", "alice"]),
        ];

        let matching = filter_by_owners(&stories, &owners(&["alice"]));
        assert_eq!(ids(&matching), vec!["1", "3"]);
    }

    #[test]
    fn test_unowned_stories_belong_to_unassigned() {
        let stories = vec![story("1", &[]), story("2", &["  "]), story("3", &["bob"])];

        let matching = filter_by_owners(&stories, &owners(&[UNASSIGNED_OWNER]));
        assert_eq!(ids(&matching), vec!["1", "2"]);
    }

    #[test]
    fn test_no_selection_matches_everything() {
        let stories = vec![story("1", &["alice"]), story("2", &[])];
        assert_eq!(filter_by_owners(&stories, &[]).len(), 2);
    }

    #[test]
    fn test_gate() {
        let stories = vec![story("1", &["alice"])];

        assert_eq!(gate(&[], &filter_by_owners(&stories, &[])), Err(GateError::NoOwners));

        let selected = owners(&["bob"]);
        let matching = filter_by_owners(&stories, &selected);
        assert_eq!(gate(&selected, &matching), Err(GateError::NoStories));

        let selected = owners(&["alice"]);
        let matching = filter_by_owners(&stories, &selected);
        assert_eq!(gate(&selected, &matching), Ok(()));
    }

    #[test]
    fn test_quick_owner_status() {
        let stories = vec![story("1", &["alice"]), story("2", &["bob"]), story("3", &["carol"])];
        let quick = QuickOwnerAggregate {
            name: "frontend".to_string(),
            owners: owners(&["alice", "bob"]),
            count: 2,
        };

        let selected = owners(&["alice", "carol"]);
        let matching = filter_by_owners(&stories, &selected);
        let status = quick_owner_status(&quick, &selected, &matching);
        assert!(!status.active);
        assert_eq!(status.selected_count, 1);

        let selected = owners(&["alice", "bob"]);
        let matching = filter_by_owners(&stories, &selected);
        let status = quick_owner_status(&quick, &selected, &matching);
        assert!(status.active);
        assert_eq!(status.selected_count, 2);
    }
}
