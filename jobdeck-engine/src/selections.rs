//! Persisted console selections
//!
//! Which action is selected, which options are toggled per action and which
//! story owners are selected. Together with the story listing these decide
//! the arguments a job is submitted with.

use std::collections::BTreeMap;
use std::sync::Arc;

use jobdeck_core::domain::action::ActionMeta;
use jobdeck_core::domain::story::{OwnerAggregate, QuickOwnerAggregate, StoryCollection};
use tracing::debug;

use crate::stories::{self, GateError};
use crate::store::{PersistentSlot, StateStore, keys};

/// Actions that receive the matching story ids
pub const STORY_ID_ACTIONS: &[&str] = &["pull-to-notion", "update-requirements", "debug-notion"];

/// Actions that never receive an `--owner` argument
pub const NO_OWNER_ARG_ACTIONS: &[&str] = &["debug-notion"];

/// Arguments for a job submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobArgs {
    pub args: Vec<String>,
    pub story_ids: Option<Vec<String>>,
}

pub struct Selections {
    selected_action: Option<String>,
    options: BTreeMap<String, Vec<String>>,
    owners: Vec<String>,
    action_slot: PersistentSlot<Option<String>>,
    options_slot: PersistentSlot<BTreeMap<String, Vec<String>>>,
    owners_slot: PersistentSlot<Vec<String>>,
}

impl Selections {
    /// Load selections persisted in `store`
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let action_slot = PersistentSlot::new(Arc::clone(&store), keys::SELECTED_ACTION, None);
        let options_slot =
            PersistentSlot::new(Arc::clone(&store), keys::OPTION_SELECTIONS, BTreeMap::new());
        let owners_slot = PersistentSlot::new(store, keys::SELECTED_OWNERS, Vec::new());

        Self {
            selected_action: action_slot.load(),
            options: options_slot.load(),
            owners: owners_slot.load(),
            action_slot,
            options_slot,
            owners_slot,
        }
    }

    pub fn selected_action(&self) -> Option<&str> {
        self.selected_action.as_deref()
    }

    pub fn select_action(&mut self, action_id: &str) {
        self.selected_action = Some(action_id.to_string());
        self.action_slot.stage(self.selected_action.clone());
    }

    /// Option ids selected for `action_id`
    pub fn options(&self, action_id: &str) -> &[String] {
        self.options.get(action_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Flip one option of an action
    ///
    /// # Returns
    /// Whether the option is selected afterwards
    pub fn toggle_option(&mut self, action_id: &str, option_id: &str) -> bool {
        let selected = self.options.entry(action_id.to_string()).or_default();
        let now_selected = match selected.iter().position(|id| id == option_id) {
            Some(index) => {
                selected.remove(index);
                false
            }
            None => {
                selected.push(option_id.to_string());
                true
            }
        };
        self.options_slot.stage(self.options.clone());
        now_selected
    }

    /// Reconcile selections with the actions currently offered
    ///
    /// Option ids an action no longer offers are dropped, actions seen for
    /// the first time get their default options and a selected action that
    /// disappeared is deselected.
    pub fn sync_actions(&mut self, actions: &[ActionMeta]) {
        let mut next = BTreeMap::new();
        for action in actions {
            let ids = match self.options.get(&action.id) {
                Some(previous) => previous
                    .iter()
                    .filter(|id| action.option(id).is_some())
                    .cloned()
                    .collect(),
                None => action.default_option_ids(),
            };
            next.insert(action.id.clone(), ids);
        }
        self.options = next;
        self.options_slot.stage(self.options.clone());

        let offered = |id: &String| actions.iter().any(|action| &action.id == id);
        if self.selected_action.as_ref().is_some_and(|id| !offered(id)) {
            debug!("Selected action is no longer offered");
            self.selected_action = None;
            self.action_slot.stage(None);
        }
    }

    pub fn owners(&self) -> &[String] {
        &self.owners
    }

    /// Flip one owner
    ///
    /// # Returns
    /// Whether the owner is selected afterwards
    pub fn toggle_owner(&mut self, owner: &str) -> bool {
        let now_selected = match self.owners.iter().position(|name| name == owner) {
            Some(index) => {
                self.owners.remove(index);
                false
            }
            None => {
                self.owners.push(owner.to_string());
                true
            }
        };
        self.owners_slot.stage(self.owners.clone());
        now_selected
    }

    /// Deselect every owner of `quick` when all are selected, otherwise select them all
    pub fn toggle_quick_owner(&mut self, quick: &QuickOwnerAggregate) {
        if quick.owners.is_empty() {
            return;
        }

        let all_selected = quick.owners.iter().all(|name| self.owners.contains(name));
        if all_selected {
            self.owners.retain(|name| !quick.owners.contains(name));
        } else {
            for name in &quick.owners {
                if !self.owners.contains(name) {
                    self.owners.push(name.clone());
                }
            }
        }
        self.owners_slot.stage(self.owners.clone());
    }

    pub fn set_owners(&mut self, owners: Vec<String>) {
        self.owners = owners;
        self.owners_slot.stage(self.owners.clone());
    }

    pub fn clear_owners(&mut self) {
        self.set_owners(Vec::new());
    }

    /// Drop selected owners the story listing no longer knows
    ///
    /// An empty listing leaves the selection alone.
    pub fn sync_owners(&mut self, known: &[OwnerAggregate]) {
        if known.is_empty() {
            return;
        }
        let before = self.owners.len();
        self.owners
            .retain(|owner| known.iter().any(|aggregate| &aggregate.name == owner));
        if self.owners.len() != before {
            self.owners_slot.stage(self.owners.clone());
        }
    }

    /// Assemble the submission arguments for `action`
    ///
    /// Default args come first, then the args of selected options in the
    /// action's option order, then `--owner` with the selected owners.
    pub fn build_args(&self, action: &ActionMeta, story_ids: &[String]) -> JobArgs {
        let selected = self.options(&action.id);
        let needs_story_ids = STORY_ID_ACTIONS.contains(&action.id.as_str());
        let allow_owner_arg = !NO_OWNER_ARG_ACTIONS.contains(&action.id.as_str());

        let mut args = action.default_args.clone();
        args.extend(
            action
                .options
                .iter()
                .filter(|option| selected.contains(&option.id))
                .flat_map(|option| option.args.iter().cloned()),
        );

        if allow_owner_arg && !self.owners.is_empty() && (!needs_story_ids || story_ids.is_empty()) {
            args.push("--owner".to_string());
            args.push(self.owners.join(","));
        }

        let story_ids = (needs_story_ids && !story_ids.is_empty()).then(|| story_ids.to_vec());
        JobArgs { args, story_ids }
    }

    /// Gate on the current owner selection and build the arguments for `action`
    pub fn prepare(
        &self,
        action: &ActionMeta,
        stories: &StoryCollection,
    ) -> Result<JobArgs, GateError> {
        let matching = stories::filter_by_owners(&stories.stories, &self.owners);
        stories::gate(&self.owners, &matching)?;

        let story_ids: Vec<String> = matching.iter().map(|story| story.id.clone()).collect();
        Ok(self.build_args(action, &story_ids))
    }

    /// Write every staged selection now
    pub fn flush(&self) {
        self.action_slot.flush();
        self.options_slot.flush();
        self.owners_slot.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::testing::action;
    use jobdeck_core::domain::story::StorySummary;

    fn selections() -> (Arc<MemoryStore>, Selections) {
        let store = Arc::new(MemoryStore::new());
        let selections = Selections::new(store.clone());
        (store, selections)
    }

    fn story(id: &str, owner: &str) -> StorySummary {
        StorySummary {
            id: id.to_string(),
            title: id.to_string(),
            status: None,
            owners: vec![owner.to_string()],
            frontend: None,
            iteration: None,
            updated_at: None,
            url: None,
        }
    }

    fn names(owners: &[&str]) -> Vec<String> {
        owners.iter().map(|o| o.to_string()).collect()
    }

    #[test]
    fn test_sync_actions_seeds_defaults_and_drops_stale() {
        let (_, mut selections) = selections();
        selections.select_action("gone");
        selections.toggle_option("sync", "verbose");
        selections.toggle_option("sync", "removed");

        let actions = vec![
            action("sync", &[("verbose", &["-v"], false), ("dry", &["--dry"], true)]),
            action("build", &[("fast", &["--fast"], true), ("slow", &[], false)]),
        ];
        selections.sync_actions(&actions);

        assert_eq!(selections.options("sync"), &["verbose".to_string()]);
        assert_eq!(selections.options("build"), &["fast".to_string()]);
        assert_eq!(selections.selected_action(), None);
    }

    #[test]
    fn test_selections_persist() {
        let (store, mut selections) = selections();
        selections.select_action("sync");
        assert!(selections.toggle_option("sync", "verbose"));
        assert!(selections.toggle_owner("alice"));
        assert!(selections.toggle_owner("bob"));
        assert!(!selections.toggle_owner("alice"));

        let restored = Selections::new(store);
        assert_eq!(restored.selected_action(), Some("sync"));
        assert_eq!(restored.options("sync"), &["verbose".to_string()]);
        assert_eq!(restored.owners(), &["bob".to_string()]);
    }

    #[test]
    fn test_toggle_quick_owner() {
        let (_, mut selections) = selections();
        let quick = QuickOwnerAggregate {
            name: "team".to_string(),
            owners: names(&["alice", "bob"]),
            count: 3,
        };

        selections.toggle_owner("alice");
        selections.toggle_quick_owner(&quick);
        assert_eq!(selections.owners(), names(&["alice", "bob"]).as_slice());

        selections.toggle_owner("carol");
        selections.toggle_quick_owner(&quick);
        assert_eq!(selections.owners(), names(&["carol"]).as_slice());
    }

    #[test]
    fn test_sync_owners_drops_unknown() {
        let (_, mut selections) = selections();
        selections.set_owners(names(&["alice", "ghost"]));

        selections.sync_owners(&[]);
        assert_eq!(selections.owners().len(), 2);

        selections.sync_owners(&[OwnerAggregate {
            name: "alice".to_string(),
            count: 1,
        }]);
        assert_eq!(selections.owners(), names(&["alice"]).as_slice());
    }

    #[test]
    fn test_build_args_orders_default_option_owner() {
        let (_, mut selections) = selections();
        let sync = action(
            "sync",
            &[("a", &["--a"], false), ("b", &["--b1", "--b2"], false)],
        );
        selections.toggle_option("sync", "b");
        selections.toggle_option("sync", "a");
        selections.set_owners(names(&["alice", "bob"]));

        let built = selections.build_args(&sync, &names(&["s1"]));
        assert_eq!(
            built.args,
            names(&["--sync", "--a", "--b1", "--b2", "--owner", "alice,bob"])
        );
        assert_eq!(built.story_ids, None);
    }

    #[test]
    fn test_story_id_actions_send_ids_instead_of_owner() {
        let (_, mut selections) = selections();
        selections.set_owners(names(&["alice"]));

        let pull = action("pull-to-notion", &[]);
        let built = selections.build_args(&pull, &names(&["s1", "s2"]));
        assert_eq!(built.args, names(&["--pull-to-notion"]));
        assert_eq!(built.story_ids, Some(names(&["s1", "s2"])));

        let built = selections.build_args(&pull, &[]);
        assert_eq!(built.args, names(&["--pull-to-notion", "--owner", "alice"]));
        assert_eq!(built.story_ids, None);

        let debug = action("debug-notion", &[]);
        let built = selections.build_args(&debug, &[]);
        assert_eq!(built.args, names(&["--debug-notion"]));
    }

    #[test]
    fn test_prepare_gates_on_owners_and_stories() {
        let (_, mut selections) = selections();
        let pull = action("pull-to-notion", &[]);
        let stories = StoryCollection {
            stories: vec![story("s1", "alice"), story("s2", "bob")],
            total: 2,
            ..Default::default()
        };

        assert_eq!(selections.prepare(&pull, &stories), Err(GateError::NoOwners));

        selections.set_owners(names(&["carol"]));
        assert_eq!(selections.prepare(&pull, &stories), Err(GateError::NoStories));

        selections.set_owners(names(&["bob"]));
        let built = selections.prepare(&pull, &stories).unwrap();
        assert_eq!(built.story_ids, Some(names(&["s2"])));
    }
}
