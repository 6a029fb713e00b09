//! Observable view-state of a single profile screen.
//!
//! Every mutation goes through one of the transition methods below, each
//! applied as a single `watch::Sender::send_modify` by the controller, so an
//! observer never sees a partially applied update.

use serde::Serialize;
use shared::{
    domain::{ActorType, AtUri, Did, Handle},
    entities::{extract_entities, Entity},
    protocol::{DeclRef, ProfileMyState, ProfileSnapshot},
};

/// The viewer's relationship to the displayed actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MyState {
    pub follow: Option<AtUri>,
    pub member: Option<AtUri>,
}

impl MyState {
    /// Copies the fields the server reported; absent fields keep their value.
    fn merge(&mut self, incoming: &ProfileMyState) {
        if let Some(follow) = &incoming.follow {
            self.follow = Some(follow.clone());
        }
        if let Some(member) = &incoming.member {
            self.member = Some(member.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    Initial,
    Loading,
    Refreshing,
    Idle,
    IdleError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileViewState {
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub has_loaded: bool,
    pub error: String,

    pub did: Did,
    pub handle: Handle,
    pub declaration: DeclRef,
    pub creator: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub followers_count: u64,
    pub follows_count: u64,
    pub members_count: u64,
    pub posts_count: u64,
    pub my_state: MyState,
    pub description_entities: Vec<Entity>,

    /// Local-only banner value; never sent to the server.
    pub user_banner: Option<String>,
}

impl ProfileViewState {
    pub fn has_content(&self) -> bool {
        !self.did.is_empty()
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.has_loaded && !self.has_content()
    }

    pub fn is_user(&self) -> bool {
        self.declaration.actor_type == ActorType::User
    }

    pub fn is_scene(&self) -> bool {
        self.declaration.actor_type == ActorType::Scene
    }

    pub fn phase(&self) -> LoadPhase {
        match (self.is_loading, self.is_refreshing, self.has_loaded) {
            (true, true, _) => LoadPhase::Refreshing,
            (true, false, _) => LoadPhase::Loading,
            (false, _, false) => LoadPhase::Initial,
            (false, _, true) if self.has_error() => LoadPhase::IdleError,
            (false, _, true) => LoadPhase::Idle,
        }
    }

    pub(crate) fn begin_load(&mut self, is_refreshing: bool) {
        self.is_loading = true;
        self.is_refreshing = is_refreshing;
        self.error.clear();
    }

    /// Settles the newest load. `error` is `None` on success.
    pub(crate) fn finish_load(&mut self, error: Option<String>) {
        self.is_loading = false;
        self.is_refreshing = false;
        self.has_loaded = true;
        self.error = error.unwrap_or_default();
    }

    /// Marks an outdated load as resolved. Returns whether anything changed.
    pub(crate) fn observe_stale_load(&mut self) -> bool {
        let changed = !self.has_loaded;
        self.has_loaded = true;
        changed
    }

    /// Full replacement from a fetched snapshot.
    ///
    /// With `keep_follow_pair` set, `followers_count` and `my_state.follow`
    /// keep their local values: a follow toggle landed after the fetch was
    /// issued and is newer than what the server reported.
    pub(crate) fn replace_all(&mut self, snapshot: &ProfileSnapshot, keep_follow_pair: bool) {
        let ProfileSnapshot {
            did,
            handle,
            declaration,
            creator,
            display_name,
            description,
            avatar,
            followers_count,
            follows_count,
            members_count,
            posts_count,
            my_state,
        } = snapshot;

        self.did = did.clone();
        self.handle = handle.clone();
        self.declaration = declaration.clone();
        self.creator = creator.clone();
        self.display_name = display_name.clone();
        self.description = description.clone();
        self.avatar = avatar.clone();
        self.follows_count = *follows_count;
        self.members_count = *members_count;
        self.posts_count = *posts_count;

        if keep_follow_pair {
            if let Some(incoming) = my_state {
                if let Some(member) = &incoming.member {
                    self.my_state.member = Some(member.clone());
                }
            }
        } else {
            self.followers_count = *followers_count;
            if let Some(incoming) = my_state {
                self.my_state.merge(incoming);
            }
        }

        self.description_entities = extract_entities(self.description.as_deref().unwrap_or(""));
    }

    pub(crate) fn apply_follow(&mut self, follow_uri: AtUri) {
        if self.my_state.follow.as_ref() == Some(&follow_uri) {
            return;
        }
        self.followers_count += 1;
        self.my_state.follow = Some(follow_uri);
    }

    /// Sets the follow handle and leaves `followers_count` as fetched.
    pub(crate) fn set_follow_handle(&mut self, follow_uri: Option<AtUri>) {
        self.my_state.follow = follow_uri;
    }

    pub(crate) fn apply_unfollow(&mut self) {
        self.followers_count = self.followers_count.saturating_sub(1);
        self.my_state.follow = None;
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
