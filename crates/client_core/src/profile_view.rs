use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use shared::protocol::{BlobRef, ProfileQuery, ProfileUpdate};
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::{
    error::ProfileViewError, state::ProfileViewState, ProfileApi, ProfileCache, ViewerSession,
};

/// A locally picked image to be uploaded as the new avatar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarImage {
    pub path: PathBuf,
    pub mime: String,
}

struct ProfileViewInner {
    /// Tag of the most recently issued load.
    latest_load: u64,
    /// Tag of the last load whose data replaced the state.
    applied_load: u64,
    /// Bumped every time a follow toggle is applied.
    relationship_epoch: u64,
}

/// View-state controller for one profile screen, bound to one actor.
///
/// Load failures are kept in [`ProfileViewState::error`]; action failures
/// are returned to the caller and leave the state untouched.
pub struct ProfileView {
    query: ProfileQuery,
    api: Arc<dyn ProfileApi>,
    session: Arc<dyn ViewerSession>,
    cache: Arc<dyn ProfileCache>,
    inner: Mutex<ProfileViewInner>,
    mutation: Mutex<()>,
    state: watch::Sender<ProfileViewState>,
}

impl ProfileView {
    pub fn new(
        query: ProfileQuery,
        api: Arc<dyn ProfileApi>,
        session: Arc<dyn ViewerSession>,
        cache: Arc<dyn ProfileCache>,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(ProfileViewState::default());
        Arc::new(Self {
            query,
            api,
            session,
            cache,
            inner: Mutex::new(ProfileViewInner {
                latest_load: 0,
                applied_load: 0,
                relationship_epoch: 0,
            }),
            mutation: Mutex::new(()),
            state,
        })
    }

    pub fn actor(&self) -> &str {
        &self.query.actor
    }

    pub fn state(&self) -> ProfileViewState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProfileViewState> {
        self.state.subscribe()
    }

    pub fn changes(&self) -> WatchStream<ProfileViewState> {
        WatchStream::new(self.state.subscribe())
    }

    pub async fn setup(&self) {
        self.load(false).await;
    }

    pub async fn refresh(&self) {
        self.load(true).await;
    }

    pub async fn toggle_following(&self) -> Result<()> {
        let Some(viewer) = self.session.viewer_did().await else {
            return Err(ProfileViewError::NotAuthenticated.into());
        };

        let _mutation = self.mutation.lock().await;
        let (issued_after, current_follow, did, declaration_cid) = {
            let guard = self.inner.lock().await;
            let state = self.state.borrow();
            (
                guard.latest_load,
                state.my_state.follow.clone(),
                state.did.clone(),
                state.declaration.cid.clone(),
            )
        };

        match current_follow {
            Some(follow_uri) => {
                self.api.unfollow(&follow_uri).await?;
                let mut guard = self.inner.lock().await;
                guard.relationship_epoch += 1;
                let superseded = guard.applied_load > issued_after;
                info!(actor = %self.query.actor, %follow_uri, superseded, "profile: unfollowed");
                self.state.send_modify(|state| {
                    if superseded {
                        state.set_follow_handle(None);
                    } else {
                        state.apply_unfollow();
                    }
                });
            }
            None => {
                if did.is_empty() {
                    return Err(ProfileViewError::MissingFollowTarget {
                        actor: self.query.actor.clone(),
                    }
                    .into());
                }
                let follow_uri = self.api.follow(&viewer, &did, &declaration_cid).await?;
                let mut guard = self.inner.lock().await;
                guard.relationship_epoch += 1;
                // a load issued after the toggle already carries the server's count
                let superseded = guard.applied_load > issued_after;
                info!(actor = %self.query.actor, %follow_uri, superseded, "profile: followed");
                self.state.send_modify(move |state| {
                    if superseded {
                        state.set_follow_handle(Some(follow_uri));
                    } else {
                        state.apply_follow(follow_uri);
                    }
                });
            }
        }

        Ok(())
    }

    /// Submits `updates`, then reloads the viewer identity and re-fetches
    /// this profile instead of patching fields locally.
    ///
    /// `banner` is stored locally only.
    pub async fn update_profile(
        &self,
        updates: ProfileUpdate,
        new_avatar: Option<AvatarImage>,
        banner: Option<String>,
    ) -> Result<()> {
        self.state.send_modify(|state| state.user_banner = banner);

        let mut record = updates;
        if let Some(image) = new_avatar {
            let cid = self
                .api
                .upload_blob(&image.path, &image.mime)
                .await
                .with_context(|| format!("failed to upload avatar {}", image.path.display()))?;
            debug!(actor = %self.query.actor, %cid, "profile: avatar uploaded");
            record.avatar = Some(BlobRef {
                cid,
                mime_type: image.mime,
            });
        }

        self.api.update_profile(&record).await?;
        self.session
            .reload()
            .await
            .context("failed to reload viewer identity")?;
        self.refresh().await;
        Ok(())
    }

    async fn load(&self, is_refreshing: bool) {
        let (seq, issued_epoch) = {
            let mut guard = self.inner.lock().await;
            guard.latest_load += 1;
            self.state
                .send_modify(|state| state.begin_load(is_refreshing));
            (guard.latest_load, guard.relationship_epoch)
        };
        debug!(actor = %self.query.actor, seq, is_refreshing, "profile: load started");

        let result = self.api.get_profile(&self.query).await;

        if let Ok(snapshot) = &result {
            self.cache
                .overwrite(&self.query.actor, snapshot.clone())
                .await;
        }

        let mut guard = self.inner.lock().await;
        if seq != guard.latest_load {
            debug!(
                actor = %self.query.actor,
                seq,
                latest = guard.latest_load,
                "profile: discarding outdated load result"
            );
            self.state
                .send_if_modified(|state| state.observe_stale_load());
            return;
        }

        match result {
            Ok(snapshot) => {
                let keep_follow_pair = guard.relationship_epoch != issued_epoch;
                guard.applied_load = seq;
                self.state.send_modify(|state| {
                    state.replace_all(&snapshot, keep_follow_pair);
                    state.finish_load(None);
                });
                debug!(actor = %self.query.actor, did = %snapshot.did, "profile: loaded");
            }
            Err(err) => {
                warn!(actor = %self.query.actor, "profile: load failed: {err:#}");
                let message = format!("{err:#}");
                self.state
                    .send_modify(move |state| state.finish_load(Some(message)));
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/profile_view_tests.rs"]
mod tests;
