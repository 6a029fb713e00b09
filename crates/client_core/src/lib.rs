use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{AtUri, Cid, Did},
    protocol::{ProfileQuery, ProfileSnapshot, ProfileUpdate},
};

pub mod cache;
pub mod error;
mod profile_view;
pub mod state;
pub mod transport;

pub use cache::InMemoryProfileCache;
pub use error::ProfileViewError;
pub use profile_view::{AvatarImage, ProfileView};
pub use state::{LoadPhase, MyState, ProfileViewState};
pub use transport::XrpcAgent;

/// Remote operations the profile controller depends on.
///
/// Implementations resolve with a typed payload or fail; retries and
/// timeouts are theirs to handle.
#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn get_profile(&self, query: &ProfileQuery) -> Result<ProfileSnapshot>;
    /// Creates a follow record and returns its uri.
    async fn follow(&self, viewer: &Did, subject: &Did, declaration_cid: &Cid) -> Result<AtUri>;
    async fn unfollow(&self, follow_uri: &AtUri) -> Result<()>;
    async fn upload_blob(&self, path: &Path, encoding: &str) -> Result<Cid>;
    async fn update_profile(&self, record: &ProfileUpdate) -> Result<()>;
}

/// The signed-in viewer, if any.
#[async_trait]
pub trait ViewerSession: Send + Sync {
    async fn viewer_did(&self) -> Option<Did>;
    /// Re-fetches the viewer's own identity record.
    async fn reload(&self) -> Result<()>;
}

/// Process-wide profile snapshots shared between screens. Last writer wins.
#[async_trait]
pub trait ProfileCache: Send + Sync {
    async fn overwrite(&self, actor: &str, snapshot: ProfileSnapshot);
}

/// Session used when no viewer is signed in.
pub struct SignedOutSession;

#[async_trait]
impl ViewerSession for SignedOutSession {
    async fn viewer_did(&self) -> Option<Did> {
        None
    }

    async fn reload(&self) -> Result<()> {
        Ok(())
    }
}
