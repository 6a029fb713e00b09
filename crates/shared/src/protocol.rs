use serde::{Deserialize, Serialize};

use crate::domain::{ActorType, AtUri, Cid, Did, Handle};

pub const FOLLOW_COLLECTION: &str = "app.bsky.graph.follow";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileQuery {
    pub actor: String,
}

impl ProfileQuery {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclRef {
    pub cid: Cid,
    pub actor_type: ActorType,
}

/// The viewer's relationship handles as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMyState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow: Option<AtUri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<AtUri>,
}

/// Response of `app.bsky.actor.getProfile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub did: Did,
    pub handle: Handle,
    pub declaration: DeclRef,
    #[serde(default)]
    pub creator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub follows_count: u64,
    #[serde(default)]
    pub members_count: u64,
    #[serde(default)]
    pub posts_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_state: Option<ProfileMyState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobRef {
    pub cid: Cid,
    pub mime_type: String,
}

/// Partial profile record accepted by `app.bsky.actor.updateProfile`.
/// Absent fields are left untouched by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<BlobRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowSubject {
    pub did: Did,
    pub declaration_cid: Cid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRecord {
    pub subject: FollowSubject,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRecordRequest {
    pub did: Did,
    pub collection: String,
    pub record: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRecordResponse {
    pub uri: AtUri,
    pub cid: Cid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRecordRequest {
    pub did: Did,
    pub collection: String,
    pub rkey: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadBlobResponse {
    pub cid: Cid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub access_jwt: String,
    #[serde(default)]
    pub refresh_jwt: String,
    pub did: Did,
    pub handle: Handle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetSessionResponse {
    pub did: Did,
    pub handle: Handle,
}
