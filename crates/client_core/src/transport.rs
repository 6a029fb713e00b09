//! XRPC-over-HTTP implementation of the profile collaborators.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{AtUri, Cid, Did, Handle},
    error::{XrpcErrorBody, XrpcException},
    protocol::{
        CreateRecordRequest, CreateRecordResponse, CreateSessionRequest, CreateSessionResponse,
        DeleteRecordRequest, FollowRecord, FollowSubject, GetSessionResponse, ProfileQuery,
        ProfileSnapshot, ProfileUpdate, UploadBlobResponse, FOLLOW_COLLECTION,
    },
};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{ProfileApi, ViewerSession};

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("not signed in")]
    NotSignedIn,
    #[error("invalid record uri: {0}")]
    InvalidRecordUri(String),
    #[error("refusing to delete non-follow record {0}")]
    NotAFollowRecord(String),
}

#[derive(Debug, Clone)]
struct AgentSession {
    did: Did,
    handle: Handle,
    access_jwt: String,
}

pub struct XrpcAgent {
    http: Client,
    service_url: String,
    session: RwLock<Option<AgentSession>>,
}

impl XrpcAgent {
    pub fn new(service_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self::with_http_client(service_url, http))
    }

    pub fn with_http_client(service_url: impl Into<String>, http: Client) -> Self {
        let service_url = service_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            service_url,
            session: RwLock::new(None),
        }
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<Did> {
        let response = self
            .http
            .post(self.xrpc_url("com.atproto.server.createSession"))
            .json(&CreateSessionRequest {
                identifier: identifier.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .context("createSession request failed")?;
        let body: CreateSessionResponse = decode(response).await?;

        info!(did = %body.did, handle = %body.handle, "session: signed in");
        let did = body.did.clone();
        *self.session.write().await = Some(AgentSession {
            did: body.did,
            handle: body.handle,
            access_jwt: body.access_jwt,
        });
        Ok(did)
    }

    pub async fn viewer_handle(&self) -> Option<Handle> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.handle.clone())
    }

    fn xrpc_url(&self, nsid: &str) -> String {
        format!("{}/xrpc/{nsid}", self.service_url)
    }

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.read().await.as_ref() {
            Some(session) => request.bearer_auth(&session.access_jwt),
            None => request,
        }
    }

    async fn require_session(&self) -> Result<AgentSession> {
        self.session
            .read()
            .await
            .clone()
            .ok_or_else(|| AgentError::NotSignedIn.into())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = ensure_success(response).await?;
    let url = response.url().to_string();
    response
        .json()
        .await
        .with_context(|| format!("invalid response body from {url}"))
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let raw = response.text().await.unwrap_or_default();
    let exception = match serde_json::from_str::<XrpcErrorBody>(&raw) {
        Ok(body) => XrpcException::new(status.as_u16(), body),
        Err(_) => XrpcException::from_status(status.as_u16(), &raw),
    };
    Err(exception.into())
}

#[async_trait]
impl ProfileApi for XrpcAgent {
    async fn get_profile(&self, query: &ProfileQuery) -> Result<ProfileSnapshot> {
        let request = self
            .http
            .get(self.xrpc_url("app.bsky.actor.getProfile"))
            .query(&[("actor", query.actor.as_str())]);
        let response = self.authorize(request).await.send().await?;
        decode(response).await
    }

    async fn follow(&self, viewer: &Did, subject: &Did, declaration_cid: &Cid) -> Result<AtUri> {
        let session = self.require_session().await?;
        let record = FollowRecord {
            subject: FollowSubject {
                did: subject.clone(),
                declaration_cid: declaration_cid.clone(),
            },
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let response = self
            .http
            .post(self.xrpc_url("com.atproto.repo.createRecord"))
            .bearer_auth(&session.access_jwt)
            .json(&CreateRecordRequest {
                did: viewer.clone(),
                collection: FOLLOW_COLLECTION.to_string(),
                record: serde_json::to_value(&record)?,
            })
            .send()
            .await?;
        let created: CreateRecordResponse = decode(response).await?;
        debug!(%viewer, %subject, uri = %created.uri, "xrpc: follow record created");
        Ok(created.uri)
    }

    async fn unfollow(&self, follow_uri: &AtUri) -> Result<()> {
        let session = self.require_session().await?;
        let (repo, collection, rkey) = follow_uri
            .record_parts()
            .ok_or_else(|| AgentError::InvalidRecordUri(follow_uri.to_string()))?;
        if collection != FOLLOW_COLLECTION {
            return Err(AgentError::NotAFollowRecord(follow_uri.to_string()).into());
        }

        let response = self
            .http
            .post(self.xrpc_url("com.atproto.repo.deleteRecord"))
            .bearer_auth(&session.access_jwt)
            .json(&DeleteRecordRequest {
                did: Did::from(repo),
                collection: collection.to_string(),
                rkey: rkey.to_string(),
            })
            .send()
            .await?;
        ensure_success(response).await?;
        debug!(%follow_uri, "xrpc: follow record deleted");
        Ok(())
    }

    async fn upload_blob(&self, path: &Path, encoding: &str) -> Result<Cid> {
        let session = self.require_session().await?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let size = bytes.len();
        let response = self
            .http
            .post(self.xrpc_url("com.atproto.blob.upload"))
            .bearer_auth(&session.access_jwt)
            .header(header::CONTENT_TYPE, encoding)
            .body(bytes)
            .send()
            .await?;
        let uploaded: UploadBlobResponse = decode(response).await?;
        debug!(cid = %uploaded.cid, size, encoding, "xrpc: blob uploaded");
        Ok(uploaded.cid)
    }

    async fn update_profile(&self, record: &ProfileUpdate) -> Result<()> {
        let session = self.require_session().await?;
        let response = self
            .http
            .post(self.xrpc_url("app.bsky.actor.updateProfile"))
            .bearer_auth(&session.access_jwt)
            .json(record)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ViewerSession for XrpcAgent {
    async fn viewer_did(&self) -> Option<Did> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.did.clone())
    }

    async fn reload(&self) -> Result<()> {
        let Some(session) = self.session.read().await.clone() else {
            debug!("session: reload skipped, not signed in");
            return Ok(());
        };

        let response = self
            .http
            .get(self.xrpc_url("com.atproto.server.getSession"))
            .bearer_auth(&session.access_jwt)
            .send()
            .await?;
        let body: GetSessionResponse = decode(response).await?;

        let mut guard = self.session.write().await;
        if let Some(current) = guard.as_mut() {
            current.did = body.did;
            current.handle = body.handle;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
