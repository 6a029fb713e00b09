use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use client_core::{
    InMemoryProfileCache, LoadPhase, ProfileView, ViewerSession, XrpcAgent,
};
use serde_json::{json, Value};
use shared::{
    domain::AtUri,
    protocol::{ProfileQuery, ProfileUpdate},
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Default)]
struct RemoteModel {
    followers: u64,
    follow: Option<String>,
    display_name: String,
}

type Shared = Arc<Mutex<RemoteModel>>;

async fn handle_xrpc(
    State(model): State<Shared>,
    Path(nsid): Path<String>,
    Query(_query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let mut model = model.lock().await;
    match nsid.as_str() {
        "com.atproto.server.createSession" => Json(json!({
            "accessJwt": "jwt",
            "did": "did:plc:viewer",
            "handle": "viewer.test",
        }))
        .into_response(),
        "com.atproto.server.getSession" => Json(json!({
            "did": "did:plc:viewer",
            "handle": "viewer.test",
        }))
        .into_response(),
        "app.bsky.actor.getProfile" => {
            let mut my_state = json!({});
            if let Some(follow) = &model.follow {
                my_state["follow"] = Value::String(follow.clone());
            }
            Json(json!({
                "did": "did:plc:alice",
                "handle": "alice.test",
                "declaration": { "cid": "bafy-decl", "actorType": "app.bsky.system.actorUser" },
                "creator": "did:plc:alice",
                "displayName": model.display_name,
                "followersCount": model.followers,
                "followsCount": 1,
                "membersCount": 0,
                "postsCount": 2,
                "myState": my_state,
            }))
            .into_response()
        }
        "com.atproto.repo.createRecord" => {
            let uri = "at://did:plc:viewer/app.bsky.graph.follow/abc".to_string();
            model.followers += 1;
            model.follow = Some(uri.clone());
            Json(json!({ "uri": uri, "cid": "bafy-follow" })).into_response()
        }
        "com.atproto.repo.deleteRecord" => {
            model.followers = model.followers.saturating_sub(1);
            model.follow = None;
            StatusCode::OK.into_response()
        }
        "app.bsky.actor.updateProfile" => {
            let record: Value = serde_json::from_slice(&body).unwrap_or_default();
            if let Some(name) = record["displayName"].as_str() {
                model.display_name = name.to_string();
            }
            StatusCode::OK.into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_remote(model: RemoteModel) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/xrpc/:nsid", get(handle_xrpc).post(handle_xrpc))
        .with_state(Arc::new(Mutex::new(model)));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn profile_screen_follow_unfollow_and_edit_acceptance() {
    let server_url = spawn_remote(RemoteModel {
        followers: 10,
        follow: None,
        display_name: "Alice".to_string(),
    })
    .await;
    let agent = Arc::new(
        XrpcAgent::new(server_url, client_core::transport::DEFAULT_HTTP_TIMEOUT).expect("agent"),
    );
    agent.login("viewer.test", "pw").await.expect("login");
    let cache = Arc::new(InMemoryProfileCache::new());
    let view = ProfileView::new(
        ProfileQuery::new("alice.test"),
        agent.clone(),
        agent.clone(),
        cache.clone(),
    );

    view.setup().await;
    let loaded = view.state();
    assert_eq!(loaded.phase(), LoadPhase::Idle);
    assert_eq!(loaded.followers_count, 10);
    assert!(loaded.is_user());
    assert_eq!(
        cache.get("alice.test").await.expect("cached").followers_count,
        10
    );

    view.toggle_following().await.expect("follow");
    let followed = view.state();
    assert_eq!(followed.followers_count, 11);
    assert_eq!(
        followed.my_state.follow,
        Some(AtUri::from("at://did:plc:viewer/app.bsky.graph.follow/abc"))
    );

    view.refresh().await;
    assert_eq!(view.state().followers_count, 11);
    assert_eq!(
        cache.get("alice.test").await.expect("cached").followers_count,
        11
    );

    view.toggle_following().await.expect("unfollow");
    assert_eq!(view.state().followers_count, 10);
    assert_eq!(view.state().my_state.follow, None);

    view.update_profile(
        ProfileUpdate {
            display_name: Some("Alice Liddell".to_string()),
            ..ProfileUpdate::default()
        },
        None,
        None,
    )
    .await
    .expect("update");
    assert_eq!(view.state().display_name.as_deref(), Some("Alice Liddell"));
    assert!(agent.viewer_did().await.is_some());
}
