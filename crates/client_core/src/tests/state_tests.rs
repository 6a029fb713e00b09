use super::*;
use shared::{domain::Cid, protocol::DeclRef};

fn snapshot() -> ProfileSnapshot {
    ProfileSnapshot {
        did: Did::from("did:plc:carol"),
        handle: Handle::from("carol.test"),
        declaration: DeclRef {
            cid: Cid::from("bafy-decl"),
            actor_type: ActorType::User,
        },
        creator: "did:plc:carol".to_string(),
        display_name: Some("Carol".to_string()),
        description: Some("see https://carol.example.com".to_string()),
        avatar: Some("https://cdn.test/avatar.jpg".to_string()),
        followers_count: 8,
        follows_count: 2,
        members_count: 0,
        posts_count: 40,
        my_state: Some(ProfileMyState {
            follow: Some(AtUri::from("at://did:me/app.bsky.graph.follow/9")),
            member: None,
        }),
    }
}

#[test]
fn default_state_is_initial() {
    let state = ProfileViewState::default();
    assert_eq!(state.phase(), LoadPhase::Initial);
    assert!(!state.has_content());
    assert!(!state.is_empty());
    assert!(!state.is_user());
    assert!(!state.is_scene());
}

#[test]
fn load_transitions_walk_the_phases() {
    let mut state = ProfileViewState::default();

    state.begin_load(false);
    assert_eq!(state.phase(), LoadPhase::Loading);

    state.finish_load(Some("bad gateway".to_string()));
    assert_eq!(state.phase(), LoadPhase::IdleError);

    state.begin_load(true);
    assert_eq!(state.phase(), LoadPhase::Refreshing);
    assert!(!state.has_error());

    state.finish_load(None);
    assert_eq!(state.phase(), LoadPhase::Idle);
    assert!(state.has_loaded);
}

#[test]
fn stale_load_only_reports_change_once() {
    let mut state = ProfileViewState::default();
    assert!(state.observe_stale_load());
    assert!(!state.observe_stale_load());
    assert!(state.has_loaded);
}

#[test]
fn replace_all_maps_every_field() {
    let mut state = ProfileViewState::default();
    state.replace_all(&snapshot(), false);

    assert_eq!(state.did, Did::from("did:plc:carol"));
    assert_eq!(state.handle, Handle::from("carol.test"));
    assert_eq!(state.declaration.cid, Cid::from("bafy-decl"));
    assert!(state.is_user());
    assert_eq!(state.creator, "did:plc:carol");
    assert_eq!(state.display_name.as_deref(), Some("Carol"));
    assert_eq!(state.avatar.as_deref(), Some("https://cdn.test/avatar.jpg"));
    assert_eq!(
        (
            state.followers_count,
            state.follows_count,
            state.members_count,
            state.posts_count
        ),
        (8, 2, 0, 40)
    );
    assert_eq!(
        state.my_state.follow,
        Some(AtUri::from("at://did:me/app.bsky.graph.follow/9"))
    );
    assert_eq!(state.description_entities.len(), 1);
    assert_eq!(
        state.description_entities[0].value,
        "https://carol.example.com"
    );
}

#[test]
fn replace_all_keeps_local_follow_pair_when_asked() {
    let mut state = ProfileViewState::default();
    state.apply_follow(AtUri::from("at://local/1"));

    let mut incoming = snapshot();
    incoming.my_state = Some(ProfileMyState {
        follow: None,
        member: Some(AtUri::from("at://member/1")),
    });
    state.replace_all(&incoming, true);

    assert_eq!(state.followers_count, 1);
    assert_eq!(state.my_state.follow, Some(AtUri::from("at://local/1")));
    assert_eq!(state.my_state.member, Some(AtUri::from("at://member/1")));
    assert_eq!(state.posts_count, 40);
}

#[test]
fn replace_all_without_my_state_keeps_relationship() {
    let mut state = ProfileViewState::default();
    state.my_state.member = Some(AtUri::from("at://member/2"));

    let mut incoming = snapshot();
    incoming.my_state = None;
    state.replace_all(&incoming, false);

    assert_eq!(state.my_state.member, Some(AtUri::from("at://member/2")));
    assert_eq!(state.my_state.follow, None);
}

#[test]
fn unfollow_never_drops_counter_below_zero() {
    let mut state = ProfileViewState::default();
    state.my_state.follow = Some(AtUri::from("at://f/1"));

    state.apply_unfollow();

    assert_eq!(state.followers_count, 0);
    assert_eq!(state.my_state.follow, None);
}

#[test]
fn unknown_actor_type_is_neither_user_nor_scene() {
    let mut state = ProfileViewState::default();
    state.declaration.actor_type = ActorType::from("app.bsky.system.actorBot".to_string());
    assert!(!state.is_user());
    assert!(!state.is_scene());
}

#[test]
fn repeated_follow_with_same_uri_counts_once() {
    let mut state = ProfileViewState::default();
    state.replace_all(&snapshot(), false);
    let before = state.followers_count;

    state.apply_follow(AtUri::from("at://f/1"));
    state.apply_follow(AtUri::from("at://f/1"));

    assert_eq!(state.followers_count, before + 1);
    assert_eq!(state.my_state.follow, Some(AtUri::from("at://f/1")));
}
