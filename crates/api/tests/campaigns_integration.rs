//! Integration tests for campaign and membership endpoints.
//!
//! Run with: cargo test --test campaigns_integration

mod common;

use axum::http::{Method, StatusCode};
use common::{
    empty_request_with_auth, get_request_with_auth, json_request_with_auth, parse_response_body,
    test_config, TestApp,
};
use domain::services::MockInviteNotifier;
use serde_json::json;

// ============================================================================
// Campaigns
// ============================================================================

#[tokio::test]
async fn test_create_campaign_with_generated_name() {
    let app = TestApp::new();
    let owner = app.user("dm@example.com");

    for expected in ["Campaign #1", "Campaign #2"] {
        let response = app
            .send(json_request_with_auth(
                Method::POST,
                "/api/v1/campaigns",
                json!({ "name": "   " }),
                &owner.token,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = parse_response_body(response).await;
        assert_eq!(body["name"], expected);
        assert_eq!(body["game_system"], "dnd-5e");
        assert_eq!(body["owner_id"], owner.user_id.to_string());
    }
}

#[tokio::test]
async fn test_get_campaign_includes_role_and_party_fund() {
    let app = TestApp::new();
    let owner = app.user("dm@example.com");
    let response = app
        .send(json_request_with_auth(
            Method::POST,
            "/api/v1/campaigns",
            json!({ "name": "Kingmaker", "game_system": "pathfinder-1e", "party_fund_gets_share": true }),
            &owner.token,
        ))
        .await;
    let created = parse_response_body(response).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .send(get_request_with_auth(&format!("/api/v1/campaigns/{}", id), &owner.token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["name"], "Kingmaker");
    assert_eq!(body["game_system"], "pathfinder-1e");
    assert_eq!(body["party_fund_gets_share"], true);
    assert_eq!(body["your_role"], "owner");
    assert_eq!(body["party_fund"]["balance_gp"], 0.0);
}

#[tokio::test]
async fn test_list_campaigns_only_shows_memberships() {
    let app = TestApp::new();
    let alice = app.user("alice@example.com");
    let bob = app.user("bob@example.com");
    app.create_campaign(&alice, "Alice's Game").await;
    app.create_campaign(&bob, "Bob's Game").await;

    let response = app
        .send(get_request_with_auth("/api/v1/campaigns", &alice.token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let campaigns = body["campaigns"].as_array().unwrap();
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0]["name"], "Alice's Game");
    assert_eq!(campaigns[0]["your_role"], "owner");
}

#[tokio::test]
async fn test_rename_campaign_by_contributor_follows_policy() {
    let app = TestApp::new();
    let owner = app.user("dm@example.com");
    let player = app.user("player@example.com");
    let viewer = app.user("viewer@example.com");
    let campaign_id = app.create_campaign(&owner, "Old Name").await;
    app.join(&owner, campaign_id, &player, "player").await;
    app.join(&owner, campaign_id, &viewer, "viewer").await;
    let uri = format!("/api/v1/campaigns/{}", campaign_id);

    let response = app
        .send(json_request_with_auth(
            Method::PATCH,
            &uri,
            json!({ "name": "  New Name  " }),
            &player.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["name"], "New Name");

    let response = app
        .send(json_request_with_auth(
            Method::PATCH,
            &uri,
            json!({ "name": "Viewer Name" }),
            &viewer.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_rename_restricted_to_owner_when_configured() {
    let mut config = test_config();
    config.permissions.contributors_can_rename = false;
    let app = TestApp::with_config(config, MockInviteNotifier::new());
    let owner = app.user("dm@example.com");
    let player = app.user("player@example.com");
    let campaign_id = app.create_campaign(&owner, "Old Name").await;
    app.join(&owner, campaign_id, &player, "player").await;

    let response = app
        .send(json_request_with_auth(
            Method::PATCH,
            &format!("/api/v1/campaigns/{}", campaign_id),
            json!({ "name": "New Name" }),
            &player.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_rename_rejects_overlong_name() {
    let app = TestApp::new();
    let owner = app.user("dm@example.com");
    let campaign_id = app.create_campaign(&owner, "Old Name").await;

    let response = app
        .send(json_request_with_auth(
            Method::PATCH,
            &format!("/api/v1/campaigns/{}", campaign_id),
            json!({ "name": "x".repeat(101) }),
            &owner.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_campaign_requires_matching_name() {
    let app = TestApp::new();
    let owner = app.user("dm@example.com");
    let campaign_id = app.create_campaign(&owner, "Doomed").await;
    let uri = format!("/api/v1/campaigns/{}", campaign_id);

    let response = app
        .send(json_request_with_auth(
            Method::DELETE,
            &uri,
            json!({ "confirm_name": "doomed" }),
            &owner.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(json_request_with_auth(
            Method::DELETE,
            &uri,
            json!({ "confirm_name": "Doomed" }),
            &owner.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.send(get_request_with_auth(&uri, &owner.token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contributor_cannot_delete_campaign() {
    let app = TestApp::new();
    let owner = app.user("dm@example.com");
    let player = app.user("player@example.com");
    let campaign_id = app.create_campaign(&owner, "Safe").await;
    app.join(&owner, campaign_id, &player, "player").await;

    let response = app
        .send(json_request_with_auth(
            Method::DELETE,
            &format!("/api/v1/campaigns/{}", campaign_id),
            json!({ "confirm_name": "Safe" }),
            &player.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Members
// ============================================================================

#[tokio::test]
async fn test_list_members_owner_first_with_emails() {
    let app = TestApp::new();
    let owner = app.user("dm@example.com");
    let player = app.user("player@example.com");
    let campaign_id = app.create_campaign(&owner, "Members").await;
    app.join(&owner, campaign_id, &player, "viewer").await;

    let response = app
        .send(get_request_with_auth(
            &format!("/api/v1/campaigns/{}/members", campaign_id),
            &player.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let members = body["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["role"], "owner");
    assert_eq!(members[0]["email"], "dm@example.com");
    assert_eq!(members[0]["is_you"], false);
    assert_eq!(members[1]["email"], "player@example.com");
    assert_eq!(members[1]["is_you"], true);
}

#[tokio::test]
async fn test_owner_changes_member_role() {
    let app = TestApp::new();
    let owner = app.user("dm@example.com");
    let player = app.user("player@example.com");
    let campaign_id = app.create_campaign(&owner, "Roles").await;
    app.join(&owner, campaign_id, &player, "player").await;
    let uri = format!("/api/v1/campaigns/{}/members/{}", campaign_id, player.user_id);

    let response = app
        .send(json_request_with_auth(
            Method::PATCH,
            &uri,
            json!({ "role": "viewer" }),
            &owner.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["role"], "viewer");

    // Owner cannot be handed out
    let response = app
        .send(json_request_with_auth(
            Method::PATCH,
            &uri,
            json!({ "role": "owner" }),
            &owner.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_contributor_cannot_change_roles() {
    let app = TestApp::new();
    let owner = app.user("dm@example.com");
    let player = app.user("player@example.com");
    let viewer = app.user("viewer@example.com");
    let campaign_id = app.create_campaign(&owner, "Roles").await;
    app.join(&owner, campaign_id, &player, "player").await;
    app.join(&owner, campaign_id, &viewer, "viewer").await;

    let response = app
        .send(json_request_with_auth(
            Method::PATCH,
            &format!("/api/v1/campaigns/{}/members/{}", campaign_id, viewer.user_id),
            json!({ "role": "contributor" }),
            &player.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_owner_removes_member() {
    let app = TestApp::new();
    let owner = app.user("dm@example.com");
    let player = app.user("player@example.com");
    let campaign_id = app.create_campaign(&owner, "Removal").await;
    app.join(&owner, campaign_id, &player, "player").await;

    let response = app
        .send(empty_request_with_auth(
            Method::DELETE,
            &format!("/api/v1/campaigns/{}/members/{}", campaign_id, player.user_id),
            &owner.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .send(get_request_with_auth(
            &format!("/api/v1/campaigns/{}", campaign_id),
            &player.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_cannot_remove_self_or_leave() {
    let app = TestApp::new();
    let owner = app.user("dm@example.com");
    let campaign_id = app.create_campaign(&owner, "Mine").await;

    let response = app
        .send(empty_request_with_auth(
            Method::DELETE,
            &format!("/api/v1/campaigns/{}/members/{}", campaign_id, owner.user_id),
            &owner.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(empty_request_with_auth(
            Method::POST,
            &format!("/api/v1/campaigns/{}/leave", campaign_id),
            &owner.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_member_leaves_campaign() {
    let app = TestApp::new();
    let owner = app.user("dm@example.com");
    let player = app.user("player@example.com");
    let campaign_id = app.create_campaign(&owner, "Leaving").await;
    app.join(&owner, campaign_id, &player, "player").await;

    let response = app
        .send(empty_request_with_auth(
            Method::POST,
            &format!("/api/v1/campaigns/{}/leave", campaign_id),
            &player.token,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .send(get_request_with_auth("/api/v1/campaigns", &player.token))
        .await;
    let body = parse_response_body(response).await;
    assert!(body["campaigns"].as_array().unwrap().is_empty());
}
