use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

pub mod friends;
pub mod health;
pub mod matches;
pub mod matchmaking;
pub mod profile;

pub fn app(state: AppState) -> Router {
    // ToDo: Tighten this up
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .merge(matchmaking::routes())
        .merge(matches::routes())
        .merge(profile::routes())
        .merge(friends::routes())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use shared::config::MatchmakingConfig;
    use shared::models::friendship::{Friendship, FriendshipStatus};
    use shared::models::profile::Profile;
    use shared::repositories::errors::friendship_repository_errors::FriendshipRepositoryError;
    use shared::repositories::errors::profile_repository_errors::ProfileRepositoryError;
    use shared::repositories::friendship_repository::FriendshipRepository;
    use shared::repositories::in_memory_match_repository::InMemoryMatchRepository;
    use shared::repositories::profile_repository::ProfileRepository;
    use shared::services::auth_service::{AuthService, AuthServiceTrait};
    use shared::services::friendship_service::FriendshipService;
    use shared::services::matchmaking_service::MatchmakingService;
    use shared::services::profile_service::ProfileService;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use lambda_http::tower::ServiceExt;

    #[derive(Default)]
    struct FakeProfiles(Mutex<HashMap<String, Profile>>);

    #[async_trait]
    impl ProfileRepository for FakeProfiles {
        async fn create_profile(&self, profile: &Profile) -> Result<(), ProfileRepositoryError> {
            let mut profiles = self.0.lock().unwrap();
            if profiles.contains_key(&profile.id) {
                return Err(ProfileRepositoryError::AlreadyExists);
            }
            profiles.insert(profile.id.clone(), profile.clone());
            Ok(())
        }

        async fn get_profile(&self, user_id: &str) -> Result<Profile, ProfileRepositoryError> {
            self.0
                .lock()
                .unwrap()
                .get(user_id)
                .cloned()
                .ok_or(ProfileRepositoryError::NotFound)
        }

        async fn update_profile(&self, profile: &Profile) -> Result<(), ProfileRepositoryError> {
            let mut profiles = self.0.lock().unwrap();
            match profiles.get_mut(&profile.id) {
                Some(existing) => {
                    *existing = profile.clone();
                    Ok(())
                }
                None => Err(ProfileRepositoryError::NotFound),
            }
        }
    }

    #[derive(Default)]
    struct FakeFriendships(Mutex<HashMap<String, Friendship>>);

    #[async_trait]
    impl FriendshipRepository for FakeFriendships {
        async fn create_friendship(
            &self,
            friendship: &Friendship,
        ) -> Result<(), FriendshipRepositoryError> {
            let mut friendships = self.0.lock().unwrap();
            if friendships.contains_key(&friendship.pair_key) {
                return Err(FriendshipRepositoryError::AlreadyExists);
            }
            friendships.insert(friendship.pair_key.clone(), friendship.clone());
            Ok(())
        }

        async fn accept_friendship(
            &self,
            pair_key: &str,
            target_id: &str,
        ) -> Result<(), FriendshipRepositoryError> {
            let mut friendships = self.0.lock().unwrap();
            match friendships.get_mut(pair_key) {
                Some(f) if f.status == FriendshipStatus::Pending && f.friend_id == target_id => {
                    f.status = FriendshipStatus::Accepted;
                    Ok(())
                }
                _ => Err(FriendshipRepositoryError::NotFound),
            }
        }

        async fn count_accepted(&self, user_id: &str) -> Result<usize, FriendshipRepositoryError> {
            Ok(self
                .0
                .lock()
                .unwrap()
                .values()
                .filter(|f| f.status == FriendshipStatus::Accepted && f.involves(user_id))
                .count())
        }
    }

    struct TestApp {
        router: Router,
        auth: Arc<AuthService>,
    }

    impl TestApp {
        fn new() -> Self {
            let matches = Arc::new(InMemoryMatchRepository::new());
            let profiles = Arc::new(FakeProfiles::default());
            let friendships = Arc::new(FakeFriendships::default());
            let auth = Arc::new(AuthService::with_jwt_secret("test-secret".to_string()));

            let state = AppState {
                auth_service: auth.clone(),
                matchmaking_service: Arc::new(MatchmakingService::new(
                    matches.clone(),
                    MatchmakingConfig::default(),
                )),
                profile_service: Arc::new(ProfileService::new(
                    profiles.clone(),
                    matches.clone(),
                    friendships.clone(),
                )),
                friendship_service: Arc::new(FriendshipService::new(friendships, matches.clone())),
                matches,
                profiles,
            };

            TestApp {
                router: app(state),
                auth,
            }
        }

        async fn call(
            &self,
            method: &str,
            uri: &str,
            user: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(user) = user {
                let token = self
                    .auth
                    .generate_token(user, Some(format!("{}@example.com", user)))
                    .unwrap()
                    .token;
                builder = builder.header("Authorization", format!("Bearer {}", token));
            }
            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, value)
        }

        async fn paired_match(&self) -> String {
            let (_, waiting) = self.call("POST", "/matchmaking/search", Some("alice"), None).await;
            let (_, joined) = self.call("POST", "/matchmaking/search", Some("bob"), None).await;
            assert_eq!(waiting["match"]["id"], joined["match"]["id"]);
            joined["match"]["id"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = TestApp::new();

        let (status, _) = app.call("GET", "/health", None, None).await;

        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = TestApp::new();

        let (status, body) = app.call("POST", "/matchmaking/search", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_search_pairs_two_players() {
        let app = TestApp::new();

        let (status, waiting) = app.call("POST", "/matchmaking/search", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(waiting["outcome"], "waiting");
        assert_eq!(waiting["match"]["status"], "waiting");

        let (status, joined) = app.call("POST", "/matchmaking/search", Some("bob"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(joined["outcome"], "joined");
        assert_eq!(joined["match"]["status"], "active");
        assert_eq!(joined["match"]["player1_id"], "alice");
        assert_eq!(joined["match"]["player2_id"], "bob");
    }

    #[tokio::test]
    async fn test_cancel_search_by_owner_only() {
        let app = TestApp::new();
        let (_, waiting) = app.call("POST", "/matchmaking/search", Some("alice"), None).await;
        let uri = format!("/matchmaking/{}", waiting["match"]["id"].as_str().unwrap());

        let (status, _) = app.call("DELETE", &uri, Some("bob"), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app.call("DELETE", &uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cancelled"], true);

        let (status, _) = app.call("DELETE", &uri, Some("alice"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_match_view_and_moves() {
        let app = TestApp::new();
        app.call("GET", "/profile", Some("alice"), None).await;
        let match_id = app.paired_match().await;

        let (status, view) = app
            .call("GET", &format!("/matches/{}", match_id), Some("alice"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["your_color"], "white");
        assert_eq!(view["side_to_move"], "white");
        assert_eq!(view["legal_moves"].as_array().unwrap().len(), 20);
        assert_eq!(view["white"]["username"], "alice");
        assert!(view["black"].is_null());

        let moves_uri = format!("/matches/{}/moves", match_id);
        let (status, view) = app
            .call("POST", &moves_uri, Some("alice"), Some(json!({"from": "e2", "to": "e4"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["match"]["moves"], json!(["e2e4"]));
        assert_eq!(view["side_to_move"], "black");
        assert!(view["legal_moves"].as_array().unwrap().is_empty());

        let (status, _) = app
            .call("POST", &moves_uri, Some("alice"), Some(json!({"from": "d2", "to": "d4"})))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .call("POST", &moves_uri, Some("bob"), Some(json!({"from": "e7", "to": "e4"})))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_outsider_cannot_view_match() {
        let app = TestApp::new();
        let match_id = app.paired_match().await;

        let (status, _) = app
            .call("GET", &format!("/matches/{}", match_id), Some("carol"), None)
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_resign_completes_match_for_opponent() {
        let app = TestApp::new();
        let match_id = app.paired_match().await;

        let (status, view) = app
            .call("POST", &format!("/matches/{}/resign", match_id), Some("bob"), None)
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["match"]["status"], "completed");
        assert_eq!(view["match"]["winner_id"], "alice");

        let (status, stats) = app.call("GET", "/profile/stats", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["wins"], 1);
        assert_eq!(stats["total_matches"], 1);
    }

    #[tokio::test]
    async fn test_timeout_claim_is_taken_from_either_participant() {
        let app = TestApp::new();
        let match_id = app.paired_match().await;

        let (status, view) = app
            .call(
                "POST",
                &format!("/matches/{}/timeout", match_id),
                Some("alice"),
                Some(json!({"flagged": "white"})),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["match"]["status"], "completed");
        assert_eq!(view["match"]["winner_id"], "bob");
    }

    #[tokio::test]
    async fn test_timeout_rejects_unknown_colour() {
        let app = TestApp::new();
        let match_id = app.paired_match().await;

        let (status, _) = app
            .call(
                "POST",
                &format!("/matches/{}/timeout", match_id),
                Some("alice"),
                Some(json!({"flagged": "purple"})),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_profile_is_created_then_updated() {
        let app = TestApp::new();

        let (status, profile) = app.call("GET", "/profile", Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["username"], "alice");
        assert_eq!(profile["email"], "alice@example.com");

        let (status, profile) = app
            .call(
                "PUT",
                "/profile",
                Some("alice"),
                Some(json!({"username": "queenside", "bio": "Sicilian fan"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["username"], "queenside");
        assert_eq!(profile["bio"], "Sicilian fan");

        let (status, _) = app
            .call("PUT", "/profile", Some("alice"), Some(json!({"username": "  "})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_befriend_opponent_then_accept() {
        let app = TestApp::new();
        let match_id = app.paired_match().await;

        let (status, request) = app
            .call(
                "POST",
                &format!("/matches/{}/friend-request", match_id),
                Some("alice"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(request["friend_id"], "bob");

        let (status, _) = app
            .call("POST", "/friends/bob/accept", Some("alice"), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .call("POST", "/friends/alice/accept", Some("bob"), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, stats) = app.call("GET", "/profile/stats", Some("bob"), None).await;
        assert_eq!(stats["friends"], 1);
    }
}
