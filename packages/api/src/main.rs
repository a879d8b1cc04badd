use lambda_http::{run, tracing, Error};
use std::env::set_var;
use std::sync::Arc;

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use shared::config::{env_var, MatchmakingConfig};
use shared::repositories::friendship_repository::DynamoDbFriendshipRepository;
use shared::repositories::match_repository::DynamoDbMatchRepository;
use shared::repositories::profile_repository::DynamoDbProfileRepository;
use shared::services::auth_service::AuthService;
use shared::services::friendship_service::FriendshipService;
use shared::services::matchmaking_service::MatchmakingService;
use shared::services::profile_service::ProfileService;

#[tokio::main]
async fn main() -> Result<(), Error> {
    set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");

    // required to enable CloudWatch error logging by the runtime
    tracing::init_default_subscriber();

    let matches_table = env_var("MATCHES_TABLE")?;
    let profiles_table = env_var("PROFILES_TABLE")?;
    let friendships_table = env_var("FRIENDSHIPS_TABLE")?;
    let matchmaking_config = MatchmakingConfig::from_env()?;

    let config = aws_config::load_from_env().await;
    let client = aws_sdk_dynamodb::Client::new(&config);

    let matches = Arc::new(DynamoDbMatchRepository::new(client.clone(), &matches_table));
    let profiles = Arc::new(DynamoDbProfileRepository::new(client.clone(), &profiles_table));
    let friendships = Arc::new(DynamoDbFriendshipRepository::new(
        client.clone(),
        &friendships_table,
    ));

    let app_state = state::AppState {
        auth_service: Arc::new(AuthService::new()?),
        matchmaking_service: Arc::new(MatchmakingService::new(
            matches.clone(),
            matchmaking_config,
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

    run(routes::app(app_state)).await
}
