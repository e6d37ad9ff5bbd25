use std::sync::Arc;

use serde::Deserialize;
use warp::Filter;
use warp::http::StatusCode;

use boggle_types::{
    CancelJoinRequest, CreateUserRequest, CreateUserResponse, JoinGameRequest, JoinGameResponse,
    PlayWordRequest, PlayWordResponse, SessionError,
};

use crate::matchmaking::JoinOutcome;
use crate::registry::SessionRegistry;

pub mod config;
pub mod matchmaking;
pub mod registry;

#[derive(Debug, Deserialize)]
struct StatusQuery {
    brief: Option<String>,
}

pub fn create_routes(
    registry: Arc<SessionRegistry>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let registry_filter = warp::any().map({
        let registry = registry.clone();
        move || registry.clone()
    });

    // User registration endpoint
    let register = warp::path("users")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(registry_filter.clone())
        .and_then(handle_register);

    // Join (or create) a game
    let join = warp::path("games")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(registry_filter.clone())
        .and_then(handle_join);

    // Cancel a pending join
    let cancel = warp::path("games")
        .and(warp::path::end())
        .and(warp::put())
        .and(warp::body::json())
        .and(registry_filter.clone())
        .and_then(handle_cancel);

    // Submit a word against a game
    let play_word = warp::path!("games" / String)
        .and(warp::put())
        .and(warp::body::json())
        .and(registry_filter.clone())
        .and_then(handle_play_word);

    // Game status, brief or full
    let status = warp::path!("games" / String)
        .and(warp::get())
        .and(warp::query::<StatusQuery>())
        .and(registry_filter.clone())
        .and_then(handle_status);

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "PUT"]);

    register
        .or(join)
        .or(cancel)
        .or(play_word)
        .or(status)
        .or(health)
        .with(cors)
        .with(warp::log("boggle_server"))
}

fn error_reply(err: SessionError) -> warp::reply::WithStatus<warp::reply::Json> {
    let status = match err {
        SessionError::AlreadyInGame | SessionError::GameNotActive => StatusCode::CONFLICT,
        SessionError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::FORBIDDEN,
    };

    let body = if err.is_persistence() {
        tracing::error!(error = %err, "operation failed against the backing store");
        serde_json::json!({ "error": "Internal server error" })
    } else {
        serde_json::json!({ "error": err.to_string() })
    };

    warp::reply::with_status(warp::reply::json(&body), status)
}

async fn handle_register(
    request: CreateUserRequest,
    registry: Arc<SessionRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match registry.register_user(&request.nickname).await {
        Ok(user_token) => Ok(warp::reply::with_status(
            warp::reply::json(&CreateUserResponse { user_token }),
            StatusCode::CREATED,
        )),
        Err(err) => Ok(error_reply(err)),
    }
}

async fn handle_join(
    request: JoinGameRequest,
    registry: Arc<SessionRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match registry
        .join_game(&request.user_token, request.time_limit)
        .await
    {
        Ok(outcome) => {
            let status = match outcome {
                JoinOutcome::Waiting { .. } => StatusCode::ACCEPTED,
                JoinOutcome::Paired { .. } => StatusCode::CREATED,
            };
            let body = JoinGameResponse {
                game_id: outcome.game_id().to_string(),
                game_state: outcome.phase(),
            };
            Ok(warp::reply::with_status(warp::reply::json(&body), status))
        }
        Err(err) => Ok(error_reply(err)),
    }
}

async fn handle_cancel(
    request: CancelJoinRequest,
    registry: Arc<SessionRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match registry.cancel_join(&request.user_token).await {
        Ok(()) => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({})),
            StatusCode::OK,
        )),
        Err(err) => Ok(error_reply(err)),
    }
}

async fn handle_play_word(
    game_id: String,
    request: PlayWordRequest,
    registry: Arc<SessionRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match registry
        .play_word(&game_id, &request.user_token, &request.word)
        .await
    {
        Ok(score) => Ok(warp::reply::with_status(
            warp::reply::json(&PlayWordResponse { score }),
            StatusCode::OK,
        )),
        Err(err) => Ok(error_reply(err)),
    }
}

async fn handle_status(
    game_id: String,
    query: StatusQuery,
    registry: Arc<SessionRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let brief = query.brief.as_deref() == Some("yes");
    match registry.game_status(&game_id, brief).await {
        Ok(status) => Ok(warp::reply::with_status(
            warp::reply::json(&status),
            StatusCode::OK,
        )),
        Err(err) => Ok(error_reply(err)),
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use boggle_core::Dictionary;
    use boggle_types::GameStatusResponse;
    use migration::{Migrator, MigratorTrait};

    const TEST_WORDS: &str = "abcd\napple\nbanana\nqueue\ntile";

    async fn create_test_registry() -> Arc<SessionRegistry> {
        let db = boggle_persistence::connection::connect_to_memory_database()
            .await
            .unwrap();
        Migrator::up(&db, None).await.unwrap();
        Arc::new(SessionRegistry::new(db, Dictionary::new(TEST_WORDS)))
    }

    async fn register(registry: &SessionRegistry, nickname: &str) -> String {
        registry.register_user(nickname).await.unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_routes(create_test_registry().await);

        let response = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), "OK");
    }

    #[tokio::test]
    async fn test_register_returns_token() {
        let app = create_routes(create_test_registry().await);

        let response = warp::test::request()
            .method("POST")
            .path("/users")
            .json(&serde_json::json!({ "Nickname": "Alice" }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 201);

        let body: CreateUserResponse = serde_json::from_slice(response.body()).unwrap();
        assert!(!body.user_token.is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_nicknames() {
        let app = create_routes(create_test_registry().await);

        for nickname in ["", "   ", &"x".repeat(51)] {
            let response = warp::test::request()
                .method("POST")
                .path("/users")
                .json(&serde_json::json!({ "Nickname": nickname }))
                .reply(&app)
                .await;
            assert_eq!(response.status(), 403, "nickname {:?}", nickname);
        }
    }

    #[tokio::test]
    async fn test_join_flow_pending_then_active() {
        let registry = create_test_registry().await;
        let app = create_routes(registry.clone());
        let alice = register(&registry, "Alice").await;
        let bob = register(&registry, "Bob").await;

        let response = warp::test::request()
            .method("POST")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": alice, "TimeLimit": 30 }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 202);
        let first: JoinGameResponse = serde_json::from_slice(response.body()).unwrap();

        let response = warp::test::request()
            .method("POST")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": bob, "TimeLimit": 60 }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 201);
        let second: JoinGameResponse = serde_json::from_slice(response.body()).unwrap();

        // Both players landed in the same game.
        assert_eq!(first.game_id, second.game_id);
    }

    #[tokio::test]
    async fn test_join_with_unknown_token_is_forbidden() {
        let app = create_routes(create_test_registry().await);

        let response = warp::test::request()
            .method("POST")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": "nope", "TimeLimit": 30 }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 403);
    }

    #[tokio::test]
    async fn test_join_with_out_of_range_time_limit_is_forbidden() {
        let registry = create_test_registry().await;
        let app = create_routes(registry.clone());
        let alice = register(&registry, "Alice").await;

        for limit in [0, 4, 121, -5] {
            let response = warp::test::request()
                .method("POST")
                .path("/games")
                .json(&serde_json::json!({ "UserToken": alice, "TimeLimit": limit }))
                .reply(&app)
                .await;
            assert_eq!(response.status(), 403, "limit {}", limit);
        }
    }

    #[tokio::test]
    async fn test_double_join_conflicts() {
        let registry = create_test_registry().await;
        let app = create_routes(registry.clone());
        let alice = register(&registry, "Alice").await;

        let response = warp::test::request()
            .method("POST")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": alice, "TimeLimit": 30 }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 202);

        let response = warp::test::request()
            .method("POST")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": alice, "TimeLimit": 30 }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 409);
    }

    #[tokio::test]
    async fn test_cancel_pending_join() {
        let registry = create_test_registry().await;
        let app = create_routes(registry.clone());
        let alice = register(&registry, "Alice").await;

        // Nothing to cancel yet.
        let response = warp::test::request()
            .method("PUT")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": alice }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 403);

        let response = warp::test::request()
            .method("POST")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": alice, "TimeLimit": 30 }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 202);

        let response = warp::test::request()
            .method("PUT")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": alice }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);

        // Cancelled, so a fresh join opens a new pending game.
        let response = warp::test::request()
            .method("POST")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": alice, "TimeLimit": 30 }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 202);
    }

    #[tokio::test]
    async fn test_play_word_against_pending_game_conflicts() {
        let registry = create_test_registry().await;
        let app = create_routes(registry.clone());
        let alice = register(&registry, "Alice").await;

        let response = warp::test::request()
            .method("POST")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": alice, "TimeLimit": 30 }))
            .reply(&app)
            .await;
        let join: JoinGameResponse = serde_json::from_slice(response.body()).unwrap();

        let response = warp::test::request()
            .method("PUT")
            .path(&format!("/games/{}", join.game_id))
            .json(&serde_json::json!({ "UserToken": alice, "Word": "abcd" }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 409);
    }

    #[tokio::test]
    async fn test_play_word_outcomes_on_live_game() {
        let registry = create_test_registry().await;
        let app = create_routes(registry.clone());
        let alice = register(&registry, "Alice").await;
        let bob = register(&registry, "Bob").await;

        warp::test::request()
            .method("POST")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": alice, "TimeLimit": 60 }))
            .reply(&app)
            .await;
        let response = warp::test::request()
            .method("POST")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": bob, "TimeLimit": 60 }))
            .reply(&app)
            .await;
        let join: JoinGameResponse = serde_json::from_slice(response.body()).unwrap();

        // Too short always scores 0 no matter what was rolled.
        let response = warp::test::request()
            .method("PUT")
            .path(&format!("/games/{}", join.game_id))
            .json(&serde_json::json!({ "UserToken": alice, "Word": "ab" }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
        let scored: PlayWordResponse = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(scored.score, 0);

        // Four z's cannot be traced on any board (only one die carries a Z).
        let response = warp::test::request()
            .method("PUT")
            .path(&format!("/games/{}", join.game_id))
            .json(&serde_json::json!({ "UserToken": alice, "Word": "zzzz" }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
        let scored: PlayWordResponse = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(scored.score, -1);

        // A stranger to the game is rejected outright.
        let mallory = register(&registry, "Mallory").await;
        let response = warp::test::request()
            .method("PUT")
            .path(&format!("/games/{}", join.game_id))
            .json(&serde_json::json!({ "UserToken": mallory, "Word": "abcd" }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 403);

        // Empty and oversized words never reach the scorer.
        for word in ["", "   ", &"a".repeat(31)] {
            let response = warp::test::request()
                .method("PUT")
                .path(&format!("/games/{}", join.game_id))
                .json(&serde_json::json!({ "UserToken": alice, "Word": word }))
                .reply(&app)
                .await;
            assert_eq!(response.status(), 403, "word {:?}", word);
        }
    }

    #[tokio::test]
    async fn test_play_word_against_unknown_game() {
        let registry = create_test_registry().await;
        let app = create_routes(registry.clone());
        let alice = register(&registry, "Alice").await;

        let response = warp::test::request()
            .method("PUT")
            .path("/games/no-such-game")
            .json(&serde_json::json!({ "UserToken": alice, "Word": "abcd" }))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 403);
    }

    #[tokio::test]
    async fn test_status_of_pending_game_is_bare() {
        let registry = create_test_registry().await;
        let app = create_routes(registry.clone());
        let alice = register(&registry, "Alice").await;

        let response = warp::test::request()
            .method("POST")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": alice, "TimeLimit": 30 }))
            .reply(&app)
            .await;
        let join: JoinGameResponse = serde_json::from_slice(response.body()).unwrap();

        let response = warp::test::request()
            .method("GET")
            .path(&format!("/games/{}", join.game_id))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, serde_json::json!({ "GameState": "pending" }));
    }

    #[tokio::test]
    async fn test_status_brief_and_full_shapes() {
        let registry = create_test_registry().await;
        let app = create_routes(registry.clone());
        let alice = register(&registry, "Alice").await;
        let bob = register(&registry, "Bob").await;

        warp::test::request()
            .method("POST")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": alice, "TimeLimit": 60 }))
            .reply(&app)
            .await;
        let response = warp::test::request()
            .method("POST")
            .path("/games")
            .json(&serde_json::json!({ "UserToken": bob, "TimeLimit": 60 }))
            .reply(&app)
            .await;
        let join: JoinGameResponse = serde_json::from_slice(response.body()).unwrap();

        let response = warp::test::request()
            .method("GET")
            .path(&format!("/games/{}?brief=yes", join.game_id))
            .reply(&app)
            .await;
        assert_eq!(response.status(), 200);
        let brief: GameStatusResponse = serde_json::from_slice(response.body()).unwrap();
        assert!(brief.board.is_none());
        assert!(brief.time_left.is_some());
        let player1 = brief.player1.unwrap();
        assert!(player1.nickname.is_none());
        assert_eq!(player1.score, 0);

        let response = warp::test::request()
            .method("GET")
            .path(&format!("/games/{}", join.game_id))
            .reply(&app)
            .await;
        let full: GameStatusResponse = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(full.board.as_ref().map(String::len), Some(16));
        assert_eq!(full.time_limit, Some(60));
        assert_eq!(full.player1.unwrap().nickname.as_deref(), Some("Alice"));
        // Ledgers stay hidden while the game is live.
        assert!(full.player2.unwrap().words_played.is_none());
    }

    #[tokio::test]
    async fn test_status_of_unknown_game() {
        let app = create_routes(create_test_registry().await);

        let response = warp::test::request()
            .method("GET")
            .path("/games/no-such-game")
            .reply(&app)
            .await;
        assert_eq!(response.status(), 403);
    }

    #[tokio::test]
    async fn test_invalid_routes() {
        let app = create_routes(create_test_registry().await);

        let response = warp::test::request()
            .method("GET")
            .path("/invalid")
            .reply(&app)
            .await;

        assert_eq!(response.status(), 404);
    }
}
