use serde::{Deserialize, Serialize};

use crate::game::{GamePhase, PlayedWord};

// Field names below are the public JSON contract and must not change.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(rename = "Nickname")]
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    #[serde(rename = "UserToken")]
    pub user_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinGameRequest {
    #[serde(rename = "UserToken")]
    pub user_token: String,
    #[serde(rename = "TimeLimit")]
    pub time_limit: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinGameResponse {
    #[serde(rename = "GameID")]
    pub game_id: String,
    #[serde(rename = "GameState")]
    pub game_state: GamePhase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelJoinRequest {
    #[serde(rename = "UserToken")]
    pub user_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayWordRequest {
    #[serde(rename = "UserToken")]
    pub user_token: String,
    #[serde(rename = "Word")]
    pub word: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayWordResponse {
    #[serde(rename = "Score")]
    pub score: i32,
}

/// Per-player slice of a status snapshot. Which fields are present depends on
/// the `brief` flag and on whether the game has completed: brief responses
/// carry only the score; the word ledger appears only once the game is over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerStatus {
    #[serde(rename = "Nickname", default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(rename = "Score")]
    pub score: i32,
    #[serde(
        rename = "WordsPlayed",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub words_played: Option<Vec<PlayedWord>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStatusResponse {
    #[serde(rename = "GameState")]
    pub game_state: GamePhase,
    #[serde(rename = "Board", default, skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
    #[serde(rename = "TimeLimit", default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<i32>,
    #[serde(rename = "TimeLeft", default, skip_serializing_if = "Option::is_none")]
    pub time_left: Option<i64>,
    #[serde(rename = "Player1", default, skip_serializing_if = "Option::is_none")]
    pub player1: Option<PlayerStatus>,
    #[serde(rename = "Player2", default, skip_serializing_if = "Option::is_none")]
    pub player2: Option<PlayerStatus>,
}

impl GameStatusResponse {
    /// Snapshot for a game still waiting on its second player. Nothing but the
    /// phase is known yet.
    pub fn pending() -> Self {
        Self {
            game_state: GamePhase::Pending,
            board: None,
            time_limit: None,
            time_left: None,
            player1: None,
            player2: None,
        }
    }
}
