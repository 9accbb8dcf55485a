use crate::use_cases::types::MatchMode;
use std::{env, time::Duration};

// Runtime/client constants (not gameplay tuning).

/// One simulation/render tick per frame at 60 Hz.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(1000 / 60);

pub fn server_ws_url() -> String {
    env::var("GAME_SERVER_WS_URL").unwrap_or_else(|_| "ws://127.0.0.1:3001/ws".to_string())
}

pub fn auth_service_url() -> String {
    env::var("AUTH_SERVICE_URL").unwrap_or_else(|_| "http://127.0.0.1:3002".to_string())
}

pub fn auth_login_timeout() -> Duration {
    let millis = env::var("AUTH_LOGIN_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}

pub fn display_name() -> String {
    env::var("DISPLAY_NAME").unwrap_or_else(|_| "guest".to_string())
}

pub fn match_mode() -> MatchMode {
    match env::var("GAME_MODE").as_deref() {
        Ok("pvp") => MatchMode::Pvp,
        Ok("coop") => MatchMode::Coop,
        _ => MatchMode::Solo,
    }
}
