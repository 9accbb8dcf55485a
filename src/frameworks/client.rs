// Framework bootstrap for the headless client runtime.

use crate::domain::ports::Presentation;
use crate::domain::state::FrameInput;
use crate::domain::tuning::GameTuning;
use crate::frameworks::config;
use crate::interface_adapters::clients::auth::AuthClient;
use crate::interface_adapters::net::{Connection, connect_and_join};
use crate::interface_adapters::presentation::LogPresentation;
use crate::use_cases::session::{MatchSession, SessionConfig};
use crate::use_cases::types::{MatchMode, MatchPhase};

use std::io::Result;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::error::TryRecvError;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// Entry point: mode comes from the environment, solo needs no server.
pub async fn run_with_config() -> Result<()> {
    init_runtime();
    match config::match_mode() {
        MatchMode::Solo => run_solo().await,
        mode => run_online(mode).await,
    }
}

/// Runs a local match with no network: the stage director drives everything.
pub async fn run_solo() -> Result<()> {
    let mut session = MatchSession::new(
        SessionConfig {
            mode: MatchMode::Solo,
            self_id: 1,
            seed: seed_from_clock(),
            tuning: GameTuning::default(),
        },
        LogPresentation,
    );
    drive(&mut session, None).await
}

/// Logs in, joins the configured match server, and drives the session until
/// the match ends.
pub async fn run_online(mode: MatchMode) -> Result<()> {
    let auth = AuthClient::new(config::auth_service_url(), config::auth_login_timeout())
        .map_err(|e| std::io::Error::other(format!("failed to initialize auth client: {e}")))?;
    let guest = auth
        .guest_login(&config::display_name())
        .await
        .map_err(std::io::Error::other)?;
    tracing::info!(guest_id = guest.guest_id, "logged in");

    let connection = connect_and_join(
        &config::server_ws_url(),
        &guest.session_token,
        &guest.display_name,
        mode,
    )
    .await
    .map_err(std::io::Error::other)?;

    let mut session = MatchSession::new(
        SessionConfig {
            mode,
            self_id: connection.self_id,
            seed: seed_from_clock(),
            tuning: GameTuning::default(),
        },
        LogPresentation,
    );
    drive(&mut session, Some(connection)).await
}

/// The frame loop: queued network messages apply before each frame's
/// simulation, outbound commands flush after it.
async fn drive<P: Presentation>(
    session: &mut MatchSession<P>,
    mut connection: Option<Connection>,
) -> Result<()> {
    let mut interval = tokio::time::interval(config::FRAME_INTERVAL);
    let dt = config::FRAME_INTERVAL.as_secs_f32();
    // The headless runner feeds no device input; casts and movement come from
    // an embedding presentation layer in a real build.
    let input = FrameInput::default();

    loop {
        interval.tick().await;

        let mut lost = false;
        if let Some(conn) = connection.as_mut() {
            loop {
                match conn.inbound_rx.try_recv() {
                    Ok(event) => session.enqueue(event),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        lost = true;
                        break;
                    }
                }
            }
        }
        if lost {
            if let Some(conn) = connection.take() {
                conn.shutdown();
            }
            session.connection_lost();
        }

        session.frame(dt, &input);

        if let Some(conn) = connection.as_mut() {
            for command in session.drain_outbound() {
                if conn.outbound_tx.try_send(command).is_err() {
                    tracing::warn!("outbound channel full or closed; dropping command");
                }
            }
        } else {
            // No network: commands have nowhere to go.
            session.drain_outbound();
        }

        if session.phase() == MatchPhase::Ended {
            break;
        }
    }

    if let Some(conn) = connection.take() {
        conn.shutdown();
    }
    session.close();
    tracing::info!(outcome = ?session.outcome(), "session finished");
    Ok(())
}
