//! Application orchestrator: wires the OBS client, the volume pipeline and
//! the playback controls to the stdin command loop.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use wedge_scene_control::{SceneControlClient, SceneError};
use wedge_spotify::{
    ClientCredentials, CredentialManager, PlaybackAction, VolumeClient, VolumeDispatcher,
    VolumeError,
};

use crate::command::{self, Command};
use crate::config::{Config, SceneButton};

/// Bound on the in-process teardown (OBS disconnect, pending sends).
const TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the panel until `quit`, end of input or Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    // -- Spotify --
    let credentials = Arc::new(
        CredentialManager::new(ClientCredentials {
            client_id: config.spotify.client_id.clone(),
            client_secret: config.spotify.client_secret.clone(),
            refresh_token: config.spotify.refresh_token.clone(),
        })?
        .with_token_url(config.spotify.token_url.clone()),
    );
    let player = Arc::new(
        VolumeClient::new(Arc::clone(&credentials))?
            .with_base_url(config.spotify.api_base_url.clone()),
    );

    let (dispatcher, mut warnings) =
        VolumeDispatcher::new(player.clone(), config.volume.initial);
    let dispatcher =
        dispatcher.with_debounce(Duration::from_millis(config.volume.debounce_ms));

    tokio::spawn(async move {
        while let Some(warning) = warnings.recv().await {
            tracing::warn!(
                value = warning.value,
                "could not set Spotify volume: {}",
                warning.message
            );
        }
    });

    if let Err(e) = credentials.prefetch().await {
        tracing::warn!(error = %e, "Spotify token prefetch failed");
    }

    // -- OBS --
    let mut obs = SceneControlClient::new(config.obs.url.clone(), config.obs.password.clone());
    match obs.connect().await {
        Ok(()) => tracing::info!(url = %obs.url(), "connected to OBS"),
        Err(e) => tracing::warn!(url = %obs.url(), error = %e, "OBS connection failed"),
    }

    let mut panel = Panel {
        obs,
        dispatcher,
        player,
        scenes: config.scenes,
    };

    tracing::info!("panel ready ({})", command::HELP);

    // -- Main loop --
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("SIGINT received, shutting down");
                break;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if panel.handle_line(&line).await.is_break() {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::info!("input closed, shutting down");
                    break;
                }
                Err(e) => {
                    tracing::error!("stdin error: {e}");
                    break;
                }
            }
        }
    }

    // -- Graceful shutdown --
    tracing::info!("stopping services...");
    if tokio::time::timeout(TEARDOWN_TIMEOUT, panel.shutdown())
        .await
        .is_err()
    {
        anyhow::bail!("teardown did not finish within {TEARDOWN_TIMEOUT:?}");
    }

    Ok(())
}

/// Front-end state: scene client, volume dispatcher, player and buttons.
struct Panel {
    obs: SceneControlClient,
    dispatcher: VolumeDispatcher,
    player: Arc<VolumeClient>,
    scenes: Vec<SceneButton>,
}

impl Panel {
    async fn handle_line(&mut self, line: &str) -> ControlFlow<()> {
        match command::parse(line) {
            Ok(Some(cmd)) => self.handle(cmd).await,
            Ok(None) => ControlFlow::Continue(()),
            Err(msg) => {
                println!("{msg}");
                ControlFlow::Continue(())
            }
        }
    }

    async fn handle(&mut self, cmd: Command) -> ControlFlow<()> {
        match cmd {
            Command::Scene(target) => {
                let Some(scene) = target.resolve(&self.scenes) else {
                    println!("no such scene button (1-{})", self.scenes.len());
                    return ControlFlow::Continue(());
                };
                match self.obs.set_scene(&scene).await {
                    Ok(request_id) => {
                        tracing::info!(scene = %scene, request_id, "scene switch sent");
                    }
                    Err(SceneError::NotConnected) => tracing::warn!("OBS not connected"),
                    Err(e) => tracing::warn!(scene = %scene, error = %e, "scene switch failed"),
                }
            }
            Command::Click(value) => {
                let _ = self.dispatcher.on_slider_clicked(value);
            }
            Command::Drag(value) => {
                self.dispatcher.on_slider_moved_debounced(value);
            }
            Command::Release(value) => {
                let _ = self.dispatcher.on_slider_released(value);
            }
            Command::Volume => println!("volume: {}", self.dispatcher.value()),
            Command::Play => self.spawn_playback(Some(PlaybackAction::Play)),
            Command::Pause => self.spawn_playback(Some(PlaybackAction::Pause)),
            Command::PlayPause => self.spawn_playback(None),
            Command::Next => self.spawn_playback(Some(PlaybackAction::Next)),
            Command::Previous => self.spawn_playback(Some(PlaybackAction::Previous)),
            Command::Scenes => {
                for (i, button) in self.scenes.iter().enumerate() {
                    println!("{}. {} -> {}", i + 1, button.label, button.scene);
                }
            }
            Command::Help => println!("{}", command::HELP),
            Command::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    /// Runs a playback request off the command loop; `None` toggles.
    fn spawn_playback(&self, action: Option<PlaybackAction>) {
        let player = Arc::clone(&self.player);
        tokio::spawn(async move {
            match playback(&player, action).await {
                Ok(sent) => tracing::info!(action = %sent, "playback request sent"),
                Err(e) => tracing::warn!(error = %e, "playback request failed"),
            }
        });
    }

    async fn shutdown(&mut self) {
        self.obs.disconnect().await;
    }
}

async fn playback(
    player: &VolumeClient,
    action: Option<PlaybackAction>,
) -> Result<PlaybackAction, VolumeError> {
    match action {
        Some(action) => player.playback(action).await.map(|()| action),
        None => player.toggle_playback().await,
    }
}
