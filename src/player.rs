use anyhow::{Context, Result, anyhow};
use std::collections::VecDeque;
use std::process::Stdio;
use tokio::{
  io::AsyncBufReadExt,
  io::BufReader as TokioBufReader,
  process::{Child as TokioChild, Command},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::sequencer::{PlayerApi, PlayerEvent};
use crate::youtube;

/// Whether `mpv` can be launched. Resolves the player-ready notification.
pub async fn probe_mpv() -> Result<()> {
  let status = Command::new("mpv")
    .arg("--version")
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .status()
    .await
    .map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to run mpv --version")
      }
    })?;
  if !status.success() {
    return Err(anyhow!("mpv --version exited with {}", status));
  }
  Ok(())
}

/// Handle to a card's player. mpv plays one video at a time, so a handle is
/// just the video it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpvHandle {
  pub video_id: String,
}

/// Plays cards through a single `mpv` process.
pub struct MpvPlayer {
  current_process: Option<TokioChild>,
  /// Element id of the card that is playing.
  pub current_element: Option<String>,
  pub current_title: Option<String>,
  mpv_monitor_handle: Option<JoinHandle<()>>,
  mpv_status_rx: Option<mpsc::Receiver<String>>,
  last_mpv_status: Option<String>,
  ipc_socket_path: Option<String>,
  events: VecDeque<(String, PlayerEvent)>,
  pub paused: bool,
}

impl Default for MpvPlayer {
  fn default() -> Self {
    Self::new()
  }
}

impl MpvPlayer {
  pub fn new() -> Self {
    Self {
      current_process: None,
      current_element: None,
      current_title: None,
      mpv_monitor_handle: None,
      mpv_status_rx: None,
      last_mpv_status: None,
      ipc_socket_path: None,
      events: VecDeque::new(),
      paused: false,
    }
  }

  pub fn is_playing(&self) -> bool {
    self.current_process.is_some()
  }

  /// Drain mpv's status lines and notice when the process has exited.
  pub fn check_mpv_status(&mut self) {
    if let Some(rx) = &mut self.mpv_status_rx {
      while let Ok(status) = rx.try_recv() {
        self.last_mpv_status = Some(status);
      }
    }

    let Some(child) = self.current_process.as_mut() else { return };
    match child.try_wait() {
      Ok(Some(status)) => {
        let element = self.current_element.clone();
        info!(status = %status, element = ?element, "player: mpv exited");
        self.reset();
        if status.success()
          && let Some(element) = element
        {
          self.events.push_back((element, PlayerEvent::Ended));
        }
      }
      Ok(None) => {}
      Err(e) => warn!(err = %e, "player: failed to poll mpv"),
    }
  }

  pub fn get_last_mpv_status(&self) -> Option<String> {
    self.last_mpv_status.clone()
  }

  /// Launch mpv on `url`, replacing whatever is playing.
  fn start(&mut self, element_id: &str, url: &str) -> Result<()> {
    self.kill_current();

    let socket_path = std::env::temp_dir().join(format!("kjkids-mpv-{}.sock", std::process::id()));
    let socket_path_str = socket_path.to_str().context("Temp dir path is not valid UTF-8")?.to_string();
    // Remove stale socket if it exists from a previous crash.
    let _ = std::fs::remove_file(&socket_path);

    let mut cmd = Command::new("mpv");
    cmd.args([
      "--force-window=immediate",
      "--term-status-msg=${time-pos/full} / ${duration/full} | ${media-title} | ${pause} ${percent-pos}%",
      &format!("--input-ipc-server={}", socket_path_str),
      url,
    ]);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    // stderr is never drained; piping it would eventually block mpv.
    cmd.stderr(Stdio::null());
    cmd.kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    let stdout = child.stdout.take().context("Failed to get mpv stdout")?;
    let (tx, rx) = mpsc::channel::<String>(10);
    self.mpv_status_rx = Some(rx);

    let monitor_handle = tokio::spawn(async move {
      let reader = TokioBufReader::new(stdout);
      let mut lines = reader.lines();
      while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
          break;
        }
      }
    });

    info!(element = %element_id, url = %url, "player: started mpv");
    self.current_process = Some(child);
    self.current_element = Some(element_id.to_string());
    self.mpv_monitor_handle = Some(monitor_handle);
    self.ipc_socket_path = Some(socket_path_str);
    self.events.push_back((element_id.to_string(), PlayerEvent::Playing));
    Ok(())
  }

  pub async fn toggle_pause(&mut self) -> Result<()> {
    let Some(ref socket_path) = self.ipc_socket_path else {
      return Ok(());
    };
    let stream = tokio::net::UnixStream::connect(socket_path).await.context("Failed to connect to mpv IPC socket")?;
    stream.writable().await.context("mpv IPC socket not writable")?;
    let cmd = b"{\"command\":[\"cycle\",\"pause\"]}\n";
    let written = stream.try_write(cmd).context("Failed to send pause command to mpv")?;
    if written < cmd.len() {
      return Err(anyhow!("Partial write to mpv IPC socket: wrote {} of {} bytes", written, cmd.len()));
    }
    self.paused = !self.paused;
    if let Some(element) = self.current_element.clone() {
      let event = if self.paused { PlayerEvent::Paused } else { PlayerEvent::Playing };
      self.events.push_back((element, event));
    }
    Ok(())
  }

  /// Stop playback without reporting the video as finished.
  pub async fn stop(&mut self) -> Result<()> {
    if let Some(handle) = self.mpv_monitor_handle.take() {
      handle.abort();
      let _ = handle.await;
    }
    if let Some(mut child) = self.current_process.take() {
      child.kill().await.context("Failed to kill mpv process")?;
      let _ = child.wait().await;
    }
    self.reset();
    Ok(())
  }

  fn kill_current(&mut self) {
    if let Some(mut child) = self.current_process.take()
      && let Err(e) = child.start_kill()
    {
      warn!(err = %e, "player: failed to kill previous mpv");
    }
    self.reset();
  }

  fn reset(&mut self) {
    if let Some(handle) = self.mpv_monitor_handle.take() {
      handle.abort();
    }
    self.current_process = None;
    self.current_element = None;
    self.current_title = None;
    self.mpv_status_rx = None;
    self.last_mpv_status = None;
    self.paused = false;
    if let Some(path) = self.ipc_socket_path.take() {
      let _ = std::fs::remove_file(&path);
    }
  }
}

impl PlayerApi for MpvPlayer {
  type Handle = MpvHandle;

  fn attach(&mut self, element_id: &str) -> Result<MpvHandle> {
    let video_id = youtube::video_id_from_element(element_id)
      .ok_or_else(|| anyhow!("Not a player element: {}", element_id))?;
    Ok(MpvHandle { video_id: video_id.to_string() })
  }

  fn play(&mut self, element_id: &str, handle: &mut MpvHandle) -> Result<()> {
    self.start(element_id, &youtube::watch_url(&handle.video_id))
  }

  fn load(&mut self, element_id: &str, src: &str) -> Result<()> {
    // mpv resolves watch URLs through yt-dlp; embed URLs it can't play.
    let video_id = youtube::video_id_from_src(src).ok_or_else(|| anyhow!("Unrecognised player source: {}", src))?;
    debug!(element = %element_id, video = %video_id, "player: load");
    self.start(element_id, &youtube::watch_url(video_id))
  }

  fn poll_event(&mut self) -> Option<(String, PlayerEvent)> {
    self.events.pop_front()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn attach_derives_video_from_element() {
    let mut player = MpvPlayer::new();
    assert_eq!(player.attach("iframe-abc").unwrap(), MpvHandle { video_id: "abc".into() });
    assert!(player.attach("grid").is_err());
  }

  #[test]
  fn load_rejects_foreign_sources() {
    let mut player = MpvPlayer::new();
    assert!(player.load("iframe-abc", "https://example.com/video.mp4").is_err());
    assert!(!player.is_playing());
  }

  #[test]
  fn idle_player_reports_nothing() {
    let mut player = MpvPlayer::new();
    player.check_mpv_status();
    assert_eq!(player.poll_event(), None);
    assert_eq!(player.get_last_mpv_status(), None);
  }
}
