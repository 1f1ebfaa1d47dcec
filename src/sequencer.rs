//! Playback sequencer: binds rendered players and hands playback to the next
//! item of the autoplay sequence when one finishes.
//!
//! Per player: `Unbound -> Bound -> Ended`. Binding needs the player API,
//! which becomes available once ([`Sequencer::on_ready`]); players registered
//! before that wait in `Unbound` and are bound in registration order when it
//! arrives.

use anyhow::Result;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::youtube;

/// Host side of an embedded player.
pub trait PlayerApi {
  type Handle;

  /// Create a player handle for a rendered element.
  fn attach(&mut self, element_id: &str) -> Result<Self::Handle>;

  /// Start playback on an attached player.
  fn play(&mut self, element_id: &str, handle: &mut Self::Handle) -> Result<()>;

  /// Point an element at a new source, which loads and (with autoplay) plays it.
  fn load(&mut self, element_id: &str, src: &str) -> Result<()>;

  /// Next state change reported by a player, if any.
  fn poll_event(&mut self) -> Option<(String, PlayerEvent)> {
    None
  }
}

/// Player state changes the sequencer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
  Playing,
  Paused,
  Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
  Unbound,
  Bound,
  Ended,
}

struct Binding<H> {
  state: PlayerState,
  handle: Option<H>,
}

/// What happened in response to a finished player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
  /// An existing player for the next video was told to play.
  Played { element_id: String },
  /// The next video's element was given an autoplay source.
  Loaded { element_id: String, src: String },
  /// Last in the sequence, or no longer in it.
  Stop,
}

pub struct Sequencer<A: PlayerApi> {
  api: Option<A>,
  players: HashMap<String, Binding<A::Handle>>,
  /// Registration order of still-unbound players.
  pending: Vec<String>,
}

impl<A: PlayerApi> Default for Sequencer<A> {
  fn default() -> Self {
    Self::new()
  }
}

impl<A: PlayerApi> Sequencer<A> {
  pub fn new() -> Self {
    Self { api: None, players: HashMap::new(), pending: Vec::new() }
  }

  pub fn is_ready(&self) -> bool {
    self.api.is_some()
  }

  pub fn api(&self) -> Option<&A> {
    self.api.as_ref()
  }

  pub fn api_mut(&mut self) -> Option<&mut A> {
    self.api.as_mut()
  }

  pub fn state(&self, element_id: &str) -> Option<PlayerState> {
    self.players.get(element_id).map(|b| b.state)
  }

  pub fn has_handle(&self, element_id: &str) -> bool {
    self.players.get(element_id).is_some_and(|b| b.handle.is_some())
  }

  /// The player API became available: bind everything that was waiting.
  pub fn on_ready(&mut self, api: A) {
    info!(pending = self.pending.len(), "sequencer: player api ready");
    self.api = Some(api);
    for element_id in std::mem::take(&mut self.pending) {
      self.bind(&element_id);
    }
  }

  /// Register rendered player elements. Already-known elements are left alone.
  pub fn register<I, S>(&mut self, element_ids: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    for element_id in element_ids {
      let element_id = element_id.into();
      if self.players.contains_key(&element_id) {
        continue;
      }
      self.players.insert(element_id.clone(), Binding { state: PlayerState::Unbound, handle: None });
      if self.is_ready() {
        self.bind(&element_id);
      } else {
        self.pending.push(element_id);
      }
    }
  }

  fn bind(&mut self, element_id: &str) {
    let Some(api) = self.api.as_mut() else { return };
    let Some(binding) = self.players.get_mut(element_id) else { return };
    if binding.handle.is_some() {
      return;
    }
    match api.attach(element_id) {
      Ok(handle) => {
        binding.handle = Some(handle);
        binding.state = PlayerState::Bound;
        debug!(element = %element_id, "sequencer: bound player");
      }
      Err(e) => warn!(element = %element_id, err = %e, "sequencer: attach failed"),
    }
  }

  /// Start a specific player, e.g. when the user picks a card.
  pub fn play(&mut self, element_id: &str) -> Result<bool> {
    let Some(api) = self.api.as_mut() else { return Ok(false) };
    let Some(binding) = self.players.get_mut(element_id) else { return Ok(false) };
    let Some(handle) = binding.handle.as_mut() else { return Ok(false) };
    api.play(element_id, handle)?;
    binding.state = PlayerState::Bound;
    Ok(true)
  }

  /// Drain pending player events from the API, advancing on every finish.
  pub fn pump(&mut self, autoplay: &[String]) -> Vec<Advance> {
    let mut advances = Vec::new();
    while let Some((element_id, event)) = self.api.as_mut().and_then(|api| api.poll_event()) {
      if let Some(advance) = self.on_event(&element_id, event, autoplay) {
        advances.push(advance);
      }
    }
    advances
  }

  /// Apply a player event. Returns the hand-off decision for `Ended`.
  pub fn on_event(&mut self, element_id: &str, event: PlayerEvent, autoplay: &[String]) -> Option<Advance> {
    let binding = self.players.get_mut(element_id)?;
    if binding.handle.is_none() {
      return None;
    }
    match event {
      PlayerEvent::Playing | PlayerEvent::Paused => {
        binding.state = PlayerState::Bound;
        None
      }
      PlayerEvent::Ended => {
        binding.state = PlayerState::Ended;
        Some(self.advance(element_id, autoplay))
      }
    }
  }

  fn advance(&mut self, element_id: &str, autoplay: &[String]) -> Advance {
    let Some(video_id) = youtube::video_id_from_element(element_id) else { return Advance::Stop };
    let Some(idx) = autoplay.iter().position(|id| id == video_id) else {
      debug!(video = %video_id, "sequencer: finished video not in autoplay sequence");
      return Advance::Stop;
    };
    let Some(next_id) = autoplay.get(idx + 1) else {
      debug!(video = %video_id, "sequencer: end of autoplay sequence");
      return Advance::Stop;
    };

    let next_element = youtube::element_id(next_id);
    let Some(api) = self.api.as_mut() else { return Advance::Stop };

    if let Some(binding) = self.players.get_mut(&next_element)
      && let Some(handle) = binding.handle.as_mut()
    {
      info!(from = %video_id, to = %next_id, "sequencer: playing next");
      if let Err(e) = api.play(&next_element, handle) {
        warn!(element = %next_element, err = %e, "sequencer: play failed");
      }
      binding.state = PlayerState::Bound;
      return Advance::Played { element_id: next_element };
    }

    let src = youtube::embed_src(next_id, true);
    info!(from = %video_id, to = %next_id, "sequencer: loading next");
    if let Err(e) = api.load(&next_element, &src) {
      warn!(element = %next_element, err = %e, "sequencer: load failed");
    }
    // The loaded element carries the chain on from here.
    self
      .players
      .entry(next_element.clone())
      .or_insert(Binding { state: PlayerState::Unbound, handle: None });
    self.bind(&next_element);
    Advance::Loaded { element_id: next_element, src }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use anyhow::anyhow;
  use std::collections::VecDeque;

  #[derive(Default)]
  struct FakeApi {
    calls: Vec<String>,
    events: VecDeque<(String, PlayerEvent)>,
    refuse: Option<String>,
  }

  impl PlayerApi for FakeApi {
    type Handle = String;

    fn attach(&mut self, element_id: &str) -> Result<String> {
      if self.refuse.as_deref() == Some(element_id) {
        return Err(anyhow!("no such element"));
      }
      self.calls.push(format!("attach {element_id}"));
      Ok(element_id.to_string())
    }

    fn play(&mut self, element_id: &str, _handle: &mut String) -> Result<()> {
      self.calls.push(format!("play {element_id}"));
      Ok(())
    }

    fn load(&mut self, element_id: &str, src: &str) -> Result<()> {
      self.calls.push(format!("load {element_id} {src}"));
      Ok(())
    }

    fn poll_event(&mut self) -> Option<(String, PlayerEvent)> {
      self.events.pop_front()
    }
  }

  fn seq(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
  }

  fn ready_sequencer(elements: &[&str]) -> Sequencer<FakeApi> {
    let mut s = Sequencer::new();
    s.on_ready(FakeApi::default());
    s.register(elements.iter().copied());
    s
  }

  #[test]
  fn players_wait_for_api_then_bind_in_order() {
    let mut s: Sequencer<FakeApi> = Sequencer::new();
    s.register(["iframe-A", "iframe-B"]);
    assert_eq!(s.state("iframe-A"), Some(PlayerState::Unbound));
    assert!(!s.has_handle("iframe-A"));

    s.on_ready(FakeApi::default());
    assert_eq!(s.state("iframe-A"), Some(PlayerState::Bound));
    assert_eq!(s.state("iframe-B"), Some(PlayerState::Bound));
    assert_eq!(s.api_mut().unwrap().calls, vec!["attach iframe-A", "attach iframe-B"]);
  }

  #[test]
  fn registering_twice_does_not_rebind() {
    let mut s = ready_sequencer(&["iframe-A"]);
    s.register(["iframe-A"]);
    assert_eq!(s.api_mut().unwrap().calls, vec!["attach iframe-A"]);
  }

  #[test]
  fn end_of_a_plays_bound_b() {
    let mut s = ready_sequencer(&["iframe-A", "iframe-B", "iframe-C"]);
    let autoplay = seq(&["A", "B", "C"]);
    let advance = s.on_event("iframe-A", PlayerEvent::Ended, &autoplay);
    assert_eq!(advance, Some(Advance::Played { element_id: "iframe-B".into() }));
    assert_eq!(s.state("iframe-A"), Some(PlayerState::Ended));
    assert_eq!(s.api_mut().unwrap().calls.last().map(String::as_str), Some("play iframe-B"));
  }

  #[test]
  fn end_of_last_does_nothing() {
    let mut s = ready_sequencer(&["iframe-A", "iframe-B", "iframe-C"]);
    let autoplay = seq(&["A", "B", "C"]);
    let before = s.api_mut().unwrap().calls.len();
    assert_eq!(s.on_event("iframe-C", PlayerEvent::Ended, &autoplay), Some(Advance::Stop));
    assert_eq!(s.api_mut().unwrap().calls.len(), before);
  }

  #[test]
  fn finished_video_missing_from_sequence_does_nothing() {
    let mut s = ready_sequencer(&["iframe-A", "iframe-B"]);
    assert_eq!(s.on_event("iframe-A", PlayerEvent::Ended, &seq(&["B"])), Some(Advance::Stop));
  }

  #[test]
  fn unrendered_next_video_gets_autoplay_source() {
    // the autoplay sequence extends past the rendered slice
    let mut s = ready_sequencer(&["iframe-A"]);
    let advance = s.on_event("iframe-A", PlayerEvent::Ended, &seq(&["A", "B"]));
    let src = "https://www.youtube.com/embed/B?enablejsapi=1&autoplay=1&rel=0".to_string();
    assert_eq!(advance, Some(Advance::Loaded { element_id: "iframe-B".into(), src: src.clone() }));
    let calls = &s.api_mut().unwrap().calls;
    assert_eq!(calls[calls.len() - 2..], [format!("load iframe-B {src}"), "attach iframe-B".to_string()]);
    assert_eq!(s.state("iframe-B"), Some(PlayerState::Bound));
  }

  #[test]
  fn chain_continues_past_the_rendered_slice() {
    let mut s = ready_sequencer(&["iframe-A"]);
    let autoplay = seq(&["A", "B", "C", "D"]);
    assert!(matches!(s.on_event("iframe-A", PlayerEvent::Ended, &autoplay), Some(Advance::Loaded { .. })));
    let advance = s.on_event("iframe-B", PlayerEvent::Ended, &autoplay);
    assert!(matches!(advance, Some(Advance::Loaded { ref element_id, .. }) if element_id == "iframe-C"));
    let advance = s.on_event("iframe-C", PlayerEvent::Ended, &autoplay);
    assert!(matches!(advance, Some(Advance::Loaded { ref element_id, .. }) if element_id == "iframe-D"));
    assert_eq!(s.on_event("iframe-D", PlayerEvent::Ended, &autoplay), Some(Advance::Stop));
    assert_eq!(s.state("iframe-C"), Some(PlayerState::Ended));
  }

  #[test]
  fn loaded_element_rendered_later_is_not_rebound() {
    let mut s = ready_sequencer(&["iframe-A"]);
    s.on_event("iframe-A", PlayerEvent::Ended, &seq(&["A", "B"]));
    s.register(["iframe-A", "iframe-B"]);
    let attaches = s.api_mut().unwrap().calls.iter().filter(|c| c.starts_with("attach iframe-B")).count();
    assert_eq!(attaches, 1);
  }

  #[test]
  fn events_for_unbound_players_are_ignored() {
    let mut s: Sequencer<FakeApi> = Sequencer::new();
    s.register(["iframe-A"]);
    assert_eq!(s.on_event("iframe-A", PlayerEvent::Ended, &seq(&["A", "B"])), None);
    assert_eq!(s.on_event("iframe-Z", PlayerEvent::Ended, &seq(&["A", "B"])), None);
  }

  #[test]
  fn failed_attach_leaves_player_unbound() {
    let mut s: Sequencer<FakeApi> = Sequencer::new();
    s.on_ready(FakeApi { refuse: Some("iframe-A".into()), ..FakeApi::default() });
    s.register(["iframe-A", "iframe-B"]);
    assert_eq!(s.state("iframe-A"), Some(PlayerState::Unbound));
    assert_eq!(s.state("iframe-B"), Some(PlayerState::Bound));
  }

  #[test]
  fn replay_after_end_returns_to_bound() {
    let mut s = ready_sequencer(&["iframe-A"]);
    s.on_event("iframe-A", PlayerEvent::Ended, &seq(&["A"]));
    assert_eq!(s.state("iframe-A"), Some(PlayerState::Ended));
    s.on_event("iframe-A", PlayerEvent::Playing, &seq(&["A"]));
    assert_eq!(s.state("iframe-A"), Some(PlayerState::Bound));
  }

  #[test]
  fn pump_drains_api_events() {
    let mut s = ready_sequencer(&["iframe-A", "iframe-B"]);
    let api = s.api_mut().unwrap();
    api.events.push_back(("iframe-A".into(), PlayerEvent::Playing));
    api.events.push_back(("iframe-A".into(), PlayerEvent::Ended));
    let advances = s.pump(&seq(&["A", "B"]));
    assert_eq!(advances, vec![Advance::Played { element_id: "iframe-B".into() }]);
  }

  #[test]
  fn play_requires_a_bound_player() {
    let mut s: Sequencer<FakeApi> = Sequencer::new();
    s.register(["iframe-A"]);
    assert!(!s.play("iframe-A").unwrap());
    s.on_ready(FakeApi::default());
    assert!(s.play("iframe-A").unwrap());
  }
}
