//! Track manager: one looping track per instrument tag, replaced by crossfade.
//!
//! Delivering an asset for a tag that already has a track starts the new
//! player at its nominal gain while the old one ramps to silence over the
//! crossfade window. A single deferred task per superseded player stops and
//! disposes it once the window has elapsed. That task is cancelled and the
//! release done immediately if another delivery for the tag or `stop_all`
//! arrives first.
//!
//! Submissions for one tag are serialized by a per-tag async mutex, so at
//! most one replacement per tag is in flight; different tags never wait on
//! each other.

use crate::gain::{clamp_db, db_to_linear};
use crate::player::{Player, PlayerBackend};
use crate::wav::{self, DecodedAudio};
use loopcam_core::{AssetMetadata, AudioAsset, InstrumentTag, LoopCamError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Track manager settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackManagerConfig {
    /// Crossfade and fade-in window in milliseconds.
    pub crossfade_ms: u64,
    /// Gain given to a newly created track, in dB.
    pub default_gain_db: f32,
    /// Smoothing applied to user gain changes, in milliseconds.
    pub gain_smoothing_ms: u64,
}

impl Default for TrackManagerConfig {
    fn default() -> Self {
        Self {
            crossfade_ms: 500,
            default_gain_db: -2.0,
            gain_smoothing_ms: 20,
        }
    }
}

impl TrackManagerConfig {
    pub fn crossfade(&self) -> Duration {
        Duration::from_millis(self.crossfade_ms)
    }

    fn gain_smoothing(&self) -> Duration {
        Duration::from_millis(self.gain_smoothing_ms)
    }
}

/// Playback state of a tag's current track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Playing,
    Stopped,
}

/// Read-only view of a track for the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSnapshot {
    pub instrument_tag: InstrumentTag,
    pub asset_id: Uuid,
    pub playback_state: PlaybackState,
    pub gain_db: f32,
    pub muted: bool,
    pub metadata: AssetMetadata,
}

struct Track {
    tag: InstrumentTag,
    asset: AudioAsset,
    /// `None` once stopped; the asset is kept so it can be resumed.
    player: Option<Box<dyn Player>>,
    state: PlaybackState,
    gain_db: f32,
    muted: bool,
}

impl Track {
    fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            instrument_tag: self.tag.clone(),
            asset_id: self.asset.id(),
            playback_state: self.state,
            gain_db: self.gain_db,
            muted: self.muted,
            metadata: self.asset.metadata().clone(),
        }
    }
}

type ReleaseSlot = Arc<Mutex<Option<Box<dyn Player>>>>;

/// Stop and dispose whatever is still in the slot. Returns false if it had
/// already been released.
fn release(slot: &ReleaseSlot) -> bool {
    let taken = slot.lock().take();
    match taken {
        Some(mut player) => {
            player.stop();
            player.dispose();
            true
        }
        None => false,
    }
}

/// A superseded player fading out, with its scheduled release.
struct PendingRelease {
    asset_id: Uuid,
    player: ReleaseSlot,
    task: JoinHandle<()>,
}

impl PendingRelease {
    fn schedule(
        tag: InstrumentTag,
        asset_id: Uuid,
        player: Box<dyn Player>,
        window: Duration,
    ) -> Self {
        let player: ReleaseSlot = Arc::new(Mutex::new(Some(player)));
        let deferred = Arc::clone(&player);
        let task = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if release(&deferred) {
                debug!(tag = %tag, asset = %asset_id, "Released faded-out player");
            }
        });
        Self {
            asset_id,
            player,
            task,
        }
    }

    /// Cancel the timer and release now.
    fn release_now(self) {
        self.task.abort();
        if release(&self.player) {
            debug!(asset = %self.asset_id, "Released fading player early");
        }
    }

    fn is_released(&self) -> bool {
        self.player.lock().is_none()
    }
}

#[derive(Default)]
struct Slot {
    track: Option<Track>,
    fading: Vec<PendingRelease>,
}

impl Slot {
    fn flush_pending(&mut self) {
        for pending in self.fading.drain(..) {
            pending.release_now();
        }
    }

    fn prune_released(&mut self) {
        self.fading.retain(|p| !p.is_released());
    }
}

type SlotHandle = Arc<tokio::sync::Mutex<Slot>>;

struct Inner {
    config: TrackManagerConfig,
    backend: Arc<dyn PlayerBackend>,
    slots: Mutex<HashMap<InstrumentTag, SlotHandle>>,
}

/// Owns every track. Cloning yields another handle to the same manager.
#[derive(Clone)]
pub struct TrackManager {
    inner: Arc<Inner>,
}

impl TrackManager {
    /// Create a manager that plays through `backend`.
    pub fn new(config: TrackManagerConfig, backend: Arc<dyn PlayerBackend>) -> Self {
        info!(backend = backend.name(), crossfade_ms = config.crossfade_ms, "Track manager created");
        Self {
            inner: Arc::new(Inner {
                config,
                backend,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &TrackManagerConfig {
        &self.inner.config
    }

    fn slot(&self, tag: &InstrumentTag) -> SlotHandle {
        let mut slots = self.inner.slots.lock();
        Arc::clone(slots.entry(tag.clone()).or_default())
    }

    fn existing_slot(&self, tag: &InstrumentTag) -> Result<SlotHandle> {
        self.inner
            .slots
            .lock()
            .get(tag)
            .cloned()
            .ok_or_else(|| LoopCamError::NotFound(format!("no track for {tag}")))
    }

    fn all_slots(&self) -> Vec<(InstrumentTag, SlotHandle)> {
        let slots = self.inner.slots.lock();
        let mut all: Vec<_> = slots
            .iter()
            .map(|(tag, slot)| (tag.clone(), Arc::clone(slot)))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    fn decode(asset: &AudioAsset) -> Result<Arc<DecodedAudio>> {
        wav::decode(asset.container_bytes()).map(Arc::new)
    }

    /// Allocate a player for `asset` and start it silent, fading up to
    /// `gain_db` over the crossfade window.
    fn start_fade_in(&self, clip: Arc<DecodedAudio>, gain_db: f32, muted: bool) -> Result<Box<dyn Player>> {
        let mut player = self.inner.backend.allocate(clip)?;
        player.set_muted(muted);
        player.set_gain(0.0, Duration::ZERO);
        player.start();
        player.set_gain(db_to_linear(gain_db), self.inner.config.crossfade());
        Ok(player)
    }

    /// Deliver a new asset for `tag`.
    ///
    /// Creates the track on first delivery, otherwise crossfades from the
    /// current player to the new one. On error the existing track is left
    /// as it was.
    pub async fn submit(&self, tag: InstrumentTag, asset: AudioAsset) -> Result<TrackSnapshot> {
        let slot = self.slot(&tag);
        let mut slot = slot.lock().await;
        slot.prune_released();

        let clip = Self::decode(&asset).map_err(|e| {
            warn!(tag = %tag, asset = %asset.id(), error = %e, "Rejected undecodable asset");
            e
        })?;

        // A still-pending fade from an earlier delivery is cut short so at
        // most one old player is ever tearing down per tag.
        slot.flush_pending();

        let window = self.inner.config.crossfade();
        let (gain_db, muted) = slot
            .track
            .as_ref()
            .map(|t| (t.gain_db, t.muted))
            .unwrap_or((clamp_db(self.inner.config.default_gain_db), false));

        let new_player = match slot.track.as_ref() {
            Some(current) if current.state == PlaybackState::Playing => {
                let mut player = self.inner.backend.allocate(clip).map_err(|e| {
                    warn!(tag = %tag, error = %e, "No player for replacement");
                    e
                })?;
                player.set_muted(muted);
                player.set_gain(db_to_linear(gain_db), Duration::ZERO);
                player.start();
                player
            }
            _ => self.start_fade_in(clip, gain_db, muted).map_err(|e| {
                warn!(tag = %tag, error = %e, "No player for new track");
                e
            })?,
        };

        if let Some(mut old) = slot.track.take() {
            if let Some(mut old_player) = old.player.take() {
                let from = old_player.current_gain();
                old_player.set_gain(0.0, window);
                info!(
                    tag = %tag,
                    from = %old.asset.id(),
                    to = %asset.id(),
                    from_gain = from,
                    "Crossfade started"
                );
                slot.fading.push(PendingRelease::schedule(
                    tag.clone(),
                    old.asset.id(),
                    old_player,
                    window,
                ));
            } else {
                info!(tag = %tag, asset = %asset.id(), "Replaced stopped track");
            }
        } else {
            info!(tag = %tag, asset = %asset.id(), "Track created");
        }

        let track = Track {
            tag,
            asset,
            player: Some(new_player),
            state: PlaybackState::Playing,
            gain_db,
            muted,
        };
        let snapshot = track.snapshot();
        slot.track = Some(track);
        Ok(snapshot)
    }

    /// Mute or unmute a track. Gain and playback state are untouched.
    pub async fn set_mute(&self, tag: &InstrumentTag, muted: bool) -> Result<TrackSnapshot> {
        let slot = self.existing_slot(tag)?;
        let mut slot = slot.lock().await;
        let track = slot
            .track
            .as_mut()
            .ok_or_else(|| LoopCamError::NotFound(format!("no track for {tag}")))?;
        if track.muted != muted {
            track.muted = muted;
            if let Some(player) = track.player.as_mut() {
                player.set_muted(muted);
            }
            debug!(tag = %tag, muted, "Mute changed");
        }
        Ok(track.snapshot())
    }

    /// Set a track's persistent gain, clamped to the supported range.
    pub async fn set_gain(&self, tag: &InstrumentTag, gain_db: f32) -> Result<TrackSnapshot> {
        let slot = self.existing_slot(tag)?;
        let mut slot = slot.lock().await;
        let smoothing = self.inner.config.gain_smoothing();
        let track = slot
            .track
            .as_mut()
            .ok_or_else(|| LoopCamError::NotFound(format!("no track for {tag}")))?;
        track.gain_db = clamp_db(gain_db);
        if let Some(player) = track.player.as_mut() {
            player.set_gain(db_to_linear(track.gain_db), smoothing);
        }
        debug!(tag = %tag, gain_db = track.gain_db, "Gain changed");
        Ok(track.snapshot())
    }

    /// Stop every track and release all players, including fading ones.
    /// Track records and their assets are kept for [`resume`](Self::resume).
    pub async fn stop_all(&self) {
        for (tag, slot) in self.all_slots() {
            let mut slot = slot.lock().await;
            slot.flush_pending();
            if let Some(track) = slot.track.as_mut() {
                if let Some(mut player) = track.player.take() {
                    player.stop();
                    player.dispose();
                }
                track.state = PlaybackState::Stopped;
                debug!(tag = %tag, "Track stopped");
            }
        }
        info!("All tracks stopped");
    }

    /// Restart a stopped track from its retained asset with a fade-in.
    pub async fn resume(&self, tag: &InstrumentTag) -> Result<TrackSnapshot> {
        let slot = self.existing_slot(tag)?;
        let mut slot = slot.lock().await;
        let track = slot
            .track
            .as_mut()
            .ok_or_else(|| LoopCamError::NotFound(format!("no track for {tag}")))?;
        if track.state == PlaybackState::Playing {
            return Ok(track.snapshot());
        }
        let clip = Self::decode(&track.asset)?;
        track.player = Some(self.start_fade_in(clip, track.gain_db, track.muted)?);
        track.state = PlaybackState::Playing;
        info!(tag = %tag, asset = %track.asset.id(), "Track resumed");
        Ok(track.snapshot())
    }

    /// Snapshot of one tag's current track.
    pub async fn snapshot(&self, tag: &InstrumentTag) -> Option<TrackSnapshot> {
        let slot = self.existing_slot(tag).ok()?;
        let slot = slot.lock().await;
        slot.track.as_ref().map(Track::snapshot)
    }

    /// Snapshots of every track, ordered by tag.
    pub async fn snapshots(&self) -> Vec<TrackSnapshot> {
        let mut out = Vec::new();
        for (_, slot) in self.all_slots() {
            if let Some(track) = slot.lock().await.track.as_ref() {
                out.push(track.snapshot());
            }
        }
        out
    }

    /// Superseded players for `tag` whose release has not happened yet.
    pub async fn pending_releases(&self, tag: &InstrumentTag) -> usize {
        let Ok(slot) = self.existing_slot(tag) else {
            return 0;
        };
        let mut slot = slot.lock().await;
        slot.prune_released();
        slot.fading.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::NullBackend;
    use loopcam_core::AssetMetadata;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn asset(tag: &str) -> AudioAsset {
        AudioAsset::new(
            tag.into(),
            wav::fallback_silence(),
            AssetMetadata::new(Some(120.0), None, 0.1).unwrap(),
        )
    }

    fn manager(backend: Arc<dyn PlayerBackend>) -> TrackManager {
        TrackManager::new(TrackManagerConfig::default(), backend)
    }

    /// Counts every dispose call per player, including repeated ones.
    #[derive(Default)]
    struct CountingBackend {
        disposals: Arc<Mutex<Vec<usize>>>,
        gains: Arc<Mutex<Vec<f32>>>,
        fail_next: AtomicUsize,
    }

    struct CountingPlayer {
        index: usize,
        disposals: Arc<Mutex<Vec<usize>>>,
        gains: Arc<Mutex<Vec<f32>>>,
        playing: bool,
    }

    impl PlayerBackend for CountingBackend {
        fn name(&self) -> &str {
            "counting"
        }

        fn allocate(&self, _clip: Arc<DecodedAudio>) -> Result<Box<dyn Player>> {
            if self.fail_next.swap(0, Ordering::AcqRel) > 0 {
                return Err(LoopCamError::ResourceExhausted("counting".into()));
            }
            let mut disposals = self.disposals.lock();
            disposals.push(0);
            self.gains.lock().push(1.0);
            Ok(Box::new(CountingPlayer {
                index: disposals.len() - 1,
                disposals: Arc::clone(&self.disposals),
                gains: Arc::clone(&self.gains),
                playing: false,
            }))
        }
    }

    impl Player for CountingPlayer {
        fn start(&mut self) {
            self.playing = true;
        }
        fn stop(&mut self) {
            self.playing = false;
        }
        fn set_gain(&mut self, gain: f32, _ramp: Duration) {
            self.gains.lock()[self.index] = gain;
        }
        fn set_muted(&mut self, _muted: bool) {}
        fn dispose(&mut self) {
            self.disposals.lock()[self.index] += 1;
        }
        fn current_gain(&self) -> f32 {
            self.gains.lock()[self.index]
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_submit_creates_playing_track() {
        let backend = Arc::new(NullBackend::new());
        let tm = manager(backend.clone());
        let a = asset("DRUMS");
        let snap = tm.submit("DRUMS".into(), a.clone()).await.unwrap();
        assert_eq!(snap.playback_state, PlaybackState::Playing);
        assert_eq!(snap.asset_id, a.id());
        assert_eq!(snap.gain_db, -2.0);
        assert!(!snap.muted);
        assert_eq!(backend.live_players(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacement_releases_old_exactly_once() {
        let backend = Arc::new(CountingBackend::default());
        let disposals = Arc::clone(&backend.disposals);
        let tm = manager(backend);
        let tag = InstrumentTag::new("DRUMS");

        tm.submit(tag.clone(), asset("DRUMS")).await.unwrap();
        let b = asset("DRUMS");
        tm.submit(tag.clone(), b.clone()).await.unwrap();

        // Both players exist during the window.
        assert_eq!(*disposals.lock(), vec![0, 0]);
        assert_eq!(tm.pending_releases(&tag).await, 1);

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(*disposals.lock(), vec![1, 0]);
        assert_eq!(tm.pending_releases(&tag).await, 0);
        let snap = tm.snapshot(&tag).await.unwrap();
        assert_eq!(snap.asset_id, b.id());
        assert_eq!(tm.snapshots().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_player_ramps_to_silence_and_new_starts_at_nominal() {
        let backend = Arc::new(CountingBackend::default());
        let gains = Arc::clone(&backend.gains);
        let tm = manager(backend);
        tm.submit("BASS".into(), asset("BASS")).await.unwrap();
        tm.submit("BASS".into(), asset("BASS")).await.unwrap();
        let gains = gains.lock().clone();
        assert_eq!(gains[0], 0.0);
        assert!((gains[1] - db_to_linear(-2.0)).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_submit_cancels_pending_release() {
        let backend = Arc::new(CountingBackend::default());
        let disposals = Arc::clone(&backend.disposals);
        let tm = manager(backend);
        let tag = InstrumentTag::new("KEYS");

        tm.submit(tag.clone(), asset("KEYS")).await.unwrap();
        tm.submit(tag.clone(), asset("KEYS")).await.unwrap();
        tm.submit(tag.clone(), asset("KEYS")).await.unwrap();

        // First player released immediately, second now fading.
        assert_eq!(*disposals.lock(), vec![1, 0, 0]);
        assert_eq!(tm.pending_releases(&tag).await, 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*disposals.lock(), vec![1, 1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_error_leaves_track_unchanged() {
        let backend = Arc::new(NullBackend::new());
        let tm = manager(backend.clone());
        let tag = InstrumentTag::new("DRUMS");
        let before = tm.submit(tag.clone(), asset("DRUMS")).await.unwrap();

        let junk = AudioAsset::new(
            tag.clone(),
            b"<html>502 Bad Gateway</html>".to_vec(),
            AssetMetadata::new(None, None, 12.0).unwrap(),
        );
        let err = tm.submit(tag.clone(), junk).await.unwrap_err();
        assert!(matches!(err, LoopCamError::DecodeError(_)));
        assert_eq!(tm.snapshot(&tag).await.unwrap(), before);
        assert_eq!(backend.live_players(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hostile_header_is_decode_error() {
        let backend = Arc::new(NullBackend::new());
        let tm = manager(backend.clone());
        let tag = InstrumentTag::new("DRUMS");
        let before = tm.submit(tag.clone(), asset("DRUMS")).await.unwrap();

        let mut bytes = wav::fallback_silence();
        bytes[22..24].copy_from_slice(&u16::MAX.to_le_bytes());
        bytes[34..36].copy_from_slice(&32u16.to_le_bytes());
        let hostile = AudioAsset::new(
            tag.clone(),
            bytes,
            AssetMetadata::new(None, None, 0.1).unwrap(),
        );
        let err = tm.submit(tag.clone(), hostile).await.unwrap_err();
        assert!(matches!(err, LoopCamError::DecodeError(_)));
        assert_eq!(tm.snapshot(&tag).await.unwrap(), before);

        // The slot lock was released, so the tag still accepts work.
        tm.submit(tag.clone(), asset("DRUMS")).await.unwrap();
        assert_eq!(backend.live_players(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_drops_fired_releases() {
        let backend = Arc::new(NullBackend::new());
        let tm = manager(backend);
        let tag = InstrumentTag::new("KEYS");
        tm.submit(tag.clone(), asset("KEYS")).await.unwrap();
        tm.submit(tag.clone(), asset("KEYS")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(tm.slot(&tag).lock().await.fading.len(), 1);

        let junk = AudioAsset::new(
            tag.clone(),
            b"not a wav".to_vec(),
            AssetMetadata::new(None, None, 1.0).unwrap(),
        );
        assert!(tm.submit(tag.clone(), junk).await.is_err());
        assert!(tm.slot(&tag).lock().await.fading.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resource_exhausted_drops_asset() {
        let backend = Arc::new(CountingBackend::default());
        let disposals = Arc::clone(&backend.disposals);
        let tm = manager(backend.clone());
        let tag = InstrumentTag::new("FX");
        let before = tm.submit(tag.clone(), asset("FX")).await.unwrap();

        backend.fail_next.store(1, Ordering::Release);
        let err = tm.submit(tag.clone(), asset("FX")).await.unwrap_err();
        assert!(matches!(err, LoopCamError::ResourceExhausted(_)));
        assert_eq!(tm.snapshot(&tag).await.unwrap(), before);
        assert_eq!(*disposals.lock(), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_during_fade_in_releases_everything() {
        let backend = Arc::new(NullBackend::new());
        let tm = manager(backend.clone());
        let tag = InstrumentTag::new("BASS");
        tm.submit(tag.clone(), asset("BASS")).await.unwrap();
        tm.submit(tag.clone(), asset("BASS")).await.unwrap();
        assert_eq!(backend.live_players(), 2);

        tm.stop_all().await;
        assert_eq!(backend.live_players(), 0);
        assert_eq!(tm.pending_releases(&tag).await, 0);
        let snap = tm.snapshot(&tag).await.unwrap();
        assert_eq!(snap.playback_state, PlaybackState::Stopped);

        // The cancelled timer must not fire a second release.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(backend.live_players(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_after_stop() {
        let backend = Arc::new(NullBackend::new());
        let tm = manager(backend.clone());
        let tag = InstrumentTag::new("VOCALS");
        let a = asset("VOCALS");
        tm.submit(tag.clone(), a.clone()).await.unwrap();
        tm.stop_all().await;

        let snap = tm.resume(&tag).await.unwrap();
        assert_eq!(snap.playback_state, PlaybackState::Playing);
        assert_eq!(snap.asset_id, a.id());
        assert_eq!(backend.live_players(), 1);
        assert_eq!(backend.allocated_players(), 2);

        assert!(matches!(
            tm.resume(&InstrumentTag::new("GUITAR")).await,
            Err(LoopCamError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_after_stop_replaces_without_fade_out() {
        let backend = Arc::new(NullBackend::new());
        let tm = manager(backend.clone());
        let tag = InstrumentTag::new("DRUMS");
        tm.submit(tag.clone(), asset("DRUMS")).await.unwrap();
        tm.stop_all().await;
        tm.submit(tag.clone(), asset("DRUMS")).await.unwrap();
        assert_eq!(tm.pending_releases(&tag).await, 0);
        assert_eq!(backend.live_players(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mute_and_gain_are_independent() {
        let backend = Arc::new(NullBackend::new());
        let tm = manager(backend);
        let tag = InstrumentTag::new("GUITAR");
        tm.submit(tag.clone(), asset("GUITAR")).await.unwrap();

        let snap = tm.set_mute(&tag, true).await.unwrap();
        assert!(snap.muted);
        assert_eq!(snap.gain_db, -2.0);
        assert_eq!(snap.playback_state, PlaybackState::Playing);
        assert!(tm.set_mute(&tag, true).await.unwrap().muted);

        let snap = tm.set_gain(&tag, 24.0).await.unwrap();
        assert_eq!(snap.gain_db, crate::gain::MAX_GAIN_DB);
        assert!(snap.muted);

        // User settings survive a replacement.
        let snap = tm.submit(tag.clone(), asset("GUITAR")).await.unwrap();
        assert!(snap.muted);
        assert_eq!(snap.gain_db, crate::gain::MAX_GAIN_DB);

        assert!(tm.set_gain(&InstrumentTag::new("FX"), 0.0).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tags_are_independent() {
        let backend = Arc::new(NullBackend::new());
        let tm = manager(backend.clone());
        let (drums, bass) = tokio::join!(
            tm.submit("DRUMS".into(), asset("DRUMS")),
            tm.submit("BASS".into(), asset("BASS")),
        );
        assert_eq!(drums.unwrap().playback_state, PlaybackState::Playing);
        assert_eq!(bass.unwrap().playback_state, PlaybackState::Playing);
        let tags: Vec<_> = tm
            .snapshots()
            .await
            .into_iter()
            .map(|s| s.instrument_tag)
            .collect();
        assert_eq!(tags, vec![InstrumentTag::new("BASS"), InstrumentTag::new("DRUMS")]);
        assert_eq!(backend.live_players(), 2);
    }
}
