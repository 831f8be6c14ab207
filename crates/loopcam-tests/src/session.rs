//! Controller lines through a session into the track manager.

use loopcam_audio::{NullBackend, PlaybackState, TrackManager, TrackManagerConfig};
use loopcam_control::generator::UnavailableGenerator;
use loopcam_control::{
    controller, Collaborators, PlaceholderGenerator, Session, SessionConfig, SessionEvent,
    StaticDescriber, StillFrame,
};
use loopcam_core::InstrumentTag;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::mpsc;

fn session(backend: Arc<NullBackend>, collaborators: Collaborators) -> Session {
    Session::new(
        SessionConfig {
            clip_duration_seconds: 0.5,
            ..Default::default()
        },
        TrackManager::new(TrackManagerConfig::default(), backend),
        collaborators,
    )
}

fn offline() -> Collaborators {
    Collaborators {
        frames: Arc::new(StillFrame::new(vec![0xFF, 0xD8, 0xFF])),
        describer: Arc::new(StaticDescriber::default()),
        generator: Arc::new(PlaceholderGenerator),
    }
}

async fn drive(session: &mut Session, script: &'static [u8]) -> Vec<SessionEvent> {
    let (tx, mut rx) = mpsc::channel(16);
    controller::run_lines(BufReader::new(script), tx).await.unwrap();
    let mut events = Vec::new();
    while let Some(command) = rx.recv().await {
        if let Ok(event) = session.handle(command).await {
            events.push(event);
        }
    }
    events
}

#[tokio::test(start_paused = true)]
async fn controller_script_builds_two_tracks() {
    let backend = Arc::new(NullBackend::new());
    let mut session = session(backend.clone(), offline());

    let events = drive(
        &mut session,
        b"instrument 1\nYou took a photo!\nadded the last generated sound\n\
          instrument 2\nYou took a photo!\nadded the last generated sound\n",
    )
    .await;
    assert_eq!(events.len(), 6);

    let snaps = session.tracks().snapshots().await;
    let tags: Vec<_> = snaps.iter().map(|s| s.instrument_tag.clone()).collect();
    assert_eq!(tags, vec![InstrumentTag::new("BASS"), InstrumentTag::new("DRUMS")]);
    assert!(snaps.iter().all(|s| s.playback_state == PlaybackState::Playing));
    assert_eq!(backend.live_players(), 2);
}

#[tokio::test(start_paused = true)]
async fn repeated_loops_on_one_instrument_keep_one_track() {
    let backend = Arc::new(NullBackend::new());
    let mut session = session(backend.clone(), offline());

    drive(
        &mut session,
        b"You took a photo!\nadded the last generated sound\n\
          You took a photo!\nadded the last generated sound\n\
          You took a photo!\nadded the last generated sound\n",
    )
    .await;

    let tag = InstrumentTag::new("DRUMS");
    let current = session.last_generated().unwrap().id();
    assert_eq!(session.tracks().snapshot(&tag).await.unwrap().asset_id, current);
    assert_eq!(backend.live_players(), 2);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.live_players(), 1);
    assert_eq!(session.tracks().pending_releases(&tag).await, 0);
}

#[tokio::test(start_paused = true)]
async fn generator_outage_still_loops_placeholder() {
    let backend = Arc::new(NullBackend::new());
    let mut session = session(
        backend.clone(),
        Collaborators {
            generator: Arc::new(UnavailableGenerator {
                payment_required: false,
            }),
            ..offline()
        },
    );
    let events = drive(
        &mut session,
        b"instrument 6\nYou took a photo!\nadded the last generated sound\n",
    )
    .await;
    let Some(SessionEvent::Looped(snap)) = events.last() else {
        panic!("expected the placeholder to loop");
    };
    assert_eq!(snap.instrument_tag, InstrumentTag::new("FX"));
    assert_eq!(snap.metadata.key.as_deref(), Some("C Major"));

    session.tracks().stop_all().await;
    assert_eq!(backend.live_players(), 0);
}

#[tokio::test(start_paused = true)]
async fn vision_failure_adds_nothing() {
    let backend = Arc::new(NullBackend::new());
    let mut session = session(
        backend.clone(),
        Collaborators {
            describer: Arc::new(StaticDescriber::new(
                "```json\n{\"description\": \"Error parsing response\"}\n```",
            )),
            ..offline()
        },
    );
    let events = drive(&mut session, b"You took a photo!\nadded the last generated sound\n").await;
    assert!(events.is_empty());
    assert!(session.tracks().snapshots().await.is_empty());
    assert_eq!(backend.live_players(), 0);
}

#[tokio::test(start_paused = true)]
async fn generated_clip_crossfades_over_test_tone() {
    let backend = Arc::new(NullBackend::new());
    let mut session = session(backend.clone(), offline());

    let events = drive(
        &mut session,
        b"instrument 4\nplay test sound\nYou took a photo!\nadded the last generated sound\n",
    )
    .await;
    assert!(matches!(events[1], SessionEvent::TestTone(_)));

    let tag = InstrumentTag::new("KEYS");
    let current = session.last_generated().unwrap().id();
    assert_eq!(session.tracks().snapshot(&tag).await.unwrap().asset_id, current);
    assert_eq!(session.tracks().pending_releases(&tag).await, 1);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(backend.live_players(), 1);
}
