/// Player integration tests: choices, fades, flags, and saves end to end.

use std::time::Duration;

use rustc_hash::FxHashSet;
use storysheet::core::config::{PlayerConfig, UnlabeledChoicePolicy};
use storysheet::core::filter::{filter_choices, ChoicePrompt};
use storysheet::core::graph::StoryBook;
use storysheet::core::navigation::GameState;
use storysheet::core::observer::{NullObserver, RecordingObserver, StoryEvent};
use storysheet::core::persistence::{MemorySaveStore, SaveStore};
use storysheet::core::player::{ChoiceOutcome, StoryPlayer};
use storysheet::core::stage::MusicCommand;
use storysheet::core::transition::FadePhase;
use storysheet::error::{PlayerError, SaveError};
use storysheet::schema::node::SpeakerPosition;

const HEADER: &str = "node_id,speaker,text,speaker_position,speaker_image,left_image,center_image,right_image,bg_image,transition,c1_text,c1_target,c1_style,c2_text,c2_target,c2_style,c3_text,c3_target,c3_style,c4_text,c4_target,c4_style,music,sfx,set_flag,require_flag";

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn fixture(name: &str) -> String {
    let path = std::path::Path::new("tests/fixtures").join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
}

fn lighthouse_player(recorder: &RecordingObserver) -> StoryPlayer {
    StoryPlayer::builder()
        .with_sheets(
            &fixture("lighthouse_story.csv"),
            &fixture("lighthouse_metadata.csv"),
        )
        .config_file(std::path::Path::new("tests/fixtures/player.ron"))
        .with_observer(recorder.clone())
        .build()
        .unwrap()
}

#[test]
fn fade_commits_navigation_exactly_at_black() {
    let story = format!(
        "{HEADER}\n\
         A,,Hi,,,,,,,,Go,B,,,,,,,,,,,,,,\n\
         B,,Bye,,,,,,,fade,,,,,,,,,,,,,,,,\n"
    );
    let recorder = RecordingObserver::new();
    let mut player = StoryPlayer::builder()
        .with_sheets(&story, "title,Fade test\n")
        .with_observer(recorder.clone())
        .build()
        .unwrap();
    player.start();
    recorder.clear();

    assert_eq!(player.select(0, ms(0)), ChoiceOutcome::FadeStarted);
    assert_eq!(player.phase(), FadePhase::FadingOut);

    // Content does not change while the overlay is still fading out.
    for t in [1, 100, 300, 599] {
        assert!(player.tick(ms(t)).is_none());
        assert_eq!(player.phase(), FadePhase::FadingOut);
        assert_eq!(player.state().current_node_id, "A");
    }

    assert!(player.tick(ms(600)).is_some());
    assert_eq!(player.phase(), FadePhase::Black);
    assert_eq!(player.state().current_node_id, "B");

    assert!(player.tick(ms(649)).is_none());
    assert_eq!(player.phase(), FadePhase::Black);
    assert!(player.tick(ms(650)).is_none());
    assert_eq!(player.phase(), FadePhase::FadingIn);
    assert!(player.tick(ms(1249)).is_none());
    assert_eq!(player.phase(), FadePhase::FadingIn);
    assert!(player.tick(ms(1250)).is_none());
    assert_eq!(player.phase(), FadePhase::Hidden);
    assert_eq!(player.next_deadline(), None);

    assert_eq!(
        player.state(),
        &GameState {
            current_node_id: "B".to_string(),
            flags: FxHashSet::default(),
            history: vec!["A".to_string()],
        }
    );

    let entered: Vec<StoryEvent> = recorder
        .events()
        .into_iter()
        .filter(|e| matches!(e, StoryEvent::NodeEntered { .. }))
        .collect();
    assert_eq!(entered.len(), 1);

    let phases: Vec<(FadePhase, FadePhase)> = recorder
        .events()
        .into_iter()
        .filter_map(|e| match e {
            StoryEvent::PhaseChanged { from, to } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            (FadePhase::Hidden, FadePhase::FadingOut),
            (FadePhase::FadingOut, FadePhase::Black),
            (FadePhase::Black, FadePhase::FadingIn),
            (FadePhase::FadingIn, FadePhase::Hidden),
        ]
    );
    assert!(player.prompt().is_ending());
}

#[test]
fn flag_gate_opens_after_visiting_setter() {
    let story = format!(
        "{HEADER}\n\
         S,,Start,,,,,,,,To the cellar,C,,To the door,E,,,,,,,,,,,\n\
         C,,You find a key.,,,,,,,,,E,,,,,,,,,,,,,key,\n\
         D,,The door opens.,,,,,,,,,,,,,,,,,,,,,,,key\n\
         E,,A locked door.,,,,,,,,Open it,D,,Force it,D,danger,,,,,,,,,,\n"
    );
    let book = StoryBook::from_csv(&story, "title,Flags\n", &mut NullObserver).unwrap();
    let e = book.node("E").unwrap();

    let before = filter_choices(&e.choices, &FxHashSet::default(), book.graph(), &mut NullObserver);
    assert!(before.is_empty());

    let mut player = StoryPlayer::builder()
        .with_book(book.clone())
        .with_observer(NullObserver)
        .build()
        .unwrap();
    player.start();
    assert!(!player.prompt().is_empty());

    // Straight to E: the door is shut and E reads as an ending.
    player.select(1, ms(0));
    assert_eq!(player.state().current_node_id, "E");
    assert!(player.prompt().is_ending());

    player.restart();
    player.select(0, ms(0));
    assert_eq!(player.state().current_node_id, "C");
    assert!(player.state().has_flag("key"));
    player.select(0, ms(0));
    assert_eq!(player.state().current_node_id, "E");

    let after = player.visible_choices();
    assert_eq!(after, e.choices);
    assert!(matches!(player.prompt(), ChoicePrompt::Choose(ref c) if c.len() == 2));
}

#[test]
fn lighthouse_walkthrough() {
    let recorder = RecordingObserver::new();
    let mut player = lighthouse_player(&recorder);
    assert_eq!(player.config().fade_duration_ms, 400);
    assert_eq!(player.metadata().title, "The Lighthouse");

    let update = player.start();
    assert!(update.scene_changed);
    assert_eq!(
        update.music,
        Some(MusicCommand::Play(
            "https://assets.example.org/lighthouse/waves.ogg".to_string()
        ))
    );
    assert_eq!(
        player.stage().background(),
        Some("https://assets.example.org/lighthouse/shore.png")
    );

    // Shed: cut transition, grants the key, plays a one-shot sound.
    let ChoiceOutcome::Navigated(update) = player.select(1, ms(0)) else {
        panic!("expected an immediate navigation");
    };
    assert_eq!(
        update.sound_effect.as_deref(),
        Some("https://assets.example.org/lighthouse/clink.wav")
    );
    assert_eq!(update.music, None);
    assert!(matches!(player.prompt(), ChoicePrompt::Continue(_)));

    player.select(0, ms(10));
    assert_eq!(player.state().current_node_id, "yard");

    // Cellar is unlocked by the key; the dangling gulls choice stays visible.
    let yard = player.prompt();
    assert_eq!(yard.len(), 4);
    assert_eq!(player.select(2, ms(20)), ChoiceOutcome::DanglingTarget);
    assert_eq!(player.state().current_node_id, "yard");
    assert!(recorder.events().contains(&StoryEvent::DanglingTarget {
        target: "gulls".to_string()
    }));

    // Cellar is a checkpoint: immediate, new scene, autosaved.
    let ChoiceOutcome::Navigated(update) = player.select(1, ms(30)) else {
        panic!("expected an immediate navigation");
    };
    assert!(update.scene_changed);
    assert!(player.has_save());
    assert!(recorder.events().contains(&StoryEvent::Autosaved {
        node_id: "cellar".to_string()
    }));

    // Truth is a fade node with a cleared background.
    assert_eq!(player.select(0, ms(1_000)), ChoiceOutcome::FadeStarted);
    assert_eq!(player.next_deadline(), Some(ms(1_400)));
    let update = player.tick(ms(1_400)).unwrap();
    assert!(update.scene_changed);
    assert_eq!(player.stage().background(), None);
    assert_eq!(player.state().current_node_id, "truth");
    player.tick(ms(5_000));
    assert_eq!(player.phase(), FadePhase::Hidden);
    assert!(player.prompt().is_ending());

    let mut flags: Vec<&String> = player.state().flags.iter().collect();
    flags.sort();
    assert_eq!(flags, vec!["cellar_seen", "key"]);
    assert_eq!(
        player.state().history,
        vec!["intro", "shed", "yard", "cellar"]
    );
}

#[test]
fn speaker_image_fills_the_speaker_slot() {
    let recorder = RecordingObserver::new();
    let mut player = lighthouse_player(&recorder);
    player.start();
    player.select(0, ms(0));
    player.tick(ms(400));
    assert_eq!(player.state().current_node_id, "stairs");
    assert_eq!(
        player.stage().slot(SpeakerPosition::Left),
        Some("https://assets.example.org/lighthouse/keeper_angry.png")
    );
    assert_eq!(
        player.stage().slot(SpeakerPosition::Right),
        Some("https://assets.example.org/lighthouse/lamp.png")
    );
    player.tick(ms(2_000));

    // Apology keeps the lamp and swaps the keeper's portrait.
    player.select(0, ms(2_000));
    assert_eq!(player.state().current_node_id, "apology");
    assert_eq!(
        player.stage().slot(SpeakerPosition::Left),
        Some("https://assets.example.org/lighthouse/keeper_calm.png")
    );
    assert_eq!(
        player.stage().slot(SpeakerPosition::Right),
        Some("https://assets.example.org/lighthouse/lamp.png")
    );

    let ChoiceOutcome::Navigated(update) = player.select(0, ms(2_100)) else {
        panic!("expected an immediate navigation");
    };
    assert_eq!(update.music, Some(MusicCommand::Stop));
    assert_eq!(player.stage().music(), None);
}

#[test]
fn continue_restores_the_autosave() {
    let story = fixture("lighthouse_story.csv");
    let metadata = fixture("lighthouse_metadata.csv");

    let mut first = StoryPlayer::builder()
        .with_sheets(&story, &metadata)
        .with_config(PlayerConfig {
            sheet_id: "lighthouse".to_string(),
            ..PlayerConfig::default()
        })
        .with_observer(NullObserver)
        .with_save_store(MemorySaveStore::new())
        .build()
        .unwrap();
    first.start();
    first.select(0, ms(0));
    first.tick(ms(600));
    assert_eq!(first.state().current_node_id, "stairs");
    let exported = first.export_save().unwrap();

    // A second session with a fresh memory store sees nothing saved.
    let mut second = StoryPlayer::builder()
        .with_sheets(&story, &metadata)
        .with_config(PlayerConfig {
            sheet_id: "lighthouse".to_string(),
            ..PlayerConfig::default()
        })
        .with_observer(NullObserver)
        .build()
        .unwrap();
    assert!(!second.has_save());
    assert!(second.continue_saved().unwrap().is_none());

    second.import_save(&exported).unwrap();
    assert_eq!(second.state(), first.state());
    assert!(second.has_save());

    second.restart();
    assert_eq!(second.state().current_node_id, "intro");
    second.continue_saved().unwrap();
    assert_eq!(second.state().current_node_id, "stairs");
    assert_eq!(second.state().history, vec!["intro"]);
}

#[test]
fn import_rejects_other_stories_and_unknown_nodes() {
    let recorder = RecordingObserver::new();
    let mut player = lighthouse_player(&recorder);
    player.start();

    let foreign = r#"{
        "sheetId": "someone-else",
        "currentNodeId": "intro",
        "flags": [],
        "history": [],
        "savedAt": "2024-05-01T12:00:00Z"
    }"#;
    assert!(matches!(
        player.import_save(foreign),
        Err(PlayerError::Save(SaveError::SheetMismatch { .. }))
    ));

    let stale = r#"{
        "sheetId": "lighthouse",
        "currentNodeId": "attic",
        "flags": ["key"],
        "history": ["intro"],
        "savedAt": "2024-05-01T12:00:00Z"
    }"#;
    assert!(matches!(
        player.import_save(stale),
        Err(PlayerError::Save(SaveError::UnknownNode(_)))
    ));
    assert!(!player.has_save());
    assert_eq!(player.state().current_node_id, "intro");

    assert!(matches!(
        player.import_save("not json"),
        Err(PlayerError::Save(SaveError::Json(_)))
    ));
}

#[test]
fn reload_cancels_a_running_fade() {
    let recorder = RecordingObserver::new();
    let mut player = lighthouse_player(&recorder);
    player.start();
    assert_eq!(player.select(0, ms(0)), ChoiceOutcome::FadeStarted);

    let replacement = StoryBook::from_csv(
        &format!("{HEADER}\nX,,Fresh start,,,,,,,,,,,,,,,,,,,,,,,\n"),
        "title,Another\n",
        &mut NullObserver,
    )
    .unwrap();
    player.load_book(replacement);
    assert!(recorder.events().contains(&StoryEvent::TransitionCancelled));
    assert_eq!(player.phase(), FadePhase::Hidden);

    assert!(player.tick(ms(10_000)).is_none());
    assert_eq!(player.state().current_node_id, "X");
    assert_eq!(player.metadata().title, "Another");
}

#[test]
fn auto_advance_policy_is_configurable() {
    let story = format!(
        "{HEADER}\n\
         A,,Fork,,,,,,,,Left,L,,,R,,,,,,,,,,,\n\
         L,,Left,,,,,,,,,,,,,,,,,,,,,,,\n\
         R,,Right,,,,,,,,,,,,,,,,,,,,,,,\n"
    );
    let mut blank = StoryPlayer::builder()
        .with_sheets(&story, "title,Policy\n")
        .with_observer(NullObserver)
        .build()
        .unwrap();
    blank.start();
    assert!(matches!(blank.prompt(), ChoicePrompt::Choose(ref c) if c.len() == 2));

    let mut auto = StoryPlayer::builder()
        .with_sheets(&story, "title,Policy\n")
        .with_config(PlayerConfig {
            unlabeled_choices: UnlabeledChoicePolicy::AutoAdvance,
            ..PlayerConfig::default()
        })
        .with_observer(NullObserver)
        .build()
        .unwrap();
    auto.start();
    assert!(matches!(auto.prompt(), ChoicePrompt::Continue(ref c) if c.target == "R"));
    auto.select(0, ms(0));
    assert_eq!(auto.state().current_node_id, "R");
}

#[test]
fn failed_autosave_is_reported_not_fatal() {
    struct BrokenStore;

    impl SaveStore for BrokenStore {
        fn save(&mut self, _data: &storysheet::schema::save::SaveData) -> Result<(), SaveError> {
            Err(SaveError::Store("disk full".to_string()))
        }
        fn load(
            &self,
            _sheet_id: &str,
        ) -> Result<Option<storysheet::schema::save::SaveData>, SaveError> {
            Ok(None)
        }
        fn has_save(&self, _sheet_id: &str) -> bool {
            false
        }
        fn delete(&mut self, _sheet_id: &str) -> Result<(), SaveError> {
            Ok(())
        }
    }

    let recorder = RecordingObserver::new();
    let mut player = StoryPlayer::builder()
        .with_sheets(
            &fixture("lighthouse_story.csv"),
            &fixture("lighthouse_metadata.csv"),
        )
        .with_observer(recorder.clone())
        .with_save_store(BrokenStore)
        .build()
        .unwrap();
    player.start();
    player.select(0, ms(0));
    player.tick(ms(600));
    assert_eq!(player.state().current_node_id, "stairs");
    assert!(recorder.events().iter().any(|e| matches!(
        e,
        StoryEvent::AutosaveFailed { reason } if reason.contains("disk full")
    )));
    assert!(player.save().is_err());
}
