use std::time::Duration;

use game::calibration::CalibrationRange;
use game::physics::{GAME_HEIGHT, PADDLE_MIN_Y, Side, WINNING_SCORE};
use game::playtest::{HandPose, SessionInput, UiRequest, apply_input, pose_landmarks};
use game::session::{GameSession, OVER_DELAY, PAUSE_COOLDOWN, RESET_COOLDOWN, SessionEvent};
use game::settings::{Difficulty, PlayerSettings};
use game::state::GameStatus;

const DT: Duration = Duration::from_millis(16);

fn new_session(seed: u64) -> GameSession {
    GameSession::new(PlayerSettings::default(), seed)
}

/// Wakes the landmark source and starts a match through the UI path.
fn started_session(seed: u64) -> GameSession {
    let mut session = new_session(seed);
    apply_input(&mut session, SessionInput::pose(HandPose::Open, 0.5), DT);
    apply_input(&mut session, SessionInput::request(UiRequest::Start), DT);
    assert_eq!(session.status(), GameStatus::Running);
    session
}

#[test]
fn thumbs_up_starts_a_match_once_the_source_is_ready() {
    let mut session = new_session(1);
    let events = apply_input(&mut session, SessionInput::pose(HandPose::ThumbsUp, 0.5), DT);
    assert_eq!(session.status(), GameStatus::Running);
    assert!(events.contains(&SessionEvent::StatusChanged(GameStatus::Running)));
    assert_eq!(session.score().player, 0);
    assert_eq!(session.score().computer, 0);
}

#[test]
fn start_is_refused_before_the_source_is_ready() {
    let mut session = new_session(1);
    apply_input(&mut session, SessionInput::request(UiRequest::Start), DT);
    assert_eq!(session.status(), GameStatus::Idle);
}

#[test]
fn victory_gesture_enters_calibration_from_idle() {
    let mut session = new_session(1);
    apply_input(&mut session, SessionInput::pose(HandPose::Victory, 0.5), DT);
    assert_eq!(session.status(), GameStatus::Calibrating);
}

#[test]
fn held_spread_toggles_pause_once_per_cooldown() {
    let mut session = started_session(5);

    // Hold spread until the start cooldown expires and the first toggle
    // lands.
    let mut paused_at = None;
    for _ in 0..200 {
        apply_input(&mut session, SessionInput::pose(HandPose::Spread, 0.5), DT);
        if session.status() == GameStatus::Paused {
            paused_at = Some(session.clock());
            break;
        }
    }
    let paused_at = paused_at.expect("spread should eventually pause");

    // Keep holding: nothing may fire until the cooldown lock expires.
    let mut resumed_at = None;
    for _ in 0..200 {
        apply_input(&mut session, SessionInput::pose(HandPose::Spread, 0.5), DT);
        match session.status() {
            GameStatus::Paused => {}
            GameStatus::Running => {
                resumed_at = Some(session.clock());
                break;
            }
            other => panic!("unexpected status {other:?}"),
        }
    }
    let resumed_at = resumed_at.expect("held spread should re-toggle after the lock");
    let held = resumed_at - paused_at;
    assert!(held >= PAUSE_COOLDOWN, "re-toggled after only {held:?}");
    assert!(held < PAUSE_COOLDOWN + Duration::from_millis(100));
}

#[test]
fn thumbs_down_resets_scores_and_calibration() {
    let mut session = new_session(9);
    session.seed_calibration(vec![CalibrationRange { min: 0.2, max: 0.8 }]);
    assert!(session.calibration().active().is_some());

    apply_input(&mut session, SessionInput::pose(HandPose::Open, 0.5), DT);
    apply_input(&mut session, SessionInput::request(UiRequest::Start), DT);

    // Let the start cooldown lapse with a neutral pose, then reset.
    for _ in 0..70 {
        apply_input(&mut session, SessionInput::pose(HandPose::Open, 0.5), DT);
    }
    apply_input(&mut session, SessionInput::pose(HandPose::ThumbsDown, 0.5), DT);
    assert_eq!(session.status(), GameStatus::Idle);
    assert_eq!(session.score().player, 0);
    assert_eq!(session.score().computer, 0);
    assert!(session.calibration().active().is_none());

    // The reset cooldown also suppresses an immediate gesture restart.
    let reset_at = session.clock();
    let mut restarted_at = None;
    for _ in 0..300 {
        apply_input(&mut session, SessionInput::pose(HandPose::ThumbsUp, 0.5), DT);
        if session.status() == GameStatus::Running {
            restarted_at = Some(session.clock());
            break;
        }
    }
    let restarted_at = restarted_at.expect("thumbs up should restart after the lock");
    assert!(restarted_at - reset_at >= RESET_COOLDOWN);
}

#[test]
fn a_full_match_ends_exactly_once_after_the_win_delay() {
    let settings = PlayerSettings {
        difficulty: Difficulty::Hard,
        ..PlayerSettings::default()
    };
    let mut session = GameSession::new(settings, 123);
    apply_input(&mut session, SessionInput::pose(HandPose::Open, 0.5), DT);
    apply_input(&mut session, SessionInput::request(UiRequest::Start), DT);

    let mut last_score = session.score();
    let mut win_score_at = None;
    let mut game_over: Vec<(Side, Duration)> = Vec::new();

    // The player's hand disappears: the paddle sits centered and the AI
    // should grind out the win. Scores must only ever increase.
    let mut frames_after_over = 0;
    for _ in 0..120_000 {
        let events = apply_input(&mut session, SessionInput::absent(), DT);
        for event in &events {
            match event {
                SessionEvent::ScoreChanged(score) => {
                    assert!(score.player >= last_score.player);
                    assert!(score.computer >= last_score.computer);
                    last_score = *score;
                    if score.player == WINNING_SCORE || score.computer == WINNING_SCORE {
                        win_score_at = Some(session.clock());
                    }
                }
                SessionEvent::GameOver(winner) => {
                    game_over.push((*winner, session.clock()));
                }
                _ => {}
            }
        }
        if session.status() == GameStatus::Over {
            frames_after_over += 1;
            // Linger to prove the ball never resets and nothing re-fires.
            if frames_after_over > 120 {
                break;
            }
        }
    }

    assert_eq!(session.status(), GameStatus::Over, "match never finished");
    assert_eq!(game_over.len(), 1, "game over fired {} times", game_over.len());
    let (winner, over_at) = game_over[0];
    assert_eq!(session.score().of(winner), WINNING_SCORE);
    assert!(!session.snapshot().ball_in_play, "ball must not reset after the win");

    let win_score_at = win_score_at.expect("winning score event seen");
    let delay = over_at - win_score_at;
    assert!(delay >= OVER_DELAY, "over arrived early: {delay:?}");
    assert!(delay < OVER_DELAY + Duration::from_millis(100));

    // Restart path: over -> idle -> running, with scores back at zero.
    apply_input(&mut session, SessionInput::request(UiRequest::Restart), DT);
    assert_eq!(session.status(), GameStatus::Idle);
    apply_input(&mut session, SessionInput::pose(HandPose::ThumbsUp, 0.5), DT);
    assert_eq!(session.status(), GameStatus::Running);
    assert_eq!(session.score().player, 0);
    assert_eq!(session.score().computer, 0);
}

#[test]
fn scoring_emits_banter_requests() {
    let settings = PlayerSettings {
        difficulty: Difficulty::Hard,
        ..PlayerSettings::default()
    };
    let mut session = GameSession::new(settings, 77);
    apply_input(&mut session, SessionInput::pose(HandPose::Open, 0.5), DT);
    apply_input(&mut session, SessionInput::request(UiRequest::Start), DT);

    for _ in 0..60_000 {
        let events = apply_input(&mut session, SessionInput::absent(), DT);
        let scored = events
            .iter()
            .find_map(|e| match e {
                SessionEvent::ScoreChanged(score)
                    if score.player + score.computer > 0 =>
                {
                    Some(*score)
                }
                _ => None,
            });
        if let Some(score) = scored {
            let banter = events.iter().any(|e| matches!(e, SessionEvent::Banter(_)));
            assert!(banter, "score {score:?} came without a banter request");
            return;
        }
    }
    panic!("no point was ever scored");
}

#[test]
fn calibration_runs_end_to_end_through_the_session() {
    let mut session = new_session(3);
    apply_input(&mut session, SessionInput::pose(HandPose::Open, 0.5), DT);
    apply_input(&mut session, SessionInput::request(UiRequest::Calibrate), DT);
    assert_eq!(session.status(), GameStatus::Calibrating);

    // Park the fist at the very top of the frame, then the very bottom.
    let mut saved = None;
    for _ in 0..140 {
        let events = apply_input(&mut session, SessionInput::pose(HandPose::Fist, 0.0), DT);
        assert!(events.iter().all(|e| !matches!(e, SessionEvent::CalibrationSaved(_))));
    }
    for _ in 0..140 {
        let events = apply_input(&mut session, SessionInput::pose(HandPose::Fist, 1.0), DT);
        if let Some(SessionEvent::CalibrationSaved(range)) = events
            .iter()
            .find(|e| matches!(e, SessionEvent::CalibrationSaved(_)))
        {
            saved = Some(*range);
            break;
        }
    }

    let range = saved.expect("calibration should complete");
    assert!(range.min < 0.05);
    assert!(range.max > 0.95);
    assert_eq!(session.status(), GameStatus::Idle);
    assert!(session.snapshot().calibration.success_visible);
}

#[test]
fn an_aborted_dwell_saves_nothing() {
    let mut session = new_session(3);
    apply_input(&mut session, SessionInput::pose(HandPose::Open, 0.5), DT);
    apply_input(&mut session, SessionInput::request(UiRequest::Calibrate), DT);

    // Hover near the top briefly, then wander off before the hold lands.
    for _ in 0..40 {
        apply_input(&mut session, SessionInput::pose(HandPose::Fist, 0.0), DT);
    }
    for _ in 0..40 {
        apply_input(&mut session, SessionInput::pose(HandPose::Fist, 0.5), DT);
    }
    assert_eq!(session.status(), GameStatus::Calibrating);
    assert!(session.calibration().active().is_none());
    assert_eq!(session.calibration().history_len(), 0);
}

#[test]
fn landmark_callbacks_only_land_on_the_next_tick() {
    let mut session = started_session(11);
    let before = session.snapshot().player_y;

    // The callback alone must not move anything.
    let points = pose_landmarks(HandPose::Fist, 0.95);
    session.handle_landmarks(Some(points.as_slice()));
    assert_eq!(session.snapshot().player_y, before);

    session.tick(DT);
    assert!(session.snapshot().player_y > before);
}

#[test]
fn only_the_control_gesture_moves_the_paddle() {
    let mut session = started_session(11);
    let before = session.snapshot().player_y;

    // An open hand is not the fist control gesture: target stays put.
    for _ in 0..30 {
        apply_input(&mut session, SessionInput::pose(HandPose::Open, 0.95), DT);
    }
    assert_eq!(session.snapshot().player_y, before);

    for _ in 0..30 {
        apply_input(&mut session, SessionInput::pose(HandPose::Fist, 0.95), DT);
    }
    assert!(session.snapshot().player_y > before);
}

#[test]
fn dropped_inference_frames_hold_the_last_target() {
    let mut session = started_session(13);
    for _ in 0..120 {
        apply_input(&mut session, SessionInput::pose(HandPose::Fist, 0.9), DT);
    }
    let reached = session.snapshot().player_y;
    assert!(reached > GAME_HEIGHT * 0.5);

    // Source stalls entirely: the paddle stays where it was.
    for _ in 0..60 {
        apply_input(&mut session, SessionInput::skipped(), DT);
    }
    assert_eq!(session.snapshot().player_y, reached);
}

#[test]
fn leaving_play_recenters_the_paddle() {
    let mut session = started_session(17);
    for _ in 0..120 {
        apply_input(&mut session, SessionInput::pose(HandPose::Fist, 0.05), DT);
    }
    assert!(session.snapshot().player_y < 300.0);

    // Past the start cooldown, thumbs down resets to idle and recenters.
    apply_input(&mut session, SessionInput::pose(HandPose::ThumbsDown, 0.5), DT);
    assert_eq!(session.status(), GameStatus::Idle);
    assert_eq!(session.snapshot().player_y, GAME_HEIGHT * 0.5);
}

#[test]
fn seeded_calibration_scales_the_mapping() {
    let mut session = new_session(19);
    session.seed_calibration(vec![CalibrationRange { min: 0.25, max: 0.75 }]);
    apply_input(&mut session, SessionInput::pose(HandPose::Open, 0.5), DT);
    apply_input(&mut session, SessionInput::request(UiRequest::Start), DT);

    // The bottom of the personal range pins the paddle to the bottom of its
    // travel, even though the raw hand is only at 0.75.
    for _ in 0..400 {
        apply_input(&mut session, SessionInput::pose(HandPose::Fist, 0.75), DT);
    }
    let low = session.snapshot().player_y;
    assert!((low - game::physics::PADDLE_MAX_Y).abs() < 1.0, "got {low}");

    for _ in 0..400 {
        apply_input(&mut session, SessionInput::pose(HandPose::Fist, 0.25), DT);
    }
    let high = session.snapshot().player_y;
    assert!((high - PADDLE_MIN_Y).abs() < 1.0, "got {high}");
}
