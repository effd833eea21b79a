//! Headless scripted match: a wobbly synthetic hand chases the ball until
//! someone wins, then the final snapshot is printed as JSON.

use std::time::Duration;

use anyhow::{Context, Result};
use engine::HeadlessRunner;
use tracing_subscriber::EnvFilter;

use game::physics::{GAME_HEIGHT, PADDLE_HEIGHT};
use game::playtest::{HandPose, PongLogic, SessionInput, UiRequest};
use game::settings::PlayerSettings;
use game::state::GameStatus;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let seed = match std::env::args().nth(1) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("seed must be a u64, got {raw:?}"))?,
        None => 42,
    };

    let dt = Duration::from_millis(16);
    let logic = PongLogic::new(PlayerSettings::default(), seed);
    let mut runner = HeadlessRunner::new(logic, dt);

    // Wake the landmark source, then start the match.
    runner.step(SessionInput::pose(HandPose::Open, 0.5));
    runner.step(SessionInput::request(UiRequest::Start));

    let max_frames = 60 * 180; // three simulated minutes
    let mut last_score = runner.state().score();
    for frame in 0..max_frames {
        let snapshot = runner.state().snapshot();
        if snapshot.status == GameStatus::Over {
            break;
        }

        // Scripted player: chase the ball with a slightly wobbly hand. The
        // wobble keeps the match imperfect enough to end.
        let desired = ((snapshot.ball.y - PADDLE_HEIGHT * 0.5) / (GAME_HEIGHT - PADDLE_HEIGHT))
            .clamp(0.0, 1.0);
        let wobble = (frame as f32 * 0.05).sin() * 0.04;
        runner.step(SessionInput::pose(HandPose::Fist, desired + wobble));

        let score = runner.state().score();
        if score != last_score {
            last_score = score;
            tracing::info!(
                frame,
                player = score.player,
                computer = score.computer,
                "point scored"
            );
        }
    }

    let snapshot = runner.state().snapshot();
    tracing::info!(
        frames = runner.frame(),
        elapsed_ms = runner.elapsed().as_millis() as u64,
        "simulation finished"
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
