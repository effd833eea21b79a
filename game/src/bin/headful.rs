//! Windowed client with a simulated landmark source: the mouse moves the
//! hand vertically, number keys switch the held pose. Useful for playing
//! and debugging the whole pipeline without a camera.

use std::error::Error;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use engine::app::{AppConfig, AppFlow, FrameApp, InputFrame, VirtualKeyCode, run_app};
use rodio::source::{SineWave, Source};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tracing_subscriber::EnvFilter;
use winit::dpi::PhysicalSize;

use game::banter::{BanterFeed, StaticBanter};
use game::persist::{Progress, ProgressStore};
use game::physics::{
    BALL_RADIUS, GAME_HEIGHT, GAME_WIDTH, PADDLE_HEIGHT, PADDLE_MARGIN, PADDLE_WIDTH,
    WINNING_SCORE,
};
use game::playtest::{HandPose, pose_landmarks};
use game::session::{GameSession, SessionEvent};
use game::settings::{PlayerSettings, SettingsStore};
use game::sfx::{
    BEEP_LENGTH, GAME_OVER_HZ, GAME_OVER_SFX_VOLUME, PADDLE_HIT_HZ, PADDLE_HIT_SFX_VOLUME,
    SCORE_HZ, SCORE_SFX_VOLUME, WALL_HZ, WALL_SFX_VOLUME,
};
use game::state::GameStatus;

const BANTER_FLASH: Duration = Duration::from_millis(2500);

struct Sfx {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl Sfx {
    fn new() -> Result<Self, Box<dyn Error>> {
        let (stream, handle) = OutputStream::try_default()?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }

    fn beep(&self, hz: f32, volume: f32) {
        let Ok(sink) = Sink::try_new(&self.handle) else {
            return;
        };
        sink.set_volume(volume);
        sink.append(SineWave::new(hz).take_duration(BEEP_LENGTH));
        sink.detach();
    }
}

struct HeadfulApp {
    session: GameSession,
    settings: PlayerSettings,
    settings_store: SettingsStore,
    progress_store: ProgressStore,
    banter: BanterFeed,
    sfx: Option<Sfx>,
    pose: HandPose,
    hand_visible: bool,
    hand_y: f32,
    banter_flash_until: Duration,
    exit: bool,
}

impl HeadfulApp {
    fn beep(&self, hz: f32, volume: f32) {
        if !self.settings.sound_enabled {
            return;
        }
        if let Some(sfx) = self.sfx.as_ref() {
            sfx.beep(hz, volume);
        }
    }

    fn save_progress(&self) {
        let progress = Progress {
            score: self.session.score(),
            calibration: self.session.calibration().ranges().to_vec(),
        };
        self.progress_store.save_quietly(&progress);
    }

    fn handle_session_events(&mut self, events: Vec<SessionEvent>) {
        for event in events {
            match event {
                SessionEvent::PaddleHit(_) => self.beep(PADDLE_HIT_HZ, PADDLE_HIT_SFX_VOLUME),
                SessionEvent::WallBounce => self.beep(WALL_HZ, WALL_SFX_VOLUME),
                SessionEvent::ScoreChanged(_) => {
                    self.beep(SCORE_HZ, SCORE_SFX_VOLUME);
                    self.save_progress();
                }
                SessionEvent::Banter(scorer) => {
                    self.banter.request(scorer, self.session.clock());
                }
                SessionEvent::GameOver(winner) => {
                    self.beep(GAME_OVER_HZ, GAME_OVER_SFX_VOLUME);
                    tracing::info!(?winner, "game over");
                }
                SessionEvent::CalibrationSaved(range) => {
                    tracing::info!(min = range.min, max = range.max, "calibration saved");
                    self.save_progress();
                }
                SessionEvent::StatusChanged(status) => {
                    tracing::debug!(?status, "status changed");
                }
            }
        }
    }
}

impl FrameApp for HeadfulApp {
    fn update(&mut self, input: &InputFrame, dt: Duration) -> AppFlow {
        if self.exit {
            return AppFlow::Exit;
        }

        if let Some((_, y)) = input.cursor {
            self.hand_y = y as f32 / GAME_HEIGHT;
        }

        if self.hand_visible {
            let points = pose_landmarks(self.pose, self.hand_y);
            self.session.handle_landmarks(Some(points.as_slice()));
        } else {
            self.session.handle_landmarks(None);
        }

        let events = self.session.tick(dt);
        self.handle_session_events(events);

        if let Some(line) = self.banter.poll(self.session.clock()) {
            tracing::info!(fallback = line.fallback, "banter: {}", line.text);
            self.banter_flash_until = self.session.clock() + BANTER_FLASH;
        }

        AppFlow::Continue
    }

    fn draw(&mut self, frame: &mut [u8], width: u32, height: u32) {
        clear(frame, [14, 18, 28, 255]);

        // Dashed center line.
        let mid_x = width as i32 / 2;
        let mut y = 0;
        while y < height {
            fill_rect(frame, width, height, mid_x - 2, y as i32, 4, 18, [40, 48, 66, 255]);
            y += 36;
        }

        let snapshot = self.session.snapshot();

        let paddle_w = PADDLE_WIDTH as i32;
        let paddle_h = PADDLE_HEIGHT as i32;
        fill_rect(
            frame,
            width,
            height,
            PADDLE_MARGIN as i32,
            (snapshot.player_y - PADDLE_HEIGHT * 0.5) as i32,
            paddle_w,
            paddle_h,
            [92, 200, 160, 255],
        );
        fill_rect(
            frame,
            width,
            height,
            (GAME_WIDTH - PADDLE_MARGIN - PADDLE_WIDTH) as i32,
            (snapshot.computer_y - PADDLE_HEIGHT * 0.5) as i32,
            paddle_w,
            paddle_h,
            [200, 120, 120, 255],
        );

        if snapshot.ball_in_play {
            let d = (BALL_RADIUS * 2.0) as i32;
            fill_rect(
                frame,
                width,
                height,
                (snapshot.ball.x - BALL_RADIUS) as i32,
                (snapshot.ball.y - BALL_RADIUS) as i32,
                d,
                d,
                [235, 235, 220, 255],
            );
        }

        // Score pips along the top, one square per point.
        for i in 0..snapshot.score.player.min(WINNING_SCORE) {
            fill_rect(frame, width, height, 40 + i as i32 * 22, 16, 14, 14, [92, 200, 160, 255]);
        }
        for i in 0..snapshot.score.computer.min(WINNING_SCORE) {
            fill_rect(
                frame,
                width,
                height,
                width as i32 - 54 - i as i32 * 22,
                16,
                14,
                14,
                [200, 120, 120, 255],
            );
        }

        if snapshot.status == GameStatus::Calibrating {
            let bar = (240.0 * snapshot.calibration.hold_fraction) as i32;
            fill_rect(frame, width, height, mid_x - 120, 40, 240, 8, [40, 48, 66, 255]);
            fill_rect(frame, width, height, mid_x - 120, 40, bar, 8, [240, 200, 90, 255]);
        }
        if snapshot.calibration.success_visible {
            fill_rect(frame, width, height, 0, 0, width as i32, 4, [120, 220, 120, 255]);
        }
        if self.session.clock() < self.banter_flash_until {
            fill_rect(
                frame,
                width,
                height,
                0,
                height as i32 - 6,
                width as i32,
                6,
                [150, 160, 240, 255],
            );
        }
    }

    fn key(&mut self, key: VirtualKeyCode, pressed: bool) {
        if !pressed {
            return;
        }
        match key {
            VirtualKeyCode::Key1 => self.pose = HandPose::Fist,
            VirtualKeyCode::Key2 => self.pose = HandPose::Pointer,
            VirtualKeyCode::Key3 => self.pose = HandPose::Open,
            VirtualKeyCode::Key4 => self.pose = HandPose::Spread,
            VirtualKeyCode::Key5 => self.pose = HandPose::ThumbsUp,
            VirtualKeyCode::Key6 => self.pose = HandPose::ThumbsDown,
            VirtualKeyCode::Key7 => self.pose = HandPose::Victory,
            VirtualKeyCode::H => self.hand_visible = !self.hand_visible,
            VirtualKeyCode::S => {
                let events = self.session.request_start();
                self.handle_session_events(events);
            }
            VirtualKeyCode::C => {
                let events = self.session.request_calibration();
                self.handle_session_events(events);
            }
            VirtualKeyCode::R => {
                let events = self.session.request_restart();
                self.handle_session_events(events);
            }
            VirtualKeyCode::X => {
                let events = self.session.request_reset();
                self.handle_session_events(events);
            }
            VirtualKeyCode::M => {
                self.settings.sound_enabled = !self.settings.sound_enabled;
                self.session.set_settings(self.settings);
                if let Err(err) = self.settings_store.save(&self.settings) {
                    tracing::warn!(%err, "failed saving settings");
                }
            }
            VirtualKeyCode::Escape => self.exit = true,
            _ => {}
        }
    }
}

fn clear(frame: &mut [u8], color: [u8; 4]) {
    for pixel in frame.chunks_exact_mut(4) {
        pixel.copy_from_slice(&color);
    }
}

#[allow(clippy::too_many_arguments)]
fn fill_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    color: [u8; 4],
) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w).min(width as i32);
    let y1 = (y + h).min(height as i32);
    for row in y0..y1 {
        for col in x0..x1 {
            let i = (row as usize * width as usize + col as usize) * 4;
            frame[i..i + 4].copy_from_slice(&color);
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let settings_store = SettingsStore::from_env();
    let settings = settings_store.load();
    let progress_store = ProgressStore::from_env();
    let progress = progress_store.load();

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(1);
    let mut session = GameSession::new(settings, seed);
    session.seed_calibration(progress.calibration);
    session.seed_score(progress.score);

    let sfx = match Sfx::new() {
        Ok(sfx) => Some(sfx),
        Err(err) => {
            tracing::warn!(%err, "audio disabled");
            None
        }
    };

    let app = HeadfulApp {
        session,
        settings,
        settings_store,
        progress_store,
        banter: BanterFeed::spawn(StaticBanter::default()),
        sfx,
        pose: HandPose::Fist,
        hand_visible: true,
        hand_y: 0.5,
        banter_flash_until: Duration::ZERO,
        exit: false,
    };

    let config = AppConfig {
        title: "Hand Pong".to_string(),
        buffer_size: (GAME_WIDTH as u32, GAME_HEIGHT as u32),
        window_size: PhysicalSize::new(GAME_WIDTH as u32, GAME_HEIGHT as u32),
        vsync: None,
    };
    run_app(config, app)
}
