use std::error::Error;
use std::time::{Duration, Instant};

use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

pub use winit::event::VirtualKeyCode;

pub struct AppConfig {
    pub title: String,
    /// Logical pixel-buffer size; the surface scales to the window.
    pub buffer_size: (u32, u32),
    pub window_size: PhysicalSize<u32>,
    pub vsync: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputFrame {
    /// Cursor position in buffer coordinates.
    pub cursor: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppFlow {
    Continue,
    Exit,
}

/// A windowed, frame-driven app: `update` runs once per redraw with the real
/// elapsed wall-clock time, then `draw` fills the RGBA pixel buffer.
pub trait FrameApp: 'static {
    fn update(&mut self, input: &InputFrame, dt: Duration) -> AppFlow;

    fn draw(&mut self, frame: &mut [u8], width: u32, height: u32);

    fn key(&mut self, _key: VirtualKeyCode, _pressed: bool) {}
}

pub fn run_app<A: FrameApp>(config: AppConfig, mut app: A) -> Result<(), Box<dyn Error>> {
    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title(config.title)
        .with_inner_size(config.window_size)
        .build(&event_loop)?;

    let window_size = window.inner_size();
    let (buffer_w, buffer_h) = config.buffer_size;
    let surface_texture = SurfaceTexture::new(window_size.width, window_size.height, &window);
    let mut pixels_builder = PixelsBuilder::new(buffer_w, buffer_h, surface_texture);
    if let Some(vsync) = config.vsync {
        pixels_builder = pixels_builder.enable_vsync(vsync);
    }
    let mut pixels: Pixels = pixels_builder.build()?;

    let mut input = InputFrame::default();
    let mut last_frame = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match &event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    if let Err(err) = pixels.resize_surface(size.width, size.height) {
                        eprintln!("resize failed: {err}");
                    }
                    window.request_redraw();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let pos = (position.x as f32, position.y as f32);
                    let (x, y) = pixels
                        .window_pos_to_pixel(pos)
                        .unwrap_or_else(|clamped| pixels.clamp_pixel_pos(clamped));
                    input.cursor = Some((x as u32, y as u32));
                }
                WindowEvent::CursorLeft { .. } => {
                    input.cursor = None;
                }
                WindowEvent::KeyboardInput { input: key_input, .. } => {
                    if let Some(key) = key_input.virtual_keycode {
                        app.key(key, key_input.state == ElementState::Pressed);
                    }
                }
                _ => {}
            },
            Event::RedrawRequested(_) => {
                let now = Instant::now();
                let dt = now.saturating_duration_since(last_frame);
                last_frame = now;

                if app.update(&input, dt) == AppFlow::Exit {
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                app.draw(pixels.frame_mut(), buffer_w, buffer_h);
                if let Err(err) = pixels.render() {
                    eprintln!("present failed: {err}");
                    *control_flow = ControlFlow::Exit;
                }
            }
            Event::MainEventsCleared => {
                window.request_redraw();
            }
            _ => {}
        }
    });

    #[allow(unreachable_code)]
    Ok(())
}
