// Demo window: one overlay with a list of sample widgets.
// Keyboard maps to the pad: arrows = d-pad, Enter = A, Backspace = B, Space = Y.

use anyhow::Context as _;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use softbuffer::{Context, Surface};
use tessera_ui::error::DisplayError;
use tessera_ui::ui::element::{
    CategoryHeader, CustomDrawer, ListItem, OverlayFrame, StepMode, TableDrawer, TrackBar,
};
use tessera_ui::ui::input::TouchPoint;
use tessera_ui::ui::{
    Buttons, Display, Gui, InputPoller, InputSnapshot, InputSource, List, PixelSurface, Renderer,
    SharedInput,
};
use tessera_ui::UiConfig;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// What the window has seen; read by the poller thread
#[derive(Default)]
struct DeviceState {
    held: Buttons,
    cursor: TouchPoint,
    touch: Option<TouchPoint>,
}

struct WindowInput {
    state: Arc<Mutex<DeviceState>>,
    previous: Buttons,
}

impl InputSource for WindowInput {
    fn poll(&mut self) -> InputSnapshot {
        let state = self.state.lock();
        let held = state.held;
        let down = held - self.previous;
        self.previous = held;
        InputSnapshot {
            buttons_down: down,
            buttons_held: held,
            touches: state.touch.into_iter().collect(),
            ..Default::default()
        }
    }
}

fn map_key(code: KeyCode) -> Option<Buttons> {
    Some(match code {
        KeyCode::ArrowUp => Buttons::UP,
        KeyCode::ArrowDown => Buttons::DOWN,
        KeyCode::ArrowLeft => Buttons::LEFT,
        KeyCode::ArrowRight => Buttons::RIGHT,
        KeyCode::Enter => Buttons::A,
        KeyCode::Backspace => Buttons::B,
        KeyCode::KeyX => Buttons::X,
        KeyCode::Space => Buttons::Y,
        KeyCode::KeyQ => Buttons::L,
        KeyCode::KeyE => Buttons::R,
        KeyCode::Equal => Buttons::PLUS,
        KeyCode::Minus => Buttons::MINUS,
        _ => return None,
    })
}

/// softbuffer-backed display, premultiplied onto black
struct WindowDisplay {
    _context: Context<Rc<Window>>,
    surface: Surface<Rc<Window>, Rc<Window>>,
    interval: Duration,
    last_vsync: Option<Instant>,
}

impl WindowDisplay {
    fn new(window: Rc<Window>, interval: Duration) -> anyhow::Result<Self> {
        let context = Context::new(window.clone())
            .map_err(|e| anyhow::anyhow!("softbuffer context: {}", e))?;
        let surface = Surface::new(&context, window)
            .map_err(|e| anyhow::anyhow!("softbuffer surface: {}", e))?;
        Ok(Self {
            _context: context,
            surface,
            interval,
            last_vsync: None,
        })
    }
}

#[inline]
fn onto_black(argb: u32) -> u32 {
    let a = argb >> 24;
    let channel = |shift: u32| (((argb >> shift) & 0xFF) * a / 0xFF) << shift;
    channel(16) | channel(8) | channel(0)
}

impl Display for WindowDisplay {
    fn present(&mut self, frame: &PixelSurface) -> Result<(), DisplayError> {
        let (Some(w), Some(h)) = (
            NonZeroU32::new(frame.width() as u32),
            NonZeroU32::new(frame.height() as u32),
        ) else {
            return Err(DisplayError::SizeMismatch {
                surface_width: frame.width(),
                surface_height: frame.height(),
                target_width: 0,
                target_height: 0,
            });
        };
        self.surface
            .resize(w, h)
            .map_err(|e| DisplayError::Present(e.to_string()))?;
        let mut buffer = self
            .surface
            .buffer_mut()
            .map_err(|e| DisplayError::Present(e.to_string()))?;
        frame.to_argb8888(&mut buffer);
        for px in buffer.iter_mut() {
            *px = onto_black(*px);
        }
        buffer
            .present()
            .map_err(|e| DisplayError::Present(e.to_string()))
    }

    fn wait_for_vsync(&mut self) {
        if let Some(last) = self.last_vsync {
            let next = last + self.interval;
            let now = Instant::now();
            if next > now {
                std::thread::sleep(next - now);
            }
        }
        self.last_vsync = Some(Instant::now());
    }
}

fn build_ui() -> Gui {
    let mut list = List::new();
    list.add_item(Box::new(CategoryHeader::new("General")), None, None);
    list.add_item(
        Box::new(ListItem::new("Refresh").with_listener(|buttons| {
            if buttons.contains(Buttons::A) {
                log::info!("refresh pressed");
                return true;
            }
            false
        })),
        None,
        None,
    );
    list.add_item(
        Box::new(
            ListItem::toggle("Wireless", true)
                .with_state_listener(|on| log::info!("wireless {}", if on { "on" } else { "off" })),
        ),
        None,
        None,
    );
    list.add_item(
        Box::new(ListItem::new(
            "A rather long entry that scrolls once it has been focused for a couple of seconds",
        )),
        None,
        None,
    );
    list.add_item(
        Box::new(
            TrackBar::new("Brightness", StepMode::Analog)
                .with_listener(|v| log::debug!("brightness {}", v)),
        ),
        None,
        None,
    );
    list.add_item(
        Box::new(TrackBar::new(
            "Profile",
            StepMode::Named(vec!["Quiet".into(), "Balanced".into(), "Boost".into()]),
        )),
        None,
        None,
    );
    list.add_item(Box::new(CategoryHeader::new("System")), None, None);
    list.add_item(
        Box::new(TableDrawer::new((0..16).map(|i| {
            (format!("Sensor {}", i), format!("{}.{} °C", 30 + i, i % 10))
        }))),
        None,
        None,
    );
    list.add_item(Box::new(ListItem::new("Version").with_value("0.1.0", true)), None, None);
    list.add_item(
        Box::new(CustomDrawer::new(60, |r, b| {
            let colour = r.theme().star;
            r.draw_circle(b.x + b.width / 2, b.y + b.height / 2, 20, true, colour);
        })),
        None,
        None,
    );

    let mut frame = OverlayFrame::new("Tessera", "demo overlay");
    frame.set_content(Box::new(list));
    Gui::new(Box::new(frame))
}

struct App {
    config: UiConfig,
    shared: SharedInput,
    device: Arc<Mutex<DeviceState>>,
    poller: Option<InputPoller>,
    window: Option<Rc<Window>>,
    display: Option<WindowDisplay>,
    renderer: Option<Renderer>,
    gui: Gui,
    scale: f64,
    failure: Option<anyhow::Error>,
}

impl App {
    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let width = self.config.surface.width as u32;
        let height = self.config.surface.height as u32;
        let attributes = Window::default_attributes()
            .with_title("Tessera")
            .with_inner_size(winit::dpi::PhysicalSize::new(width, height))
            .with_resizable(false);
        let window = Rc::new(event_loop.create_window(attributes).context("creating window")?);
        self.scale = window.scale_factor();

        let renderer = Renderer::from_config(&self.config).context("building renderer")?;
        let interval = Duration::from_millis(self.config.render.frame_interval_ms);
        self.display = Some(WindowDisplay::new(window.clone(), interval)?);
        self.renderer = Some(renderer);

        let source = WindowInput {
            state: self.device.clone(),
            previous: Buttons::empty(),
        };
        self.poller = Some(
            InputPoller::spawn(source, self.shared.clone(), POLL_INTERVAL)
                .context("starting input poller")?,
        );
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn frame(&mut self) -> anyhow::Result<()> {
        let (Some(renderer), Some(display)) = (self.renderer.as_mut(), self.display.as_mut()) else {
            return Ok(());
        };
        let input = self.shared.take();
        self.gui.handle_input(&input, Instant::now());
        self.gui.render(renderer, display)?;
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.failure = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.start(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if code == KeyCode::F5 && event.state.is_pressed() {
                        if let Some(renderer) = self.renderer.as_mut() {
                            if let Err(e) = renderer.reload_theme() {
                                log::warn!("theme reload failed: {}", e);
                            }
                        }
                    }
                    if let Some(button) = map_key(code) {
                        let mut device = self.device.lock();
                        device.held.set(button, event.state.is_pressed());
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let mut device = self.device.lock();
                device.cursor = TouchPoint {
                    x: (position.x / self.scale) as i32,
                    y: (position.y / self.scale) as i32,
                };
                if device.touch.is_some() {
                    device.touch = Some(device.cursor);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let mut device = self.device.lock();
                device.touch = match state {
                    ElementState::Pressed => Some(device.cursor),
                    ElementState::Released => None,
                };
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.frame() {
                    self.fail(event_loop, e);
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }
}

fn main() -> anyhow::Result<()> {
    tessera_ui::init_logging();

    let config = UiConfig::load().context("loading config")?;
    let event_loop = EventLoop::new().context("creating event loop")?;
    let mut app = App {
        config,
        shared: SharedInput::new(),
        device: Arc::new(Mutex::new(DeviceState::default())),
        poller: None,
        window: None,
        display: None,
        renderer: None,
        gui: build_ui(),
        scale: 1.0,
        failure: None,
    };
    event_loop.run_app(&mut app).context("event loop")?;
    match app.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
