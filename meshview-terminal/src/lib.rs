/// Terminal-based wireframe viewer
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use meshview_core::config::ViewerConfig;
use meshview_core::{CameraLimits, CameraState, FrameUniforms, Mesh, ModelMotion, Presenter};

pub mod logging;
pub mod renderer;

pub use renderer::{MeshHandle, RenderError, WireframeRenderer};

/// Pointer-equivalent step for one keyboard orbit press, in cells.
const KEY_ORBIT_STEP: f32 = 8.0;

/// Rows reserved for the status line.
const STATUS_ROWS: u16 = 1;

/// What the event loop should do after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Camera and interaction state, independent of the terminal itself.
#[derive(Debug, Clone)]
pub struct ViewerState {
    pub camera: CameraState,
    initial: CameraState,
    limits: CameraLimits,
    sensitivity: f32,
    scroll_step: f32,
    last_pointer: Option<(u16, u16)>,
    paused: bool,
    spin_time: f32,
}

impl ViewerState {
    pub fn new(config: &ViewerConfig) -> Self {
        let camera = config.camera.initial_state();
        Self {
            camera,
            initial: camera,
            limits: config.camera.limits(),
            sensitivity: config.camera.drag_sensitivity,
            scroll_step: config.camera.scroll_step,
            last_pointer: None,
            paused: false,
            spin_time: 0.0,
        }
    }

    /// Place the camera far enough out to see a mesh of the given radius.
    pub fn frame_radius(&mut self, radius: f32) {
        if radius <= 0.0 || !radius.is_finite() {
            return;
        }
        let fitting = radius / (self.camera.fov * 0.5).sin();
        let distance = fitting.clamp(self.limits.min_distance, self.limits.max_distance);
        self.camera.distance = distance;
        self.initial.distance = distance;
        debug!(radius, distance, "camera framed to mesh");
    }

    /// Seconds of turntable motion so far; frozen while paused.
    pub fn spin_time(&self) -> f32 {
        self.spin_time
    }

    pub fn advance(&mut self, dt: f32) {
        if !self.paused {
            self.spin_time += dt;
        }
    }

    pub fn handle_event(&mut self, event: &Event) -> Control {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                Control::Continue
            }
            _ => Control::Continue,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> Control {
        if key.kind == KeyEventKind::Release {
            return Control::Continue;
        }
        let step = KEY_ORBIT_STEP;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            KeyCode::Char('w') | KeyCode::Up => self.drag(0.0, step),
            KeyCode::Char('s') | KeyCode::Down => self.drag(0.0, -step),
            KeyCode::Char('a') | KeyCode::Left => self.drag(step, 0.0),
            KeyCode::Char('d') | KeyCode::Right => self.drag(-step, 0.0),
            KeyCode::Char('z') | KeyCode::PageUp => self.zoom(-self.scroll_step),
            KeyCode::Char('x') | KeyCode::PageDown => self.zoom(self.scroll_step),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.camera = self.camera.adjust_fov(-1f32.to_radians(), &self.limits);
            }
            KeyCode::Char('-') => {
                self.camera = self.camera.adjust_fov(1f32.to_radians(), &self.limits);
            }
            KeyCode::Char(' ') => self.paused = !self.paused,
            KeyCode::Char('r') => {
                self.camera = self.initial;
                self.spin_time = 0.0;
            }
            _ => {}
        }
        Control::Continue
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent) {
        let position = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.last_pointer = Some(position),
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((x, y)) = self.last_pointer {
                    let dx = f32::from(position.0) - f32::from(x);
                    // Cells are about twice as tall as wide.
                    let dy = (f32::from(position.1) - f32::from(y)) * 2.0;
                    self.drag(dx, dy);
                }
                self.last_pointer = Some(position);
            }
            MouseEventKind::Up(MouseButton::Left) => self.last_pointer = None,
            MouseEventKind::ScrollUp => self.zoom(-self.scroll_step),
            MouseEventKind::ScrollDown => self.zoom(self.scroll_step),
            _ => {}
        }
    }

    fn drag(&mut self, dx: f32, dy: f32) {
        self.camera = self.camera.apply_drag(dx, dy, self.sensitivity);
    }

    fn zoom(&mut self, delta: f32) {
        self.camera = self.camera.adjust_distance(delta, &self.limits);
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    state: ViewerState,
    renderer: WireframeRenderer,
    handle: MeshHandle,
    motion: ModelMotion,
    light_pos: nalgebra::Point3<f32>,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(mesh: Mesh, config: &ViewerConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;

        let mut state = ViewerState::new(config);
        state.frame_radius(mesh.radius());
        let motion = ModelMotion::new(mesh.center(), config.scene.spin_speed);

        let mut renderer = WireframeRenderer::new(
            width as usize,
            height.saturating_sub(STATUS_ROWS) as usize,
            config.mesh.builder(),
        );
        renderer.set_light_position(config.scene.light_position());
        let handle = renderer.insert(mesh);

        Ok(Self {
            state,
            renderer,
            handle,
            motion,
            light_pos: config.scene.light_position(),
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide
        )?;
        info!("terminal viewer started");

        let result = self.main_loop();

        // Cleanup
        execute!(
            stdout(),
            cursor::Show,
            DisableMouseCapture,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        info!("terminal viewer stopped");

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target
        let mut previous = Instant::now();

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_input()?;
            }

            // Update
            self.state.advance((frame_start - previous).as_secs_f32());
            previous = frame_start;

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        let event = event::read()?;
        if let Event::Resize(width, height) = event {
            debug!(width, height, "terminal resized");
            self.renderer
                .resize(width as usize, height.saturating_sub(STATUS_ROWS) as usize);
        }
        if self.state.handle_event(&event) == Control::Quit {
            self.running = false;
        }
        Ok(())
    }

    fn render(&mut self) -> io::Result<()> {
        let uniforms = match FrameUniforms::compose(
            &self.state.camera,
            self.renderer.aspect(),
            self.state.spin_time(),
            &self.motion,
            self.light_pos,
        ) {
            Ok(uniforms) => uniforms,
            Err(e) => {
                // Zero-height terminal; skip the frame.
                warn!("skipping frame: {e}");
                return Ok(());
            }
        };

        self.renderer
            .present(&self.handle, &uniforms.model, &uniforms.view, &uniforms.projection)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, STATUS_ROWS))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        let (vertices, triangles) = self
            .renderer
            .mesh(self.handle)
            .map_or((0, 0), |m| (m.vertex_count(), m.triangle_count()));
        let camera = &self.state.camera;
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            terminal::Clear(terminal::ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "meshview | FPS: {:.1} | {} verts {} tris | yaw {:.0} pitch {:.0} dist {:.1} fov {:.0} | drag/WASD orbit, scroll/Z/X zoom, +/- fov, space pause, R reset, Q quit",
                self.fps,
                vertices,
                triangles,
                camera.yaw.to_degrees(),
                camera.pitch.to_degrees(),
                camera.distance,
                camera.fov.to_degrees(),
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}
