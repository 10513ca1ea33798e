// SPDX-License-Identifier: GPL-3.0-only

//! Terminal viewer
//!
//! Streams the synthetic sensor through the compositor and shows the
//! composited viewport with Unicode half-block characters, two canvas rows
//! per terminal row.

use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use tracing::{error, info};

use crate::compositor::Compositor;
use crate::config::Config;
use crate::render::Canvas;
use crate::storage;
use crate::streaming::{CaptureLoopController, SyntheticSensor};

/// Drag applied per arrow key press, in viewport pixels
const ARROW_DRAG_PX: f32 = 8.0;

/// Run the terminal viewer until the user quits
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let compositor = Compositor::new(config.clone());
    let sensor = SyntheticSensor::new(&config.sensor);
    info!(streams = sensor.streams().len(), "Starting synthetic sensor");
    let mut capture = CaptureLoopController::stream(sensor, Arc::clone(&compositor), None)?;

    let mut canvas = Canvas::default();
    let mut status_message = build_status_message(compositor.point_cloud_mode());

    loop {
        terminal.draw(|f| {
            let area = f.area();
            let view_area = Rect {
                height: area.height.saturating_sub(1),
                ..area
            };

            compositor.on_viewport_resized(view_area.width as u32, view_area.height as u32 * 2);
            compositor.on_draw_tick(&mut canvas);
            f.render_widget(CanvasWidget { canvas: &canvas }, view_area);

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(
                StatusBar {
                    message: &status_message,
                },
                status_area,
            );
        })?;

        if !capture.is_running() {
            status_message = "Capture stopped | 'q' quit".to_string();
        }

        if event::poll(Duration::from_millis(33))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Char('p') => {
                    let enabled = !compositor.point_cloud_mode();
                    compositor.set_point_cloud_mode(enabled);
                    status_message = build_status_message(enabled);
                }
                KeyCode::Left => compositor.on_user_drag(-ARROW_DRAG_PX, 0.0),
                KeyCode::Right => compositor.on_user_drag(ARROW_DRAG_PX, 0.0),
                KeyCode::Up => compositor.on_user_drag(0.0, -ARROW_DRAG_PX),
                KeyCode::Down => compositor.on_user_drag(0.0, ARROW_DRAG_PX),
                KeyCode::Char('r') => compositor.reset_rotation(),
                KeyCode::Char('s') => {
                    status_message = match save_full_size_snapshot(&compositor, &config) {
                        Ok(path) => format!("Saved: {}", path.display()),
                        Err(e) => {
                            error!("Failed to save snapshot: {}", e);
                            format!("Error: {}", e)
                        }
                    };
                }
                _ => {}
            }
        }
    }

    capture.stop();
    compositor.reset();
    Ok(())
}

/// Render at the configured viewport size rather than the terminal's
fn save_full_size_snapshot(
    compositor: &Compositor,
    config: &Config,
) -> Result<std::path::PathBuf, Box<dyn std::error::Error>> {
    let mut canvas = Canvas::default();
    compositor.on_viewport_resized(config.viewport.width, config.viewport.height);
    compositor.on_draw_tick(&mut canvas);
    Ok(storage::save_snapshot(
        &canvas,
        None,
        &storage::snapshot_directory(),
    )?)
}

fn build_status_message(point_cloud: bool) -> String {
    let mode = if point_cloud { "point cloud" } else { "2-D" };
    format!(
        "[{}] 'p' toggle view | arrows rotate | 'r' reset | 's' snapshot | 'q' quit",
        mode
    )
}

/// Shows a canvas at one pixel per column and two pixels per row
struct CanvasWidget<'a> {
    canvas: &'a Canvas,
}

impl Widget for CanvasWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows = area.height.min((self.canvas.height() / 2) as u16);
        let cols = area.width.min(self.canvas.width() as u16);

        for ty in 0..rows {
            for tx in 0..cols {
                let top = pixel_color(self.canvas, tx as u32, ty as u32 * 2);
                let bottom = pixel_color(self.canvas, tx as u32, ty as u32 * 2 + 1);
                if let Some(cell) = buf.cell_mut((area.x + tx, area.y + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

fn pixel_color(canvas: &Canvas, x: u32, y: u32) -> Color {
    match canvas.get_pixel(x, y) {
        Some([r, g, b, _]) => Color::Rgb(r, g, b),
        None => Color::Reset,
    }
}

struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}
