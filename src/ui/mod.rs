use std::{
    cell::RefCell,
    io,
    rc::Rc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode,
        KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect as Area},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};
use tracing::info;

use crate::{
    config::Settings,
    core::{Pointer, World},
    data::{DataItem, Dataset},
    render::{self, CellMetrics, FrameBuffer, CELL_HEIGHT, CELL_WIDTH},
    types::Point,
};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub fn run(dataset: Dataset, settings: Settings, seed: Option<u64>) -> Result<()> {
    let mut world = match seed {
        Some(seed) => World::with_seed(settings, seed),
        None => World::new(settings),
    };
    world.load(&dataset);
    info!(backlog = world.backlog_len(), "simulation starting");

    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal")?;

    let result = event_loop(&mut terminal, &mut world);
    shutdown_terminal(&mut terminal)?;
    result
}

fn event_loop(terminal: &mut Term, world: &mut World) -> Result<()> {
    let selected: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&selected);
    world.set_on_select(Box::new(move |key: &str, item: &DataItem| {
        *sink.borrow_mut() = Some(format!("{} [{key}]", item.name));
    }));
    world.set_tip_text(Box::new(|key: &str, item: &DataItem| {
        format!("{key}: {} ({})", item.name, item.count)
    }));

    let metrics = CellMetrics;
    let frame_interval = world.settings().frame_interval();
    let started = Instant::now();
    let mut ui_state = UiState::new();
    let mut last_frame: Option<Instant> = None;
    let mut frames = 0_u32;
    let mut last_fps_sample = Instant::now();
    let mut fps = 0.0_f32;

    loop {
        let now_ms = started.elapsed().as_millis() as u64;

        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                        return Ok(());
                    }
                }
                CrosstermEvent::Mouse(mouse) => ui_state.handle_mouse(mouse, world, now_ms),
                _ => {}
            }
        }

        if last_frame.is_some_and(|at| at.elapsed() < frame_interval) {
            std::thread::sleep(Duration::from_millis(1));
            continue;
        }
        last_frame = Some(Instant::now());

        let size = terminal.size()?;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(size);
        let viewport = Block::default().borders(Borders::ALL).inner(chunks[1]);
        if ui_state.ensure_viewport(viewport) {
            world.resize(
                viewport.width as f32 * CELL_WIDTH,
                viewport.height as f32 * CELL_HEIGHT,
            );
        }

        world.frame(ui_state.pointer, now_ms, &metrics);
        render::draw(world, &mut ui_state.framebuf, &metrics);
        let lines = frame_lines(&ui_state.framebuf);

        frames += 1;
        if last_fps_sample.elapsed() >= Duration::from_secs(1) {
            fps = frames as f32 / last_fps_sample.elapsed().as_secs_f32();
            frames = 0;
            last_fps_sample = Instant::now();
        }

        let header = format!(
            "bubbles: {} | occurrences: {} | backlog: {} | hovered: {} | cursor: {:?} | fps: {:.1}",
            world.bubbles().len(),
            world.total_occurrences(),
            world.backlog_len(),
            world.hovered_key().unwrap_or("-"),
            world.cursor(),
            fps,
        );
        let footer = format!(
            "selected: {} | drag: move a bubble | double click: select | q: quit",
            selected.borrow().as_deref().unwrap_or("-"),
        );

        terminal.draw(|frame| {
            frame.render_widget(
                Paragraph::new(header).block(Block::default().borders(Borders::ALL).title("wordbubbles")),
                chunks[0],
            );
            frame.render_widget(
                Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
                chunks[1],
            );
            frame.render_widget(
                Paragraph::new(footer).block(Block::default().borders(Borders::ALL).title("Controls")),
                chunks[2],
            );
        })?;
    }
}

fn shutdown_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

struct UiState {
    framebuf: FrameBuffer,
    viewport: Area,
    pointer: Pointer,
}

impl UiState {
    fn new() -> Self {
        Self {
            framebuf: FrameBuffer::new(0, 0),
            viewport: Area::default(),
            pointer: Pointer {
                position: Point::new(-1.0, -1.0),
                pressed: false,
            },
        }
    }

    /// Returns true when the viewport changed size.
    fn ensure_viewport(&mut self, viewport: Area) -> bool {
        let resized = self.viewport.width != viewport.width || self.viewport.height != viewport.height;
        self.viewport = viewport;
        if resized || self.framebuf.width() != viewport.width {
            self.framebuf.resize(viewport.width, viewport.height);
        }
        resized
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, world: &mut World, now_ms: u64) {
        self.pointer.position = self.to_world(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.pointer.pressed = true,
            MouseEventKind::Up(MouseButton::Left) => {
                self.pointer.pressed = false;
                world.pointer_released();
                world.pointer_clicked(now_ms);
            }
            MouseEventKind::Moved | MouseEventKind::Drag(_) => world.pointer_moved(now_ms),
            _ => {}
        }
    }

    /// Center of a terminal cell in world pixels.
    fn to_world(&self, column: u16, row: u16) -> Point {
        let x = column as f32 - self.viewport.x as f32;
        let y = row as f32 - self.viewport.y as f32;
        Point::new((x + 0.5) * CELL_WIDTH, (y + 0.5) * CELL_HEIGHT)
    }
}

/// Converts the frame buffer into styled lines, merging runs of equally
/// colored cells into one span.
fn frame_lines(framebuf: &FrameBuffer) -> Vec<Line<'static>> {
    (0..framebuf.height())
        .map(|y| {
            let mut spans: Vec<Span<'static>> = Vec::new();
            let mut run = String::new();
            let mut run_style: Option<Style> = None;
            for x in 0..framebuf.width() {
                let cell = framebuf.get(x, y);
                let style = Style::default().fg(rgb(cell.fg)).bg(rgb(cell.bg));
                if run_style.is_some_and(|current| current != style) {
                    spans.push(Span::styled(std::mem::take(&mut run), run_style.unwrap_or_default()));
                }
                run_style = Some(style);
                run.push(cell.ch);
            }
            if let Some(style) = run_style {
                spans.push(Span::styled(run, style));
            }
            Line::from(spans)
        })
        .collect()
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb(r, g, b)
}
