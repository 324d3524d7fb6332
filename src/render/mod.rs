use crate::{
    config::{color, font, tooltip},
    core::{Bubble, World},
    textfit::TextMetrics,
    types::{Point, Rect, Rgba},
};

/// World pixels covered by one terminal cell.
pub const CELL_WIDTH: f32 = 8.0;
pub const CELL_HEIGHT: f32 = 16.0;

const RIM_GLYPH: char = 'o';

/// A surface that accepts drawing intents.
pub trait Canvas {
    fn clear(&mut self, color: Rgba);
    fn circle(&mut self, center: Point, diameter: f32, stroke: Rgba, fill: Rgba, weight: f32);
    fn rectangle(&mut self, area: Rect, stroke: Rgba, fill: Rgba, weight: f32);
    /// Draws `text`, one line per `\n`, centered on `center`.
    fn text(&mut self, size: f32, color: Rgba, center: Point, text: &str);
}

/// Draws the whole world: bubbles in creation order, then the tooltip.
pub fn draw(world: &World, canvas: &mut impl Canvas, metrics: &impl TextMetrics) {
    canvas.clear(Rgba::opaque(color::BACK));

    for (idx, bubble) in world.bubbles().iter().enumerate() {
        draw_bubble(world, idx, bubble, canvas);
    }

    if let Some(bubble) = world.tooltip() {
        draw_tooltip(world, bubble, canvas, metrics);
    }

    if world.bubbles().is_empty() {
        canvas.text(
            font::HEAD,
            Rgba::BLACK,
            world.bounds().midpoint(),
            "Nothing",
        );
    }
}

fn draw_bubble(world: &World, idx: usize, bubble: &Bubble, canvas: &mut impl Canvas) {
    let settings = world.settings();
    let rim = bubble.rim(settings.rim_fraction);
    let diameter = bubble.radius() * 2.0;

    let max = world.max_occurrences().max(1) as f32;
    let depth = (max - bubble.occurrences() as f32) / max;
    let alpha = (1.0 - depth) * settings.alpha_depth + (1.0 - settings.alpha_depth);

    let highlighted = match world.dragged_index() {
        Some(dragged) => dragged == idx,
        None => bubble.hovered(world.pointer().position),
    };
    let (back, fore) = if highlighted {
        (color::HOVER_BALL, color::HOVER_TEXT)
    } else {
        (color::BALL, color::TEXT)
    };
    let fore = Rgba::with_alpha(fore, alpha);

    canvas.circle(bubble.position, diameter, fore, Rgba::opaque(back), rim);
    if let Some(label) = bubble.label() {
        canvas.text(label.font_size as f32, fore, bubble.position, &label.text);
    }
}

/// Places the tip beside the pointer, on whichever side faces the middle of
/// the world.
fn draw_tooltip(world: &World, bubble: &Bubble, canvas: &mut impl Canvas, metrics: &impl TextMetrics) {
    let tip = bubble.tip();
    let pointer = world.pointer().position;
    let size = metrics.line_width(tooltip::POINT_SIZE, tip);

    let left = if pointer.x < world.bounds().mid_x() {
        pointer.x + tooltip::OFFSET
    } else {
        pointer.x - size - tooltip::OFFSET
    };
    let top = pointer.y + tooltip::OFFSET;
    let width = tooltip::MARGIN * 2.0 + size;
    let height = tooltip::MARGIN * 2.0 + tooltip::POINT_SIZE;

    canvas.rectangle(
        Rect::new(top, left, top + height, left + width),
        Rgba::BLACK,
        Rgba::opaque(color::TIP),
        1.0,
    );
    canvas.text(
        tooltip::POINT_SIZE,
        Rgba::BLACK,
        Point::new(left + width / 2.0 + 1.0, top + height / 2.0 + 1.0),
        tip,
    );
}

/// Measures text in whole terminal cells. Font size does not change the
/// size of a cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct CellMetrics;

impl TextMetrics for CellMetrics {
    fn line_width(&self, _size: f32, line: &str) -> f32 {
        line.chars().count() as f32 * CELL_WIDTH
    }

    fn block_height(&self, _size: f32, lines: usize) -> f32 {
        lines as f32 * CELL_HEIGHT
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderCell {
    pub ch: char,
    pub fg: [u8; 3],
    pub bg: [u8; 3],
}

impl RenderCell {
    fn blank(bg: [u8; 3]) -> Self {
        Self { ch: ' ', fg: bg, bg }
    }
}

/// A grid of terminal cells that world pixels are rasterized into.
#[derive(Debug)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<RenderCell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buffer = Self {
            width,
            height,
            cells: Vec::new(),
        };
        buffer.resize(width, height);
        buffer
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = (width as usize).saturating_mul(height as usize);
        self.cells.resize(len, RenderCell::blank(color::BACK));
        self.fill(color::BACK);
    }

    fn fill(&mut self, bg: [u8; 3]) {
        for cell in &mut self.cells {
            *cell = RenderCell::blank(bg);
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, x: u16, y: u16) -> RenderCell {
        debug_assert!(x < self.width && y < self.height, "get() out of bounds");
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.cells[idx]
    }

    fn cell_mut(&mut self, x: i32, y: i32) -> Option<&mut RenderCell> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.cells.get_mut(idx)
    }

    /// Cell containing a world pixel.
    fn cell_at(point: Point) -> (i32, i32) {
        (
            (point.x / CELL_WIDTH).floor() as i32,
            (point.y / CELL_HEIGHT).floor() as i32,
        )
    }

    fn cell_center(x: i32, y: i32) -> Point {
        Point::new(
            (x as f32 + 0.5) * CELL_WIDTH,
            (y as f32 + 0.5) * CELL_HEIGHT,
        )
    }
}

impl Canvas for FrameBuffer {
    fn clear(&mut self, color: Rgba) {
        self.fill(color.over(color::BACK));
    }

    fn circle(&mut self, center: Point, diameter: f32, stroke: Rgba, fill: Rgba, weight: f32) {
        let radius = diameter / 2.0;
        if radius <= 0.0 {
            return;
        }
        // A rim thinner than a cell would leave gaps.
        let rim = weight.max(CELL_WIDTH);
        let (x0, y0) = Self::cell_at(center - Point::new(radius, radius));
        let (x1, y1) = Self::cell_at(center + Point::new(radius, radius));

        for y in y0..=y1 {
            for x in x0..=x1 {
                let distance = Self::cell_center(x, y).distance(center);
                if distance > radius {
                    continue;
                }
                let Some(cell) = self.cell_mut(x, y) else {
                    continue;
                };
                let bg = fill.over(cell.bg);
                *cell = if distance >= radius - rim {
                    RenderCell {
                        ch: RIM_GLYPH,
                        fg: stroke.over(bg),
                        bg,
                    }
                } else {
                    RenderCell::blank(bg)
                };
            }
        }
    }

    fn rectangle(&mut self, area: Rect, stroke: Rgba, fill: Rgba, weight: f32) {
        let (x0, y0) = Self::cell_at(Point::new(area.left, area.top));
        let (x1, y1) = Self::cell_at(Point::new(area.right, area.bottom));
        for y in y0..=y1 {
            for x in x0..=x1 {
                let edge = weight > 0.0 && (x == x0 || x == x1);
                let Some(cell) = self.cell_mut(x, y) else {
                    continue;
                };
                let bg = fill.over(cell.bg);
                *cell = if edge {
                    RenderCell {
                        ch: '│',
                        fg: stroke.over(bg),
                        bg,
                    }
                } else {
                    RenderCell::blank(bg)
                };
            }
        }
    }

    fn text(&mut self, _size: f32, color: Rgba, center: Point, text: &str) {
        let lines: Vec<&str> = text.split('\n').collect();
        let (cx, cy) = Self::cell_at(center);
        let top = cy - (lines.len() as i32 - 1) / 2;

        for (row, line) in lines.iter().enumerate() {
            let y = top + row as i32;
            let left = cx - line.chars().count() as i32 / 2;
            for (col, ch) in line.chars().enumerate() {
                if let Some(cell) = self.cell_mut(left + col as i32, y) {
                    cell.ch = ch;
                    cell.fg = color.over(cell.bg);
                }
            }
        }
    }
}
