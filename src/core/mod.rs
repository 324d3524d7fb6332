mod bubble;

use std::{
    collections::{HashMap, VecDeque},
    rc::Rc,
};

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, info};

pub use bubble::{Bubble, Drag, Pointer, Surroundings};

use crate::{
    config::Settings,
    data::{DataItem, Dataset, Occurrence},
    textfit::TextMetrics,
    types::Rect,
};

/// Produces tooltip text for a newly created bubble.
pub type TipText = Box<dyn Fn(&str, &DataItem) -> String>;
/// Called when a bubble is double clicked.
pub type OnSelect = Box<dyn FnMut(&str, &DataItem)>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorKind {
    #[default]
    Arrow,
    Hand,
    Move,
}

pub struct World {
    settings: Settings,
    bounds: Rect,
    bubbles: Vec<Bubble>,
    index: HashMap<Rc<str>, usize>,
    backlog: VecDeque<Occurrence>,
    total_occurrences: u64,
    max_occurrences: u64,
    drag: Drag,
    hovered: Option<usize>,
    pointer: Pointer,
    cursor: CursorKind,
    tooltip_armed: bool,
    last_move_ms: u64,
    last_click_ms: Option<u64>,
    tip_text: Option<TipText>,
    on_select: Option<OnSelect>,
    rng: StdRng,
}

impl World {
    pub fn new(settings: Settings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    pub fn with_seed(settings: Settings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: Settings, rng: StdRng) -> Self {
        Self {
            settings,
            bounds: Rect::default(),
            bubbles: Vec::new(),
            index: HashMap::new(),
            backlog: VecDeque::new(),
            total_occurrences: 0,
            max_occurrences: 0,
            drag: Drag::default(),
            hovered: None,
            pointer: Pointer::default(),
            cursor: CursorKind::Arrow,
            tooltip_armed: false,
            last_move_ms: 0,
            last_click_ms: None,
            tip_text: None,
            on_select: None,
            rng,
        }
    }

    pub fn set_tip_text(&mut self, tip_text: TipText) {
        self.tip_text = Some(tip_text);
    }

    pub fn set_on_select(&mut self, on_select: OnSelect) {
        self.on_select = Some(on_select);
    }

    /// Fits the world to a surface of `width` by `height`, less the margin.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.bounds = Rect::new(0.0, 0.0, height.max(0.0), width.max(0.0))
            .shrink(self.settings.world_margin);
        info!(width, height, "world resized");
    }

    /// Queues every occurrence of `dataset`, shuffled.
    pub fn load(&mut self, dataset: &Dataset) {
        let backlog = dataset.occurrences(&mut self.rng);
        self.backlog.extend(backlog);
    }

    pub fn enqueue(&mut self, occurrence: Occurrence) {
        self.backlog.push_back(occurrence);
    }

    /// Admits one pending occurrence, growing its bubble or creating it.
    /// Returns false when the backlog is empty.
    pub fn admit_next(&mut self) -> bool {
        let Some(occurrence) = self.backlog.pop_front() else {
            return false;
        };

        if let Some(&idx) = self.index.get(&occurrence.key) {
            let bubble = &mut self.bubbles[idx];
            bubble.occurred();
            self.max_occurrences = self.max_occurrences.max(bubble.occurrences());
        } else {
            let tip = self
                .tip_text
                .as_ref()
                .map(|tip_text| tip_text(&*occurrence.key, &*occurrence.item))
                .unwrap_or_default();
            let bubble = Bubble::born(
                Rc::clone(&occurrence.key),
                occurrence.item,
                tip,
                self.bounds,
                self.settings.birth_speed,
                &mut self.rng,
            );
            debug!(key = %occurrence.key, name = %bubble.item().name, "bubble created");
            self.index.insert(occurrence.key, self.bubbles.len());
            self.bubbles.push(bubble);
            self.max_occurrences = self.max_occurrences.max(1);
        }

        self.total_occurrences += 1;
        true
    }

    /// One animation frame: admit at most one occurrence, then tick.
    pub fn frame(&mut self, pointer: Pointer, now_ms: u64, metrics: &impl TextMetrics) {
        self.admit_next();
        self.tick(pointer, now_ms, metrics);
    }

    /// Advances every bubble one step. Each bubble collides only with the
    /// bubbles after it, so every pair is resolved once per tick.
    pub fn tick(&mut self, pointer: Pointer, now_ms: u64, metrics: &impl TextMetrics) {
        self.pointer = pointer;
        self.hovered = None;

        let settings = &self.settings;
        let around = Surroundings {
            world: self.bounds,
            total_occurrences: self.total_occurrences,
            settings,
        };

        for idx in 0..self.bubbles.len() {
            let (head, tail) = self.bubbles.split_at_mut(idx + 1);
            let bubble = &mut head[idx];

            bubble.rescale(&around);
            bubble.bounce(around.world, settings.rebound, settings.friction);
            for other in tail.iter_mut() {
                bubble.collide(other, settings.rebound);
            }
            bubble.jiggle(&mut self.rng, settings.rest_jiggle);
            bubble.drag_or_move(idx, &mut self.drag, pointer);
            bubble.refit_label(settings, metrics);

            if bubble.hovered(pointer.position) {
                self.hovered = Some(idx);
            }
        }

        self.cursor = if self.drag.index.is_some() {
            CursorKind::Move
        } else if self.hovered.is_some() {
            CursorKind::Hand
        } else {
            CursorKind::Arrow
        };

        self.tooltip_armed = settings.tips_wanted
            && now_ms.saturating_sub(self.last_move_ms) > settings.tip_delay_ms
            && self.drag.index.is_none()
            && self.hovered.is_some();
    }

    pub fn pointer_moved(&mut self, now_ms: u64) {
        self.last_move_ms = now_ms;
    }

    pub fn pointer_released(&mut self) {
        self.drag = Drag::default();
    }

    /// Two clicks within the double click window select the hovered bubble.
    pub fn pointer_clicked(&mut self, now_ms: u64) {
        if let Some(last) = self.last_click_ms {
            if now_ms.saturating_sub(last) < self.settings.double_click_ms {
                self.select();
            }
        }
        self.last_click_ms = Some(now_ms);
    }

    /// Reports the hovered bubble to the selection callback. Returns whether
    /// the callback ran.
    pub fn select(&mut self) -> bool {
        let (Some(idx), Some(on_select)) = (self.hovered, self.on_select.as_mut()) else {
            return false;
        };
        let bubble = &self.bubbles[idx];
        info!(key = bubble.key(), "bubble selected");
        on_select(bubble.key(), bubble.item());
        true
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Bubbles in creation order.
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn bubble(&self, key: &str) -> Option<&Bubble> {
        self.index.get(key).map(|&idx| &self.bubbles[idx])
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    pub fn total_occurrences(&self) -> u64 {
        self.total_occurrences
    }

    pub fn max_occurrences(&self) -> u64 {
        self.max_occurrences
    }

    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    pub fn hovered_index(&self) -> Option<usize> {
        self.hovered
    }

    pub fn hovered_key(&self) -> Option<&str> {
        self.hovered.map(|idx| self.bubbles[idx].key())
    }

    pub fn dragged_index(&self) -> Option<usize> {
        self.drag.index
    }

    pub fn dragged_key(&self) -> Option<&str> {
        self.drag.index.map(|idx| self.bubbles[idx].key())
    }

    pub fn cursor(&self) -> CursorKind {
        self.cursor
    }

    /// The bubble whose tooltip should show this frame, if any.
    pub fn tooltip(&self) -> Option<&Bubble> {
        if !self.tooltip_armed {
            return None;
        }
        self.hovered
            .map(|idx| &self.bubbles[idx])
            .filter(|bubble| !bubble.tip().is_empty())
    }
}
