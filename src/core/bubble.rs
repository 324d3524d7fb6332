use std::{f32::consts::PI, rc::Rc};

use rand::Rng;
use tracing::trace;

use crate::{
    config::{physics, Settings},
    data::DataItem,
    textfit::{Fit, TextFitter, TextMetrics},
    types::{Point, Rect},
};

/// What a bubble needs to know about its world during a tick.
#[derive(Clone, Copy, Debug)]
pub struct Surroundings<'a> {
    pub world: Rect,
    pub total_occurrences: u64,
    pub settings: &'a Settings,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pointer {
    pub position: Point,
    pub pressed: bool,
}

/// The bubble being dragged, if any, and where on it the pointer grabbed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Drag {
    pub index: Option<usize>,
    pub offset: Point,
}

#[derive(Clone, Debug, PartialEq)]
struct LayoutCache {
    fit: Option<Fit>,
    /// Radius at the time of the fit.
    growth: f32,
}

#[derive(Debug)]
pub struct Bubble {
    key: Rc<str>,
    item: Rc<DataItem>,
    tip: String,
    occurs: u64,
    radius: f32,
    pub position: Point,
    pub velocity: Point,
    fitter: TextFitter,
    layout: Option<LayoutCache>,
}

impl Bubble {
    pub fn new(key: Rc<str>, item: Rc<DataItem>, tip: String, position: Point, velocity: Point) -> Self {
        let fitter = TextFitter::new(&item.name);
        Self {
            key,
            item,
            tip,
            occurs: 1,
            radius: 0.0,
            position,
            velocity,
            fitter,
            layout: None,
        }
    }

    /// A fresh bubble somewhere in `world`, heading anywhere at up to
    /// `birth_speed` per axis.
    pub fn born(
        key: Rc<str>,
        item: Rc<DataItem>,
        tip: String,
        world: Rect,
        birth_speed: f32,
        rng: &mut impl Rng,
    ) -> Self {
        let position = Point::new(
            random_between(rng, world.left, world.right),
            random_between(rng, world.top, world.bottom),
        );
        let velocity = Point::new(
            random_between(rng, -birth_speed, birth_speed),
            random_between(rng, -birth_speed, birth_speed),
        );
        Self::new(key, item, tip, position, velocity)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn item(&self) -> &DataItem {
        &self.item
    }

    pub fn tip(&self) -> &str {
        &self.tip
    }

    pub fn occurrences(&self) -> u64 {
        self.occurs
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// The cached label layout, if the label has any words.
    pub fn label(&self) -> Option<&Fit> {
        self.layout.as_ref().and_then(|cache| cache.fit.as_ref())
    }

    pub fn occurred(&mut self) {
        self.occurs += 1;
    }

    /// Sizes the bubble so its area is its share of the crowded world area.
    pub fn rescale(&mut self, around: &Surroundings) {
        if around.total_occurrences == 0 {
            self.radius = 0.0;
            return;
        }
        let available = around.world.area() * around.settings.crowdedness;
        let scaled = available * self.occurs as f32 / around.total_occurrences as f32;
        self.radius = (scaled / PI).max(0.0).sqrt();
    }

    /// Keeps the next position inside `world`. Top/bottom and left/right are
    /// checked separately so a corner hit damps both axes.
    pub fn bounce(&mut self, world: Rect, rebound: f32, friction: f32) {
        let r = self.radius;
        let next = self.position + self.velocity;

        if next.y - r < world.top {
            self.position.y = world.top + r;
            self.velocity.scale_axes(friction, -rebound);
        } else if next.y + r > world.bottom {
            self.position.y = world.bottom - r;
            self.velocity.scale_axes(friction, -rebound);
        }

        if next.x - r < world.left {
            self.position.x = world.left + r;
            self.velocity.scale_axes(-rebound, friction);
        } else if next.x + r > world.right {
            self.position.x = world.right - r;
            self.velocity.scale_axes(-rebound, friction);
        }
    }

    /// Pushes `self` and `other` apart if they overlap. Coincident centers
    /// never collide. Returns whether a recoil was applied.
    pub fn collide(&mut self, other: &mut Bubble, rebound: f32) -> bool {
        let delta = other.position - self.position;
        let distance = delta.length();
        let reach = self.radius + other.radius;

        if distance > 0.0 && distance < reach - physics::COLLISION_SLOP {
            let overlap = reach - distance;
            let angle = delta.y.atan2(delta.x);
            let recoil = Point::new(overlap * angle.cos() / 2.0, overlap * angle.sin() / 2.0);

            self.velocity -= recoil;
            self.velocity.scale_axes(rebound, rebound);

            other.velocity += recoil;
            other.velocity.scale_axes(rebound, rebound);
            return true;
        }
        false
    }

    pub fn jiggle(&mut self, rng: &mut impl Rng, restlessness: f32) {
        self.velocity.x += random_between(rng, -restlessness, restlessness);
        self.velocity.y += random_between(rng, -restlessness, restlessness);
    }

    /// Picks the bubble up if the pointer presses on it while nothing else is
    /// dragged, follows the pointer while dragged, and otherwise moves one
    /// step along its velocity.
    pub fn drag_or_move(&mut self, index: usize, drag: &mut Drag, pointer: Pointer) {
        if drag.index.is_none() && pointer.pressed && self.hovered(pointer.position) {
            drag.index = Some(index);
            drag.offset = self.position - pointer.position;
        }

        if drag.index == Some(index) {
            self.position = pointer.position + drag.offset;
            self.velocity = Point::ZERO;
        } else {
            self.position += self.velocity;
        }
    }

    pub fn hovered(&self, at: Point) -> bool {
        self.position.distance(at) < self.radius
    }

    /// Rim stroke weight.
    pub fn rim(&self, rim_fraction: f32) -> f32 {
        (self.radius / rim_fraction).ceil()
    }

    /// Side of the padded square inscribed in the bubble, inside its rim.
    pub fn text_budget(&self, settings: &Settings) -> f32 {
        let space = self.radius * 2.0 - self.rim(settings.rim_fraction);
        (space / 2.0 - settings.font_pad).max(0.0) * std::f32::consts::SQRT_2
    }

    /// Refits the label once the radius has drifted past `font_recalc` from
    /// the last fit. Returns whether a refit happened.
    pub fn refit_label(&mut self, settings: &Settings, metrics: &impl TextMetrics) -> bool {
        let stale = match &self.layout {
            None => true,
            Some(cache) => (self.radius - cache.growth).abs() > settings.font_recalc,
        };
        if !stale {
            return false;
        }

        let budget = self.text_budget(settings);
        let fit = self.fitter.fit(budget, settings.fonts, metrics);
        trace!(
            key = %self.key,
            radius = self.radius,
            font = fit.as_ref().map(|f| f.font_size),
            "label refit"
        );
        self.layout = Some(LayoutCache {
            fit,
            growth: self.radius,
        });
        true
    }
}

/// Uniform sample from `lo..hi`, or `lo` when the range is empty.
pub(crate) fn random_between(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::json;

    use super::*;
    use crate::textfit::tests::FixedAdvance;

    fn bubble(name: &str, position: Point, velocity: Point, radius: f32) -> Bubble {
        let item = DataItem::normalize(name, json!({ "name": name, "count": 1 }));
        let mut bubble = Bubble::new(Rc::from(name), Rc::new(item), String::new(), position, velocity);
        bubble.radius = radius;
        bubble
    }

    fn world() -> Rect {
        Rect::new(0.0, 0.0, 100.0, 200.0)
    }

    mod rescale {
        use super::*;

        #[test]
        fn radius_follows_occurrence_share() {
            let settings = Settings::default();
            let mut b = bubble("a", Point::ZERO, Point::ZERO, 0.0);
            b.occurs = 3;
            let around = Surroundings {
                world: world(),
                total_occurrences: 12,
                settings: &settings,
            };
            b.rescale(&around);
            let expected = (20_000.0 * settings.crowdedness * 3.0 / 12.0 / PI).sqrt();
            assert!((b.radius() - expected).abs() < 1e-4);
        }

        #[test]
        fn zero_area_world_gives_zero_radius() {
            let settings = Settings::default();
            let mut b = bubble("a", Point::ZERO, Point::ZERO, 5.0);
            let around = Surroundings {
                world: Rect::default(),
                total_occurrences: 1,
                settings: &settings,
            };
            b.rescale(&around);
            assert_eq!(b.radius(), 0.0);
        }
    }

    mod bounce {
        use super::*;

        #[test]
        fn outward_bubble_at_left_edge_is_clamped_and_reflected() {
            let mut b = bubble("a", Point::new(10.0, 50.0), Point::new(-4.0, 2.0), 10.0);
            b.bounce(world(), 0.75, 0.8);
            assert_eq!(b.position.x, 10.0);
            assert_eq!(b.velocity.x, 3.0);
            assert!((b.velocity.y - 1.6).abs() < 1e-6);
        }

        #[test]
        fn bottom_hit_inverts_vertical_axis() {
            let mut b = bubble("a", Point::new(100.0, 88.0), Point::new(1.0, 4.0), 10.0);
            b.bounce(world(), 0.75, 0.8);
            assert_eq!(b.position.y, 90.0);
            assert_eq!(b.velocity.y, -3.0);
            assert!((b.velocity.x - 0.8).abs() < 1e-6);
        }

        #[test]
        fn corner_hit_damps_both_axes() {
            let mut b = bubble("a", Point::new(11.0, 11.0), Point::new(-4.0, -4.0), 10.0);
            b.bounce(world(), 0.5, 0.5);
            assert_eq!(b.position, Point::new(10.0, 10.0));
            // Each axis is reflected once and damped by friction once.
            assert_eq!(b.velocity, Point::new(1.0, 1.0));
        }

        #[test]
        fn inside_bubble_is_untouched() {
            let mut b = bubble("a", Point::new(100.0, 50.0), Point::new(3.0, -3.0), 10.0);
            b.bounce(world(), 0.75, 0.8);
            assert_eq!(b.position, Point::new(100.0, 50.0));
            assert_eq!(b.velocity, Point::new(3.0, -3.0));
        }
    }

    mod collide {
        use super::*;

        #[test]
        fn coincident_centers_do_not_collide() {
            let mut a = bubble("a", Point::new(50.0, 50.0), Point::new(1.0, 2.0), 10.0);
            let mut b = bubble("b", Point::new(50.0, 50.0), Point::new(-3.0, 4.0), 10.0);
            assert!(!a.collide(&mut b, 0.75));
            assert_eq!(a.velocity, Point::new(1.0, 2.0));
            assert_eq!(b.velocity, Point::new(-3.0, 4.0));
        }

        #[test]
        fn overlapping_bubbles_recoil_symmetrically() {
            let mut a = bubble("a", Point::new(50.0, 50.0), Point::ZERO, 10.0);
            let mut b = bubble("b", Point::new(62.0, 50.0), Point::ZERO, 10.0);
            assert!(a.collide(&mut b, 0.5));
            // Overlap 8, half to each side, then damped by half.
            assert!((a.velocity.x + 2.0).abs() < 1e-5);
            assert!((b.velocity.x - 2.0).abs() < 1e-5);
            assert!(a.velocity.y.abs() < 1e-5);
            assert!(b.velocity.y.abs() < 1e-5);
        }

        #[test]
        fn overlap_within_slop_is_ignored() {
            let mut a = bubble("a", Point::new(0.0, 0.0), Point::ZERO, 10.0);
            let mut b = bubble("b", Point::new(19.5, 0.0), Point::ZERO, 10.0);
            assert!(!a.collide(&mut b, 0.75));
        }

        #[test]
        fn separated_bubbles_do_not_collide() {
            let mut a = bubble("a", Point::new(0.0, 0.0), Point::ZERO, 10.0);
            let mut b = bubble("b", Point::new(0.0, 30.0), Point::ZERO, 10.0);
            assert!(!a.collide(&mut b, 0.75));
        }
    }

    mod jiggle {
        use super::*;

        #[test]
        fn perturbation_is_bounded() {
            let mut rng = StdRng::seed_from_u64(11);
            let mut b = bubble("a", Point::ZERO, Point::ZERO, 10.0);
            for _ in 0..100 {
                b.velocity = Point::ZERO;
                b.jiggle(&mut rng, 0.02);
                assert!(b.velocity.x.abs() <= 0.02);
                assert!(b.velocity.y.abs() <= 0.02);
            }
        }

        #[test]
        fn zero_restlessness_keeps_velocity() {
            let mut rng = StdRng::seed_from_u64(11);
            let mut b = bubble("a", Point::ZERO, Point::new(1.0, 1.0), 10.0);
            b.jiggle(&mut rng, 0.0);
            assert_eq!(b.velocity, Point::new(1.0, 1.0));
        }
    }

    mod drag_or_move {
        use super::*;

        #[test]
        fn integrates_velocity_when_not_dragged() {
            let mut b = bubble("a", Point::new(10.0, 10.0), Point::new(2.0, -1.0), 5.0);
            let mut drag = Drag::default();
            b.drag_or_move(0, &mut drag, Pointer::default());
            assert_eq!(b.position, Point::new(12.0, 9.0));
            assert_eq!(drag.index, None);
        }

        #[test]
        fn press_on_bubble_grabs_it_with_offset() {
            let mut b = bubble("a", Point::new(10.0, 10.0), Point::new(2.0, -1.0), 5.0);
            let mut drag = Drag::default();
            let pointer = Pointer {
                position: Point::new(12.0, 11.0),
                pressed: true,
            };
            b.drag_or_move(3, &mut drag, pointer);
            assert_eq!(drag.index, Some(3));
            assert_eq!(drag.offset, Point::new(-2.0, -1.0));
            assert_eq!(b.position, Point::new(10.0, 10.0));
            assert_eq!(b.velocity, Point::ZERO);

            let moved = Pointer {
                position: Point::new(40.0, 30.0),
                pressed: true,
            };
            b.drag_or_move(3, &mut drag, moved);
            assert_eq!(b.position, Point::new(38.0, 29.0));
        }

        #[test]
        fn cannot_grab_while_another_is_dragged() {
            let mut b = bubble("a", Point::new(10.0, 10.0), Point::new(1.0, 0.0), 5.0);
            let mut drag = Drag {
                index: Some(7),
                offset: Point::ZERO,
            };
            let pointer = Pointer {
                position: Point::new(10.0, 10.0),
                pressed: true,
            };
            b.drag_or_move(0, &mut drag, pointer);
            assert_eq!(drag.index, Some(7));
            assert_eq!(b.position, Point::new(11.0, 10.0));
        }
    }

    mod hovered {
        use super::*;

        #[test]
        fn inside_radius_is_hovered() {
            let b = bubble("a", Point::new(0.0, 0.0), Point::ZERO, 5.0);
            assert!(b.hovered(Point::new(3.0, 3.0)));
            assert!(!b.hovered(Point::new(5.0, 0.0)));
        }
    }

    mod refit_label {
        use super::*;

        #[test]
        fn first_call_fits_and_small_drift_is_ignored() {
            let settings = Settings::default();
            let metrics = FixedAdvance::new(0.5);
            let mut b = bubble("Rome", Point::ZERO, Point::ZERO, 60.0);
            assert!(b.refit_label(&settings, &metrics));
            let first = b.label().cloned().expect("label fitted");

            b.radius = 60.0 + settings.font_recalc - 1.0;
            assert!(!b.refit_label(&settings, &metrics));
            assert_eq!(b.label(), Some(&first));
        }

        #[test]
        fn growth_past_threshold_refits() {
            let settings = Settings::default();
            let metrics = FixedAdvance::new(0.5);
            let mut b = bubble("Rome", Point::ZERO, Point::ZERO, 20.0);
            b.refit_label(&settings, &metrics);
            let small = b.label().map(|f| f.font_size).expect("label fitted");

            b.radius = 80.0;
            assert!(b.refit_label(&settings, &metrics));
            let big = b.label().map(|f| f.font_size).expect("label fitted");
            assert!(big > small);
        }

        #[test]
        fn empty_name_has_no_label() {
            let settings = Settings::default();
            let metrics = FixedAdvance::new(0.5);
            let mut b = bubble("", Point::ZERO, Point::ZERO, 60.0);
            b.refit_label(&settings, &metrics);
            assert!(b.label().is_none());
        }
    }

    mod text_budget {
        use super::*;

        #[test]
        fn tiny_bubble_has_zero_budget() {
            let b = bubble("a", Point::ZERO, Point::ZERO, 2.0);
            assert_eq!(b.text_budget(&Settings::default()), 0.0);
        }

        #[test]
        fn budget_is_inscribed_square_side() {
            let b = bubble("a", Point::ZERO, Point::ZERO, 40.0);
            // rim 2, space 78, half 39, minus padding 8.
            let expected = 31.0 * std::f32::consts::SQRT_2;
            assert!((b.text_budget(&Settings::default()) - expected).abs() < 1e-4);
        }
    }
}
