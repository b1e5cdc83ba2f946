//! The visual state the engine animates and the renderer draws.
//!
//! Composition order, from a point inside card `i` to the screen:
//!
//! 1. the card's own pose: scale about its transform origin, then translate,
//!    all in the card's local frame;
//! 2. the card's slot: offset by `radius` toward "up" and turned by its fixed
//!    angular offset;
//! 3. the ring: turned by `ring_rotation`, scaled by `ring_scale` and moved to
//!    `ring_center`.
//!
//! Steps 2 and 3 rotate about the same point, so they collapse into a single
//! rotation by `ring_rotation + angular_offset`.

use crate::angle::snap_angle;
use crate::geometry::{Point, Size};
use crate::timeline::Property;
use crate::tuning::RingTuning;

/// A card's transform inside ring space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardPose {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for CardPose {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

impl CardPose {
    pub fn translation(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardVisual {
    pub pose: CardPose,
    /// Normalized point inside the card box that scaling pivots on.
    pub origin: Point,
    pub opacity: f64,
}

impl Default for CardVisual {
    fn default() -> Self {
        Self {
            pose: CardPose::default(),
            origin: Point::CENTER,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorVisual {
    pub rotation: f64,
    pub scale: f64,
    pub opacity: f64,
}

impl Default for IndicatorVisual {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            scale: 1.0,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub viewport: Size,
    pub ring_center: Point,
    pub ring_scale: f64,
    pub ring_rotation: f64,
    pub radius: f64,
    /// Layout box shared by every card, in ring units.
    pub card_box: Size,
    pub cards: Vec<CardVisual>,
    pub backdrop_opacity: f64,
    pub indicator: IndicatorVisual,
    /// Card drawn above the backdrop while lifted.
    pub elevated: Option<usize>,
}

impl Scene {
    pub fn new(card_count: usize, viewport: Size, ring: &RingTuning) -> Self {
        let ring_scale = if ring.reference_height > 0.0 && !viewport.is_degenerate() {
            viewport.height / ring.reference_height
        } else {
            1.0
        };
        let mut scene = Self {
            viewport,
            ring_center: Point::default(),
            ring_scale,
            ring_rotation: 0.0,
            radius: ring.radius,
            card_box: ring.card_box(),
            cards: vec![CardVisual::default(); card_count],
            backdrop_opacity: 0.0,
            indicator: IndicatorVisual::default(),
            elevated: None,
        };
        scene.ring_center = scene.layout_center(viewport, ring);
        scene
    }

    /// Ring center that puts the top card at the configured height, at the
    /// current ring scale.
    pub fn layout_center(&self, viewport: Size, ring: &RingTuning) -> Point {
        Point::new(
            viewport.width / 2.0,
            viewport.height * ring.top_card_y + self.radius * self.ring_scale,
        )
    }

    pub fn angular_offset(&self, index: usize) -> f64 {
        snap_angle(self.cards.len().max(1)) * index as f64
    }

    /// Total rotation of card `index`'s local frame on screen.
    pub fn frame_rotation(&self, index: usize) -> f64 {
        self.ring_rotation + self.angular_offset(index)
    }

    pub fn get(&self, property: Property) -> f64 {
        match property {
            Property::RingRotation => self.ring_rotation,
            Property::RingX => self.ring_center.x,
            Property::RingY => self.ring_center.y,
            Property::IndicatorRotation => self.indicator.rotation,
            Property::IndicatorScale => self.indicator.scale,
            Property::IndicatorOpacity => self.indicator.opacity,
            Property::BackdropOpacity => self.backdrop_opacity,
            Property::CardOpacity(i) => self.cards.get(i).map_or(1.0, |c| c.opacity),
            Property::CardX(i) => self.cards.get(i).map_or(0.0, |c| c.pose.x),
            Property::CardY(i) => self.cards.get(i).map_or(0.0, |c| c.pose.y),
            Property::CardScale(i) => self.cards.get(i).map_or(1.0, |c| c.pose.scale),
        }
    }

    pub fn set(&mut self, property: Property, value: f64) {
        match property {
            Property::RingRotation => self.ring_rotation = value,
            Property::RingX => self.ring_center.x = value,
            Property::RingY => self.ring_center.y = value,
            Property::IndicatorRotation => self.indicator.rotation = value,
            Property::IndicatorScale => self.indicator.scale = value,
            Property::IndicatorOpacity => self.indicator.opacity = value,
            Property::BackdropOpacity => self.backdrop_opacity = value,
            Property::CardOpacity(i) => {
                if let Some(card) = self.cards.get_mut(i) {
                    card.opacity = value;
                }
            }
            Property::CardX(i) => {
                if let Some(card) = self.cards.get_mut(i) {
                    card.pose.x = value;
                }
            }
            Property::CardY(i) => {
                if let Some(card) = self.cards.get_mut(i) {
                    card.pose.y = value;
                }
            }
            Property::CardScale(i) => {
                if let Some(card) = self.cards.get_mut(i) {
                    card.pose.scale = value;
                }
            }
        }
    }

    /// Offset of a normalized box point from the box center, in card units.
    fn box_offset(&self, normalized: Point) -> Point {
        Point::new(
            (normalized.x - 0.5) * self.card_box.width,
            (normalized.y - 0.5) * self.card_box.height,
        )
    }

    /// Screen position of the normalized point `at` inside card `index`.
    pub fn card_point_on_screen(&self, index: usize, at: Point) -> Option<Point> {
        let card = self.cards.get(index)?;
        let origin = self.box_offset(card.origin);
        let local =
            origin + (self.box_offset(at) - origin) * card.pose.scale + card.pose.translation();
        let slot = Point::new(0.0, -self.radius) + local;
        Some(self.ring_center + slot.rotated(self.frame_rotation(index)) * self.ring_scale)
    }

    /// Moves card `index`'s transform origin without moving the card on
    /// screen, compensating the translation for the current scale.
    pub fn rebase_origin(&mut self, index: usize, origin: Point) {
        let Some(card) = self.cards.get(index) else {
            return;
        };
        let shift =
            (self.box_offset(card.origin) - self.box_offset(origin)) * (1.0 - card.pose.scale);
        let card = &mut self.cards[index];
        card.pose.x += shift.x;
        card.pose.y += shift.y;
        card.origin = origin;
    }

    /// Converts a screen-space displacement into card `index`'s local frame.
    pub fn screen_vector_to_local(&self, index: usize, vector: Point) -> Point {
        if self.ring_scale == 0.0 {
            return Point::default();
        }
        (vector * (1.0 / self.ring_scale)).rotated(-self.frame_rotation(index))
    }

    /// Normalized box coordinates of a screen point relative to card `index`,
    /// undoing its pose. `None` when the card is collapsed to zero scale.
    pub fn screen_to_card(&self, index: usize, screen: Point) -> Option<Point> {
        let card = self.cards.get(index)?;
        if self.ring_scale == 0.0 || card.pose.scale == 0.0 {
            return None;
        }
        let slot = self.screen_vector_to_local(index, screen - self.ring_center);
        let local = slot - Point::new(0.0, -self.radius);
        let origin = self.box_offset(card.origin);
        let unscaled =
            origin + (local - card.pose.translation() - origin) * (1.0 / card.pose.scale);
        Some(Point::new(
            unscaled.x / self.card_box.width + 0.5,
            unscaled.y / self.card_box.height + 0.5,
        ))
    }

    /// Cards in paint order: the elevated card last.
    pub fn draw_order(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.cards.len())
            .filter(move |i| Some(*i) != self.elevated)
            .chain(self.elevated)
    }

    /// Topmost visible card under `screen`, if any.
    pub fn card_at(&self, screen: Point) -> Option<usize> {
        let order: Vec<usize> = self.draw_order().collect();
        order.into_iter().rev().find(|&i| {
            self.cards[i].opacity > 0.0
                && self
                    .screen_to_card(i, screen)
                    .is_some_and(|p| (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(cards: usize) -> Scene {
        let ring = RingTuning {
            reference_height: 1000.0,
            ..RingTuning::default()
        };
        Scene::new(cards, Size::new(1600.0, 1000.0), &ring)
    }

    fn near(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6
    }

    #[test]
    fn test_top_card_sits_at_layout_height() {
        let scene = scene(8);
        let center = scene.card_point_on_screen(0, Point::CENTER).unwrap();
        assert!(near(center, Point::new(800.0, 420.0)));
    }

    #[test]
    fn test_ring_rotation_brings_card_to_top() {
        let mut scene = scene(8);
        scene.ring_rotation = -135.0;
        let center = scene.card_point_on_screen(3, Point::CENTER).unwrap();
        assert!(near(center, Point::new(800.0, 420.0)));
    }

    #[test]
    fn test_scaling_pivots_on_origin() {
        let mut scene = scene(8);
        scene.ring_rotation = 17.0;
        scene.cards[2].origin = Point::new(0.5, 0.8);
        let before = scene.card_point_on_screen(2, Point::new(0.5, 0.8)).unwrap();
        scene.cards[2].pose.scale = 3.0;
        let after = scene.card_point_on_screen(2, Point::new(0.5, 0.8)).unwrap();
        assert!(near(before, after));
    }

    #[test]
    fn test_screen_to_card_inverts_mapping() {
        let mut scene = scene(6);
        scene.ring_rotation = 33.0;
        scene.cards[4].origin = Point::new(0.5, 0.7);
        scene.cards[4].pose = CardPose {
            x: 12.0,
            y: -40.0,
            scale: 1.7,
        };
        for at in [Point::new(0.1, 0.2), Point::CENTER, Point::new(0.9, 1.0)] {
            let screen = scene.card_point_on_screen(4, at).unwrap();
            assert!(near(scene.screen_to_card(4, screen).unwrap(), at));
        }
    }

    #[test]
    fn test_rebase_origin_keeps_card_in_place() {
        let mut scene = scene(8);
        scene.ring_rotation = -20.0;
        scene.cards[5].pose = CardPose {
            x: 30.0,
            y: 5.0,
            scale: 2.5,
        };
        let corners = [Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
        let before: Vec<Point> = corners
            .iter()
            .map(|&p| scene.card_point_on_screen(5, p).unwrap())
            .collect();
        scene.rebase_origin(5, Point::new(0.5, 0.9));
        for (corner, expected) in corners.iter().zip(before) {
            assert!(near(scene.card_point_on_screen(5, *corner).unwrap(), expected));
        }
        assert_eq!(scene.cards[5].origin, Point::new(0.5, 0.9));
    }

    #[test]
    fn test_card_at_prefers_elevated_card() {
        let mut scene = scene(8);
        let top = scene.card_point_on_screen(0, Point::CENTER).unwrap();
        assert_eq!(scene.card_at(top), Some(0));
        assert_eq!(scene.card_at(Point::new(-500.0, -500.0)), None);

        // card 1 blown up over card 0
        scene.cards[1].pose.scale = 50.0;
        scene.elevated = Some(1);
        assert_eq!(scene.card_at(top), Some(1));
    }

    #[test]
    fn test_property_roundtrip_ignores_missing_cards() {
        let mut scene = scene(2);
        scene.set(Property::CardScale(9), 4.0);
        assert_eq!(scene.get(Property::CardScale(9)), 1.0);
        scene.set(Property::CardX(1), 4.0);
        assert_eq!(scene.get(Property::CardX(1)), 4.0);
    }
}
