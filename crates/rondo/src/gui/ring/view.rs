use super::{
    Artwork, CARD_CORNER_RADIUS, CENTRAL_OUTLINE_WIDTH, INDICATOR_BOTTOM_MARGIN,
    INDICATOR_RADIUS, INDICATOR_TICK, TITLE_FONT_SIZE,
};
use crate::gui::media::Playback;
use crate::gui::theme::ThemeColors;
use cairo::{Context, Filter};
use gdk4::prelude::*;
use gtk4 as gtk;
use gtk4::prelude::SnapshotExt;
use palette::Srgba;
use spindle::{Card, HintTarget, RenderHints, Scene, Size};
use std::f64::consts::PI;

/// Everything a frame is drawn from.
pub struct Stage<'a> {
    pub scene: &'a Scene,
    pub cards: &'a [Card],
    pub artwork: &'a Artwork,
    pub playback: &'a Playback,
    pub hints: &'a RenderHints,
    pub central: Option<usize>,
    pub show_central: bool,
    pub quality: Filter,
}

impl Stage<'_> {
    fn filter_for(&self, index: usize) -> Filter {
        if self.hints.is_active(HintTarget::Ring) || self.hints.is_active(HintTarget::Card(index)) {
            Filter::Fast
        } else {
            self.quality
        }
    }
}

fn set_color(cr: &Context, color: Srgba<f64>, opacity: f64) {
    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a * opacity);
}

fn rounded_rect(cr: &Context, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    cr.new_sub_path();
    cr.arc(x + w - r, y + r, r, -PI / 2.0, 0.0);
    cr.arc(x + w - r, y + h - r, r, 0.0, PI / 2.0);
    cr.arc(x + r, y + h - r, r, PI / 2.0, PI);
    cr.arc(x + r, y + r, r, PI, 1.5 * PI);
    cr.close_path();
}

/// Object-fit contain, bottom aligned, inside a box centered on the origin.
fn contain_rect(frame: Size, content: Size) -> (f64, f64, f64) {
    let k = (frame.width / content.width).min(frame.height / content.height);
    let (w, h) = (content.width * k, content.height * k);
    (-w / 2.0, frame.height / 2.0 - h, k)
}

struct CardRenderer<'a> {
    stage: &'a Stage<'a>,
    index: usize,
}

impl<'a> CardRenderer<'a> {
    fn new(stage: &'a Stage<'a>, index: usize) -> Self {
        Self { stage, index }
    }

    fn draw(&self, cr: &Context, colors: &ThemeColors) -> Result<(), cairo::Error> {
        let scene = self.stage.scene;
        let Some(visual) = scene.cards.get(self.index) else {
            return Ok(());
        };
        if visual.opacity <= 0.0 || visual.pose.scale <= 0.0 {
            return Ok(());
        }
        let frame = scene.card_box;
        let origin = (
            (visual.origin.x - 0.5) * frame.width,
            (visual.origin.y - 0.5) * frame.height,
        );

        cr.save()?;
        cr.translate(scene.ring_center.x, scene.ring_center.y);
        cr.scale(scene.ring_scale, scene.ring_scale);
        cr.rotate(scene.frame_rotation(self.index).to_radians());
        cr.translate(0.0, -scene.radius);
        cr.translate(visual.pose.x + origin.0, visual.pose.y + origin.1);
        cr.scale(visual.pose.scale, visual.pose.scale);
        cr.translate(-origin.0, -origin.1);

        if visual.opacity < 1.0 {
            cr.push_group();
            self.draw_content(cr, colors, frame)?;
            cr.pop_group_to_source()?;
            cr.paint_with_alpha(visual.opacity)?;
        } else {
            self.draw_content(cr, colors, frame)?;
        }
        cr.restore()
    }

    fn draw_content(
        &self,
        cr: &Context,
        colors: &ThemeColors,
        frame: Size,
    ) -> Result<(), cairo::Error> {
        let (x, y) = (-frame.width / 2.0, -frame.height / 2.0);
        cr.save()?;
        rounded_rect(cr, x, y, frame.width, frame.height, CARD_CORNER_RADIUS);
        cr.clip();

        if !self.draw_video(cr, frame)? && !self.draw_still(cr, frame)? {
            set_color(cr, colors.card, 1.0);
            cr.paint()?;
            if let Some(card) = self.stage.cards.get(self.index) {
                self.draw_title(cr, colors, &card.title)?;
            }
        }
        cr.restore()?;

        let highlighted = self.stage.show_central && self.stage.central == Some(self.index);
        if highlighted {
            set_color(cr, colors.central, 1.0);
            cr.set_line_width(CENTRAL_OUTLINE_WIDTH);
            rounded_rect(cr, x, y, frame.width, frame.height, CARD_CORNER_RADIUS);
            cr.stroke()?;
        }
        Ok(())
    }

    fn draw_still(&self, cr: &Context, frame: Size) -> Result<bool, cairo::Error> {
        let Some(pixbuf) = self.stage.artwork.still(self.index) else {
            return Ok(false);
        };
        let content = Size::new(pixbuf.width() as f64, pixbuf.height() as f64);
        if content.is_degenerate() {
            return Ok(false);
        }
        let (x, y, k) = contain_rect(frame, content);
        cr.save()?;
        cr.translate(x, y);
        cr.scale(k, k);
        cr.set_source_pixbuf(pixbuf, 0.0, 0.0);
        cr.source().set_filter(self.stage.filter_for(self.index));
        cr.paint()?;
        cr.restore()?;
        Ok(true)
    }

    fn draw_video(&self, cr: &Context, frame: Size) -> Result<bool, cairo::Error> {
        let Some(paintable) = self.stage.playback.frame(self.index) else {
            return Ok(false);
        };
        let content = Size::new(
            paintable.intrinsic_width() as f64,
            paintable.intrinsic_height() as f64,
        );
        if content.is_degenerate() {
            return Ok(false);
        }
        let snapshot = gtk::Snapshot::new();
        paintable.snapshot(&snapshot, content.width, content.height);
        let Some(node) = snapshot.to_node() else {
            return Ok(false);
        };
        let (x, y, k) = contain_rect(frame, content);
        cr.save()?;
        cr.translate(x, y);
        cr.scale(k, k);
        node.draw(cr);
        cr.restore()?;
        Ok(true)
    }

    fn draw_title(
        &self,
        cr: &Context,
        colors: &ThemeColors,
        text: &str,
    ) -> Result<(), cairo::Error> {
        if text.is_empty() {
            return Ok(());
        }
        set_color(cr, colors.text, 1.0);
        cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
        cr.set_font_size(TITLE_FONT_SIZE);
        if let Ok(ext) = cr.text_extents(text) {
            cr.move_to(-ext.width() / 2.0, ext.height() / 2.0);
            cr.show_text(text)?;
        }
        Ok(())
    }
}

fn draw_backdrop(cr: &Context, scene: &Scene, colors: &ThemeColors) -> Result<(), cairo::Error> {
    if scene.backdrop_opacity <= 0.0 {
        return Ok(());
    }
    set_color(cr, colors.backdrop, scene.backdrop_opacity);
    cr.paint()
}

/// A dial with one tick per card, turned against the ring.
fn draw_indicator(cr: &Context, stage: &Stage, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let scene = stage.scene;
    let indicator = scene.indicator;
    if indicator.opacity <= 0.0 || stage.cards.is_empty() {
        return Ok(());
    }
    let step = 2.0 * PI / stage.cards.len() as f64;

    cr.save()?;
    cr.translate(
        scene.viewport.width / 2.0,
        scene.viewport.height - INDICATOR_BOTTOM_MARGIN * scene.ring_scale,
    );
    cr.scale(
        indicator.scale * scene.ring_scale,
        indicator.scale * scene.ring_scale,
    );
    set_color(cr, colors.indicator, indicator.opacity);

    cr.arc(0.0, -INDICATOR_RADIUS, INDICATOR_TICK / 2.0, 0.0, 2.0 * PI);
    cr.fill()?;

    cr.rotate(indicator.rotation.to_radians());
    cr.set_line_width(1.5);
    for i in 0..stage.cards.len() {
        let (sin, cos) = (step * i as f64).sin_cos();
        let (inner, outer) = (INDICATOR_RADIUS - INDICATOR_TICK, INDICATOR_RADIUS);
        cr.move_to(sin * inner, -cos * inner);
        cr.line_to(sin * outer, -cos * outer);
    }
    cr.stroke()?;
    cr.restore()
}

pub fn draw(cr: &Context, stage: &Stage, colors: &ThemeColors) -> Result<(), cairo::Error> {
    let scene = stage.scene;
    for index in scene.draw_order().filter(|i| Some(*i) != scene.elevated) {
        CardRenderer::new(stage, index).draw(cr, colors)?;
    }
    draw_indicator(cr, stage, colors)?;
    draw_backdrop(cr, scene, colors)?;
    if let Some(index) = scene.elevated {
        CardRenderer::new(stage, index).draw(cr, colors)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contain_is_bottom_aligned() {
        let frame = Size::new(200.0, 300.0);
        let (x, y, k) = contain_rect(frame, Size::new(400.0, 200.0));
        assert_eq!(k, 0.5);
        assert_eq!(x, -100.0);
        // 100px tall image resting on the bottom edge
        assert_eq!(y, 50.0);

        let (x, y, k) = contain_rect(frame, Size::new(100.0, 300.0));
        assert_eq!(k, 1.0);
        assert_eq!(x, -50.0);
        assert_eq!(y, -150.0);
    }
}
