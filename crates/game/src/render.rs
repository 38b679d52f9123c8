//! Drawing contract and arena drawing.
//!
//! The simulation draws through a [`Surface`]; the UI shell supplies one backed
//! by its canvas. Pixel output is entirely up to the surface.

use crate::entity::{Entity, Obstacle, Particle};
use crate::world::WorldBounds;
use glam::Vec2;
use protocol::Color;

const BACKGROUND: Color = Color::new(0xf3, 0xfa, 0xff);
const GRID_LINE: Color = Color::new(0xea, 0xf1, 0xf5);
const GRID_DIVISIONS: f32 = 75.0;
const NAME_COLOR: Color = Color::new(255, 255, 255);
const ARROW_COLOR: Color = Color::new(255, 0, 0);

/// A 2D drawing target covering `[0, width] x [0, height]`.
pub trait Surface {
    fn clear(&mut self, color: Color);
    fn fill_circle(&mut self, center: Vec2, radius: f32, fill: Color);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, stroke: Color, width: f32);
    fn line(&mut self, from: Vec2, to: Vec2, color: Color, width: f32);
    /// Centered text.
    fn text(&mut self, position: Vec2, text: &str, size: f32, color: Color);
    /// Square image `size` wide with its top-left corner at `top_left`.
    fn image(&mut self, source: &str, top_left: Vec2, size: f32);
}

/// A recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    FillCircle { center: Vec2, radius: f32, fill: Color },
    StrokeCircle { center: Vec2, radius: f32, stroke: Color, width: f32 },
    Line { from: Vec2, to: Vec2, color: Color, width: f32 },
    Text { position: Vec2, text: String, size: f32, color: Color },
    Image { source: String, top_left: Vec2, size: f32 },
}

/// Surface that records every call, for replay by a UI thread or inspection in tests.
#[derive(Debug, Default)]
pub struct CommandList {
    commands: Vec<DrawCommand>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded frame, leaving the list empty.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Surface for CommandList {
    fn clear(&mut self, color: Color) {
        self.commands.push(DrawCommand::Clear(color));
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, fill: Color) {
        self.commands.push(DrawCommand::FillCircle { center, radius, fill });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, stroke: Color, width: f32) {
        self.commands.push(DrawCommand::StrokeCircle { center, radius, stroke, width });
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Color, width: f32) {
        self.commands.push(DrawCommand::Line { from, to, color, width });
    }

    fn text(&mut self, position: Vec2, text: &str, size: f32, color: Color) {
        self.commands.push(DrawCommand::Text {
            position,
            text: text.to_string(),
            size,
            color,
        });
    }

    fn image(&mut self, source: &str, top_left: Vec2, size: f32) {
        self.commands.push(DrawCommand::Image {
            source: source.to_string(),
            top_left,
            size,
        });
    }
}

/// Surface that discards everything (headless runs).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn clear(&mut self, _color: Color) {}
    fn fill_circle(&mut self, _center: Vec2, _radius: f32, _fill: Color) {}
    fn stroke_circle(&mut self, _center: Vec2, _radius: f32, _stroke: Color, _width: f32) {}
    fn line(&mut self, _from: Vec2, _to: Vec2, _color: Color, _width: f32) {}
    fn text(&mut self, _position: Vec2, _text: &str, _size: f32, _color: Color) {}
    fn image(&mut self, _source: &str, _top_left: Vec2, _size: f32) {}
}

/// Clear the field and draw the background grid.
pub fn draw_background(surface: &mut dyn Surface, bounds: &WorldBounds) {
    surface.clear(BACKGROUND);

    // Square cells: both axes step by the same width fraction.
    let step = bounds.width / GRID_DIVISIONS;
    if step <= 0.0 {
        return;
    }
    let mut x = step;
    while x < bounds.width {
        surface.line(Vec2::new(x, 0.0), Vec2::new(x, bounds.height), GRID_LINE, 2.0);
        x += step;
    }
    let mut y = step;
    while y < bounds.height {
        surface.line(Vec2::new(0.0, y), Vec2::new(bounds.width, y), GRID_LINE, 2.0);
        y += step;
    }
}

pub fn draw_particle(surface: &mut dyn Surface, particle: &Particle) {
    surface.fill_circle(particle.position, particle.radius * 2.0, particle.color);
}

pub fn draw_obstacle(surface: &mut dyn Surface, obstacle: &Obstacle) {
    surface.fill_circle(obstacle.position, obstacle.radius * 2.0, obstacle.color);
}

/// Draw a live entity: body, skin, name and heading arrow.
pub fn draw_entity(surface: &mut dyn Surface, entity: &Entity) {
    if !entity.is_alive {
        return;
    }
    let r = entity.radius;
    let pos = entity.position;

    surface.fill_circle(pos, r * 2.0, entity.color);
    surface.stroke_circle(pos, r * 2.0, entity.border_color, 5.0);

    if let Some(skin) = entity.skin.as_deref().filter(|s| !s.is_empty()) {
        surface.image(skin, pos - Vec2::splat(r * 1.5), r * 3.0);
    }

    surface.text(Vec2::new(pos.x, pos.y + r * 0.25), &entity.name, r, NAME_COLOR);

    if entity.direction != Vec2::ZERO {
        draw_arrow(surface, pos + entity.direction * (r * 3.0), r);
    }
}

fn draw_arrow(surface: &mut dyn Surface, tip: Vec2, r: f32) {
    let h = r * (3.0_f32.sqrt() / 2.0);
    let top = Vec2::new(tip.x, tip.y - h / 2.0);
    let left = Vec2::new(tip.x - r / 2.0, tip.y + h / 2.0);
    let right = Vec2::new(tip.x + r / 2.0, tip.y + h / 2.0);
    surface.line(top, left, ARROW_COLOR, 1.0);
    surface.line(left, right, ARROW_COLOR, 1.0);
    surface.line(right, top, ARROW_COLOR, 1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::vector::UP;

    #[test]
    fn test_background_grid() {
        let mut list = CommandList::new();
        draw_background(&mut list, &WorldBounds::new(750.0, 100.0));
        let commands = list.take();
        assert_eq!(commands[0], DrawCommand::Clear(BACKGROUND));
        // step 10: 74 vertical lines, 9 horizontal
        let lines = commands.iter().filter(|c| matches!(c, DrawCommand::Line { .. })).count();
        assert_eq!(lines, 74 + 9);
        assert!(list.commands().is_empty());
    }

    #[test]
    fn test_empty_field_draws_no_grid() {
        let mut list = CommandList::new();
        draw_background(&mut list, &WorldBounds::new(0.0, 0.0));
        assert_eq!(list.commands().len(), 1);
    }

    #[test]
    fn test_entity_drawing() {
        let mut entity = Entity::new("blob", Vec2::new(50.0, 50.0), Color::new(100, 120, 140), 6.0, Some("s.png".into()));
        entity.direction = UP;
        let mut list = CommandList::new();
        draw_entity(&mut list, &entity);
        let commands = list.take();
        assert_eq!(
            commands[0],
            DrawCommand::FillCircle { center: Vec2::new(50.0, 50.0), radius: 12.0, fill: Color::new(100, 120, 140) }
        );
        assert!(commands.iter().any(|c| matches!(c, DrawCommand::Image { size, .. } if *size == 18.0)));
        assert!(commands.iter().any(|c| matches!(c, DrawCommand::Text { text, .. } if text == "blob")));
        // body, border, skin, name, three arrow edges
        assert_eq!(commands.len(), 7);

        entity.is_alive = false;
        draw_entity(&mut list, &entity);
        assert!(list.commands().is_empty());
    }
}
