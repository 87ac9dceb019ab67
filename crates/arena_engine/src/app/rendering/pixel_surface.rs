use crate::app::geometry::Vec2;

use super::surface::{DrawSurface, Rgba, Shape, SourceRect, SpriteImage};

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;
const BLANK_GLYPH: [u8; 5] = [0; 5];
const MISSING_GLYPH: [u8; 5] = [0b000, 0b010, 0b101, 0b010, 0b000];

const GLYPHS: &[(char, [u8; 5])] = &[
    ('0', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('1', [0b010, 0b110, 0b010, 0b010, 0b111]),
    ('2', [0b111, 0b001, 0b111, 0b100, 0b111]),
    ('3', [0b111, 0b001, 0b011, 0b001, 0b111]),
    ('4', [0b101, 0b101, 0b111, 0b001, 0b001]),
    ('5', [0b111, 0b100, 0b111, 0b001, 0b110]),
    ('6', [0b011, 0b100, 0b111, 0b101, 0b111]),
    ('7', [0b111, 0b001, 0b001, 0b010, 0b010]),
    ('8', [0b111, 0b101, 0b111, 0b101, 0b111]),
    ('9', [0b111, 0b101, 0b111, 0b001, 0b110]),
    ('A', [0b010, 0b101, 0b111, 0b101, 0b101]),
    ('B', [0b110, 0b101, 0b110, 0b101, 0b110]),
    ('C', [0b011, 0b100, 0b100, 0b100, 0b011]),
    ('D', [0b110, 0b101, 0b101, 0b101, 0b110]),
    ('E', [0b111, 0b100, 0b110, 0b100, 0b111]),
    ('F', [0b111, 0b100, 0b110, 0b100, 0b100]),
    ('G', [0b011, 0b100, 0b101, 0b101, 0b011]),
    ('H', [0b101, 0b101, 0b111, 0b101, 0b101]),
    ('I', [0b111, 0b010, 0b010, 0b010, 0b111]),
    ('J', [0b001, 0b001, 0b001, 0b101, 0b010]),
    ('K', [0b101, 0b110, 0b100, 0b110, 0b101]),
    ('L', [0b100, 0b100, 0b100, 0b100, 0b111]),
    ('M', [0b101, 0b111, 0b111, 0b101, 0b101]),
    ('N', [0b110, 0b101, 0b101, 0b101, 0b101]),
    ('O', [0b010, 0b101, 0b101, 0b101, 0b010]),
    ('P', [0b110, 0b101, 0b110, 0b100, 0b100]),
    ('Q', [0b010, 0b101, 0b101, 0b110, 0b011]),
    ('R', [0b110, 0b101, 0b110, 0b101, 0b101]),
    ('S', [0b011, 0b100, 0b010, 0b001, 0b110]),
    ('T', [0b111, 0b010, 0b010, 0b010, 0b010]),
    ('U', [0b101, 0b101, 0b101, 0b101, 0b111]),
    ('V', [0b101, 0b101, 0b101, 0b101, 0b010]),
    ('W', [0b101, 0b101, 0b111, 0b111, 0b101]),
    ('X', [0b101, 0b101, 0b010, 0b101, 0b101]),
    ('Y', [0b101, 0b101, 0b010, 0b010, 0b010]),
    ('Z', [0b111, 0b001, 0b010, 0b100, 0b111]),
    ('+', [0b000, 0b010, 0b111, 0b010, 0b000]),
    ('-', [0b000, 0b000, 0b111, 0b000, 0b000]),
    ('.', [0b000, 0b000, 0b000, 0b000, 0b010]),
    (':', [0b000, 0b010, 0b000, 0b010, 0b000]),
    ('!', [0b010, 0b010, 0b010, 0b000, 0b010]),
    ('?', [0b110, 0b001, 0b010, 0b000, 0b010]),
    ('#', [0b101, 0b111, 0b101, 0b111, 0b101]),
    ('*', [0b000, 0b101, 0b010, 0b101, 0b000]),
    ('/', [0b001, 0b001, 0b010, 0b100, 0b100]),
    ('_', [0b000, 0b000, 0b000, 0b000, 0b111]),
];

fn glyph_rows(ch: char) -> [u8; 5] {
    if ch == ' ' {
        return BLANK_GLYPH;
    }
    let upper = ch.to_ascii_uppercase();
    GLYPHS
        .iter()
        .find(|(glyph, _)| *glyph == upper)
        .map(|(_, rows)| *rows)
        .unwrap_or(MISSING_GLYPH)
}

/// `DrawSurface` over a row-major RGBA8 frame such as `Pixels::frame_mut`.
/// Every write is clipped and alpha-blended (source over).
pub struct PixelSurface<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> PixelSurface<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 || color[3] == 0 {
            return;
        }
        let Some(offset) = (y as usize)
            .checked_mul(self.width as usize)
            .and_then(|row| row.checked_add(x as usize))
            .and_then(|pixel| pixel.checked_mul(4))
        else {
            return;
        };
        let Some(dst) = self.frame.get_mut(offset..offset + 4) else {
            return;
        };

        if color[3] == u8::MAX {
            dst.copy_from_slice(&color);
            return;
        }
        let alpha = u32::from(color[3]);
        let inverse = 255 - alpha;
        for channel in 0..3 {
            let mixed = u32::from(color[channel]) * alpha + u32::from(dst[channel]) * inverse;
            dst[channel] = ((mixed + 127) / 255) as u8;
        }
        dst[3] = (alpha + (u32::from(dst[3]) * inverse + 127) / 255) as u8;
    }

    /// Visits every pixel whose centre lies in the clipped box and passes
    /// `inside`.
    fn fill_where(&mut self, min: Vec2, max: Vec2, color: Rgba, inside: impl Fn(Vec2) -> bool) {
        let left = (min.x.floor() as i32).max(0);
        let top = (min.y.floor() as i32).max(0);
        let right = (max.x.ceil() as i32).min(self.width as i32);
        let bottom = (max.y.ceil() as i32).min(self.height as i32);
        for y in top..bottom {
            for x in left..right {
                if inside(Vec2::new(x as f32 + 0.5, y as f32 + 0.5)) {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    fn fill_block(&mut self, x: i32, y: i32, size: i32, color: Rgba) {
        for dy in 0..size {
            for dx in 0..size {
                self.blend_pixel(x + dx, y + dy, color);
            }
        }
    }
}

impl DrawSurface for PixelSurface<'_> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Rgba) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    fn fill(&mut self, shape: &Shape, color: Rgba) {
        match shape {
            Shape::Rect { origin, size } => {
                let max = *origin + *size;
                self.fill_where(*origin, max, color, |_| true);
            }
            Shape::Circle { center, radius } => {
                let reach = Vec2::new(*radius, *radius);
                let radius_sq = radius * radius;
                self.fill_where(*center - reach, *center + reach, color, |point| {
                    let delta = point - *center;
                    delta.dot(delta) <= radius_sq
                });
            }
            Shape::Ellipse { center, radii } => {
                if radii.x <= 0.0 || radii.y <= 0.0 {
                    return;
                }
                self.fill_where(*center - *radii, *center + *radii, color, |point| {
                    let dx = (point.x - center.x) / radii.x;
                    let dy = (point.y - center.y) / radii.y;
                    dx * dx + dy * dy <= 1.0
                });
            }
            Shape::Polygon(points) => {
                if points.len() < 3 {
                    return;
                }
                let mut min = points[0];
                let mut max = points[0];
                for point in points {
                    min = Vec2::new(min.x.min(point.x), min.y.min(point.y));
                    max = Vec2::new(max.x.max(point.x), max.y.max(point.y));
                }
                self.fill_where(min, max, color, |point| polygon_contains(points, point));
            }
        }
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, thickness: f32, color: Rgba) {
        let half = (thickness * 0.5).max(0.5);
        let reach = Vec2::new(radius + half, radius + half);
        self.fill_where(center - reach, center + reach, color, |point| {
            (point.distance(center) - radius).abs() <= half
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Rgba) {
        let half = (thickness * 0.5).max(0.5);
        let min = Vec2::new(from.x.min(to.x) - half, from.y.min(to.y) - half);
        let max = Vec2::new(from.x.max(to.x) + half, from.y.max(to.y) + half);
        self.fill_where(min, max, color, |point| {
            distance_to_segment(point, from, to) <= half
        });
    }

    fn draw_image_region(
        &mut self,
        image: &SpriteImage,
        source: SourceRect,
        center: Vec2,
        size: Vec2,
        flip_x: bool,
    ) {
        if source.width == 0 || source.height == 0 || size.x <= 0.0 || size.y <= 0.0 {
            return;
        }
        let origin = center - size * 0.5;
        let scale_x = source.width as f32 / size.x;
        let scale_y = source.height as f32 / size.y;

        let left = (origin.x.floor() as i32).max(0);
        let top = (origin.y.floor() as i32).max(0);
        let right = ((origin.x + size.x).ceil() as i32).min(self.width as i32);
        let bottom = ((origin.y + size.y).ceil() as i32).min(self.height as i32);

        for y in top..bottom {
            let v = ((y as f32 + 0.5 - origin.y) * scale_y).floor();
            if v < 0.0 || v >= source.height as f32 {
                continue;
            }
            for x in left..right {
                let u = ((x as f32 + 0.5 - origin.x) * scale_x).floor();
                if u < 0.0 || u >= source.width as f32 {
                    continue;
                }
                let u = if flip_x {
                    source.width - 1 - u as u32
                } else {
                    u as u32
                };
                if let Some(texel) = image.pixel(source.x + u, source.y + v as u32) {
                    self.blend_pixel(x, y, texel);
                }
            }
        }
    }

    fn draw_text(&mut self, text: &str, center: Vec2, size_px: f32, color: Rgba) {
        let chars = text.chars().count() as i32;
        if chars == 0 {
            return;
        }
        let scale = ((size_px / GLYPH_HEIGHT as f32).round() as i32).max(1);
        let advance = (GLYPH_WIDTH + 1) * scale;
        let text_width = chars * advance - scale;
        let mut x = (center.x - text_width as f32 * 0.5).round() as i32;
        let y = (center.y - (GLYPH_HEIGHT * scale) as f32 * 0.5).round() as i32;

        for ch in text.chars() {
            let rows = glyph_rows(ch);
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    self.fill_block(x + col * scale, y + row as i32 * scale, scale, color);
                }
            }
            x += advance;
        }
    }
}

/// Even-odd rule.
fn polygon_contains(points: &[Vec2], point: Vec2) -> bool {
    let mut inside = false;
    let mut previous = points[points.len() - 1];
    for &current in points {
        let crosses = (current.y > point.y) != (previous.y > point.y);
        if crosses {
            let t = (point.y - current.y) / (previous.y - current.y);
            if point.x < current.x + t * (previous.x - current.x) {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

fn distance_to_segment(point: Vec2, from: Vec2, to: Vec2) -> f32 {
    let segment = to - from;
    let length_sq = segment.dot(segment);
    if length_sq <= f32::EPSILON {
        return point.distance(from);
    }
    let t = ((point - from).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(from + segment * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba = [255, 255, 255, 255];

    fn frame(width: u32, height: u32) -> Vec<u8> {
        vec![0; (width * height * 4) as usize]
    }

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> Rgba {
        let offset = ((y * width + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn shapes_far_outside_do_not_write_or_panic() {
        let mut buffer = frame(8, 8);
        let mut surface = PixelSurface::new(&mut buffer, 8, 8);
        surface.fill(
            &Shape::Circle {
                center: Vec2::new(-50.0, 200.0),
                radius: 30.0,
            },
            WHITE,
        );
        surface.stroke_line(Vec2::new(-10.0, -10.0), Vec2::new(-1.0, 40.0), 2.0, WHITE);
        surface.draw_text("99+", Vec2::new(400.0, 4.0), 10.0, WHITE);
        assert!(buffer.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn edge_clipping_keeps_in_bounds_pixels() {
        let mut buffer = frame(8, 8);
        let mut surface = PixelSurface::new(&mut buffer, 8, 8);
        surface.fill(
            &Shape::Rect {
                origin: Vec2::new(-4.0, -4.0),
                size: Vec2::new(6.0, 6.0),
            },
            WHITE,
        );
        assert_eq!(pixel(&buffer, 8, 0, 0), WHITE);
        assert_eq!(pixel(&buffer, 8, 1, 1), WHITE);
        assert_eq!(pixel(&buffer, 8, 2, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn short_frame_buffer_is_tolerated() {
        let mut buffer = vec![0u8; 16];
        let mut surface = PixelSurface::new(&mut buffer, 8, 8);
        surface.clear([1, 2, 3, 255]);
        surface.fill(
            &Shape::Rect {
                origin: Vec2::ZERO,
                size: Vec2::new(8.0, 8.0),
            },
            WHITE,
        );
        assert_eq!(buffer.len(), 16);
        assert!(buffer.iter().all(|byte| *byte == 255));
    }

    #[test]
    fn half_alpha_blends_over_background() {
        let mut buffer = frame(1, 1);
        let mut surface = PixelSurface::new(&mut buffer, 1, 1);
        surface.clear([0, 0, 0, 255]);
        surface.fill(
            &Shape::Rect {
                origin: Vec2::ZERO,
                size: Vec2::new(1.0, 1.0),
            },
            [200, 100, 0, 128],
        );
        assert_eq!(pixel(&buffer, 1, 0, 0), [100, 50, 0, 255]);
    }

    #[test]
    fn flipped_region_mirrors_columns() {
        let image = SpriteImage {
            width: 2,
            height: 1,
            rgba: vec![255, 0, 0, 255, 0, 0, 255, 255],
        };
        let source = SourceRect {
            x: 0,
            y: 0,
            width: 2,
            height: 1,
        };
        let mut buffer = frame(2, 1);
        let mut surface = PixelSurface::new(&mut buffer, 2, 1);
        surface.draw_image_region(&image, source, Vec2::new(1.0, 0.5), Vec2::new(2.0, 1.0), true);

        assert_eq!(pixel(&buffer, 2, 0, 0), [0, 0, 255, 255]);
        assert_eq!(pixel(&buffer, 2, 1, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn unknown_characters_fall_back_to_diamond() {
        assert_eq!(glyph_rows('é'), MISSING_GLYPH);
        assert_eq!(glyph_rows('a'), glyph_rows('A'));
        assert_eq!(glyph_rows(' '), BLANK_GLYPH);
    }
}
