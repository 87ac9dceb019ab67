use crate::app::geometry::Vec2;

pub type Rgba = [u8; 4];

/// Replaces the alpha channel with `alpha` scaled into `0..=255`.
pub fn with_alpha(color: Rgba, alpha: f32) -> Rgba {
    let scaled = (f32::from(color[3]) * alpha.clamp(0.0, 1.0)).round() as u8;
    [color[0], color[1], color[2], scaled]
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect { origin: Vec2, size: Vec2 },
    Circle { center: Vec2, radius: f32 },
    Ellipse { center: Vec2, radii: Vec2 },
    Polygon(Vec<Vec2>),
}

/// Pixel rectangle inside a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Decoded RGBA8 image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl SpriteImage {
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.rgba.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

/// Drawing capability the scene renderer is handed each frame.
pub trait DrawSurface {
    fn size(&self) -> (u32, u32);
    fn clear(&mut self, color: Rgba);
    fn fill(&mut self, shape: &Shape, color: Rgba);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, thickness: f32, color: Rgba);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, thickness: f32, color: Rgba);
    fn draw_image_region(
        &mut self,
        image: &SpriteImage,
        source: SourceRect,
        center: Vec2,
        size: Vec2,
        flip_x: bool,
    );
    fn draw_text(&mut self, text: &str, center: Vec2, size_px: f32, color: Rgba);
}
