mod pixel_surface;
mod presenter;
mod scene_renderer;
mod sprites;
mod surface;

pub use pixel_surface::PixelSurface;
pub use presenter::FramePresenter;
pub use scene_renderer::SceneRenderer;
pub use sprites::{
    load_sprite_sheet, SpriteCatalog, SpriteLoadError, SpriteSheet, SHEET_FRAME_COUNT,
};
pub use surface::{with_alpha, DrawSurface, Rgba, Shape, SourceRect, SpriteImage};
