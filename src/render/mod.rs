mod mask;
pub use mask::render;
pub use mask::render_with_stats;
pub use mask::ClassIndexGrid;
pub use mask::MaskStats;
pub use mask::RenderedMask;
pub use mask::FALLBACK;

mod palette;
pub use palette::Palette;

mod overlay;
pub use overlay::blend_mask;
pub use overlay::draw_detections;
pub use overlay::BoxStyle;
