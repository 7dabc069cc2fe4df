pub mod color;
pub mod error_codes;
pub mod export;
pub mod font_assets;
pub mod glyph_atlas;
pub mod glyph_atlas_data;
pub mod layout;
pub mod manifest;
pub mod preview_mode;
pub mod renderer;
pub mod schema;
pub mod shadow;
pub mod templates;
pub mod text_painter;
pub mod text_wrap;
pub mod variations;
