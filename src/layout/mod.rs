pub mod field;
pub mod loader;

pub use field::{FieldKind, FieldSpec, LayoutConfig, PixelRect};
pub use loader::load_layout;
