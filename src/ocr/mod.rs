pub mod crop;
pub mod engine;
pub mod extract;
pub mod normalize;
pub mod setup;

pub use engine::{ImageSession, TesseractEngine, TextRecognizer};
pub use extract::extract_region;
pub use normalize::normalize;
