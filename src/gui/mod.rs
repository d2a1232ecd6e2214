//! The terminal front end.

mod play;
pub mod scene;

pub use play::play;
pub use scene::draw_scene;
