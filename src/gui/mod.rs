pub mod app;
pub mod input;
pub mod scheduler;
pub mod texture;

pub use app::{JuliaApp, ViewerConfig};
