pub mod params;
pub mod viewport;
