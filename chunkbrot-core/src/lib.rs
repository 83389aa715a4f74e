pub mod complex;
pub mod error;
pub mod escape;
pub mod fractal;
pub mod seed_picker;
pub mod viewport;

// Re-export primary types for convenience.
pub use complex::Complex;
pub use error::CoreError;
pub use escape::{evaluate, evaluate_with};
pub use fractal::{FractalMode, FractalParams};
pub use seed_picker::SeedPicker;
pub use viewport::Viewport;

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
