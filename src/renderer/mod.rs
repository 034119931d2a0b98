//! Rendering pass
//!
//! Canvas 2D painting of the world state. Strictly read-only with respect to
//! the simulation.

mod canvas;

pub use canvas::CanvasRenderer;
