pub mod renderer;

pub use renderer::{PrimitiveRenderer, Renderer};
