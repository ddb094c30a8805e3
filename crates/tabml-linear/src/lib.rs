pub mod sdca;
pub mod logistic;

pub use sdca::*;
pub use logistic::*;
