pub mod scaler;
pub mod encoder;
pub mod split;
pub mod text;

pub use scaler::*;
pub use encoder::*;
pub use split::*;
pub use text::*;
