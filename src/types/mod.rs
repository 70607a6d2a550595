//! Value types for light control parameters.

mod brightness;
mod color;
mod hsv;
mod kelvin;
mod protocol;
mod transition;

pub use brightness::Brightness;
pub use color::Color;
pub use hsv::Hsv;
pub use kelvin::Kelvin;
pub use protocol::Protocol;
pub use transition::Transition;
