mod constants;
mod event;
mod frame;
mod round;

pub use constants::*;
pub use event::*;
pub use frame::*;
pub use round::*;
