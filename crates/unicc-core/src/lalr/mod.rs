mod closure;
mod conflict;
mod encode;
mod states;

pub use closure::*;
pub use conflict::*;
pub use encode::*;
pub use states::*;
