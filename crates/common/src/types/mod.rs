mod decision;
mod exchange;
mod level;
mod reflection;

pub use decision::*;
pub use exchange::*;
pub use level::*;
pub use reflection::*;
