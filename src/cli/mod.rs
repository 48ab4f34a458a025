pub mod create;
pub mod extract;
pub mod info;
pub mod list;

pub use create::*;
pub use extract::*;
pub use info::*;
pub use list::*;
