pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;

pub use ingredients::*;
pub use recipes::*;
pub use tags::*;
pub use users::*;
