mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod loader;
    pub mod pagination;
    pub mod schema;
    pub mod shopping;
}
mod constants;

pub use constants::*;
pub use database::*;
pub use error::*;
pub use form::*;
pub use loader::*;
pub use shopping::*;
