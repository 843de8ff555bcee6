pub mod common;
pub mod criteria;
pub mod entity;
pub mod kind;
pub mod user_context;
pub mod validation;
pub mod vocabulary;

pub use common::*;
pub use criteria::*;
pub use entity::*;
pub use kind::*;
pub use user_context::*;
pub use validation::*;
