pub mod fields;
pub mod model;
mod validate;

pub use fields::*;
pub use model::*;
pub use validate::validate;
pub(crate) use validate::value_kind;
