//! Generic table model: column types, definitions, resources, submissions and rows.

mod column;
mod column_type;
mod form;
mod resource;
mod value;

pub use column::*;
pub use column_type::*;
pub use form::*;
pub use resource::*;
pub use value::*;
