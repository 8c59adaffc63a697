pub mod declaration;
pub mod expression;
pub mod statement;
pub mod type_name;

pub use declaration::*;
pub use expression::*;
pub use statement::*;
pub use type_name::*;
