pub mod catalog;
pub mod credits;
pub mod model;
pub mod price;
pub mod universe;

pub use catalog::*;
pub use credits::*;
pub use model::*;
pub use price::*;
pub use universe::*;
