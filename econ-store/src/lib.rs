pub mod economy_save;
pub mod economy_store;

pub use economy_save::*;
pub use economy_store::*;
