pub mod brand;
pub mod country;
pub mod product;

pub use brand::*;
pub use country::*;
pub use product::*;
