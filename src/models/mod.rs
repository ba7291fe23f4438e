pub mod crop;
pub mod field;
pub mod plan;
pub mod planting;
pub mod price;
pub mod recommendation;

pub use crop::*;
pub use field::*;
pub use plan::*;
pub use planting::*;
pub use price::*;
pub use recommendation::*;
