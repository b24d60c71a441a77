pub mod errors;
pub mod limits;
pub mod series;

pub use errors::*;
pub use limits::*;
pub use series::*;
