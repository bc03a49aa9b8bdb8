pub mod authorization;
pub mod calendar;
pub mod errors;
pub mod grouping;
pub mod todo;
pub mod user;

pub use authorization::*;
pub use calendar::*;
pub use errors::*;
pub use grouping::*;
pub use todo::*;
pub use user::*;
