pub mod validation;
pub mod password;
pub mod time;

pub use validation::*;
pub use password::*;
pub use time::*;
