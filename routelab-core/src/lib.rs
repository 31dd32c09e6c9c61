pub mod driver;
pub mod error;
pub mod logging;
pub mod plan;
pub mod types;


pub use driver::*;
pub use error::*;
pub use logging::{LogLevel as NodeLogLevel, NodeLogger};
pub use plan::*;
pub use types::*;
