pub mod commands;
pub mod constants;
pub mod error;
pub mod protocol;
pub mod vapix;

pub use commands::*;
pub use protocol::Params;
pub use vapix::{HttpMethod, VapixCam};
pub use error::{Result, VapixError};
