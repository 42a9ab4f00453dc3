pub mod connection;
pub mod geolocation;
pub mod ptz;

pub use connection::Connection;
pub use geolocation::{GeoPosition, Geolocation, parse_position};
pub use ptz::{MoveDirection, Preset, Ptz, PtzPosition};
