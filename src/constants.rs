use std::time::Duration;

pub const CGI_PATH: &str = "axis-cgi";

pub const PTZ_ENDPOINT: &str = "com/ptz.cgi";
pub const PTZ_CONFIG_ENDPOINT: &str = "com/ptzconfig.cgi";
pub const GEOLOCATION_GET_ENDPOINT: &str = "geolocation/get.cgi";
pub const GEOLOCATION_SET_ENDPOINT: &str = "geolocation/set.cgi";

pub const DEFAULT_CAMERA: &str = "1";
pub const DEFAULT_HTML: &str = "no";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub const SPEED_MIN: i32 = 0;
pub const SPEED_MAX: i32 = 100;

/// Shared limit for absolute zoom, focus, iris and brightness.
pub const LENS_MIN: i32 = 0;
pub const LENS_MAX: i32 = 9999;
