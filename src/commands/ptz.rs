use crate::constants::{LENS_MAX, LENS_MIN, PTZ_CONFIG_ENDPOINT, PTZ_ENDPOINT, SPEED_MAX, SPEED_MIN};
use crate::error::{Result, VapixError};
use crate::protocol::Params;
use crate::vapix::{HttpMethod, VapixCam};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use strum_macros::AsRefStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum MoveDirection {
    Home,
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PtzPosition {
    pub pan: f64,
    pub tilt: f64,
    pub zoom: f64,
    pub focus: Option<f64>,
    pub iris: Option<f64>,
    pub brightness: Option<f64>,
    pub autofocus: Option<bool>,
    pub autoiris: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub number: u32,
    pub name: String,
}

fn check_range<T: PartialOrd + Display + Copy>(name: &str, value: T, min: T, max: T) -> Result<T> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(VapixError::InvalidArgument(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )))
    }
}

fn check_name<'a>(what: &str, name: &'a str) -> Result<&'a str> {
    if name.trim().is_empty() {
        return Err(VapixError::InvalidArgument(format!(
            "{} must not be empty",
            what
        )));
    }
    Ok(name)
}

fn speed(speed: i32) -> Result<(&'static str, String)> {
    let speed = check_range("speed", speed, SPEED_MIN, SPEED_MAX)?;
    Ok(("speed", speed.to_string()))
}

fn on_off(on: bool) -> String {
    let value = if on { "on" } else { "off" };
    value.to_string()
}

pub fn absolute_move_params(pan: f64, tilt: f64, zoom: i32, speed_value: i32) -> Result<Params> {
    let zoom = check_range("zoom", zoom, LENS_MIN, LENS_MAX)?;
    Ok(vec![
        ("pan", pan.to_string()),
        ("tilt", tilt.to_string()),
        ("zoom", zoom.to_string()),
        speed(speed_value)?,
    ])
}

pub fn relative_move_params(pan: f64, tilt: f64, zoom: i32, speed_value: i32) -> Result<Params> {
    Ok(vec![
        ("rpan", pan.to_string()),
        ("rtilt", tilt.to_string()),
        ("rzoom", zoom.to_string()),
        speed(speed_value)?,
    ])
}

pub fn continuous_move_params(pan_speed: i32, tilt_speed: i32, zoom_speed: i32) -> Params {
    vec![
        (
            "continuouspantiltmove",
            format!("{},{}", pan_speed, tilt_speed),
        ),
        ("continuouszoommove", zoom_speed.to_string()),
    ]
}

pub fn continuous_pantilt_params(pan_speed: i32, tilt_speed: i32) -> Params {
    vec![(
        "continuouspantiltmove",
        format!("{},{}", pan_speed, tilt_speed),
    )]
}

pub fn continuous_zoom_params(zoom_speed: i32) -> Params {
    vec![("continuouszoommove", zoom_speed.to_string())]
}

pub fn continuous_focus_params(focus_speed: i32) -> Params {
    vec![("continuousfocusmove", focus_speed.to_string())]
}

pub fn continuous_iris_params(iris_speed: i32) -> Params {
    vec![("continuousirismove", iris_speed.to_string())]
}

pub fn continuous_brightness_params(brightness_speed: i32) -> Params {
    vec![("continuousbrightnessmove", brightness_speed.to_string())]
}

pub fn stop_move_params() -> Params {
    continuous_move_params(0, 0, 0)
}

pub fn center_move_params(x: i32, y: i32, speed_value: i32) -> Result<Params> {
    Ok(vec![("center", format!("{},{}", x, y)), speed(speed_value)?])
}

pub fn area_zoom_params(x: i32, y: i32, zoom: i32, speed_value: i32) -> Result<Params> {
    Ok(vec![
        ("areazoom", format!("{},{},{}", x, y, zoom)),
        speed(speed_value)?,
    ])
}

pub fn move_direction_params(direction: MoveDirection, speed_value: i32) -> Result<Params> {
    Ok(vec![
        ("move", direction.as_ref().to_string()),
        speed(speed_value)?,
    ])
}

pub fn go_home_params(speed_value: i32) -> Result<Params> {
    move_direction_params(MoveDirection::Home, speed_value)
}

pub fn set_zoom_params(zoom: i32) -> Result<Params> {
    let zoom = check_range("zoom", zoom, LENS_MIN, LENS_MAX)?;
    Ok(vec![("zoom", zoom.to_string())])
}

pub fn set_focus_params(focus: i32) -> Result<Params> {
    let focus = check_range("focus", focus, LENS_MIN, LENS_MAX)?;
    Ok(vec![("focus", focus.to_string())])
}

pub fn set_iris_params(iris: i32) -> Result<Params> {
    let iris = check_range("iris", iris, LENS_MIN, LENS_MAX)?;
    Ok(vec![("iris", iris.to_string())])
}

pub fn set_brightness_params(brightness: i32) -> Result<Params> {
    let brightness = check_range("brightness", brightness, LENS_MIN, LENS_MAX)?;
    Ok(vec![("brightness", brightness.to_string())])
}

pub fn autofocus_params(on: bool) -> Params {
    vec![("autofocus", on_off(on))]
}

pub fn autoiris_params(on: bool) -> Params {
    vec![("autoiris", on_off(on))]
}

pub fn save_preset_name_params(name: &str) -> Result<Params> {
    let name = check_name("preset name", name)?;
    Ok(vec![("setserverpresetname", name.to_string())])
}

pub fn save_preset_number_params(number: u32) -> Params {
    vec![("setserverpresetno", number.to_string())]
}

pub fn rename_preset_params(old_name: &str, new_name: &str) -> Result<Params> {
    let old_name = check_name("preset name", old_name)?;
    let new_name = check_name("new preset name", new_name)?;
    Ok(vec![
        ("renameserverpresetname", old_name.to_string()),
        ("newname", new_name.to_string()),
    ])
}

pub fn rename_preset_number_params(number: u32, new_name: &str) -> Result<Params> {
    let new_name = check_name("new preset name", new_name)?;
    Ok(vec![
        ("renameserverpresetno", number.to_string()),
        ("newname", new_name.to_string()),
    ])
}

pub fn remove_preset_name_params(name: &str) -> Result<Params> {
    let name = check_name("preset name", name)?;
    Ok(vec![("removeserverpresetname", name.to_string())])
}

pub fn remove_preset_number_params(number: u32) -> Params {
    vec![("removeserverpresetno", number.to_string())]
}

pub fn goto_preset_name_params(name: &str, speed_value: i32) -> Result<Params> {
    let name = check_name("preset name", name)?;
    Ok(vec![
        ("gotoserverpresetname", name.to_string()),
        speed(speed_value)?,
    ])
}

pub fn goto_preset_number_params(number: u32, speed_value: i32) -> Result<Params> {
    Ok(vec![
        ("gotoserverpresetno", number.to_string()),
        speed(speed_value)?,
    ])
}

fn parse_number(key: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|e| VapixError::ParseError(format!("Invalid {} value {:?}: {}", key, value, e)))
}

/// Parses the `key=value` body returned by `query=position`.
pub fn parse_position_response(text: &str) -> Result<PtzPosition> {
    let fields: HashMap<&str, &str> = text
        .split_whitespace()
        .filter_map(|token| token.split_once('='))
        .collect();

    let required = |key: &str| -> Result<f64> {
        let value = fields
            .get(key)
            .ok_or_else(|| VapixError::ParseError(format!("Missing {} in position response", key)))?;
        parse_number(key, value)
    };
    let optional = |key: &str| -> Result<Option<f64>> {
        fields.get(key).map(|v| parse_number(key, v)).transpose()
    };
    let flag = |key: &str| fields.get(key).map(|v| v.eq_ignore_ascii_case("on"));

    Ok(PtzPosition {
        pan: required("pan")?,
        tilt: required("tilt")?,
        zoom: required("zoom")?,
        focus: optional("focus")?,
        iris: optional("iris")?,
        brightness: optional("brightness")?,
        autofocus: flag("autofocus"),
        autoiris: flag("autoiris"),
    })
}

/// Parses `presetposnoN=Name` lines returned by `query=presetposall`.
pub fn parse_presets_response(text: &str) -> Vec<Preset> {
    let mut presets: Vec<Preset> = text
        .lines()
        .filter_map(|line| {
            let (key, name) = line.trim().split_once('=')?;
            let number = key.strip_prefix("presetposno")?.parse().ok()?;
            Some(Preset {
                number,
                name: name.trim().to_string(),
            })
        })
        .collect();
    presets.sort_by_key(|p| p.number);
    presets
}

#[async_trait]
pub trait Ptz: Send + Sync {
    /// Query the current pan, tilt and zoom (plus lens state when reported)
    async fn get_current_position(&self) -> Result<PtzPosition>;

    /// List the server presets stored on the camera
    async fn list_presets(&self) -> Result<Vec<Preset>>;

    /// Move to an absolute position
    async fn absolute_move(&self, pan: f64, tilt: f64, zoom: i32, speed: i32) -> Result<String>;

    /// Move relative to the current position
    async fn relative_move(&self, pan: f64, tilt: f64, zoom: i32, speed: i32) -> Result<String>;

    /// Start continuous pan/tilt and zoom movement
    async fn continuous_move(&self, pan_speed: i32, tilt_speed: i32, zoom_speed: i32)
    -> Result<String>;

    /// Start continuous pan/tilt movement
    async fn continuous_pantilt(&self, pan_speed: i32, tilt_speed: i32) -> Result<String>;

    /// Start continuous zoom movement
    async fn continuous_zoom(&self, zoom_speed: i32) -> Result<String>;

    /// Start continuous focus movement
    async fn continuous_focus(&self, focus_speed: i32) -> Result<String>;

    /// Start continuous iris movement
    async fn continuous_iris(&self, iris_speed: i32) -> Result<String>;

    /// Start continuous brightness movement
    async fn continuous_brightness(&self, brightness_speed: i32) -> Result<String>;

    /// Stop all continuous movement
    async fn stop_move(&self) -> Result<String>;

    /// Center the view on an image coordinate
    async fn center_move(&self, x: i32, y: i32, speed: i32) -> Result<String>;

    /// Center on an image coordinate and zoom
    async fn area_zoom(&self, x: i32, y: i32, zoom: i32, speed: i32) -> Result<String>;

    /// Move one step in a direction
    async fn move_direction(&self, direction: MoveDirection, speed: i32) -> Result<String>;

    /// Return to the home position
    async fn go_home(&self, speed: i32) -> Result<String>;

    /// Set the absolute zoom (0-9999)
    async fn set_zoom(&self, zoom: i32) -> Result<String>;

    /// Set the absolute focus (0-9999)
    async fn set_focus(&self, focus: i32) -> Result<String>;

    /// Set the absolute iris (0-9999)
    async fn set_iris(&self, iris: i32) -> Result<String>;

    /// Set the absolute brightness (0-9999)
    async fn set_brightness(&self, brightness: i32) -> Result<String>;

    /// Toggle autofocus
    async fn set_autofocus(&self, on: bool) -> Result<String>;

    /// Toggle autoiris
    async fn set_autoiris(&self, on: bool) -> Result<String>;

    /// Save the current position as a named preset
    async fn save_preset_name(&self, name: &str) -> Result<String>;

    /// Save the current position as a numbered preset
    async fn save_preset_number(&self, number: u32) -> Result<String>;

    /// Rename a named preset
    async fn rename_preset(&self, old_name: &str, new_name: &str) -> Result<String>;

    /// Give a numbered preset a new name
    async fn rename_preset_number(&self, number: u32, new_name: &str) -> Result<String>;

    /// Remove a named preset
    async fn remove_preset_name(&self, name: &str) -> Result<String>;

    /// Remove a numbered preset
    async fn remove_preset_number(&self, number: u32) -> Result<String>;

    /// Move to a named preset
    async fn goto_preset_name(&self, name: &str, speed: i32) -> Result<String>;

    /// Move to a numbered preset
    async fn goto_preset_number(&self, number: u32, speed: i32) -> Result<String>;
}

impl VapixCam {
    async fn ptz_command(&self, params: Params) -> Result<String> {
        self.send_request(PTZ_ENDPOINT, HttpMethod::Get, params)
            .await
    }

    async fn ptz_config(&self, params: Params) -> Result<String> {
        self.send_request(PTZ_CONFIG_ENDPOINT, HttpMethod::Get, params)
            .await
    }
}

#[async_trait]
impl Ptz for VapixCam {
    async fn get_current_position(&self) -> Result<PtzPosition> {
        let text = self
            .ptz_command(vec![("query", "position".to_string())])
            .await?;
        parse_position_response(&text)
    }

    async fn list_presets(&self) -> Result<Vec<Preset>> {
        let text = self
            .ptz_command(vec![("query", "presetposall".to_string())])
            .await?;
        Ok(parse_presets_response(&text))
    }

    async fn absolute_move(&self, pan: f64, tilt: f64, zoom: i32, speed: i32) -> Result<String> {
        self.ptz_command(absolute_move_params(pan, tilt, zoom, speed)?)
            .await
    }

    async fn relative_move(&self, pan: f64, tilt: f64, zoom: i32, speed: i32) -> Result<String> {
        self.ptz_command(relative_move_params(pan, tilt, zoom, speed)?)
            .await
    }

    async fn continuous_move(
        &self,
        pan_speed: i32,
        tilt_speed: i32,
        zoom_speed: i32,
    ) -> Result<String> {
        self.ptz_command(continuous_move_params(pan_speed, tilt_speed, zoom_speed))
            .await
    }

    async fn continuous_pantilt(&self, pan_speed: i32, tilt_speed: i32) -> Result<String> {
        self.ptz_command(continuous_pantilt_params(pan_speed, tilt_speed))
            .await
    }

    async fn continuous_zoom(&self, zoom_speed: i32) -> Result<String> {
        self.ptz_command(continuous_zoom_params(zoom_speed)).await
    }

    async fn continuous_focus(&self, focus_speed: i32) -> Result<String> {
        self.ptz_command(continuous_focus_params(focus_speed)).await
    }

    async fn continuous_iris(&self, iris_speed: i32) -> Result<String> {
        self.ptz_command(continuous_iris_params(iris_speed)).await
    }

    async fn continuous_brightness(&self, brightness_speed: i32) -> Result<String> {
        self.ptz_command(continuous_brightness_params(brightness_speed))
            .await
    }

    async fn stop_move(&self) -> Result<String> {
        self.ptz_command(stop_move_params()).await
    }

    async fn center_move(&self, x: i32, y: i32, speed: i32) -> Result<String> {
        self.ptz_command(center_move_params(x, y, speed)?).await
    }

    async fn area_zoom(&self, x: i32, y: i32, zoom: i32, speed: i32) -> Result<String> {
        self.ptz_command(area_zoom_params(x, y, zoom, speed)?).await
    }

    async fn move_direction(&self, direction: MoveDirection, speed: i32) -> Result<String> {
        self.ptz_command(move_direction_params(direction, speed)?)
            .await
    }

    async fn go_home(&self, speed: i32) -> Result<String> {
        self.ptz_command(go_home_params(speed)?).await
    }

    async fn set_zoom(&self, zoom: i32) -> Result<String> {
        self.ptz_command(set_zoom_params(zoom)?).await
    }

    async fn set_focus(&self, focus: i32) -> Result<String> {
        self.ptz_command(set_focus_params(focus)?).await
    }

    async fn set_iris(&self, iris: i32) -> Result<String> {
        self.ptz_command(set_iris_params(iris)?).await
    }

    async fn set_brightness(&self, brightness: i32) -> Result<String> {
        self.ptz_command(set_brightness_params(brightness)?).await
    }

    async fn set_autofocus(&self, on: bool) -> Result<String> {
        self.ptz_command(autofocus_params(on)).await
    }

    async fn set_autoiris(&self, on: bool) -> Result<String> {
        self.ptz_command(autoiris_params(on)).await
    }

    async fn save_preset_name(&self, name: &str) -> Result<String> {
        self.ptz_config(save_preset_name_params(name)?).await
    }

    async fn save_preset_number(&self, number: u32) -> Result<String> {
        self.ptz_config(save_preset_number_params(number)).await
    }

    async fn rename_preset(&self, old_name: &str, new_name: &str) -> Result<String> {
        self.ptz_config(rename_preset_params(old_name, new_name)?)
            .await
    }

    async fn rename_preset_number(&self, number: u32, new_name: &str) -> Result<String> {
        self.ptz_config(rename_preset_number_params(number, new_name)?)
            .await
    }

    async fn remove_preset_name(&self, name: &str) -> Result<String> {
        self.ptz_config(remove_preset_name_params(name)?).await
    }

    async fn remove_preset_number(&self, number: u32) -> Result<String> {
        self.ptz_config(remove_preset_number_params(number)).await
    }

    async fn goto_preset_name(&self, name: &str, speed: i32) -> Result<String> {
        self.ptz_command(goto_preset_name_params(name, speed)?)
            .await
    }

    async fn goto_preset_number(&self, number: u32, speed: i32) -> Result<String> {
        self.ptz_command(goto_preset_number_params(number, speed)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    fn is_invalid<T: std::fmt::Debug>(result: Result<T>) -> bool {
        matches!(result, Err(VapixError::InvalidArgument(_)))
    }

    #[test]
    fn lens_setters_accept_bounds() {
        for v in [0, 9999] {
            assert!(set_zoom_params(v).is_ok());
            assert!(set_focus_params(v).is_ok());
            assert!(set_iris_params(v).is_ok());
            assert!(set_brightness_params(v).is_ok());
        }
        for v in [-1, 10000] {
            assert!(is_invalid(set_zoom_params(v)));
            assert!(is_invalid(set_focus_params(v)));
            assert!(is_invalid(set_iris_params(v)));
            assert!(is_invalid(set_brightness_params(v)));
        }
    }

    #[test]
    fn speed_bounds() {
        assert!(go_home_params(0).is_ok());
        assert!(go_home_params(100).is_ok());
        assert!(is_invalid(go_home_params(-1)));
        assert!(is_invalid(go_home_params(101)));
        assert!(is_invalid(center_move_params(1, 1, 101)));
        assert!(is_invalid(area_zoom_params(1, 1, 200, -1)));
        assert!(is_invalid(relative_move_params(1.0, 1.0, 0, 101)));
        assert!(is_invalid(goto_preset_number_params(3, 101)));
    }

    #[test]
    fn absolute_move_checks_zoom_and_speed() {
        let params = absolute_move_params(10.5, -20.0, 9999, 100).unwrap();
        assert_eq!(value(&params, "pan"), Some("10.5"));
        assert_eq!(value(&params, "tilt"), Some("-20"));
        assert_eq!(value(&params, "zoom"), Some("9999"));
        assert_eq!(value(&params, "speed"), Some("100"));

        assert!(is_invalid(absolute_move_params(0.0, 0.0, 10000, 50)));
        assert!(is_invalid(absolute_move_params(0.0, 0.0, 1, 101)));
    }

    #[test]
    fn relative_move_uses_r_keys() {
        let params = relative_move_params(5.0, -5.0, -100, 20).unwrap();
        let keys: Vec<_> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["rpan", "rtilt", "rzoom", "speed"]);
        assert_eq!(value(&params, "rzoom"), Some("-100"));
    }

    #[test]
    fn continuous_builders_join_with_commas() {
        let params = continuous_pantilt_params(10, -5);
        assert_eq!(value(&params, "continuouspantiltmove"), Some("10,-5"));

        let params = continuous_move_params(10, -5, 3);
        assert_eq!(value(&params, "continuouspantiltmove"), Some("10,-5"));
        assert_eq!(value(&params, "continuouszoommove"), Some("3"));

        assert_eq!(
            continuous_focus_params(-40),
            vec![("continuousfocusmove", "-40".to_string())]
        );
        assert_eq!(
            continuous_iris_params(7),
            vec![("continuousirismove", "7".to_string())]
        );
        assert_eq!(
            continuous_brightness_params(-1),
            vec![("continuousbrightnessmove", "-1".to_string())]
        );
    }

    #[test]
    fn stop_zeroes_pantilt_and_zoom() {
        let params = stop_move_params();
        assert_eq!(value(&params, "continuouspantiltmove"), Some("0,0"));
        assert_eq!(value(&params, "continuouszoommove"), Some("0"));
    }

    #[test]
    fn center_and_area_zoom() {
        let params = center_move_params(320, 240, 50).unwrap();
        assert_eq!(value(&params, "center"), Some("320,240"));

        let params = area_zoom_params(320, 240, 200, 50).unwrap();
        assert_eq!(value(&params, "areazoom"), Some("320,240,200"));
        assert_eq!(value(&params, "speed"), Some("50"));
    }

    #[test]
    fn directions_serialize_lowercase() {
        let params = move_direction_params(MoveDirection::UpLeft, 30).unwrap();
        assert_eq!(value(&params, "move"), Some("upleft"));
        let params = go_home_params(30).unwrap();
        assert_eq!(value(&params, "move"), Some("home"));
        assert_eq!(MoveDirection::DownRight.as_ref(), "downright");
    }

    #[test]
    fn auto_toggles() {
        assert_eq!(autofocus_params(true), vec![("autofocus", "on".to_string())]);
        assert_eq!(autoiris_params(false), vec![("autoiris", "off".to_string())]);
    }

    #[test]
    fn preset_builders() {
        assert_eq!(
            save_preset_name_params("Gate").unwrap(),
            vec![("setserverpresetname", "Gate".to_string())]
        );
        assert_eq!(
            rename_preset_params("Gate", "Front gate").unwrap(),
            vec![
                ("renameserverpresetname", "Gate".to_string()),
                ("newname", "Front gate".to_string()),
            ]
        );
        assert_eq!(
            remove_preset_number_params(4),
            vec![("removeserverpresetno", "4".to_string())]
        );
        assert!(is_invalid(save_preset_name_params("  ")));
        assert!(is_invalid(rename_preset_number_params(2, "")));
        assert!(is_invalid(goto_preset_name_params("", 10)));
    }

    #[test]
    fn parses_position_response() {
        let text = "pan=-12.5\ntilt=3.25\nzoom=1\niris=5000\nfocus=7000\nautofocus=on\nautoiris=off\n";
        let position = parse_position_response(text).unwrap();
        assert_eq!(position.pan, -12.5);
        assert_eq!(position.tilt, 3.25);
        assert_eq!(position.zoom, 1.0);
        assert_eq!(position.focus, Some(7000.0));
        assert_eq!(position.iris, Some(5000.0));
        assert_eq!(position.brightness, None);
        assert_eq!(position.autofocus, Some(true));
        assert_eq!(position.autoiris, Some(false));
    }

    #[test]
    fn position_response_requires_axes() {
        assert!(matches!(
            parse_position_response("pan=1 tilt=2"),
            Err(VapixError::ParseError(_))
        ));
        assert!(matches!(
            parse_position_response("pan=1 tilt=abc zoom=1"),
            Err(VapixError::ParseError(_))
        ));
    }

    #[test]
    fn parses_presets() {
        let text = "presetposall\npresetposno3=Parking lot\npresetposno1=Home\nsomething=else\n";
        assert_eq!(
            parse_presets_response(text),
            vec![
                Preset {
                    number: 1,
                    name: "Home".to_string()
                },
                Preset {
                    number: 3,
                    name: "Parking lot".to_string()
                },
            ]
        );
    }
}
