use crate::constants::{GEOLOCATION_GET_ENDPOINT, GEOLOCATION_SET_ENDPOINT};
use crate::error::{Result, VapixError};
use crate::vapix::{HttpMethod, VapixCam};
use async_trait::async_trait;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::{Error as XmlError, Reader};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub lat: f64,
    pub lon: f64,
    pub heading: f64,
    pub valid_position: bool,
    pub valid_heading: bool,
}

const LAT: usize = 0;
const LNG: usize = 1;
const HEADING: usize = 2;
const VALID_POSITION: usize = 3;
const VALID_HEADING: usize = 4;

const TAGS: [&str; 5] = ["Lat", "Lng", "Heading", "ValidPosition", "ValidHeading"];

/// Extracts the position fields from a `geolocation/get.cgi` response.
///
/// The first element with each tag name is used, wherever it sits in the
/// document. Flags are `false` only for the text `false` (any case).
pub fn parse_position(xml: &str) -> Result<GeoPosition> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut seen = [false; TAGS.len()];
    let mut values: [Option<String>; TAGS.len()] = Default::default();
    let mut current: Option<usize> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                current = TAGS
                    .iter()
                    .position(|tag| tag.as_bytes() == e.local_name().as_ref())
                    .filter(|&i| !seen[i]);
                if let Some(i) = current {
                    seen[i] = true;
                }
            }
            Event::Empty(e) => {
                if let Some(i) = TAGS
                    .iter()
                    .position(|tag| tag.as_bytes() == e.local_name().as_ref())
                {
                    seen[i] = true;
                }
            }
            Event::Text(e) => {
                if let Some(i) = current {
                    append(&mut values[i], &e.decode().map_err(XmlError::Encoding)?);
                }
            }
            Event::CData(e) => {
                if let Some(i) = current {
                    append(&mut values[i], &e.decode().map_err(XmlError::Encoding)?);
                }
            }
            Event::GeneralRef(e) => {
                if let Some(i) = current {
                    if let Some(ch) = e.resolve_char_ref()? {
                        append(&mut values[i], ch.encode_utf8(&mut [0u8; 4]));
                    } else {
                        let name = e.decode().map_err(XmlError::Encoding)?;
                        let resolved = resolve_predefined_entity(&name).ok_or_else(|| {
                            VapixError::ParseError(format!(
                                "Unknown entity &{}; in <{}>",
                                name, TAGS[i]
                            ))
                        })?;
                        append(&mut values[i], resolved);
                    }
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }

    let number = |i: usize| -> Result<f64> {
        let raw = field_text(&seen, &values, i)?;
        raw.parse::<f64>().map_err(|e| {
            VapixError::ParseError(format!("Invalid <{}> value {:?}: {}", TAGS[i], raw, e))
        })
    };
    let flag = |i: usize| -> Result<bool> {
        Ok(!field_text(&seen, &values, i)?.eq_ignore_ascii_case("false"))
    };

    Ok(GeoPosition {
        lat: number(LAT)?,
        lon: number(LNG)?,
        heading: number(HEADING)?,
        valid_position: flag(VALID_POSITION)?,
        valid_heading: flag(VALID_HEADING)?,
    })
}

fn append(value: &mut Option<String>, text: &str) {
    value.get_or_insert_with(String::new).push_str(text);
}

fn field_text<'a>(seen: &[bool], values: &'a [Option<String>], i: usize) -> Result<&'a str> {
    if !seen[i] {
        return Err(VapixError::ParseError(format!(
            "Missing <{}> element",
            TAGS[i]
        )));
    }
    values[i]
        .as_deref()
        .map(str::trim)
        .ok_or_else(|| VapixError::ParseError(format!("Empty <{}> element", TAGS[i])))
}

#[async_trait]
pub trait Geolocation: Send + Sync {
    /// Read the position stored on the camera
    async fn get_position(&self) -> Result<GeoPosition>;

    /// Store a new position and heading with a free-form label
    async fn set_position(&self, lat: f64, lon: f64, heading: f64, text: &str) -> Result<String>;
}

#[async_trait]
impl Geolocation for VapixCam {
    async fn get_position(&self) -> Result<GeoPosition> {
        let xml = self
            .send_request_vanilla(GEOLOCATION_GET_ENDPOINT, HttpMethod::Get, vec![])
            .await?;
        tracing::debug!(response = %xml, "Geolocation response");
        parse_position(&xml)
    }

    async fn set_position(&self, lat: f64, lon: f64, heading: f64, text: &str) -> Result<String> {
        let params = vec![
            ("lat", lat.to_string()),
            ("lng", lon.to_string()),
            ("heading", heading.to_string()),
            ("text", text.to_string()),
        ];
        let response = self
            .send_request_vanilla(GEOLOCATION_SET_ENDPOINT, HttpMethod::Post, params)
            .await?;
        tracing::debug!(response = %response, "Geolocation updated");
        Ok(response)
    }
}
