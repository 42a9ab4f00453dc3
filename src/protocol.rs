use crate::constants::{DEFAULT_CAMERA, DEFAULT_HTML};
use crate::error::{Result, VapixError};

/// Ordered CGI parameters, sent as a query string or a form body.
pub type Params = Vec<(&'static str, String)>;

pub fn default_params(timestamp: i64) -> Params {
    vec![
        ("camera", DEFAULT_CAMERA.to_string()),
        ("html", DEFAULT_HTML.to_string()),
        ("timestamp", timestamp.to_string()),
    ]
}

/// Overlays `extra` on `base`: existing keys keep their position and take the
/// new value, unknown keys are appended in order.
pub fn merge_params(mut base: Params, extra: Params) -> Params {
    for (key, value) in extra {
        match base.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => base.push((key, value)),
        }
    }
    base
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Md5,
    Md5Sess,
}

/// A parsed `WWW-Authenticate: Digest ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub opaque: Option<String>,
    pub algorithm: DigestAlgorithm,
    /// `true` when the server offered `qop=auth`.
    pub qop_auth: bool,
}

/// Splits a `WWW-Authenticate` value into its Digest parameters, or `None`
/// for any other scheme.
fn digest_params(header: &str) -> Option<&str> {
    let header = header.trim();
    let (scheme, rest) = header
        .split_once(char::is_whitespace)
        .unwrap_or((header, ""));
    scheme.eq_ignore_ascii_case("digest").then_some(rest)
}

pub fn is_digest_challenge(header: &str) -> bool {
    digest_params(header).is_some()
}

impl DigestChallenge {
    pub fn parse(header: &str) -> Result<Self> {
        let rest = digest_params(header).ok_or_else(|| {
            VapixError::AuthenticationError(format!(
                "Unsupported authentication scheme: {}",
                header.trim()
            ))
        })?;

        let mut realm = None;
        let mut nonce = None;
        let mut opaque = None;
        let mut algorithm = DigestAlgorithm::Md5;
        let mut qop = None;

        for (key, value) in split_auth_params(rest) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "nonce" => nonce = Some(value),
                "opaque" => opaque = Some(value),
                "qop" => qop = Some(value),
                "algorithm" => {
                    algorithm = match value.to_ascii_uppercase().as_str() {
                        "MD5" => DigestAlgorithm::Md5,
                        "MD5-SESS" => DigestAlgorithm::Md5Sess,
                        other => {
                            return Err(VapixError::AuthenticationError(format!(
                                "Unsupported digest algorithm: {}",
                                other
                            )));
                        }
                    }
                }
                _ => {}
            }
        }

        let qop_auth = match qop {
            None => false,
            Some(qop) if qop.split(',').any(|q| q.trim().eq_ignore_ascii_case("auth")) => true,
            Some(qop) => {
                return Err(VapixError::AuthenticationError(format!(
                    "Unsupported digest qop: {}",
                    qop
                )));
            }
        };

        Ok(Self {
            realm: realm.ok_or_else(|| {
                VapixError::AuthenticationError("Digest challenge without realm".to_string())
            })?,
            nonce: nonce.ok_or_else(|| {
                VapixError::AuthenticationError("Digest challenge without nonce".to_string())
            })?,
            opaque,
            algorithm,
            qop_auth,
        })
    }

    /// Builds the `Authorization` header value for one request.
    pub fn authorization(
        &self,
        username: &str,
        password: &str,
        method: &str,
        uri: &str,
        nonce_count: u32,
        cnonce: &str,
    ) -> String {
        let nc = format!("{:08x}", nonce_count);

        let mut ha1 = hex_md5(&[username, &self.realm, password]);
        if self.algorithm == DigestAlgorithm::Md5Sess {
            ha1 = hex_md5(&[&ha1, &self.nonce, cnonce]);
        }
        let ha2 = hex_md5(&[method, uri]);

        let response = if self.qop_auth {
            hex_md5(&[&ha1, &self.nonce, &nc, cnonce, "auth", &ha2])
        } else {
            hex_md5(&[&ha1, &self.nonce, &ha2])
        };

        let mut header = format!(
            r#"Digest username="{}", realm="{}", nonce="{}", uri="{}", response="{}""#,
            username, self.realm, self.nonce, uri, response
        );
        if let Some(opaque) = &self.opaque {
            header.push_str(&format!(r#", opaque="{}""#, opaque));
        }
        header.push_str(match self.algorithm {
            DigestAlgorithm::Md5 => ", algorithm=MD5",
            DigestAlgorithm::Md5Sess => ", algorithm=MD5-sess",
        });
        if self.qop_auth {
            header.push_str(&format!(r#", qop=auth, nc={}, cnonce="{}""#, nc, cnonce));
        }
        header
    }
}

pub fn new_cnonce() -> String {
    format!("{:016x}", rand::random::<u64>())
}

fn hex_md5(parts: &[&str]) -> String {
    format!("{:x}", md5::compute(parts.join(":").as_bytes()))
}

fn split_auth_params(input: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if *c == ',' || c.is_whitespace()) {
            chars.next();
        }

        let mut key = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c == ',' {
                break;
            }
            key.push(c);
            chars.next();
        }
        if key.is_empty() {
            break;
        }

        let mut value = String::new();
        if chars.peek() == Some(&'=') {
            chars.next();
            if chars.peek() == Some(&'"') {
                chars.next();
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                value.push(escaped);
                            }
                        }
                        '"' => break,
                        _ => value.push(c),
                    }
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c == ',' {
                        break;
                    }
                    value.push(c);
                    chars.next();
                }
            }
        }

        params.push((key.trim().to_string(), value.trim().to_string()));
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    const RFC_CHALLENGE: &str = r#"Digest realm="testrealm@host.com", qop="auth,auth-int", nonce="dcd98b7102dd2f0e8b11d0f600bfb0c093", opaque="5ccc069c403ebaf9f0171e9517f40e41""#;

    #[test]
    fn parses_rfc_challenge() {
        let challenge = DigestChallenge::parse(RFC_CHALLENGE).unwrap();
        assert_eq!(challenge.realm, "testrealm@host.com");
        assert_eq!(challenge.nonce, "dcd98b7102dd2f0e8b11d0f600bfb0c093");
        assert_eq!(
            challenge.opaque.as_deref(),
            Some("5ccc069c403ebaf9f0171e9517f40e41")
        );
        assert_eq!(challenge.algorithm, DigestAlgorithm::Md5);
        assert!(challenge.qop_auth);
    }

    #[test]
    fn computes_rfc_response() {
        let challenge = DigestChallenge::parse(RFC_CHALLENGE).unwrap();
        let header = challenge.authorization(
            "Mufasa",
            "Circle Of Life",
            "GET",
            "/dir/index.html",
            1,
            "0a4f113b",
        );
        assert!(header.starts_with("Digest "));
        assert!(header.contains(r#"response="6629fae49393a05397450978507c4ef1""#));
        assert!(header.contains("nc=00000001"));
        assert!(header.contains(r#"cnonce="0a4f113b""#));
        assert!(header.contains(r#"opaque="5ccc069c403ebaf9f0171e9517f40e41""#));
    }

    #[test]
    fn legacy_challenge_without_qop() {
        let challenge =
            DigestChallenge::parse(r#"Digest realm="AXIS_ACCC8E000000", nonce="abc""#).unwrap();
        assert!(!challenge.qop_auth);
        let header = challenge.authorization("root", "pass", "GET", "/", 1, "ffff");
        let expected = hex_md5(&[
            &hex_md5(&["root", "AXIS_ACCC8E000000", "pass"]),
            "abc",
            &hex_md5(&["GET", "/"]),
        ]);
        assert!(header.contains(&format!(r#"response="{}""#, expected)));
        assert!(!header.contains("qop="));
    }

    #[test]
    fn rejects_basic_and_unknown_algorithms() {
        assert!(DigestChallenge::parse(r#"Basic realm="x""#).is_err());
        assert!(
            DigestChallenge::parse(r#"Digest realm="x", nonce="y", algorithm=SHA-512-256"#)
                .is_err()
        );
        assert!(DigestChallenge::parse(r#"Digest realm="x""#).is_err());
        assert!(DigestChallenge::parse(r#"Digestfoo realm="x", nonce="y""#).is_err());
        assert!(DigestChallenge::parse("Digest").is_err());
        assert!(DigestChallenge::parse("digest\trealm=\"x\", nonce=\"y\"").is_ok());
        assert!(!is_digest_challenge(r#"Digestfoo realm="x""#));
        assert!(is_digest_challenge(r#" digest realm="x""#));
    }

    #[test]
    fn merge_overrides_in_place() {
        let merged = merge_params(
            default_params(42),
            vec![("camera", "2".to_string()), ("pan", "10".to_string())],
        );
        assert_eq!(
            merged,
            vec![
                ("camera", "2".to_string()),
                ("html", "no".to_string()),
                ("timestamp", "42".to_string()),
                ("pan", "10".to_string()),
            ]
        );
    }
}
