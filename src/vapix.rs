use crate::constants::{CGI_PATH, DEFAULT_TIMEOUT};
use crate::error::{Result, VapixError};
use crate::protocol::{
    DigestChallenge, Params, default_params, is_digest_challenge, merge_params, new_cnonce,
};
use reqwest::header::{AUTHORIZATION, HeaderValue, WWW_AUTHENTICATE};
use reqwest::{Client, Request, Response, StatusCode};
use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

pub(crate) struct DigestSession {
    challenge: DigestChallenge,
    nonce_count: u32,
}

pub struct VapixCam {
    pub(crate) host: String,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) timeout: Duration,
    pub(crate) https: bool,
    pub(crate) user_agent: Option<String>,

    // Connection pool, present between connect() and close()
    pub(crate) client: Option<Client>,

    // Last digest challenge, answered preemptively on later requests
    pub(crate) digest: Mutex<Option<DigestSession>>,
}

impl VapixCam {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            timeout: DEFAULT_TIMEOUT,
            https: false,
            user_agent: None,
            client: None,
            digest: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_https(mut self, https: bool) -> Self {
        self.https = https;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `http://<host>/axis-cgi`
    pub fn base_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{}://{}/{}", scheme, self.host, CGI_PATH)
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url(), endpoint.trim_start_matches('/'))
    }

    /// Sends `params` merged over the default `camera`, `html` and
    /// `timestamp` fields.
    pub async fn send_request(
        &self,
        endpoint: &str,
        method: HttpMethod,
        params: Params,
    ) -> Result<String> {
        let params = merge_params(default_params(chrono::Utc::now().timestamp()), params);
        self.dispatch(endpoint, method, params).await
    }

    /// Sends `params` as given, without the default fields.
    pub async fn send_request_vanilla(
        &self,
        endpoint: &str,
        method: HttpMethod,
        params: Params,
    ) -> Result<String> {
        self.dispatch(endpoint, method, params).await
    }

    async fn dispatch(&self, endpoint: &str, method: HttpMethod, params: Params) -> Result<String> {
        let client = self.client.as_ref().ok_or(VapixError::NotConnected())?;
        let url = self.endpoint_url(endpoint);

        let span = tracing::debug_span!(
            "VAPIX request",
            endpoint,
            ?method,
            params = params.len(),
        );

        async move {
            let request = match method {
                HttpMethod::Get => client.get(&url).query(&params),
                HttpMethod::Post => client.post(&url).form(&params),
            }
            .build()?;

            let response = self.execute_with_digest(client, request).await?;
            let status = response.status();
            let body = response.text().await?;

            if !status.is_success() {
                tracing::warn!(status = status.as_u16(), "Camera rejected request");
                return Err(VapixError::HttpStatus {
                    status: status.as_u16(),
                    body,
                });
            }

            tracing::debug!(bytes = body.len(), "Received response");
            Ok(body)
        }
        .instrument(span)
        .await
    }

    async fn execute_with_digest(&self, client: &Client, mut request: Request) -> Result<Response> {
        let replay = request.try_clone();
        self.authorize(&mut request).await?;

        let response = client.execute(request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = response
            .headers()
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| is_digest_challenge(v))
            .map(DigestChallenge::parse)
            .transpose()?;
        let Some(challenge) = challenge else {
            return Ok(response);
        };

        let mut replay = replay.ok_or_else(|| {
            VapixError::AuthenticationError("Request body cannot be replayed".to_string())
        })?;

        tracing::debug!(realm = %challenge.realm, "Answering digest challenge");
        *self.digest.lock().await = Some(DigestSession {
            challenge,
            nonce_count: 0,
        });
        self.authorize(&mut replay).await?;

        let response = client.execute(replay).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            *self.digest.lock().await = None;
            return Err(VapixError::AuthenticationError(format!(
                "Camera rejected credentials for user {}",
                self.username
            )));
        }

        Ok(response)
    }

    async fn authorize(&self, request: &mut Request) -> Result<()> {
        let mut guard = self.digest.lock().await;
        let Some(session) = guard.as_mut() else {
            return Ok(());
        };
        session.nonce_count += 1;

        let url = request.url();
        let uri = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        let header = session.challenge.authorization(
            &self.username,
            &self.password,
            request.method().as_str(),
            &uri,
            session.nonce_count,
            &new_cnonce(),
        );
        let value = HeaderValue::from_str(&header).map_err(|e| {
            VapixError::AuthenticationError(format!("Invalid authorization header: {}", e))
        })?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}
