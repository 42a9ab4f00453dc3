use crate::error::{Result, VapixError};
use crate::vapix::VapixCam;
use async_trait::async_trait;
use reqwest::Client;
use tokio::time::Duration;

#[async_trait]
pub trait Connection: Send + Sync {
    /// Open the HTTP connection pool
    async fn connect(&mut self, timeout: Duration) -> Result<()>;

    /// Drop the connection pool and any cached digest challenge
    async fn close(&mut self) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Get the device host, including the port if one was given
    fn host(&self) -> &str;
}

#[async_trait]
impl Connection for VapixCam {
    async fn connect(&mut self, timeout: Duration) -> Result<()> {
        self.timeout = timeout;

        let base_url = self.base_url();
        reqwest::Url::parse(&base_url)
            .map_err(|e| VapixError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        let mut builder = Client::builder().timeout(timeout);
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        self.client = Some(builder.build()?);
        *self.digest.lock().await = None;

        tracing::debug!(host = %self.host, ?timeout, "Connection pool opened");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.client = None;
        *self.digest.lock().await = None;

        tracing::debug!(host = %self.host, "Connection pool closed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    fn host(&self) -> &str {
        &self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_and_close() {
        let mut cam = VapixCam::new("127.0.0.1:8080", "root", "pass");
        assert!(!cam.is_connected());

        cam.connect(Duration::from_secs(2)).await.unwrap();
        assert!(cam.is_connected());
        assert_eq!(cam.timeout(), Duration::from_secs(2));
        assert_eq!(Connection::host(&cam), "127.0.0.1:8080");

        cam.close().await.unwrap();
        assert!(!cam.is_connected());
    }

    #[tokio::test]
    async fn rejects_unparsable_host() {
        let mut cam = VapixCam::new("bad host", "root", "pass");
        let err = cam.connect(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, VapixError::InvalidUrl(_)));
    }
}
