//! Smart-HTTP transport (spec component D): a thin synchronous wrapper
//! around `reqwest::blocking` that sets the git protocol-v2 header and
//! hands back raw response bytes. TLS and redirects are delegated to the
//! underlying client; no retries happen at this layer.

use crate::error::{GitError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

pub struct Transport {
    client: reqwest::blocking::Client,
}

impl Transport {
    pub fn new() -> Self {
        Transport {
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn request(&self, url: &str, method: Method, body: Option<Vec<u8>>) -> Result<Vec<u8>> {
        log::debug!("{method:?} {url}");

        let builder = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };

        let request = builder.header("git-protocol", "version=2");
        let request = match body {
            Some(body) => request.body(body),
            None => request,
        };

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(GitError::TransportError(format!(
                "{url} returned status {status}"
            )));
        }

        Ok(response.bytes()?.to_vec())
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}
