// src/core/net.rs
// Blocking page fetch. Status classification is left to the caller.

use std::time::Duration;

use reqwest::blocking::Client;

/// A fetched page: HTTP status plus body text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_ok(&self) -> bool { self.status == 200 }
}

/// Anything that can GET a page. Transport failures are returned as strings;
/// callers treat them the same as a non-200 status.
pub trait SourceClient {
    fn get(&self, url: &str) -> Result<Page, String>;
}

pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl SourceClient for HttpSource {
    fn get(&self, url: &str) -> Result<Page, String> {
        let resp = self.client.get(url).send().map_err(|e| e.to_string())?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| e.to_string())?;
        Ok(Page { status, body })
    }
}
