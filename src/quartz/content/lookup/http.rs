use std::io::Read;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::quartz::content::error::Result;
use crate::quartz::content::lookup::Throttle;

const MAX_RESPONSE_BYTES: u64 = 10 * 1024 * 1024; // 10 MB

/// Blocking HTTP client shared by the lookup providers: one user agent, one
/// timeout, and a fixed pause between requests.
#[derive(Debug)]
pub struct HttpClient {
    agent: ureq::Agent,
    throttle: Throttle,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration, pause: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(user_agent)
            .timeout(timeout)
            .build();
        Self {
            agent,
            throttle: Throttle::new(pause),
        }
    }

    /// GETs `url` with the given query pairs and decodes a JSON body.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        self.throttle.wait();
        let mut request = self.agent.get(url);
        for (name, value) in query {
            request = request.query(name, value);
        }
        let response = request.call()?;
        let body = read_limited(response)?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// GETs `url` and returns the raw body.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.throttle.wait();
        let response = self.agent.get(url).call()?;
        read_limited(response)
    }
}

fn read_limited(response: ureq::Response) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    response
        .into_reader()
        .take(MAX_RESPONSE_BYTES)
        .read_to_end(&mut body)?;
    Ok(body)
}
