use std::time::Duration;

/// Result of probing one url. Unreachable urls are data, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkProbe {
    pub reachable: bool,
    pub http_status: Option<u16>,
}

impl LinkProbe {
    pub fn from_status(status: u16) -> Self {
        Self {
            reachable: (200..400).contains(&status),
            http_status: Some(status),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            http_status: None,
        }
    }
}

pub trait LinkVerifier: Send + Sync {
    fn check(&self, url: &str) -> LinkProbe;
}

#[derive(Debug, Clone)]
pub struct HttpLinkVerifier {
    agent: ureq::Agent,
}

impl HttpLinkVerifier {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout(timeout)
                .redirects(5)
                .build(),
        }
    }

    fn probe(&self, method: &str, url: &str) -> Result<u16, ureq::Error> {
        self.agent.request(method, url).call().map(|r| r.status())
    }
}

impl LinkVerifier for HttpLinkVerifier {
    fn check(&self, url: &str) -> LinkProbe {
        if !is_http_url(url) {
            return LinkProbe::unreachable();
        }
        // Some hosts refuse HEAD; fall back to GET before calling the link broken.
        let status = match self.probe("HEAD", url) {
            Ok(status) => Some(status),
            Err(ureq::Error::Status(405 | 501, _)) => match self.probe("GET", url) {
                Ok(status) => Some(status),
                Err(ureq::Error::Status(status, _)) => Some(status),
                Err(ureq::Error::Transport(_)) => None,
            },
            Err(ureq::Error::Status(status, _)) => Some(status),
            Err(ureq::Error::Transport(_)) => None,
        };
        status
            .map(LinkProbe::from_status)
            .unwrap_or_else(LinkProbe::unreachable)
    }
}

fn is_http_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty() && !rest.contains(char::is_whitespace))
}
