use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use std::fmt;

/// Operating system family derived from the User-Agent header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Os {
    #[serde(rename = "Windows")]
    Windows,
    #[serde(rename = "macOS")]
    MacOS,
    #[serde(rename = "iOS")]
    IOS,
    #[serde(rename = "Android")]
    Android,
    #[serde(rename = "ChromeOS")]
    ChromeOS,
    #[serde(rename = "Linux")]
    Linux,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Os {
    pub fn from_user_agent(user_agent: &str) -> Self {
        // Order matters: iOS agents claim "like Mac OS X", Android and ChromeOS claim Linux
        if user_agent.contains("Windows") {
            Os::Windows
        } else if ["iPhone", "iPad", "iPod"].iter().any(|d| user_agent.contains(d)) {
            Os::IOS
        } else if user_agent.contains("Android") {
            Os::Android
        } else if user_agent.contains("CrOS") {
            Os::ChromeOS
        } else if user_agent.contains("Macintosh") || user_agent.contains("Mac OS X") {
            Os::MacOS
        } else if user_agent.contains("Linux") || user_agent.contains("X11") {
            Os::Linux
        } else {
            Os::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Windows => "Windows",
            Os::MacOS => "macOS",
            Os::IOS => "iOS",
            Os::Android => "Android",
            Os::ChromeOS => "ChromeOS",
            Os::Linux => "Linux",
            Os::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request values attached by the context stage.
///
/// Lives in the request extensions, so it is dropped with the request and never
/// shared between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub os: Os,
}

impl RequestContext {
    pub fn from_user_agent(user_agent: &str) -> Self {
        Self {
            os: Os::from_user_agent(user_agent),
        }
    }
}

/// Parse the User-Agent header and attach a RequestContext for downstream stages and handlers
pub async fn context_middleware(mut request: Request, next: Next) -> Response {
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let context = RequestContext::from_user_agent(user_agent);
    request.extensions_mut().insert(context);

    next.run(request).await
}
