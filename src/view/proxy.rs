use crate::config::Settings;

/// Storage hosts whose URLs the browser cannot fetch directly.
pub const PROXIED_HOST_SUFFIXES: [&str; 4] = [
    ".amazonaws.com",
    ".r2.cloudflarestorage.com",
    ".storage.googleapis.com",
    ".blob.core.windows.net",
];

/// Rewrites cloud-storage artifact URLs to go through the console's
/// artifact proxy route. Relative URLs and other hosts pass through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactUrlProxy {
    route: Option<String>,
}

impl ArtifactUrlProxy {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: Some(route.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { route: None }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        match settings.artifact_proxy_path() {
            Some(route) => Self::new(route),
            None => Self::disabled(),
        }
    }

    pub fn rewrite(&self, url: &str) -> String {
        let Some(route) = &self.route else {
            return url.to_string();
        };
        if url.starts_with('/') {
            return url.to_string();
        }
        match host_of(url) {
            Some(host)
                if PROXIED_HOST_SUFFIXES
                    .iter()
                    .any(|suffix| host.ends_with(suffix)) =>
            {
                format!("{route}?url={}", urlencoding::encode(url))
            }
            _ => url.to_string(),
        }
    }
}

impl Default for ArtifactUrlProxy {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ARTIFACT_PROXY_PATH)
    }
}

fn host_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    if scheme.is_empty() || !scheme.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '+') {
        return None;
    }
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = match host_port.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|ch| ch.is_ascii_digit()) => host,
        _ => host_port,
    };
    if host.is_empty() {
        return None;
    }
    Some(host.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_hosts_are_proxied() {
        let proxy = ArtifactUrlProxy::default();
        assert_eq!(
            proxy.rewrite("https://bucket.s3.amazonaws.com/a b.png?X-Sig=1"),
            "/api/artifact-proxy?url=https%3A%2F%2Fbucket.s3.amazonaws.com%2Fa%20b.png%3FX-Sig%3D1"
        );
        assert!(proxy
            .rewrite("https://acct.blob.core.windows.net:443/c/x.webm")
            .starts_with("/api/artifact-proxy?url="));
    }

    #[test]
    fn relative_foreign_and_invalid_urls_pass_through() {
        let proxy = ArtifactUrlProxy::default();
        for url in [
            "/local/shot.png",
            "https://cdn.example.com/shot.png",
            "not a url",
            "https://amazonaws.com.evil.test/x",
        ] {
            assert_eq!(proxy.rewrite(url), url);
        }
    }

    #[test]
    fn disabled_proxy_is_identity() {
        let url = "https://bucket.s3.amazonaws.com/x.png";
        assert_eq!(ArtifactUrlProxy::disabled().rewrite(url), url);
    }
}
