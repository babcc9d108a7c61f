//! Proxy resolution
//!
//! Turns a [`ProxyConfig`](crate::config::ProxyConfig) into a [`Matcher`]
//! the connector consults per destination. System mode reads the
//! conventional `HTTP_PROXY`, `HTTPS_PROXY` and `NO_PROXY` variables
//! (upper- and lowercase), with `NO_PROXY` supporting `*`, IPs, CIDR
//! blocks and domain suffixes.

use std::env;
use std::net::IpAddr;

use base64::prelude::{Engine, BASE64_STANDARD};
use http::header::HeaderValue;
use http::Uri;
use url::Url;

use crate::config::ProxyConfig;
use crate::error::{self, Error};

/// Where a destination's traffic should be routed.
#[derive(Debug, Clone)]
pub(crate) struct Intercept {
    /// The proxy endpoint.
    pub(crate) uri: Uri,
    /// `Basic` credentials from the proxy URL's userinfo, pre-encoded.
    pub(crate) basic_auth: Option<HeaderValue>,
}

/// Destination → proxy decision table.
#[derive(Debug, Default)]
pub(crate) struct Matcher {
    http: Option<Intercept>,
    https: Option<Intercept>,
    no_proxy: NoProxy,
}

impl Matcher {
    /// Build from config. `Direct` yields a matcher that never intercepts.
    pub(crate) fn from_config(cfg: &ProxyConfig) -> Result<Matcher, Error> {
        match cfg {
            ProxyConfig::Direct => Ok(Matcher::default()),
            ProxyConfig::Url(url) => {
                let intercept = parse_proxy_url(url.as_str())?;
                Ok(Matcher {
                    http: Some(intercept.clone()),
                    https: Some(intercept),
                    no_proxy: NoProxy::default(),
                })
            }
            ProxyConfig::System => Ok(Matcher::from_env()),
        }
    }

    fn from_env() -> Matcher {
        let http = env_var("HTTP_PROXY").and_then(|raw| parse_proxy_url(&raw).ok());
        let https = env_var("HTTPS_PROXY").and_then(|raw| parse_proxy_url(&raw).ok());
        let no_proxy = env_var("NO_PROXY")
            .map(|raw| NoProxy::parse(&raw))
            .unwrap_or_default();
        Matcher {
            http,
            https,
            no_proxy,
        }
    }

    /// The proxy to use for `url`, or `None` for a direct connection.
    pub(crate) fn intercept(&self, url: &Url) -> Option<&Intercept> {
        self.intercept_parts(url.scheme(), url.host_str()?)
    }

    /// Same decision from pre-split scheme and host, for callers holding
    /// an `http::Uri`.
    pub(crate) fn intercept_parts(&self, scheme: &str, host: &str) -> Option<&Intercept> {
        if self.no_proxy.matches(host) {
            return None;
        }
        match scheme {
            "http" => self.http.as_ref(),
            "https" => self.https.as_ref(),
            _ => None,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .or_else(|_| env::var(name.to_ascii_lowercase()))
        .ok()
        .filter(|value| !value.is_empty())
}

fn parse_proxy_url(raw: &str) -> Result<Intercept, Error> {
    // Scheme-less values like "proxy.example:3128" are common in env vars.
    let raw = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("http://{raw}")
    };
    let url = Url::parse(&raw).map_err(error::builder)?;
    let host = url
        .host_str()
        .ok_or_else(|| error::builder("proxy url has no host"))?;
    let port = url.port_or_known_default().unwrap_or(80);
    let uri = format!("{}://{host}:{port}", url.scheme())
        .parse::<Uri>()
        .map_err(error::builder)?;
    let basic_auth = if url.username().is_empty() && url.password().is_none() {
        None
    } else {
        let credentials = format!("{}:{}", url.username(), url.password().unwrap_or(""));
        let encoded = format!("Basic {}", BASE64_STANDARD.encode(credentials));
        let mut value = HeaderValue::from_str(&encoded).map_err(error::builder)?;
        value.set_sensitive(true);
        Some(value)
    };
    Ok(Intercept { uri, basic_auth })
}

/// Parsed `NO_PROXY` rules.
#[derive(Debug, Default)]
struct NoProxy {
    all: bool,
    ips: Vec<IpAddr>,
    cidrs: Vec<(IpAddr, u8)>,
    suffixes: Vec<String>,
}

impl NoProxy {
    fn parse(raw: &str) -> NoProxy {
        let mut rules = NoProxy::default();
        for entry in raw.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            if entry == "*" {
                rules.all = true;
            } else if let Some((network, prefix)) = entry.split_once('/') {
                if let (Ok(ip), Ok(prefix)) = (network.parse::<IpAddr>(), prefix.parse::<u8>()) {
                    rules.cidrs.push((ip, prefix));
                }
            } else if let Ok(ip) = entry.parse::<IpAddr>() {
                rules.ips.push(ip);
            } else {
                rules
                    .suffixes
                    .push(entry.trim_start_matches('.').to_ascii_lowercase());
            }
        }
        rules
    }

    fn matches(&self, host: &str) -> bool {
        if self.all {
            return true;
        }
        if let Ok(ip) = host.trim_matches(['[', ']']).parse::<IpAddr>() {
            if self.ips.contains(&ip) {
                return true;
            }
            return self
                .cidrs
                .iter()
                .any(|&(network, prefix)| cidr_contains(network, prefix, ip));
        }
        let host = host.to_ascii_lowercase();
        self.suffixes.iter().any(|suffix| {
            host == *suffix || host.ends_with(&format!(".{suffix}"))
        })
    }
}

fn cidr_contains(network: IpAddr, prefix: u8, ip: IpAddr) -> bool {
    match (network, ip) {
        (IpAddr::V4(network), IpAddr::V4(ip)) => {
            let prefix = u32::from(prefix.min(32));
            if prefix == 0 {
                return true;
            }
            let mask = u32::MAX << (32 - prefix);
            u32::from(network) & mask == u32::from(ip) & mask
        }
        (IpAddr::V6(network), IpAddr::V6(ip)) => {
            let prefix = u32::from(prefix.min(128));
            if prefix == 0 {
                return true;
            }
            let mask = u128::MAX << (128 - prefix);
            u128::from(network) & mask == u128::from(ip) & mask
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_url_intercepts_both_schemes() {
        let cfg = ProxyConfig::Url(Url::parse("http://proxy.internal:3128").unwrap());
        let matcher = Matcher::from_config(&cfg).unwrap();
        let http = Url::parse("http://example.com/").unwrap();
        let https = Url::parse("https://example.com/").unwrap();
        assert_eq!(
            matcher.intercept(&http).unwrap().uri.to_string(),
            "http://proxy.internal:3128/"
        );
        assert!(matcher.intercept(&https).is_some());
    }

    #[test]
    fn direct_never_intercepts() {
        let matcher = Matcher::from_config(&ProxyConfig::Direct).unwrap();
        let url = Url::parse("http://example.com/").unwrap();
        assert!(matcher.intercept(&url).is_none());
    }

    #[test]
    fn proxy_credentials_become_basic_auth() {
        let intercept = parse_proxy_url("http://user:pw@proxy:8080").unwrap();
        let auth = intercept.basic_auth.unwrap();
        assert_eq!(auth.to_str().unwrap(), "Basic dXNlcjpwdw==");
    }

    #[test]
    fn no_proxy_rules() {
        let rules = NoProxy::parse("localhost, .internal.corp, 10.0.0.0/8, 192.168.1.5");
        assert!(rules.matches("localhost"));
        assert!(rules.matches("svc.internal.corp"));
        assert!(rules.matches("internal.corp"));
        assert!(rules.matches("10.20.30.40"));
        assert!(rules.matches("192.168.1.5"));
        assert!(!rules.matches("192.168.1.6"));
        assert!(!rules.matches("example.com"));

        assert!(NoProxy::parse("*").matches("anything.example"));
    }
}
