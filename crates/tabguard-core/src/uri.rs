//! URL, scheme, and domain helpers.

use std::net::IpAddr;

use url::Url;

/// Returns the lowercase scheme of `url`, or `""` if it cannot be parsed.
pub fn scheme_from_url(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.scheme().to_string())
        .unwrap_or_default()
}

/// Returns the hostname of `url`, or `""` if it has none.
pub fn hostname_from_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Returns true for schemes that carry traffic over a secure transport.
pub fn is_secure_scheme(scheme: &str) -> bool {
    matches!(scheme, "https" | "wss")
}

/// Returns true for the HTTP family of schemes the pipeline enforces on.
pub fn is_network_scheme(scheme: &str) -> bool {
    scheme.starts_with("http")
}

/// Returns the registrable domain (eTLD+1) of `hostname`.
///
/// IP literals and names the public suffix list cannot split are returned as-is.
pub fn domain_from_hostname(hostname: &str) -> &str {
    let bare = hostname.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return hostname;
    }
    psl::domain_str(hostname).unwrap_or(hostname)
}

/// Returns the registrable domain of the host in `url`.
pub fn domain_from_url(url: &str) -> String {
    let hostname = hostname_from_url(url);
    domain_from_hostname(&hostname).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_is_lowercased() {
        assert_eq!(scheme_from_url("HTTPS://Example.com/"), "https");
        assert_eq!(scheme_from_url("filesystem:http://a.test/temporary/x"), "filesystem");
        assert_eq!(scheme_from_url("not a url"), "");
    }

    #[test]
    fn hostname_extraction() {
        assert_eq!(hostname_from_url("http://Shop.Example.com:8080/cart?x=1"), "shop.example.com");
        assert_eq!(hostname_from_url("about:blank"), "");
    }

    #[test]
    fn secure_and_network_schemes() {
        assert!(is_secure_scheme("https"));
        assert!(is_secure_scheme("wss"));
        assert!(!is_secure_scheme("http"));
        assert!(is_network_scheme("http"));
        assert!(is_network_scheme("https"));
        assert!(!is_network_scheme("chrome-extension"));
        assert!(!is_network_scheme("data"));
    }

    #[test]
    fn registrable_domains() {
        assert_eq!(domain_from_hostname("shop.example.com"), "example.com");
        assert_eq!(domain_from_hostname("www.bbc.co.uk"), "bbc.co.uk");
        assert_eq!(domain_from_hostname("example.com"), "example.com");
    }

    #[test]
    fn ip_hosts_are_their_own_domain() {
        assert_eq!(domain_from_hostname("192.168.1.10"), "192.168.1.10");
        assert_eq!(domain_from_hostname("[::1]"), "[::1]");
    }

    #[test]
    fn unsplittable_names_fall_back_to_hostname() {
        assert_eq!(domain_from_hostname("localhost"), "localhost");
    }

    #[test]
    fn domain_from_url_uses_host() {
        assert_eq!(domain_from_url("https://www.example.com/cart"), "example.com");
        assert_eq!(domain_from_url("garbage"), "");
    }
}
