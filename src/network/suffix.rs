use std::fmt;
use serde::{Deserialize, Serialize};

/// Hostname split around its public suffix.
///
/// For `www.example.co.uk`: subdomain `www`, domain `example`,
/// fld `example.co.uk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainParts {
    pub domain: String,
    pub subdomain: String,
    pub fld: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    Empty,
    UnknownSuffix,
    /// The hostname is itself a public suffix, e.g. `co.uk`.
    NoRegistrableDomain,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::Empty => write!(f, "empty hostname"),
            UnresolvedReason::UnknownSuffix => write!(f, "no matching public suffix"),
            UnresolvedReason::NoRegistrableDomain => write!(f, "no registrable domain below the suffix"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(DomainParts),
    Unresolved(UnresolvedReason),
}

/// Resolves a hostname against the public suffix list.
pub fn resolve(hostname: &str) -> Resolution {
    let name = hostname.trim().trim_end_matches('.').to_lowercase();
    if name.is_empty() {
        return Resolution::Unresolved(UnresolvedReason::Empty);
    }

    match psl::suffix(name.as_bytes()) {
        Some(suffix) if suffix.is_known() => {}
        _ => return Resolution::Unresolved(UnresolvedReason::UnknownSuffix),
    }

    let fld = match psl::domain(name.as_bytes()).and_then(|d| std::str::from_utf8(d.as_bytes()).ok()) {
        Some(fld) => fld.to_string(),
        None => return Resolution::Unresolved(UnresolvedReason::NoRegistrableDomain),
    };

    // Registrable domain is always a trailing slice of the name
    let domain = fld.split_once('.').map_or(fld.as_str(), |(label, _)| label).to_string();
    let subdomain = name
        .strip_suffix(fld.as_str())
        .map(|rest| rest.trim_end_matches('.'))
        .unwrap_or("")
        .to_string();

    Resolution::Resolved(DomainParts { domain, subdomain, fld })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(hostname: &str) -> DomainParts {
        match resolve(hostname) {
            Resolution::Resolved(parts) => parts,
            other => panic!("{} did not resolve: {:?}", hostname, other),
        }
    }

    #[test]
    fn test_multi_label_suffix() {
        let parts = parts("www.example.co.uk");
        assert_eq!(parts.domain, "example");
        assert_eq!(parts.subdomain, "www");
        assert_eq!(parts.fld, "example.co.uk");
    }

    #[test]
    fn test_bare_registrable_domain() {
        let parts = parts("github.com");
        assert_eq!(parts.domain, "github");
        assert_eq!(parts.subdomain, "");
        assert_eq!(parts.fld, "github.com");
    }

    #[test]
    fn test_nested_subdomain() {
        let parts = parts("a.b.cdn.example.com");
        assert_eq!(parts.domain, "example");
        assert_eq!(parts.subdomain, "a.b.cdn");
        assert_eq!(parts.fld, "example.com");
    }

    #[test]
    fn test_trailing_dot_and_case() {
        let parts = parts("WWW.Example.COM.");
        assert_eq!(parts.fld, "example.com");
        assert_eq!(parts.subdomain, "www");
    }

    #[test]
    fn test_unresolved_hostnames() {
        assert_eq!(resolve(""), Resolution::Unresolved(UnresolvedReason::Empty));
        assert_eq!(resolve("localhost"), Resolution::Unresolved(UnresolvedReason::UnknownSuffix));
        assert_eq!(resolve("printer.lan-internal-zzz"), Resolution::Unresolved(UnresolvedReason::UnknownSuffix));
        assert_eq!(resolve("co.uk"), Resolution::Unresolved(UnresolvedReason::NoRegistrableDomain));
    }
}
