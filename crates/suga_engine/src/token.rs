//! Symbolic references inside blueprint properties.
//!
//! A reference is a string that is exactly `${<source>.<path>}`, for example
//! `${infra.network.vpc_id}` or `${self.memory}`. Anything else, including
//! strings that merely contain a reference, is a literal.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Where a reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// An infra resource declared by the platform
    Infra,
    /// A variable declared for the module being resolved
    SelfRef,
    /// A platform variable
    Var,
    /// Any other source; left for the code generator
    Other(String),
}

impl TokenSource {
    fn parse(source: &str) -> Self {
        match source {
            "infra" => TokenSource::Infra,
            "self" => TokenSource::SelfRef,
            "var" => TokenSource::Var,
            other => TokenSource::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TokenSource::Infra => "infra",
            TokenSource::SelfRef => "self",
            TokenSource::Var => "var",
            TokenSource::Other(source) => source,
        }
    }
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `${source.path}` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecReference {
    pub source: TokenSource,
    /// At least one segment
    pub path: Vec<String>,
}

impl SpecReference {
    /// Parse a token, returning `None` for literals.
    pub fn parse(token: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"^\$\{([^}]+)\}$").expect("token pattern is valid")
        });

        let contents = re.captures(token)?.get(1)?.as_str();
        let mut parts = contents.split('.').map(|p| p.trim().to_string());
        let source = parts.next()?;
        let path: Vec<String> = parts.collect();
        if path.is_empty() || path.iter().any(|p| p.is_empty()) {
            return None;
        }

        Some(Self {
            source: TokenSource::parse(&source),
            path,
        })
    }

    /// The first path segment: an infra resource or variable name.
    pub fn name(&self) -> &str {
        &self.path[0]
    }

    /// Path segments after the name, joined with dots.
    pub fn property(&self) -> Option<String> {
        if self.path.len() > 1 {
            Some(self.path[1..].join("."))
        } else {
            None
        }
    }
}

impl fmt::Display for SpecReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}}}", self.source, self.path.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sources() {
        let infra = SpecReference::parse("${infra.network.vpc_id}").unwrap();
        assert_eq!(infra.source, TokenSource::Infra);
        assert_eq!(infra.name(), "network");
        assert_eq!(infra.property().as_deref(), Some("vpc_id"));

        let own = SpecReference::parse("${self.memory}").unwrap();
        assert_eq!(own.source, TokenSource::SelfRef);
        assert_eq!(own.property(), None);

        let var = SpecReference::parse("${var.region}").unwrap();
        assert_eq!(var.source, TokenSource::Var);

        let other = SpecReference::parse("${data.aws_region.name}").unwrap();
        assert_eq!(other.source, TokenSource::Other("data".to_string()));
    }

    #[test]
    fn test_literals() {
        for literal in [
            "plain",
            "${infra}",
            "prefix-${var.region}",
            "${var.region}-suffix",
            "${var..x}",
            "",
        ] {
            assert!(SpecReference::parse(literal).is_none(), "{}", literal);
        }
    }

    #[test]
    fn test_display() {
        let token = "${infra.network.subnets.private}";
        let reference = SpecReference::parse(token).unwrap();
        assert_eq!(reference.to_string(), token);
        assert_eq!(reference.property().as_deref(), Some("subnets.private"));
    }
}
