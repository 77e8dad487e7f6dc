//! Codec operations
//!
//! Encodes canonical paths into tokens and decodes tokens into (root name, suffix).

use log::debug;
use std::path::Path;
use std::sync::Arc;

use crate::codec::token::Token;
use crate::error::{BrokerError, BrokerResult};
use crate::roots::RootRegistry;
use crate::storage::{canonicalize_lenient, relative_suffix, strip_root};

/// Result of decoding a token against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    pub root_name: String,
    pub relative_suffix: String,
}

/// Stateless transform over a shared root table.
#[derive(Debug, Clone)]
pub struct UriCodec {
    registry: Arc<RootRegistry>,
    scheme: String,
    authority: String,
}

impl UriCodec {
    pub fn new(registry: Arc<RootRegistry>, scheme: &str, authority: &str) -> Self {
        Self {
            registry,
            scheme: scheme.to_string(),
            authority: authority.to_string(),
        }
    }

    pub fn registry(&self) -> &RootRegistry {
        &self.registry
    }

    /// Encodes `real_path` under the first root that contains it.
    ///
    /// Paths outside every specific root fall back to the catch-all, whose
    /// suffix is the full absolute path.
    pub fn encode(&self, real_path: &Path) -> BrokerResult<Token> {
        let canonical = canonicalize_lenient(real_path)?;

        for root in self.registry.roots().iter().filter(|r| !r.is_catch_all()) {
            if let Some(rest) = strip_root(&canonical, root.canonical_path()) {
                let suffix = relative_suffix(rest).ok_or_else(|| {
                    BrokerError::InvalidArgument(format!(
                        "Path is not valid UTF-8: {}",
                        canonical.display()
                    ))
                })?;
                debug!("Encoding {} under root '{}'", canonical.display(), root.name());
                return Ok(Token::new(&self.scheme, &self.authority, root.name(), &suffix));
            }
        }

        let catch_all = self.registry.catch_all().ok_or_else(|| {
            BrokerError::AccessDenied(format!(
                "{} is outside every registered root",
                canonical.display()
            ))
        })?;
        let full = canonical.to_str().ok_or_else(|| {
            BrokerError::InvalidArgument(format!(
                "Path is not valid UTF-8: {}",
                canonical.display()
            ))
        })?;
        debug!("Encoding {} under catch-all root", full);
        Ok(Token::new(&self.scheme, &self.authority, catch_all.name(), full))
    }

    /// Decodes a token string, rejecting foreign addresses and unknown roots.
    pub fn decode(&self, raw: &str) -> BrokerResult<DecodedToken> {
        let token = Token::parse(raw)?;
        self.decode_token(&token)
    }

    pub fn decode_token(&self, token: &Token) -> BrokerResult<DecodedToken> {
        if token.scheme() != self.scheme || token.authority() != self.authority {
            return Err(BrokerError::MalformedToken(format!(
                "Token is not addressed to {}://{}: {}",
                self.scheme, self.authority, token
            )));
        }
        if self.registry.get(token.root_name()).is_none() {
            return Err(BrokerError::MalformedToken(format!(
                "Unknown root '{}'",
                token.root_name()
            )));
        }

        Ok(DecodedToken {
            root_name: token.root_name().to_string(),
            relative_suffix: token.relative_suffix()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roots::StorageRoot;

    fn scenario_codec() -> UriCodec {
        let registry = RootRegistry::new(vec![
            StorageRoot::new("files", "/data/app/files"),
            StorageRoot::new("cache", "/data/app/cache"),
            StorageRoot::catch_all("root"),
        ])
        .unwrap();
        UriCodec::new(Arc::new(registry), "scheme", "authority")
    }

    #[test]
    fn test_encode_under_specific_root() {
        let token = scenario_codec()
            .encode(Path::new("/data/app/files/sub/a.apk"))
            .unwrap();
        assert_eq!(token.to_string(), "scheme://authority/files/sub%2Fa.apk");
    }

    #[test]
    fn test_encode_sibling_with_shared_prefix_uses_catch_all() {
        let token = scenario_codec()
            .encode(Path::new("/data/app/files2/x"))
            .unwrap();
        assert_eq!(token.root_name(), "root");
        assert_eq!(token.relative_suffix().unwrap(), "/data/app/files2/x");
    }

    #[test]
    fn test_encode_canonicalizes_dot_segments() {
        let token = scenario_codec()
            .encode(Path::new("/data/app/cache/./tmp/../b.bin"))
            .unwrap();
        assert_eq!(token.to_string(), "scheme://authority/cache/b.bin");
    }

    #[test]
    fn test_decode_inverts_encode() {
        let codec = scenario_codec();
        let token = codec.encode(Path::new("/data/app/files/sub/a.apk")).unwrap();
        let decoded = codec.decode(&token.to_string()).unwrap();
        assert_eq!(
            decoded,
            DecodedToken {
                root_name: "files".into(),
                relative_suffix: "sub/a.apk".into(),
            }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_root_and_foreign_authority() {
        let codec = scenario_codec();
        assert!(matches!(
            codec.decode("scheme://authority/media/a.png"),
            Err(BrokerError::MalformedToken(_))
        ));
        assert!(matches!(
            codec.decode("scheme://elsewhere/files/a.png"),
            Err(BrokerError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_encode_without_catch_all_denies_outside_paths() {
        let registry =
            RootRegistry::new(vec![StorageRoot::new("files", "/data/app/files")]).unwrap();
        let codec = UriCodec::new(Arc::new(registry), "scheme", "authority");
        assert!(matches!(
            codec.encode(Path::new("/etc/passwd")),
            Err(BrokerError::AccessDenied(_))
        ));
    }
}
