//! Broker core
//!
//! Decodes the token, resolves the path, then runs exactly one filesystem
//! call sequence for the requested operation.

use log::{debug, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::broker::modes::AccessMode;
use crate::broker::request::{AccessRequest, DEFAULT_QUERY_FIELDS, Operation, QueryField};
use crate::broker::results::{BrokerResponse, OpenedFile, QueryColumn, QueryResult, QueryValue};
use crate::codec::{Token, UriCodec};
use crate::config::StartupConfig;
use crate::error::{BrokerError, BrokerResult};
use crate::mime::mime_for;
use crate::resolver::PathResolver;
use crate::roots::RootRegistry;

/// What `update` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// `update` deletes the file.
    AliasDelete,
    /// `update` is unsupported like `insert`.
    Reject,
}

/// Token-addressed file access over a fixed root table.
#[derive(Debug, Clone)]
pub struct AccessBroker {
    codec: UriCodec,
    resolver: PathResolver,
    update_policy: UpdatePolicy,
}

impl AccessBroker {
    pub fn new(registry: Arc<RootRegistry>, scheme: &str, authority: &str) -> Self {
        Self {
            codec: UriCodec::new(Arc::clone(&registry), scheme, authority),
            resolver: PathResolver::new(registry),
            update_policy: UpdatePolicy::AliasDelete,
        }
    }

    pub fn with_update_policy(mut self, policy: UpdatePolicy) -> Self {
        self.update_policy = policy;
        self
    }

    /// Builds the registry from the configured layout and wires up the broker.
    pub fn from_config(config: &StartupConfig) -> BrokerResult<Self> {
        let registry = RootRegistry::from_layout(&config.root_layout())?;
        let policy = if config.update_deletes {
            UpdatePolicy::AliasDelete
        } else {
            UpdatePolicy::Reject
        };
        Ok(Self::new(Arc::new(registry), &config.scheme, &config.authority)
            .with_update_policy(policy))
    }

    pub fn registry(&self) -> &RootRegistry {
        self.codec.registry()
    }

    /// Hands out a token for a file the owning application controls.
    pub fn encode(&self, real_path: &Path) -> BrokerResult<Token> {
        self.codec.encode(real_path)
    }

    /// Decodes and validates a token down to a real path.
    pub fn resolve(&self, token: &str) -> BrokerResult<PathBuf> {
        let decoded = self.codec.decode(token)?;
        self.resolver
            .resolve(&decoded.root_name, &decoded.relative_suffix)
    }

    /// Base name and byte length, in the requested column order.
    pub fn query(&self, token: &str, fields: Option<&[QueryField]>) -> BrokerResult<QueryResult> {
        let path = self.resolve(token)?;
        let metadata = fs::metadata(&path).map_err(|e| BrokerError::from_io(e, &path))?;
        let fields = fields.unwrap_or(&DEFAULT_QUERY_FIELDS);

        let columns = fields
            .iter()
            .map(|field| {
                let value = match field {
                    QueryField::DisplayName => QueryValue::Text(display_name(&path)),
                    QueryField::Size => QueryValue::Integer(metadata.len()),
                    QueryField::Other(_) => QueryValue::Null,
                };
                QueryColumn {
                    field: field.clone(),
                    value,
                }
            })
            .collect();

        Ok(QueryResult { columns })
    }

    /// Content type judged from the resolved base name.
    pub fn type_of(&self, token: &str) -> BrokerResult<&'static str> {
        let path = self.resolve(token)?;
        Ok(mime_for(&display_name(&path)))
    }

    /// Opens with a raw mode string. The mode is checked before the token.
    pub fn open(&self, token: &str, mode: &str) -> BrokerResult<OpenedFile> {
        let mode: AccessMode = mode.parse()?;
        self.open_with(token, mode)
    }

    pub fn open_with(&self, token: &str, mode: AccessMode) -> BrokerResult<OpenedFile> {
        let path = self.resolve(token)?;
        let file = mode
            .open_options()
            .open(&path)
            .map_err(|e| BrokerError::from_io(e, &path))?;
        let metadata = file.metadata().map_err(|e| BrokerError::from_io(e, &path))?;
        if !metadata.is_file() {
            return Err(BrokerError::InvalidArgument(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        debug!("Opened {} with mode {}", path.display(), mode);
        Ok(OpenedFile { file, path, mode })
    }

    /// Removes the file. A missing file counts 0, not an error.
    pub fn delete(&self, token: &str) -> BrokerResult<usize> {
        let path = self.resolve(token)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted {}", path.display());
                Ok(1)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(BrokerError::Io(e)),
        }
    }

    pub fn update(&self, token: &str) -> BrokerResult<usize> {
        match self.update_policy {
            UpdatePolicy::AliasDelete => self.delete(token),
            UpdatePolicy::Reject => Err(BrokerError::UnsupportedOperation(
                "No external updates".into(),
            )),
        }
    }

    pub fn insert(&self, _token: &str) -> BrokerResult<usize> {
        Err(BrokerError::UnsupportedOperation(
            "No external inserts".into(),
        ))
    }

    /// Dispatches a request to its operation.
    pub fn handle(&self, request: AccessRequest) -> BrokerResult<BrokerResponse> {
        let token = request.token.as_str();
        match request.operation {
            Operation::Query(fields) => self.query(token, fields.as_deref()).map(BrokerResponse::Row),
            Operation::TypeLookup => self.type_of(token).map(BrokerResponse::ContentType),
            Operation::Open(mode) => self.open_with(token, mode).map(BrokerResponse::Handle),
            Operation::Delete => self.delete(token).map(BrokerResponse::Count),
            Operation::Update => self.update(token).map(BrokerResponse::Count),
            Operation::Insert => self.insert(token).map(BrokerResponse::Count),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roots::StorageRoot;
    use std::io::{Read, Seek, SeekFrom, Write};

    struct Fixture {
        _dir: tempfile::TempDir,
        files: PathBuf,
        broker: AccessBroker,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let files = fs::canonicalize(dir.path()).unwrap().join("files");
        fs::create_dir(&files).unwrap();
        let registry = RootRegistry::new(vec![
            StorageRoot::new("files", files.clone()),
            StorageRoot::catch_all("root"),
        ])
        .unwrap();
        let broker = AccessBroker::new(Arc::new(registry), "content", "test.broker");
        Fixture {
            _dir: dir,
            files,
            broker,
        }
    }

    fn token_for(fx: &Fixture, name: &str) -> String {
        fx.broker.encode(&fx.files.join(name)).unwrap().to_string()
    }

    #[test]
    fn test_query_defaults_to_name_and_size() {
        let fx = fixture();
        fs::write(fx.files.join("a.apk"), b"12345").unwrap();

        let row = fx.broker.query(&token_for(&fx, "a.apk"), None).unwrap();
        assert_eq!(row.display_name(), Some("a.apk"));
        assert_eq!(row.size(), Some(5));
        assert_eq!(row.columns.len(), 2);
    }

    #[test]
    fn test_query_missing_file_is_not_found() {
        let fx = fixture();
        assert!(matches!(
            fx.broker.query(&token_for(&fx, "ghost"), None),
            Err(BrokerError::NotFound(_))
        ));
    }

    #[test]
    fn test_query_unknown_field_is_null() {
        let fx = fixture();
        fs::write(fx.files.join("a.txt"), b"x").unwrap();

        let fields = [QueryField::Other("mtime".into()), QueryField::Size];
        let row = fx.broker.query(&token_for(&fx, "a.txt"), Some(&fields)).unwrap();
        assert_eq!(row.columns[0].value, QueryValue::Null);
        assert_eq!(row.size(), Some(1));
        assert_eq!(row.display_name(), None);
    }

    #[test]
    fn test_type_of_uses_base_name() {
        let fx = fixture();
        assert_eq!(
            fx.broker.type_of(&token_for(&fx, "dir/app.apk")).unwrap(),
            "application/vnd.android.package-archive"
        );
        assert_eq!(
            fx.broker.type_of(&token_for(&fx, "blob")).unwrap(),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_open_modes_on_missing_file() {
        let fx = fixture();
        for mode in AccessMode::ALL {
            let name = format!("fresh-{}", mode);
            let result = fx.broker.open_with(&token_for(&fx, &name), mode);
            assert_eq!(result.is_ok(), mode.may_create(), "mode {mode}");
            assert_eq!(fx.files.join(&name).exists(), mode.may_create());
        }
        assert!(matches!(
            fx.broker.open(&token_for(&fx, "nope"), "r"),
            Err(BrokerError::NotFound(_))
        ));
    }

    #[test]
    fn test_truncate_append_and_preserve() {
        let fx = fixture();
        let path = fx.files.join("data.bin");
        let token = token_for(&fx, "data.bin");

        fs::write(&path, b"hello").unwrap();
        fx.broker.open(&token, "wa").unwrap().file.write_all(b"!").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello!");

        let mut rw = fx.broker.open(&token, "rw").unwrap().file;
        let mut content = String::new();
        rw.read_to_string(&mut content).unwrap();
        assert_eq!(content, "hello!");
        rw.seek(SeekFrom::Start(0)).unwrap();
        rw.write_all(b"J").unwrap();
        drop(rw);
        assert_eq!(fs::read(&path).unwrap(), b"Jello!");

        for mode in ["w", "wt", "rwt"] {
            fs::write(&path, b"content").unwrap();
            fx.broker.open(&token, mode).unwrap();
            assert_eq!(fs::metadata(&path).unwrap().len(), 0, "mode {mode}");
        }
    }

    #[test]
    fn test_open_rejects_directories() {
        let fx = fixture();
        fs::create_dir(fx.files.join("sub")).unwrap();

        assert!(matches!(
            fx.broker.open(&token_for(&fx, "sub"), "r"),
            Err(BrokerError::InvalidArgument(_))
        ));
        let root_token = fx.broker.encode(&fx.files).unwrap().to_string();
        assert!(fx.broker.open(&root_token, "r").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_cannot_plant_files_outside_root() {
        let fx = fixture();
        let outside = fx.files.parent().unwrap().join("outside");
        fs::create_dir(&outside).unwrap();
        std::os::unix::fs::symlink(outside.join("planted.txt"), fx.files.join("evil")).unwrap();
        let token = "content://test.broker/files/evil";

        assert!(matches!(fx.broker.resolve(token), Err(BrokerError::AccessDenied(_))));
        for mode in ["w", "wt", "wa", "rw", "rwt"] {
            assert!(matches!(
                fx.broker.open(token, mode),
                Err(BrokerError::AccessDenied(_))
            ));
        }
        assert!(!outside.join("planted.txt").exists());
    }

    #[test]
    fn test_invalid_mode_checked_before_token() {
        let fx = fixture();
        assert!(matches!(
            fx.broker.open("not a token", "append"),
            Err(BrokerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let fx = fixture();
        let token = token_for(&fx, "gone.txt");
        assert_eq!(fx.broker.delete(&token).unwrap(), 0);
        assert_eq!(fx.broker.delete(&token).unwrap(), 0);

        fs::write(fx.files.join("gone.txt"), b"x").unwrap();
        assert_eq!(fx.broker.delete(&token).unwrap(), 1);
        assert_eq!(fx.broker.delete(&token).unwrap(), 0);
    }

    #[test]
    fn test_update_policy() {
        let fx = fixture();
        fs::write(fx.files.join("u.txt"), b"x").unwrap();
        let token = token_for(&fx, "u.txt");

        assert_eq!(fx.broker.update(&token).unwrap(), 1);
        assert_eq!(fx.broker.update(&token).unwrap(), 0);

        let strict = fx.broker.clone().with_update_policy(UpdatePolicy::Reject);
        assert!(matches!(
            strict.update(&token),
            Err(BrokerError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            fx.broker.insert(&token),
            Err(BrokerError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_escaping_token_is_denied_for_every_operation() {
        let fx = fixture();
        let token = "content://test.broker/files/..%2Fsecret";
        assert!(matches!(fx.broker.query(token, None), Err(BrokerError::AccessDenied(_))));
        assert!(matches!(fx.broker.type_of(token), Err(BrokerError::AccessDenied(_))));
        assert!(matches!(fx.broker.open(token, "w"), Err(BrokerError::AccessDenied(_))));
        assert!(matches!(fx.broker.delete(token), Err(BrokerError::AccessDenied(_))));
    }

    #[test]
    fn test_handle_dispatches_every_operation() {
        let fx = fixture();
        fs::write(fx.files.join("h.txt"), b"abc").unwrap();
        let token = token_for(&fx, "h.txt");

        let row = fx.broker.handle(AccessRequest::new(&token, Operation::Query(None))).unwrap();
        assert!(matches!(row, BrokerResponse::Row(r) if r.size() == Some(3)));

        let kind = fx.broker.handle(AccessRequest::new(&token, Operation::TypeLookup)).unwrap();
        assert!(matches!(kind, BrokerResponse::ContentType("text/plain")));

        let handle = fx.broker.handle(AccessRequest::open(&token, "r").unwrap()).unwrap();
        assert!(matches!(handle, BrokerResponse::Handle(h) if h.mode == AccessMode::Read));

        let count = fx.broker.handle(AccessRequest::new(&token, Operation::Delete)).unwrap();
        assert!(matches!(count, BrokerResponse::Count(1)));

        assert!(fx.broker.handle(AccessRequest::new(&token, Operation::Insert)).is_err());
    }
}
