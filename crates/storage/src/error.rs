use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] statusfeed_core::ConfigError),

    #[error("stored fingerprint is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
