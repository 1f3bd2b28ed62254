use bridge_traits::catalog::CatalogError;
use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Sync error: {0}")]
    Sync(#[from] core_sync::SyncError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("{operation} requires {mode} mode")]
    WrongMode {
        operation: &'static str,
        mode: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
