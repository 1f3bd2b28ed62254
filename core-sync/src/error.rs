use bridge_traits::catalog::CatalogError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// A cell failed its field rule; only the current row is affected.
    #[error("{reason}")]
    Validation {
        field: String,
        value: String,
        reason: String,
    },

    /// Neither the asset id nor the original filename identified an asset.
    #[error("Could not resolve asset: {by_id}; {by_filename}")]
    Resolution { by_id: String, by_filename: String },

    /// The input file does not start with the fixed column prefix.
    #[error("Invalid input file: {0}")]
    Schema(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl SyncError {
    /// Errors confined to a single row; the run continues after them.
    pub fn is_row_level(&self) -> bool {
        match self {
            Self::Validation { .. } | Self::Resolution { .. } => true,
            Self::Catalog(e) => !e.is_permission_denied(),
            Self::Schema(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_level_classification() {
        let resolution = SyncError::Resolution {
            by_id: "not a valid asset ID".to_string(),
            by_filename: "file clip.mov does not exist in the collection".to_string(),
        };
        assert!(resolution.is_row_level());
        assert_eq!(
            resolution.to_string(),
            "Could not resolve asset: not a valid asset ID; file clip.mov does not exist in the collection"
        );

        let denied = SyncError::from(CatalogError::PermissionDenied {
            resource: "asset a1".to_string(),
            status: 403,
        });
        assert!(!denied.is_row_level());
        assert!(!SyncError::Schema("empty file".to_string()).is_row_level());
    }
}
