use thiserror::Error;

use crate::parse::ParseError;
use crate::CatalogError;

/// Unified error type covering catalog parsing, catalog assembly, and I/O.
///
/// Returned by convenience loaders like [`Catalog::from_dsl()`](crate::Catalog::from_dsl)
/// and [`Catalog::from_file()`](crate::Catalog::from_file). Rule evaluation
/// itself never fails; see [`RuleError`](crate::RuleError).
#[derive(Debug, Error)]
pub enum PopoverError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PopupId;

    #[test]
    fn catalog_error_is_transparent() {
        let err = PopoverError::from(CatalogError::DuplicatePopup { id: PopupId(3) });
        assert_eq!(err.to_string(), "duplicate popup id 3");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "catalog.popover");
        assert!(matches!(PopoverError::from(io), PopoverError::Io(_)));
    }
}
