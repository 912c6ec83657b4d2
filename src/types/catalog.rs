use std::borrow::Cow;
use std::fmt;

use super::config::{PopupId, PopupRuleConfig};
use super::error::CatalogError;
use super::host::PopupSource;

/// An ordered, in-memory set of popups and their rule configurations.
///
/// Insertion order is the active order reported through [`PopupSource`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub(crate) popups: Vec<(PopupId, PopupRuleConfig)>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a popup at the end of the active order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicatePopup`] if `id` is already present.
    pub fn insert(&mut self, id: PopupId, config: PopupRuleConfig) -> Result<(), CatalogError> {
        if self.get(id).is_some() {
            return Err(CatalogError::DuplicatePopup { id });
        }
        self.popups.push((id, config));
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: PopupId) -> Option<&PopupRuleConfig> {
        self.popups
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, config)| config)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PopupId, &PopupRuleConfig)> {
        self.popups.iter().map(|(id, config)| (*id, config))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.popups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.popups.is_empty()
    }

    /// Parse the text catalog format.
    ///
    /// # Errors
    ///
    /// Returns [`PopoverError`](crate::PopoverError) on a syntax error or a
    /// duplicate popup id.
    pub fn from_dsl(input: &str) -> Result<Self, crate::PopoverError> {
        let parsed = crate::parse::parse(input)?;
        let mut catalog = Self::new();
        for popup in parsed.popups {
            catalog.insert(popup.id, popup.config)?;
        }
        Ok(catalog)
    }

    /// Read a text catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`PopoverError`](crate::PopoverError) on I/O, syntax, or
    /// duplicate id failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::PopoverError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_dsl(&input)
    }
}

impl PopupSource for Catalog {
    fn active_popups(&self) -> Vec<PopupId> {
        self.popups.iter().map(|(id, _)| *id).collect()
    }

    fn popup(&self, id: PopupId) -> Option<Cow<'_, PopupRuleConfig>> {
        self.get(id).map(Cow::Borrowed)
    }
}

#[cfg(feature = "binary-cache")]
impl Catalog {
    /// Serialize this catalog to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload metadata so callers can tell when the cache is stale.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize a catalog previously produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Like [`from_bytes`](Self::from_bytes), but returns `Ok(None)` unless
    /// the cache was written from exactly `source_text`.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes_if_fresh(
        bytes: &[u8],
        source_text: &str,
    ) -> Result<Option<Self>, crate::serial::DeserializeError> {
        crate::serial::decode_if_fresh(bytes, source_text)
    }

    /// Serialize this catalog and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a file and deserialize the catalog it contains.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let conditions: usize = self.popups.iter().map(|(_, c)| c.len()).sum();
        write!(
            f,
            "Catalog({} popups, {} conditions)",
            self.popups.len(),
            conditions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_preserves_order() {
        let mut catalog = Catalog::new();
        catalog.insert(PopupId(9), PopupRuleConfig::new()).unwrap();
        catalog
            .insert(PopupId(2), PopupRuleConfig::new().condition("login"))
            .unwrap();
        assert_eq!(catalog.active_popups(), [PopupId(9), PopupId(2)]);
        assert_eq!(catalog.get(PopupId(2)).unwrap().len(), 1);
        assert_eq!(catalog.to_string(), "Catalog(2 popups, 1 conditions)");
    }

    #[test]
    fn duplicate_id_rejected() {
        let mut catalog = Catalog::new();
        catalog.insert(PopupId(1), PopupRuleConfig::new()).unwrap();
        let err = catalog.insert(PopupId(1), PopupRuleConfig::new()).unwrap_err();
        assert_eq!(err, CatalogError::DuplicatePopup { id: PopupId(1) });
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn popup_source_lookup() {
        let mut catalog = Catalog::new();
        catalog
            .insert(PopupId(4), PopupRuleConfig::new().condition("comment"))
            .unwrap();
        assert!(catalog.popup(PopupId(4)).is_some());
        assert!(catalog.popup(PopupId(5)).is_none());
    }

    #[test]
    fn from_dsl_builds_catalog() {
        let catalog = Catalog::from_dsl("popup 1 { login }\npopup 2 { }").unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get(PopupId(2)).unwrap().is_empty());
    }

    #[test]
    fn from_dsl_rejects_duplicates() {
        let err = Catalog::from_dsl("popup 1 { }\npopup 1 { login }").unwrap_err();
        assert!(matches!(
            err,
            crate::PopoverError::Catalog(CatalogError::DuplicatePopup { id: PopupId(1) })
        ));
    }
}
