//! Configuration access port.

/// Sectioned key/value lookup. Values come back raw; parsing and range
/// checks belong to `domain::config_validation`.
pub trait ConfigPort {
    /// Trimmed value, `None` when the key is absent or blank.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// Names of every section present in the source.
    fn sections(&self) -> Vec<String>;
}
