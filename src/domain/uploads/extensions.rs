use std::collections::BTreeSet;

/// Case-insensitive allow-list of file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedExtensions(BTreeSet<String>);

impl AllowedExtensions {
    pub const DEFAULT: &'static [&'static str] = &["txt", "png", "jpg", "jpeg"];

    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self(set)
    }

    /// Parses a comma separated list such as `txt, png,.JPG`.
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// The extension is whatever follows the last `.`; a name without a dot
    /// is never permitted.
    pub fn permits(&self, filename: &str) -> bool {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| self.0.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for AllowedExtensions {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}
