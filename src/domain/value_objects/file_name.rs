/// Filename stored when the client supplies none
pub const DEFAULT_FILE_NAME: &str = "upload";

/// The client-supplied filename of an upload
///
/// Only the last path component is kept and control characters are
/// dropped, so the value is always safe to echo in a
/// `Content-Disposition` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName(String);

impl FileName {
    /// Never fails; blank input falls back to [`DEFAULT_FILE_NAME`]
    pub fn sanitize(raw: Option<&str>) -> Self {
        let raw = raw.unwrap_or_default();
        let last = raw
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();
        let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
        let cleaned = cleaned.trim();

        if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
            Self(DEFAULT_FILE_NAME.to_string())
        } else {
            Self(cleaned.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
