//! `[document]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[document]` section in letterpress.toml - how the page is assembled.
///
/// # Example
/// ```toml
/// [document]
/// lang = "de"
/// meta = ["author", "date"]   # front matter fields shown in the page
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct DocumentConfig {
    /// `lang` attribute of the `<html>` element.
    #[serde(default = "defaults::document::lang")]
    #[educe(Default = defaults::document::lang())]
    pub lang: String,

    /// Front matter fields surfaced as `<meta>` tags and in the page header.
    #[serde(default = "defaults::document::meta")]
    #[educe(Default = defaults::document::meta())]
    pub meta: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::super::ProjectConfig;

    #[test]
    fn test_document_config_defaults() {
        let config: ProjectConfig = toml::from_str("").unwrap();

        assert_eq!(config.document.lang, "en");
        assert_eq!(config.document.meta, vec!["author", "date", "description"]);
    }

    #[test]
    fn test_document_config_no_meta() {
        let config = r#"
            [document]
            lang = "fr"
            meta = []
        "#;
        let config: ProjectConfig = toml::from_str(config).unwrap();

        assert_eq!(config.document.lang, "fr");
        assert!(config.document.meta.is_empty());
    }
}
