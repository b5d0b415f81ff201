//! Localized message lookup
//!
//! Each locale is a flat YAML table of `key: template`. Templates use
//! `${name}` placeholders.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

const BUILTIN_LOCALES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en.yaml")),
    ("ru", include_str!("../locales/ru.yaml")),
];

/// Errors raised while loading locale tables
#[derive(Error, Debug)]
pub enum LocaleError {
    /// Locale directory could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Locale file is not a flat YAML map of strings
    #[error("YAML error in {file}: {source}")]
    Yaml {
        /// Offending file
        file: String,
        /// Parser error
        source: serde_yaml::Error,
    },
}

/// Translation tables for all loaded locales
#[derive(Debug, Clone)]
pub struct Localizer {
    default_language: String,
    tables: HashMap<String, HashMap<String, String>>,
}

impl Localizer {
    /// Localizer with the tables compiled into the binary
    ///
    /// # Examples
    ///
    /// ```
    /// use album_bot::i18n::Localizer;
    ///
    /// let i18n = Localizer::builtin("en");
    /// assert_eq!(i18n.t("en", "keyboard_done", &[]), "Done");
    /// ```
    #[must_use]
    pub fn builtin(default_language: &str) -> Self {
        let mut tables = HashMap::new();
        for (lang, source) in BUILTIN_LOCALES {
            match serde_yaml::from_str::<HashMap<String, String>>(source) {
                Ok(table) => {
                    tables.insert((*lang).to_string(), table);
                }
                Err(e) => warn!("Built-in locale {lang} is invalid: {e}"),
            }
        }
        Self {
            default_language: default_language.to_string(),
            tables,
        }
    }

    /// Load every `<lang>.yaml` / `<lang>.yml` file from `dir`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or a file is not a
    /// flat map of strings.
    pub fn from_dir(dir: impl AsRef<Path>, default_language: &str) -> Result<Self, LocaleError> {
        let mut tables = HashMap::new();
        for entry in std::fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let is_yaml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            let Some(lang) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if !is_yaml {
                continue;
            }

            let source = std::fs::read_to_string(&path)?;
            let table: HashMap<String, String> =
                serde_yaml::from_str(&source).map_err(|source| LocaleError::Yaml {
                    file: path.display().to_string(),
                    source,
                })?;
            tables.insert(lang.to_lowercase(), table);
        }

        info!(
            "Loaded {} locales from {}",
            tables.len(),
            dir.as_ref().display()
        );
        Ok(Self {
            default_language: default_language.to_string(),
            tables,
        })
    }

    /// Translate `key` for `locale`, substituting `${name}` params.
    ///
    /// `en-US` falls back to `en`, then to the default language. A key
    /// missing everywhere is returned as is.
    #[must_use]
    pub fn t(&self, locale: &str, key: &str, params: &[(&str, &str)]) -> String {
        let Some(template) = self.lookup(locale, key) else {
            return key.to_string();
        };
        params
            .iter()
            .fold(template.to_string(), |text, (name, value)| {
                text.replace(&format!("${{{name}}}"), value)
            })
    }

    /// Whether `text` is the translation of `key` in any loaded locale
    #[must_use]
    pub fn matches(&self, key: &str, text: &str) -> bool {
        let text = text.trim();
        self.tables
            .values()
            .filter_map(|table| table.get(key))
            .any(|value| value == text)
    }

    /// Language used when a locale has no table
    #[must_use]
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        let locale = locale.to_lowercase();
        let base = locale.split(['-', '_']).next().unwrap_or_default();
        let found = [locale.as_str(), base, self.default_language.as_str()]
            .into_iter()
            .filter_map(|lang| self.tables.get(lang))
            .find_map(|table| table.get(key))
            .map(String::as_str);
        found
    }
}
