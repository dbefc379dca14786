//! Report localization
//!
//! Report text is rendered from Fluent resources compiled into the crate.
//! Bundles are built per render call and never cross an await point.

use std::fmt;

use fluent::{FluentArgs, FluentBundle, FluentResource};
use thiserror::Error;
use unic_langid::LanguageIdentifier;

const EN_US: &str = include_str!("../resources/en-US/audit.ftl");
const AR_SA: &str = include_str!("../resources/ar-SA/audit.ftl");

#[derive(Debug, Error)]
pub enum LocalizationError {
    #[error("Invalid locale identifier: {0}")]
    InvalidLocale(String),

    #[error("Fluent resource for {locale} failed to parse: {message}")]
    Resource { locale: Locale, message: String },

    #[error("Message {id} missing for {locale}")]
    MissingMessage { locale: Locale, id: String },

    #[error("Message {id} failed to format for {locale}: {message}")]
    Format { locale: Locale, id: String, message: String },
}

/// Report languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale {
    EnUs,
    ArSa,
}

impl Locale {
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::ArSa => "ar-SA",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            Locale::EnUs => EN_US,
            Locale::ArSa => AR_SA,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Renders messages for one locale
pub struct Localizer {
    locale: Locale,
    bundle: FluentBundle<FluentResource>,
}

impl fmt::Debug for Localizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localizer").field("locale", &self.locale).finish()
    }
}

impl Localizer {
    pub fn new(locale: Locale) -> Result<Self, LocalizationError> {
        let langid: LanguageIdentifier = locale
            .tag()
            .parse()
            .map_err(|_| LocalizationError::InvalidLocale(locale.tag().to_string()))?;
        let resource = FluentResource::try_new(locale.source().to_string()).map_err(|(_, errors)| {
            LocalizationError::Resource {
                locale,
                message: format!("{:?}", errors),
            }
        })?;

        let mut bundle = FluentBundle::new(vec![langid]);
        bundle.set_use_isolating(false);
        bundle
            .add_resource(resource)
            .map_err(|errors| LocalizationError::Resource {
                locale,
                message: format!("{:?}", errors),
            })?;
        Ok(Self { locale, bundle })
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Formats a message; argument values are inserted verbatim
    pub fn message(&self, id: &str, args: &[(&str, String)]) -> Result<String, LocalizationError> {
        let pattern = self
            .bundle
            .get_message(id)
            .and_then(|m| m.value())
            .ok_or_else(|| LocalizationError::MissingMessage {
                locale: self.locale,
                id: id.to_string(),
            })?;

        let mut fluent_args = FluentArgs::new();
        for (key, value) in args {
            fluent_args.set(*key, value.clone());
        }

        let mut errors = vec![];
        let text = self
            .bundle
            .format_pattern(pattern, Some(&fluent_args), &mut errors)
            .into_owned();
        if !errors.is_empty() {
            return Err(LocalizationError::Format {
                locale: self.locale,
                id: id.to_string(),
                message: format!("{:?}", errors),
            });
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_locales_load() {
        for locale in [Locale::EnUs, Locale::ArSa] {
            let localizer = Localizer::new(locale).unwrap();
            assert!(!localizer.message("outcome-compliant", &[]).unwrap().is_empty());
        }
    }

    #[test]
    fn test_arguments_are_substituted() {
        let en = Localizer::new(Locale::EnUs).unwrap();
        let text = en.message("next-step-follow-up", &[("days", "90".to_string())]).unwrap();
        assert_eq!(text, "Schedule a follow-up audit within 90 days.");

        let ar = Localizer::new(Locale::ArSa).unwrap();
        assert!(ar
            .message("next-step-follow-up", &[("days", "90".to_string())])
            .unwrap()
            .contains("90"));
    }

    #[test]
    fn test_missing_argument_is_an_error() {
        let en = Localizer::new(Locale::EnUs).unwrap();
        assert!(matches!(
            en.message("next-step-follow-up", &[]),
            Err(LocalizationError::Format { .. })
        ));
    }

    #[test]
    fn test_unknown_message() {
        let en = Localizer::new(Locale::EnUs).unwrap();
        assert!(matches!(
            en.message("no-such-message", &[]),
            Err(LocalizationError::MissingMessage { .. })
        ));
    }
}
