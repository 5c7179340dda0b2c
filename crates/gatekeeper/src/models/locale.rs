//! Supported site locales.

use std::fmt;

/// A locale the site is published in.
///
/// The code is always region-qualified (`en-US`), which is also the form
/// used as the leading path segment of every user-facing URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale {
    EnUs,
    FrFr,
    EsEs,
    ArMa,
}

impl Locale {
    /// Every supported locale, default first.
    pub const ALL: [Locale; 4] = [Locale::EnUs, Locale::FrFr, Locale::EsEs, Locale::ArMa];

    /// Locale used when neither the path nor a stored preference names one.
    pub const DEFAULT: Locale = Locale::EnUs;

    /// The `xx-XX` code used in paths and cookies.
    pub fn code(self) -> &'static str {
        match self {
            Locale::EnUs => "en-US",
            Locale::FrFr => "fr-FR",
            Locale::EsEs => "es-ES",
            Locale::ArMa => "ar-MA",
        }
    }

    /// Primary language subtag (`en` for `en-US`).
    pub fn language(self) -> &'static str {
        match self {
            Locale::EnUs => "en",
            Locale::FrFr => "fr",
            Locale::EsEs => "es",
            Locale::ArMa => "ar",
        }
    }

    /// Look up a locale by its exact, case-sensitive code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
