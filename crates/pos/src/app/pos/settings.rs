use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const DEFAULT_STORE_NAME: &str = "NEXUS POS";
pub(crate) const DEFAULT_TABLE_COUNT: u32 = 10;
pub(crate) const DEFAULT_IDLE_TIMEOUT_MS: u64 = 40_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum Currency {
    #[default]
    Usd,
    Php,
    Eur,
    Jpy,
}

impl Currency {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Php => "₱",
            Self::Eur => "€",
            Self::Jpy => "¥",
        }
    }

    pub(crate) fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Php => "PHP",
            Self::Eur => "EUR",
            Self::Jpy => "JPY",
        }
    }

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "USD" => Some(Self::Usd),
            "PHP" => Some(Self::Php),
            "EUR" => Some(Self::Eur),
            "JPY" => Some(Self::Jpy),
            _ => None,
        }
    }

    /// `1250` cents renders as `$12.50`.
    pub(crate) fn format(self, cents: u64) -> String {
        format!("{}{}.{:02}", self.symbol(), cents / 100, cents % 100)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) store_name: String,
    pub(crate) table_count: u32,
    pub(crate) setup_done: bool,
    pub(crate) language: String,
    pub(crate) currency: Currency,
    pub(crate) idle_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_name: DEFAULT_STORE_NAME.to_string(),
            table_count: DEFAULT_TABLE_COUNT,
            setup_done: false,
            language: "en".to_string(),
            currency: Currency::Usd,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SetupForm {
    pub(crate) store_name: String,
    pub(crate) table_count: u32,
    pub(crate) language: String,
    pub(crate) currency: Currency,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum SetupError {
    #[error("store name is required")]
    MissingStoreName,
    #[error("table count must be at least 1")]
    NoTables,
    #[error("language is required")]
    MissingLanguage,
}

impl Settings {
    /// Applies a completed setup wizard. Leaves `self` untouched on error.
    pub(crate) fn apply_setup(&mut self, form: SetupForm) -> Result<(), SetupError> {
        let store_name = form.store_name.trim();
        if store_name.is_empty() {
            return Err(SetupError::MissingStoreName);
        }
        if form.table_count == 0 {
            return Err(SetupError::NoTables);
        }
        let language = form.language.trim();
        if language.is_empty() {
            return Err(SetupError::MissingLanguage);
        }

        self.store_name = store_name.to_string();
        self.table_count = form.table_count;
        self.language = language.to_string();
        self.currency = form.currency;
        self.setup_done = true;
        Ok(())
    }

    pub(crate) fn format_money(&self, cents: u64) -> String {
        self.currency.format(cents)
    }
}
