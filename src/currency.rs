//! Display currencies for tour prices.
//!
//! Prices are stored in the tour's base currency (USD for every tour the
//! admin API creates) and converted at fixed rates when a page is rendered.

use serde::Serialize;

/// Currencies a visitor can display prices in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Inr,
    Gbp,
    Aud,
}

const CURRENCIES: [Currency; 5] = [
    Currency::Usd,
    Currency::Eur,
    Currency::Inr,
    Currency::Gbp,
    Currency::Aud,
];

impl Currency {
    /// All display currencies, base currency first.
    pub fn all() -> impl Iterator<Item = Currency> {
        CURRENCIES.into_iter()
    }

    /// Look up an ISO code, ignoring case and surrounding whitespace.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::all().find(|currency| currency.code().eq_ignore_ascii_case(code))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Inr => "INR",
            Currency::Gbp => "GBP",
            Currency::Aud => "AUD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Inr => "₹",
            Currency::Gbp => "£",
            Currency::Aud => "A$",
        }
    }

    /// Units of this currency per US dollar.
    pub fn rate(&self) -> f64 {
        match self {
            Currency::Usd => 1.0,
            Currency::Eur => 0.92,
            Currency::Inr => 83.12,
            Currency::Gbp => 0.79,
            Currency::Aud => 1.53,
        }
    }
}

/// Convert `amount` between currencies through the USD rates.
pub fn convert_price(amount: f64, from: Currency, to: Currency) -> f64 {
    if from == to {
        return amount;
    }
    amount / from.rate() * to.rate()
}

/// Symbol plus whole units with thousands separators, e.g. `₹37,404`.
///
/// Halves round away from zero.
pub fn format_price(amount: f64, currency: Currency) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}{}", sign, currency.symbol(), grouped)
}

/// Convert and format in one step.
pub fn display_price(amount: f64, from: Currency, to: Currency) -> String {
    format_price(convert_price(amount, from, to), to)
}
