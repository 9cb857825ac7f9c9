//! Tour search and filtering for the storefront listing.

use crate::catalog::Tour;
use crate::i18n::{get_localized_field, Locale};
use serde::Deserialize;

/// Price brackets offered by the listing (USD).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriceRange {
    #[default]
    All,
    Under500,
    From500To1000,
    From1000To2000,
    Over2000,
}

impl PriceRange {
    /// Parse a query-string value; anything unknown means no price filter.
    pub fn parse(value: &str) -> Self {
        match value {
            "under500" => PriceRange::Under500,
            "500-1000" => PriceRange::From500To1000,
            "1000-2000" => PriceRange::From1000To2000,
            "2000plus" => PriceRange::Over2000,
            _ => PriceRange::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceRange::All => "all",
            PriceRange::Under500 => "under500",
            PriceRange::From500To1000 => "500-1000",
            PriceRange::From1000To2000 => "1000-2000",
            PriceRange::Over2000 => "2000plus",
        }
    }

    /// Lower bounds are inclusive, upper bounds exclusive.
    pub fn contains(&self, price: f64) -> bool {
        match self {
            PriceRange::All => true,
            PriceRange::Under500 => price < 500.0,
            PriceRange::From500To1000 => (500.0..1000.0).contains(&price),
            PriceRange::From1000To2000 => (1000.0..2000.0).contains(&price),
            PriceRange::Over2000 => price >= 2000.0,
        }
    }
}

/// Raw `?q=&price=&location=` query of the listing page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TourQuery {
    pub q: Option<String>,
    pub price: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TourFilter {
    /// Lower-cased free-text term; empty matches everything
    pub query: String,
    pub price: PriceRange,
    /// `None` matches every location
    pub location: Option<String>,
}

impl From<TourQuery> for TourFilter {
    fn from(query: TourQuery) -> Self {
        TourFilter {
            query: query.q.unwrap_or_default().trim().to_lowercase(),
            price: query.price.as_deref().map(PriceRange::parse).unwrap_or_default(),
            location: query
                .location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty() && l != "all"),
        }
    }
}

impl TourFilter {
    pub fn is_active(&self) -> bool {
        !self.query.is_empty() || self.price != PriceRange::All || self.location.is_some()
    }

    /// Whether `tour`, rendered in `locale`, passes every filter.
    pub fn matches(&self, tour: &Tour, locale: Locale) -> bool {
        let title = get_localized_field(tour, "title", locale);
        let location = get_localized_field(tour, "location", locale);

        let matches_query = self.query.is_empty()
            || title.to_lowercase().contains(&self.query)
            || location.to_lowercase().contains(&self.query);

        // Links carry English location names; the dropdown carries localized ones.
        let matches_location = match &self.location {
            None => true,
            Some(wanted) => {
                let wanted = wanted.as_str();
                location == wanted
                    || get_localized_field(tour, "location", Locale::default_locale()) == wanted
            }
        };

        matches_query && self.price.contains(tour.price) && matches_location
    }

    pub fn apply<'a>(&self, tours: &'a [Tour], locale: Locale) -> Vec<&'a Tour> {
        tours.iter().filter(|tour| self.matches(tour, locale)).collect()
    }
}

/// Sorted, de-duplicated localized locations.
pub fn unique_locations(tours: &[Tour], locale: Locale) -> Vec<String> {
    let mut locations: Vec<String> = tours
        .iter()
        .map(|tour| get_localized_field(tour, "location", locale).to_string())
        .filter(|location| !location.is_empty())
        .collect();
    locations.sort();
    locations.dedup();
    locations
}
