//! Record transformers
//!
//! A lookup yields either the ordered values of one language block
//! ([`Reader::find`](crate::Reader::find)) or those values paired with field
//! names ([`Reader::find_to_pairs`](crate::Reader::find_to_pairs)). The two
//! traits here turn either shape into an application type.
//!
//! [`OrderParser`] reads values by position. It is the fastest option but
//! depends on the database's field order, so there is no built-in
//! implementation. [`PairParser`] reads by field name and tolerates databases
//! with different field sets; [`FullInfo`] is the built-in one.
//!
//! Plain functions and closures implement both traits:
//!
//! ```rust
//! use ipdb::parser::{OrderParser, PairParser};
//!
//! fn country(values: &[&str]) -> String {
//!     values.first().copied().unwrap_or_default().to_string()
//! }
//!
//! fn field_count(pairs: &[(&str, &str)]) -> usize {
//!     pairs.len()
//! }
//!
//! assert_eq!(country.parse(&["Japan", "Tokyo"]), "Japan");
//! assert_eq!(field_count.parse_pairs(&[("country_name", "Japan")]), 1);
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Builds a `T` from the positional values of one language block
pub trait OrderParser<T> {
    /// Transform the ordered values
    fn parse(&self, values: &[&str]) -> T;
}

/// Builds a `T` from `(field name, value)` pairs
pub trait PairParser<T> {
    /// Transform the paired values
    fn parse_pairs(&self, pairs: &[(&str, &str)]) -> T;
}

impl<T, F> OrderParser<T> for F
where
    F: Fn(&[&str]) -> T,
{
    fn parse(&self, values: &[&str]) -> T {
        self(values)
    }
}

impl<T, F> PairParser<T> for F
where
    F: Fn(&[(&str, &str)]) -> T,
{
    fn parse_pairs(&self, pairs: &[(&str, &str)]) -> T {
        self(pairs)
    }
}

/// Every field an IPDB city database may carry
///
/// Fields missing from a particular database are left empty. Field names
/// match the IPDB header's `fields` entries.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullInfo {
    pub country_name: String,
    pub region_name: String,
    pub city_name: String,
    pub district_name: String,
    pub owner_domain: String,
    pub isp_domain: String,
    pub latitude: String,
    pub longitude: String,
    pub timezone: String,
    pub utc_offset: String,
    pub china_region_code: String,
    pub china_city_code: String,
    pub china_admin_code: String,
    pub idd_code: String,
    pub country_code: String,
    pub continent_code: String,
    pub idc: String,
    pub base_station: String,
    pub country_code3: String,
    pub european_union: String,
    pub currency_code: String,
    pub currency_name: String,
    #[serde(rename = "anycast")]
    pub any_cast: String,
    pub line: String,
    pub route: String,
    pub asn: String,
    pub area_code: String,
    pub usage_type: String,
}

impl FullInfo {
    /// Build from `(field name, value)` pairs, ignoring unknown fields
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let map: FxHashMap<&str, &str> = pairs.iter().copied().collect();
        let f = |name: &str| map.get(name).map(|v| v.to_string()).unwrap_or_default();

        FullInfo {
            country_name: f("country_name"),
            region_name: f("region_name"),
            city_name: f("city_name"),
            district_name: f("district_name"),
            owner_domain: f("owner_domain"),
            isp_domain: f("isp_domain"),
            latitude: f("latitude"),
            longitude: f("longitude"),
            timezone: f("timezone"),
            utc_offset: f("utc_offset"),
            china_region_code: f("china_region_code"),
            china_city_code: f("china_city_code"),
            china_admin_code: f("china_admin_code"),
            idd_code: f("idd_code"),
            country_code: f("country_code"),
            continent_code: f("continent_code"),
            idc: f("idc"),
            base_station: f("base_station"),
            country_code3: f("country_code3"),
            european_union: f("european_union"),
            currency_code: f("currency_code"),
            currency_name: f("currency_name"),
            any_cast: f("anycast"),
            line: f("line"),
            route: f("route"),
            asn: f("asn"),
            area_code: f("area_code"),
            usage_type: f("usage_type"),
        }
    }
}

/// Unit parser that produces [`FullInfo`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FullInfoParser;

impl PairParser<FullInfo> for FullInfoParser {
    fn parse_pairs(&self, pairs: &[(&str, &str)]) -> FullInfo {
        FullInfo::from_pairs(pairs)
    }
}
