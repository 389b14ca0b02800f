//! # Keyword Matcher
//!
//! Maps a batch of news articles to the places and companies they talk about.
//!
//! - Reference tables (cities, company aliases → tickers, ticker display names)
//!   are immutable data loaded once at startup (TOML or built-in seed).
//! - Matching is a case-insensitive substring test, evaluated once per article
//!   (several mentions in one article still count once).
//! - Rankings are deterministic: descending count, ties keep reference-table order.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::providers::types::Article;

pub const DEFAULT_KEYWORDS_CONFIG_PATH: &str = "config/keywords.toml";
pub const ENV_KEYWORDS_CONFIG_PATH: &str = "KEYWORDS_CONFIG_PATH";

pub const MAX_LOCATIONS: usize = 3;
pub const MAX_COMPANIES: usize = 5;
pub const DEFAULT_LOCATION: &str = "New York";
pub const DEFAULT_TICKER: &str = "SPY";

/// One company alias and the ticker it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompanyAlias {
    pub name: String,
    pub ticker: String,
}

/// Static reference data shared by the matcher and the stock provider.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordTables {
    pub cities: Vec<String>,
    pub companies: Vec<CompanyAlias>,
    #[serde(default)]
    pub ticker_names: HashMap<String, String>,
}

impl KeywordTables {
    /// Load tables from an explicit TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading keyword tables from {}", path.display()))?;
        let raw: KeywordTables = toml::from_str(&content)
            .with_context(|| format!("parsing keyword tables in {}", path.display()))?;
        raw.cleaned()
    }

    /// Load tables using env var + fallbacks:
    /// 1) $KEYWORDS_CONFIG_PATH
    /// 2) config/keywords.toml
    /// 3) built-in seed
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_KEYWORDS_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!(
                "{ENV_KEYWORDS_CONFIG_PATH} points to non-existent path"
            ));
        }
        let default_path = PathBuf::from(DEFAULT_KEYWORDS_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from(&default_path);
        }
        Ok(Self::built_in())
    }

    /// Display name for a ticker, falling back to the ticker itself.
    pub fn company_name_for(&self, ticker: &str) -> String {
        self.ticker_names
            .get(ticker)
            .cloned()
            .unwrap_or_else(|| ticker.to_string())
    }

    /// Trim entries, drop blanks and duplicate cities, reject empty tables.
    fn cleaned(self) -> Result<Self> {
        let mut cities: Vec<String> = Vec::with_capacity(self.cities.len());
        for c in self.cities {
            let t = c.trim();
            if !t.is_empty() && !cities.iter().any(|seen| seen == t) {
                cities.push(t.to_string());
            }
        }

        let companies: Vec<CompanyAlias> = self
            .companies
            .into_iter()
            .filter_map(|c| {
                let name = c.name.trim();
                let ticker = c.ticker.trim();
                (!name.is_empty() && !ticker.is_empty()).then(|| CompanyAlias {
                    name: name.to_string(),
                    ticker: ticker.to_string(),
                })
            })
            .collect();

        let ticker_names = self
            .ticker_names
            .into_iter()
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .collect();

        if cities.is_empty() {
            return Err(anyhow!("keyword tables: city list is empty"));
        }
        if companies.is_empty() {
            return Err(anyhow!("keyword tables: company list is empty"));
        }

        Ok(Self {
            cities,
            companies,
            ticker_names,
        })
    }

    /// Built-in reference tables used when no config file is present.
    pub fn built_in() -> Self {
        let cities = [
            "New York", "Los Angeles", "Chicago", "Houston", "Phoenix",
            "Philadelphia", "San Antonio", "San Diego", "Dallas", "San Jose",
            "Austin", "Jacksonville", "Fort Worth", "Columbus", "Charlotte",
            "San Francisco", "Indianapolis", "Seattle", "Denver", "Washington",
            "Boston", "El Paso", "Nashville", "Detroit", "Oklahoma City",
            "Portland", "Las Vegas", "Memphis", "Louisville", "Baltimore",
            "Milwaukee", "Albuquerque", "Tucson", "Fresno", "Sacramento",
            "Kansas City", "Mesa", "Atlanta", "Omaha", "Colorado Springs",
            "Raleigh", "Miami", "Long Beach", "Virginia Beach", "Oakland",
            "Minneapolis", "Tulsa", "Tampa", "Arlington", "New Orleans",
            // international
            "London", "Paris", "Tokyo", "Berlin", "Sydney", "Toronto",
            "Mumbai", "Shanghai", "Beijing", "Moscow", "Dubai", "Singapore",
            "Hong Kong", "Seoul", "Madrid", "Rome", "Amsterdam", "Brussels",
            "Vienna", "Dublin", "Zurich", "Copenhagen", "Stockholm", "Oslo",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        let companies = [
            ("Apple", "AAPL"),
            ("Microsoft", "MSFT"),
            ("Google", "GOOGL"),
            ("Alphabet", "GOOGL"),
            ("Amazon", "AMZN"),
            ("Tesla", "TSLA"),
            ("Meta", "META"),
            ("Facebook", "META"),
            ("NVIDIA", "NVDA"),
            ("Berkshire Hathaway", "BRK.B"),
            ("JPMorgan", "JPM"),
            ("Johnson & Johnson", "JNJ"),
            ("Visa", "V"),
            ("Walmart", "WMT"),
            ("Procter & Gamble", "PG"),
            ("UnitedHealth", "UNH"),
            ("Mastercard", "MA"),
            ("Home Depot", "HD"),
            ("Chevron", "CVX"),
            ("Pfizer", "PFE"),
            ("AbbVie", "ABBV"),
            ("Coca-Cola", "KO"),
            ("PepsiCo", "PEP"),
            ("Costco", "COST"),
            ("Netflix", "NFLX"),
            ("Adobe", "ADBE"),
            ("Cisco", "CSCO"),
            ("Intel", "INTC"),
            ("Comcast", "CMCSA"),
            ("Verizon", "VZ"),
            ("AT&T", "T"),
            ("Disney", "DIS"),
            ("McDonald's", "MCD"),
            ("Nike", "NKE"),
            ("Boeing", "BA"),
            ("IBM", "IBM"),
            ("Salesforce", "CRM"),
            ("Oracle", "ORCL"),
            ("PayPal", "PYPL"),
            ("Broadcom", "AVGO"),
            ("Texas Instruments", "TXN"),
            ("Qualcomm", "QCOM"),
            ("AMD", "AMD"),
            ("Starbucks", "SBUX"),
            ("Goldman Sachs", "GS"),
            ("Morgan Stanley", "MS"),
            ("Bank of America", "BAC"),
            ("Wells Fargo", "WFC"),
            ("Citigroup", "C"),
            ("American Express", "AXP"),
        ]
        .into_iter()
        .map(|(name, ticker)| CompanyAlias {
            name: name.to_string(),
            ticker: ticker.to_string(),
        })
        .collect();

        let ticker_names = [
            ("AAPL", "Apple Inc."),
            ("MSFT", "Microsoft Corporation"),
            ("GOOGL", "Alphabet Inc."),
            ("AMZN", "Amazon.com Inc."),
            ("TSLA", "Tesla Inc."),
            ("META", "Meta Platforms Inc."),
            ("NVDA", "NVIDIA Corporation"),
            ("SPY", "S&P 500 ETF"),
        ]
        .into_iter()
        .map(|(t, n)| (t.to_string(), n.to_string()))
        .collect();

        Self {
            cities,
            companies,
            ticker_names,
        }
    }
}

/// Ticker with the number of articles that mentioned one of its aliases.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TickerCount {
    pub ticker: String,
    pub count: usize,
}

/// Precomputed, lowercased view of the reference tables.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    cities: Vec<String>,
    cities_lower: Vec<String>,
    /// Distinct tickers in order of first appearance in the company table.
    tickers: Vec<String>,
    /// (lowercased alias, index into `tickers`)
    aliases_lower: Vec<(String, usize)>,
}

impl KeywordMatcher {
    pub fn new(tables: &KeywordTables) -> Self {
        let mut tickers: Vec<String> = Vec::new();
        let mut aliases_lower = Vec::with_capacity(tables.companies.len());
        for c in &tables.companies {
            let idx = match tickers.iter().position(|t| *t == c.ticker) {
                Some(i) => i,
                None => {
                    tickers.push(c.ticker.clone());
                    tickers.len() - 1
                }
            };
            aliases_lower.push((c.name.to_lowercase(), idx));
        }

        Self {
            cities: tables.cities.clone(),
            cities_lower: tables.cities.iter().map(|c| c.to_lowercase()).collect(),
            tickers,
            aliases_lower,
        }
    }

    /// Up to three most-mentioned cities; `["New York"]` when nothing matches.
    pub fn extract_locations(&self, articles: &[Article]) -> Vec<String> {
        let mut counts = vec![0usize; self.cities.len()];
        for article in articles {
            let text = search_text(article);
            for (i, city) in self.cities_lower.iter().enumerate() {
                if text.contains(city.as_str()) {
                    counts[i] += 1;
                }
            }
        }

        let top: Vec<String> = rank(counts)
            .into_iter()
            .take(MAX_LOCATIONS)
            .map(|(i, _)| self.cities[i].clone())
            .collect();

        if top.is_empty() {
            return vec![DEFAULT_LOCATION.to_string()];
        }
        top
    }

    /// Up to five most-mentioned tickers with their counts; `[SPY: 1]` when nothing matches.
    ///
    /// Aliases of one ticker share a counter, so an article naming both
    /// "Facebook" and "Meta" adds two to META.
    pub fn extract_companies(&self, articles: &[Article]) -> Vec<TickerCount> {
        let mut counts = vec![0usize; self.tickers.len()];
        for article in articles {
            let text = search_text(article);
            for (alias, idx) in &self.aliases_lower {
                if text.contains(alias.as_str()) {
                    counts[*idx] += 1;
                }
            }
        }

        let top: Vec<TickerCount> = rank(counts)
            .into_iter()
            .take(MAX_COMPANIES)
            .map(|(i, count)| TickerCount {
                ticker: self.tickers[i].clone(),
                count,
            })
            .collect();

        if top.is_empty() {
            return vec![TickerCount {
                ticker: DEFAULT_TICKER.to_string(),
                count: 1,
            }];
        }
        top
    }
}

/// Lowercased `headline + " " + description`.
fn search_text(article: &Article) -> String {
    format!(
        "{} {}",
        article.headline,
        article.description.as_deref().unwrap_or_default()
    )
    .to_lowercase()
}

/// Non-zero counters as (table index, count), descending; stable on ties.
fn rank(counts: Vec<usize>) -> Vec<(usize, usize)> {
    let mut ranked: Vec<(usize, usize)> = counts
        .into_iter()
        .enumerate()
        .filter(|(_, c)| *c > 0)
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn matcher() -> KeywordMatcher {
        KeywordMatcher::new(&KeywordTables::built_in())
    }

    fn article(headline: &str, description: Option<&str>) -> Article {
        Article {
            headline: headline.to_string(),
            description: description.map(str::to_string),
            url: "https://example.test/a".to_string(),
            source: "Test".to_string(),
            published_at: Utc::now(),
        }
    }

    #[test]
    fn no_matches_fall_back_to_defaults() {
        let m = matcher();
        let arts = vec![article("Quiet day", Some("nothing to report"))];
        assert_eq!(m.extract_locations(&arts), vec!["New York".to_string()]);
        assert_eq!(
            m.extract_companies(&arts),
            vec![TickerCount {
                ticker: "SPY".into(),
                count: 1
            }]
        );
    }

    #[test]
    fn empty_input_falls_back_to_defaults() {
        let m = matcher();
        assert_eq!(m.extract_locations(&[]), vec!["New York".to_string()]);
        assert_eq!(m.extract_companies(&[])[0].ticker, "SPY");
    }

    #[test]
    fn locations_rank_by_count_and_cap_at_three() {
        let m = matcher();
        let arts = vec![
            article("Storm hits Tokyo", None),
            article("Tokyo and Paris trade talks", None),
            article("London, Paris, Tokyo, Berlin summit", None),
        ];
        let locs = m.extract_locations(&arts);
        assert_eq!(locs.len(), 3);
        assert_eq!(locs[0], "Tokyo");
        assert_eq!(locs[1], "Paris");
        // London and Berlin tie at 1: table order puts London first.
        assert_eq!(locs[2], "London");
    }

    #[test]
    fn one_article_counts_a_city_once() {
        let m = matcher();
        let arts = vec![
            article("Miami Miami Miami", Some("Miami again")),
            article("Denver news", None),
            article("Denver again", None),
        ];
        assert_eq!(m.extract_locations(&arts)[0], "Denver");
    }

    #[test]
    fn matching_is_case_insensitive_and_reads_description() {
        let m = matcher();
        let arts = vec![article("Markets", Some("APPLE opens store in SEATTLE"))];
        assert_eq!(m.extract_locations(&arts), vec!["Seattle".to_string()]);
        assert_eq!(m.extract_companies(&arts)[0].ticker, "AAPL");
    }

    #[test]
    fn aliases_merge_into_one_ticker() {
        let m = matcher();
        let arts = vec![article("Facebook rebrands", Some("Meta shares rise"))];
        let companies = m.extract_companies(&arts);
        let meta: Vec<_> = companies.iter().filter(|c| c.ticker == "META").collect();
        assert_eq!(meta.len(), 1);
        assert_eq!(meta[0].count, 2);
    }

    #[test]
    fn companies_cap_at_five() {
        let m = matcher();
        let arts = vec![article(
            "Apple, Microsoft, Amazon, Tesla, Netflix, Boeing and Disney report",
            None,
        )];
        let companies = m.extract_companies(&arts);
        assert_eq!(companies.len(), 5);
        let tickers: Vec<&str> = companies.iter().map(|c| c.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT", "AMZN", "TSLA", "NFLX"]);
    }

    #[test]
    fn output_is_deterministic() {
        let m = matcher();
        let arts = vec![
            article("Google and Intel in Boston", Some("Oracle, Chicago")),
            article("Chicago Boston Oslo", Some("IBM Visa Nike")),
        ];
        let a = (m.extract_locations(&arts), m.extract_companies(&arts));
        for _ in 0..10 {
            assert_eq!(a, (m.extract_locations(&arts), m.extract_companies(&arts)));
        }
    }

    #[test]
    fn company_name_falls_back_to_ticker() {
        let t = KeywordTables::built_in();
        assert_eq!(t.company_name_for("AAPL"), "Apple Inc.");
        assert_eq!(t.company_name_for("ZZZZ"), "ZZZZ");
    }

    #[test]
    fn cleaned_trims_and_dedups() {
        let raw: KeywordTables = toml::from_str(
            r#"
cities = [" Oslo ", "", "Oslo", "Rome"]
[[companies]]
name = " Apple "
ticker = "AAPL"
[[companies]]
name = ""
ticker = "X"
"#,
        )
        .unwrap();
        let t = raw.cleaned().unwrap();
        assert_eq!(t.cities, vec!["Oslo".to_string(), "Rome".to_string()]);
        assert_eq!(t.companies.len(), 1);
        assert_eq!(t.companies[0].name, "Apple");
    }

    #[test]
    fn empty_tables_are_rejected() {
        let raw: KeywordTables = toml::from_str(
            r#"
cities = []
[[companies]]
name = "Apple"
ticker = "AAPL"
"#,
        )
        .unwrap();
        assert!(raw.cleaned().is_err());
    }
}
