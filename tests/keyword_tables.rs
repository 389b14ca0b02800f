// tests/keyword_tables.rs
use daily_dashboard::keywords::{KeywordMatcher, KeywordTables, ENV_KEYWORDS_CONFIG_PATH};
use std::path::PathBuf;
use std::{env, fs};

mod common;
use common::article;

const SMALL_TABLES: &str = r#"
cities = [" Springfield ", "", "Shelbyville", "Springfield"]

companies = [
  { name = "Duff", ticker = "DUFF" },
  { name = "Duff Beer", ticker = "DUFF" },
  { name = " ", ticker = "NOPE" },
  { name = "Krusty", ticker = "KRST" },
]

[ticker_names]
DUFF = "Duff Brewing Co."
"#;

#[test]
fn toml_tables_are_cleaned_and_drive_the_matcher() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("keywords.toml");
    fs::write(&p, SMALL_TABLES).unwrap();

    let t = KeywordTables::load_from(&p).unwrap();
    assert_eq!(t.cities, vec!["Springfield".to_string(), "Shelbyville".to_string()]);
    assert_eq!(t.companies.len(), 3);
    assert_eq!(t.company_name_for("DUFF"), "Duff Brewing Co.");
    assert_eq!(t.company_name_for("KRST"), "KRST");

    let m = KeywordMatcher::new(&t);
    let arts = vec![
        article("Duff Beer shortage hits Shelbyville", None),
        article("Krusty opens in Shelbyville", Some("Springfield reacts")),
    ];
    assert_eq!(
        m.extract_locations(&arts),
        vec!["Shelbyville".to_string(), "Springfield".to_string()]
    );
    let companies = m.extract_companies(&arts);
    // "Duff" and "Duff Beer" both hit the first article
    assert_eq!(companies[0].ticker, "DUFF");
    assert_eq!(companies[0].count, 2);
    assert_eq!(companies[1].ticker, "KRST");
}

#[test]
fn empty_or_malformed_tables_are_errors() {
    let dir = tempfile::tempdir().unwrap();

    let empty_cities = dir.path().join("empty.toml");
    fs::write(
        &empty_cities,
        r#"
cities = [" "]
companies = [{ name = "Duff", ticker = "DUFF" }]
"#,
    )
    .unwrap();
    assert!(KeywordTables::load_from(&empty_cities).is_err());

    let broken = dir.path().join("broken.toml");
    fs::write(&broken, "cities = [").unwrap();
    assert!(KeywordTables::load_from(&broken).is_err());

    assert!(KeywordTables::load_from(&dir.path().join("missing.toml")).is_err());
}

/// Restores the working directory and clears the keywords env var on drop.
struct EnvRestore {
    cwd: PathBuf,
}

impl Drop for EnvRestore {
    fn drop(&mut self) {
        env::remove_var(ENV_KEYWORDS_CONFIG_PATH);
        let _ = env::set_current_dir(&self.cwd);
    }
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // keep the test away from any config/ in the real working directory
    let tmp = tempfile::tempdir().unwrap();
    let _restore = EnvRestore {
        cwd: env::current_dir().unwrap(),
    };
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_KEYWORDS_CONFIG_PATH);

    // 1) nothing on disk → built-in tables
    let t = KeywordTables::load_default().unwrap();
    assert!(t.cities.iter().any(|c| c == "New York"));
    assert_eq!(t.company_name_for("AAPL"), "Apple Inc.");

    // 2) ./config/keywords.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("keywords.toml"), SMALL_TABLES).unwrap();
    let t = KeywordTables::load_default().unwrap();
    assert_eq!(t.cities[0], "Springfield");

    // 3) env var wins
    let p_env = tmp.path().join("other.toml");
    fs::write(
        &p_env,
        r#"
cities = ["Ogdenville"]
companies = [{ name = "Monorail", ticker = "MONO" }]
"#,
    )
    .unwrap();
    env::set_var(ENV_KEYWORDS_CONFIG_PATH, p_env.display().to_string());
    let t = KeywordTables::load_default().unwrap();
    assert_eq!(t.cities, vec!["Ogdenville".to_string()]);

    // 4) env var pointing nowhere is an error, not a silent fallback
    env::set_var(ENV_KEYWORDS_CONFIG_PATH, tmp.path().join("nope.toml").display().to_string());
    assert!(KeywordTables::load_default().is_err());
}
