//! Integration tests for cross-module functionality.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use factcheck_scores::analysis::{self, GroupTables, Report};
use factcheck_scores::config::{
    AppConfig, ChartTheme, EnrichmentConfig, RateLimitConfig, ScraperConfig,
};
use factcheck_scores::db::{self, store::DocumentStore};
use factcheck_scores::enrich::images::ImageResolver;
use factcheck_scores::paths::ProjectPaths;
use factcheck_scores::processing::{self, normalize, verdict::classify_verdict};
use factcheck_scores::scrape::browser::HttpBrowser;
use factcheck_scores::scrape::{merge_statements, scrape_new_statements};
use factcheck_scores::table::models::{Score, StatementRecord};
use factcheck_scores::table::parquet::{read_scored, write_statements};

use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rate_limit() -> RateLimitConfig {
    RateLimitConfig {
        requests_per_minute: 600,
        saturation_sleep_ms: 10,
    }
}

fn statement(title: &str, date: &str, author: &str, party: &str, verdict: &str) -> StatementRecord {
    StatementRecord {
        id: StatementRecord::content_id(title, date),
        title: title.to_string(),
        date: date.to_string(),
        source: "Twitter".to_string(),
        read_more_link: String::new(),
        author: author.to_string(),
        party: party.to_string(),
        verdict: verdict.to_string(),
    }
}

// ──────────────────────────────────────────
// Verdict classification
// ──────────────────────────────────────────

#[test]
fn classify_negative_beats_positive() {
    assert_eq!(classify_verdict("Sbagliata, ma ha ragione sul resto"), Score::Negative);
}

#[test]
fn classify_is_case_insensitive() {
    assert_eq!(classify_verdict("CORRETTA"), classify_verdict("corretta"));
    assert_eq!(classify_verdict("Corretta"), Score::Positive);
}

#[test]
fn classify_unknown_is_neutral() {
    assert_eq!(classify_verdict("senza parole chiave"), Score::Neutral);
    assert_eq!(classify_verdict(""), Score::Neutral);
}

// ──────────────────────────────────────────
// Normalization and merge
// ──────────────────────────────────────────

#[test]
fn normalize_output_invariants() {
    let rows = vec![
        statement("a", "3 marzo 2024", "Rossi", "lega", "Vero"),
        statement("b", "giugno 2023", "Bianchi", "partito democratico", "Falso"),
        statement("a", "3 marzo 2024", "Rossi", "lega", "Vero"),
        statement("c", "", " ", "lega", "Vero"),
    ];
    let (scored, stats) = normalize(rows);

    assert_eq!(scored.len(), 2);
    assert_eq!(stats.dropped_duplicate, 1);
    assert_eq!(stats.dropped_incomplete, 1);

    let ids: HashSet<&str> = scored.iter().map(|r| r.statement.id.as_str()).collect();
    assert_eq!(ids.len(), scored.len());
    for pair in scored.windows(2) {
        assert!(pair[0].statement.date >= pair[1].statement.date);
    }
    assert!(scored
        .iter()
        .all(|r| !r.statement.author.is_empty() && !r.statement.party.is_empty()));
}

#[test]
fn merge_never_overwrites_existing() {
    let existing = vec![statement("t", "d", "A", "Lega", "Corretta")];
    let incoming = statement("t", "d", "B", "Lega", "Falsa");
    let merged = merge_statements(existing.clone(), vec![incoming]);
    assert_eq!(merged, existing);
}

// ──────────────────────────────────────────
// HTTP scraper against a mock site
// ──────────────────────────────────────────

fn card(title: &str, date: &str, verdict: Option<&str>) -> String {
    let verdict = verdict
        .map(|v| format!(r#"<h3 class="declaration line-clamp-6 text-white">{v}</h3>"#))
        .unwrap_or_default();
    format!(
        r#"<li class="col-span-4 flex"><article class="card">
        <h4 class="declaration-author">Giuseppe Conte</h4>
        <p class="declaration-date">Movimento 5 Stelle</p>
        <h3 class="declaration">{title}</h3>
        <div class="declaration-date">{date}</div>
        <div class="declaration-fonte">Fonte: Rai 3</div>
        <a class="btn" href="/fact-checking/{slug}">Leggi</a>
        {verdict}
        </article></li>"#,
        slug = title.to_lowercase()
    )
}

fn listing(cards: &[String]) -> String {
    format!("<html><body><ul>{}</ul></body></html>", cards.concat())
}

fn scraper_config(server: &MockServer) -> ScraperConfig {
    ScraperConfig {
        base_url: format!("{}/fact-checking", server.uri()),
        max_cards: 50,
        page_timeout_seconds: 5,
        verdict_timeout_seconds: 5,
        page_delay_ms: 0,
    }
}

#[tokio::test]
async fn http_scraper_pages_and_reveals_verdicts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fact-checking"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[
            card("Alpha", "1 marzo 2024", Some("Vero")),
            card("Beta", "2 marzo 2024", None),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fact-checking"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[
            card("Beta", "2 marzo 2024", None),
            card("Gamma", "3 marzo 2024", Some("Falso")),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fact-checking/beta"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><div class="verdetto"><h3>C'eri quasi</h3></div></body></html>"#,
        ))
        .mount(&server)
        .await;

    let mut browser = HttpBrowser::new(&scraper_config(&server), &rate_limit()).unwrap();
    let rows = scrape_new_statements(&mut browser, &HashSet::new(), 50, Duration::from_secs(5))
        .await
        .unwrap();

    let verdicts: HashMap<&str, &str> = rows
        .iter()
        .map(|r| (r.title.as_str(), r.verdict.as_str()))
        .collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(verdicts["Alpha"], "Vero");
    assert_eq!(verdicts["Beta"], "C'eri quasi");
    assert_eq!(verdicts["Gamma"], "Falso");
    assert!(rows.iter().all(|r| r.source == "Rai 3"));
}

#[tokio::test]
async fn http_scraper_stops_at_max_cards_and_drops_missing_verdicts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fact-checking"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[
            card("Alpha", "1 marzo 2024", Some("Vero")),
            card("Beta", "2 marzo 2024", None),
            card("Gamma", "3 marzo 2024", Some("Falso")),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fact-checking"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[card(
            "Delta",
            "4 marzo 2024",
            Some("Vero"),
        )])))
        .expect(0)
        .mount(&server)
        .await;

    let mut browser = HttpBrowser::new(&scraper_config(&server), &rate_limit()).unwrap();
    let rows = scrape_new_statements(&mut browser, &HashSet::new(), 2, Duration::from_secs(5))
        .await
        .unwrap();

    // Beta has no verdict in the listing and its detail page 404s.
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Alpha");
}

#[tokio::test]
async fn http_scraper_ends_when_pages_repeat() {
    let server = MockServer::start().await;

    // Every page number serves the same two cards.
    Mock::given(method("GET"))
        .and(path("/fact-checking"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[
            card("Alpha", "1 marzo 2024", Some("Vero")),
            card("Beta", "2 marzo 2024", Some("Falso")),
        ])))
        .mount(&server)
        .await;

    let mut browser = HttpBrowser::new(&scraper_config(&server), &rate_limit()).unwrap();
    let rows = tokio::time::timeout(
        Duration::from_secs(10),
        scrape_new_statements(&mut browser, &HashSet::new(), 50, Duration::from_secs(5)),
    )
    .await
    .expect("scrape should finish")
    .unwrap();

    let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta"]);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn http_scraper_ends_on_page_without_new_titles() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fact-checking"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[
            card("Alpha", "1 marzo 2024", Some("Vero")),
            card("Beta", "2 marzo 2024", Some("Falso")),
        ])))
        .mount(&server)
        .await;
    // Same cards in a different order, so the body differs from page 1.
    Mock::given(method("GET"))
        .and(path("/fact-checking"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[
            card("Beta", "2 marzo 2024", Some("Falso")),
            card("Alpha", "1 marzo 2024", Some("Vero")),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fact-checking"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let mut browser = HttpBrowser::new(&scraper_config(&server), &rate_limit()).unwrap();
    let rows = scrape_new_statements(&mut browser, &HashSet::new(), 50, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
}

// ──────────────────────────────────────────
// Image enrichment against a mock wiki
// ──────────────────────────────────────────

fn enrichment_config(server: &MockServer) -> EnrichmentConfig {
    EnrichmentConfig {
        wiki_base_url: server.uri(),
        request_timeout_seconds: 5,
        image_overrides: HashMap::from([(
            "Giorgia Meloni".to_string(),
            "https://images.example.org/meloni.jpg".to_string(),
        )]),
    }
}

#[tokio::test]
async fn image_override_wins_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = ImageResolver::new(&enrichment_config(&server), &rate_limit()).unwrap();
    assert_eq!(
        resolver.fetch_image("Giorgia Meloni").await.as_deref(),
        Some("https://images.example.org/meloni.jpg")
    );
}

#[tokio::test]
async fn image_disambiguation_follows_exact_phrase() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Mario_Rossi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><table id="disambigbox"></table><ul>
            <li><a href="/wiki/Mario_Rossi_(calciatore)">Mario Rossi</a>, calciatore</li>
            <li><a href="/wiki/Mario_Rossi_(politico)">Mario Rossi</a> (1950), politico italiano</li>
            </ul></body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Mario_Rossi_(politico)"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><table class="infobox"><tr><td>
            <img src="//upload.example.org/rossi.jpg"></td></tr></table></body></html>"#,
        ))
        .mount(&server)
        .await;

    let resolver = ImageResolver::new(&enrichment_config(&server), &rate_limit()).unwrap();
    assert_eq!(
        resolver.fetch_image("Mario Rossi").await.as_deref(),
        Some("http://upload.example.org/rossi.jpg")
    );
}

#[tokio::test]
async fn image_missing_infobox_or_page_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wiki/Senza_Foto"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>nessuna immagine</p>"))
        .mount(&server)
        .await;

    let resolver = ImageResolver::new(&enrichment_config(&server), &rate_limit()).unwrap();
    assert_eq!(resolver.fetch_image("Senza Foto").await, None);
    assert_eq!(resolver.fetch_image("Pagina Assente").await, None);
}

// ──────────────────────────────────────────
// Pipeline on disk
// ──────────────────────────────────────────

fn config_for(root: &Path) -> AppConfig {
    let mut config = AppConfig::from_file(Path::new("config/default.toml")).unwrap();
    config.paths.root = root.to_string_lossy().into_owned();
    config
}

#[tokio::test]
async fn pipeline_process_aggregate_sync_analyze() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = config_for(dir.path());
    let paths = ProjectPaths::from_config(&config.paths);

    write_statements(
        &paths.raw_statements(),
        &[
            statement("s1", "10 gennaio 2024", "Matteo Salvini", "lega", "Falsa"),
            statement("s2", "12 gennaio 2024", "Matteo Salvini", "lega", "Corretta"),
            statement("s3", "5 febbraio 2024", "Elly Schlein", "partito democratico", "Corretta"),
            statement("s4", "marzo", "Elly Schlein", "partito democratico", "C'eri quasi"),
        ],
    )
    .unwrap();

    let stats = processing::run(&paths).unwrap();
    assert_eq!(stats.output_rows, 4);
    let scored = read_scored(&paths.scored_statements()).unwrap();
    assert_eq!(scored[0].statement.date, "2024-02-05");
    assert_eq!(scored[3].statement.date, "1900-03-01");

    let tables = analysis::aggregate_tables(&paths).unwrap();
    assert_eq!(tables, GroupTables::from_records(&scored));
    assert_eq!(tables.by_party[0].key, "Partito Democratico");

    let report = Report::from_tables(&tables);
    assert_eq!(report.lowest_author.as_ref().map(|(a, _)| a.as_str()), Some("Matteo Salvini"));

    db::sync(&config, &paths).await.unwrap();
    let store = DocumentStore::open(&paths.database(&config).to_string_lossy())
        .await
        .unwrap();
    let doc = store
        .get(db::store::PARTY_AVERAGES, "partito_democratico")
        .await
        .unwrap()
        .expect("party document");
    assert_eq!(doc["party"], "Partito Democratico");
    assert_eq!(doc["count"], 2);
    assert!(doc.get("normalized_score").is_none());
    store.close().await;

    let (_, files) = analysis::analyze(&config, &paths, ChartTheme::Dark).unwrap();
    assert!(files.iter().all(|f| f.starts_with(dir.path())));
    assert!(files.iter().all(|f| f.exists()));
}
