// tests/pipeline_e2e.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bestseller_harvester::translate::{
    CacheMap, CacheStore, Lang, MemoryStore, ProviderChain, TranslationCache, Translator,
};
use bestseller_harvester::{FailureStage, HarvestSettings, PageFetcher, PipelineRunner, SourceRule};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves canned pages by URL; unknown URLs fail, "slow" URLs hang.
struct StubFetcher {
    pages: HashMap<String, String>,
    slow: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    fn new(pages: &[(&str, String)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(u, p)| (u.to_string(), p.clone()))
                .collect(),
            slow: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.slow.iter().any(|s| s == url) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP 503 for {url}"))
    }
}

struct Counting(Arc<AtomicUsize>);

#[async_trait]
impl Translator for Counting {
    async fn translate(&self, text: &str, target: Lang) -> Result<String> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}({text})", target.code()))
    }
    fn name(&self) -> &'static str {
        "counting"
    }
}

fn rule(source: &str, category: &str, url: &str) -> SourceRule {
    SourceRule {
        source: source.into(),
        category: category.into(),
        endpoint: url.into(),
        item_pattern: r"<li[^>]*>(.*?)</li>".into(),
        brand_pattern: r#"class="brand"[^>]*>(.*?)<"#.into(),
        name_pattern: r#"class="name"[^>]*>(.*?)<"#.into(),
        price_pattern: r#"class="price"[^>]*>([\d,]+)<"#.into(),
        image_pattern: r#"<img[^>]+src="([^"]+)""#.into(),
    }
}

fn page(names: &[&str]) -> String {
    let items: String = names
        .iter()
        .map(|n| {
            format!(
                r#"<li><span class="brand">메디힐</span><span class="name">{n}</span><em class="price">12,900</em></li>"#
            )
        })
        .collect();
    format!("<html><body><ul>{items}</ul></body></html>")
}

fn settings() -> HarvestSettings {
    HarvestSettings {
        fetch_timeout: Duration::from_millis(200),
        ..HarvestSettings::default()
    }
}

fn runner(fetcher: StubFetcher, store: MemoryStore, calls: Arc<AtomicUsize>) -> PipelineRunner {
    let chain = ProviderChain::new(vec![Box::new(Counting(calls))], Duration::from_secs(1));
    let cache = TranslationCache::load(Box::new(store), chain);
    PipelineRunner::new(Arc::new(fetcher), cache, settings())
}

#[tokio::test]
async fn nameless_fragment_is_skipped_without_consuming_rank() {
    let html = r#"<ul>
        <li><span class="brand">A</span><span class="name">첫번째</span></li>
        <li><span class="banner">광고</span></li>
        <li><span class="brand">B</span><span class="name">두번째</span></li>
    </ul>"#
        .to_string();
    let fetcher = StubFetcher::new(&[("https://shop.test/1", html)]);
    let mut r = runner(fetcher, MemoryStore::default(), Arc::new(AtomicUsize::new(0)));

    let run = r.run(&[rule("Shop", "뷰티", "https://shop.test/1")]).await.unwrap();
    let names: Vec<&str> = run.snapshot.rankings.iter().map(|x| x.name.as_str()).collect();
    let ranks: Vec<u32> = run.snapshot.rankings.iter().map(|x| x.rank).collect();
    assert_eq!(names, vec!["첫번째", "두번째"]);
    assert_eq!(ranks, vec![1, 2]);
    assert!(run.failures.is_empty());
}

#[tokio::test]
async fn failed_fetch_is_logged_and_other_rules_survive() {
    let fetcher = StubFetcher::new(&[(
        "https://shop.test/ok",
        page(&["a", "b", "c", "d", "e"]),
    )]);
    let mut r = runner(fetcher, MemoryStore::default(), Arc::new(AtomicUsize::new(0)));

    let run = r
        .run(&[
            rule("Down", "리빙", "https://shop.test/down"),
            rule("Up", "뷰티", "https://shop.test/ok"),
        ])
        .await
        .unwrap();

    assert_eq!(run.snapshot.rankings.len(), 5);
    assert!(run.snapshot.rankings.iter().all(|x| x.source == "Up"));
    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].source, "Down");
    assert_eq!(run.failures[0].stage, FailureStage::Fetch);
}

#[tokio::test]
async fn fetch_timeout_is_a_rule_failure() {
    let mut fetcher = StubFetcher::new(&[
        ("https://shop.test/slow", page(&["x"])),
        ("https://shop.test/ok", page(&["y"])),
    ]);
    fetcher.slow.push("https://shop.test/slow".into());
    let mut r = runner(fetcher, MemoryStore::default(), Arc::new(AtomicUsize::new(0)));

    let run = r
        .run(&[
            rule("Slow", "리빙", "https://shop.test/slow"),
            rule("Ok", "뷰티", "https://shop.test/ok"),
        ])
        .await
        .unwrap();
    assert_eq!(run.snapshot.rankings.len(), 1);
    assert_eq!(run.failures.len(), 1);
    assert!(run.failures[0].message.contains("timed out"));
}

#[tokio::test]
async fn invalid_rule_is_skipped_without_fetching() {
    let fetcher = StubFetcher::new(&[("https://shop.test/ok", page(&["a"]))]);
    let mut bad = rule("Bad", "리빙", "https://shop.test/bad");
    bad.name_pattern = r"(a)(b)".into();
    let fetcher = Arc::new(fetcher);
    let chain = ProviderChain::empty();
    let cache = TranslationCache::load(Box::new(MemoryStore::default()), chain);
    let mut r = PipelineRunner::new(fetcher.clone(), cache, settings());

    let run = r
        .run(&[bad, rule("Ok", "뷰티", "https://shop.test/ok")])
        .await
        .unwrap();
    assert_eq!(run.snapshot.rankings.len(), 1);
    assert_eq!(run.failures[0].stage, FailureStage::Rules);
    assert_eq!(
        *fetcher.calls.lock().unwrap(),
        vec!["https://shop.test/ok".to_string()]
    );
}

#[tokio::test]
async fn all_rules_failing_still_yields_valid_snapshot_and_saves_cache() {
    let store = MemoryStore::default();
    let fetcher = StubFetcher::new(&[]);
    let mut r = runner(fetcher, store.clone(), Arc::new(AtomicUsize::new(0)));

    let run = r
        .run(&[rule("A", "리빙", "https://a.test"), rule("B", "뷰티", "https://b.test")])
        .await
        .unwrap();
    assert!(run.snapshot.rankings.is_empty());
    assert_eq!(run.failures.len(), 2);
    assert_eq!(run.snapshot.fx_rate, 1350);
    assert_eq!(run.snapshot.translation_meta.cache_location, "memory");
    assert!(store.saved_map().is_some(), "cache persisted even when every rule failed");
}

#[tokio::test]
async fn no_rules_is_an_error() {
    let mut r = runner(StubFetcher::new(&[]), MemoryStore::default(), Arc::new(AtomicUsize::new(0)));
    assert!(r.run(&[]).await.is_err());
}

#[tokio::test]
async fn translations_are_deduplicated_across_rules() {
    // Same brand + same product names under two categories.
    let fetcher = StubFetcher::new(&[
        ("https://shop.test/1", page(&["수분크림", "선크림"])),
        ("https://shop.test/2", page(&["선크림", "수분크림"])),
    ]);
    let store = MemoryStore::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut r = runner(fetcher, store.clone(), calls.clone());

    let run = r
        .run(&[
            rule("Shop", "뷰티", "https://shop.test/1"),
            rule("Shop", "리빙", "https://shop.test/2"),
        ])
        .await
        .unwrap();
    assert_eq!(run.snapshot.rankings.len(), 4);

    // Distinct strings: 뷰티, 리빙, 메디힐, 수분크림, 선크림 → 5 × 2 languages.
    assert_eq!(calls.load(Ordering::SeqCst), 10);
    let saved = store.saved_map().unwrap();
    assert_eq!(saved.len(), 5);
    assert_eq!(saved["메디힐"].en, "EN(메디힐)");

    let first = &run.snapshot.rankings[0];
    assert_eq!(first.brand_translations.ja, "JA(메디힐)");
    assert_eq!(first.category_translations.ko, "뷰티");
    assert_eq!(first.price, "12,900");
}

#[tokio::test]
async fn concurrent_fetch_keeps_configuration_order() {
    let fetcher = StubFetcher::new(&[
        ("https://shop.test/1", page(&["a1", "a2"])),
        ("https://shop.test/2", page(&["b1"])),
        ("https://shop.test/3", page(&["c1", "c2", "c3"])),
    ]);
    let chain = ProviderChain::empty();
    let cache = TranslationCache::load(Box::new(MemoryStore::default()), chain);
    let s = HarvestSettings {
        fetch_concurrency: 3,
        max_rank: 2,
        ..settings()
    };
    let mut r = PipelineRunner::new(Arc::new(fetcher), cache, s);

    let run = r
        .run(&[
            rule("A", "x", "https://shop.test/1"),
            rule("B", "y", "https://shop.test/2"),
            rule("C", "z", "https://shop.test/3"),
        ])
        .await
        .unwrap();
    let got: Vec<(String, u32)> = run
        .snapshot
        .rankings
        .iter()
        .map(|x| (x.name.clone(), x.rank))
        .collect();
    assert_eq!(
        got,
        vec![
            ("a1".into(), 1),
            ("a2".into(), 2),
            ("b1".into(), 1),
            ("c1".into(), 1),
            ("c2".into(), 2),
        ]
    );
}

/// Fetch split into two awaits (connect, then body), each `step` long.
struct TwoStageFetcher {
    pages: HashMap<String, (Duration, String)>,
}

#[async_trait]
impl PageFetcher for TwoStageFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<String> {
        let (step, body) = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP 404 for {url}"))?;
        tokio::time::sleep(step).await;
        tokio::time::sleep(step).await;
        Ok(body)
    }
}

struct SlowTranslator;

#[async_trait]
impl Translator for SlowTranslator {
    async fn translate(&self, text: &str, target: Lang) -> Result<String> {
        tokio::time::sleep(Duration::from_millis(60)).await;
        Ok(format!("{}({text})", target.code()))
    }
    fn name(&self) -> &'static str {
        "slow"
    }
}

#[tokio::test]
async fn concurrent_fetch_finishes_while_translations_are_slow() {
    // Rule A's assembly (several 60ms translations) outlasts rule B's
    // fetch budget; B's fetch must keep running meanwhile.
    let fetcher = TwoStageFetcher {
        pages: HashMap::from([
            ("https://a.test".to_string(), (Duration::from_millis(25), page(&["a1", "a2"]))),
            ("https://b.test".to_string(), (Duration::from_millis(80), page(&["b1"]))),
        ]),
    };
    let chain = ProviderChain::new(vec![Box::new(SlowTranslator)], Duration::from_secs(1));
    let cache = TranslationCache::load(Box::new(MemoryStore::default()), chain);
    let s = HarvestSettings {
        fetch_timeout: Duration::from_millis(300),
        fetch_concurrency: 2,
        ..HarvestSettings::default()
    };
    let mut r = PipelineRunner::new(Arc::new(fetcher), cache, s);

    let run = r
        .run(&[rule("A", "x", "https://a.test"), rule("B", "y", "https://b.test")])
        .await
        .unwrap();
    assert!(run.failures.is_empty(), "unexpected failures: {:?}", run.failures);
    let names: Vec<&str> = run.snapshot.rankings.iter().map(|x| x.name.as_str()).collect();
    assert_eq!(names, vec!["a1", "a2", "b1"]);
}

/// Loads nothing and refuses every write.
struct FailingStore;

impl CacheStore for FailingStore {
    fn load(&self) -> CacheMap {
        CacheMap::new()
    }
    fn save(&self, _map: &CacheMap) -> Result<()> {
        Err(anyhow!("disk full"))
    }
    fn location(&self) -> String {
        "failing".into()
    }
}

#[tokio::test]
async fn cache_save_failure_still_returns_snapshot() {
    let fetcher = StubFetcher::new(&[("https://shop.test/1", page(&["수분크림", "선크림"]))]);
    let chain = ProviderChain::new(
        vec![Box::new(Counting(Arc::new(AtomicUsize::new(0))))],
        Duration::from_secs(1),
    );
    let cache = TranslationCache::load(Box::new(FailingStore), chain);
    let mut r = PipelineRunner::new(Arc::new(fetcher), cache, settings());

    let run = r
        .run(&[rule("Shop", "뷰티", "https://shop.test/1")])
        .await
        .expect("a failed cache save is not fatal");
    assert_eq!(run.snapshot.rankings.len(), 2);
    assert!(run.failures.is_empty());
    assert_eq!(run.snapshot.rankings[0].name_translations.en, "EN(수분크림)");
    assert_eq!(run.snapshot.translation_meta.cache_location, "failing");
}
