//! End-to-end acquisition runs with a scripted search backend and a mock image host.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use wiremock::matchers::path;
use wiremock::{Mock, MockServer, ResponseTemplate};

use image_harvest::{create_category_directories, get_image_files};
use image_harvest_cli::acquisition::{HttpClient, ImageHit, ImageSearch};
use image_harvest_cli::config::{HarvestConfig, Recipe};
use image_harvest_cli::pipeline::{
    download_images_for_categories, prepare_dataset, AcquisitionOptions, HarvestContext,
    PrepareOutcome,
};
use image_harvest_cli::progress::{self, ProgressEventKind, ProgressReporter};

/// Search backend returning the same URLs for every term and recording the terms.
struct ScriptedSearch {
    urls: Vec<String>,
    terms: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            terms: Mutex::new(Vec::new()),
        }
    }

    fn terms(&self) -> Vec<String> {
        self.terms.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageSearch for ScriptedSearch {
    async fn search(&self, term: &str, max_images: usize) -> Result<Vec<ImageHit>> {
        self.terms.lock().unwrap().push(term.to_string());
        Ok(self
            .urls
            .iter()
            .take(max_images)
            .map(|u| ImageHit {
                image: u.clone(),
                title: None,
                thumbnail: None,
                url: None,
                width: None,
                height: None,
                source: None,
            })
            .collect())
    }
}

struct FailingSearch;

#[async_trait]
impl ImageSearch for FailingSearch {
    async fn search(&self, term: &str, _max_images: usize) -> Result<Vec<ImageHit>> {
        bail!("search backend refused '{term}'")
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn options() -> AcquisitionOptions {
    let mut opts = HarvestConfig::default().acquisition_options();
    opts.pause = Duration::ZERO;
    opts
}

fn context(search: Arc<dyn ImageSearch>) -> HarvestContext {
    HarvestContext::new(HttpClient::new(Duration::from_secs(4)), search)
}

/// Serves a large PNG, a corrupt "JPEG", and an HTML page without a file suffix.
async fn image_host() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(path("/big.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(png_bytes(1200, 800)),
        )
        .mount(&server)
        .await;
    Mock::given(path("/broken.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/jpeg")
                .set_body_bytes(b"definitely not a jpeg".to_vec()),
        )
        .mount(&server)
        .await;
    Mock::given(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html></html>"),
        )
        .mount(&server)
        .await;
    server
}

fn host_urls(server: &MockServer) -> Vec<String> {
    ["big.png", "broken.jpg", "page"]
        .iter()
        .map(|f| format!("{}/{f}", server.uri()))
        .collect()
}

fn recipe(root: PathBuf, cleanup_on_failure: bool) -> Recipe {
    Recipe {
        name: "birds".to_string(),
        root,
        categories: vec!["bird".to_string(), "forest".to_string()],
        subjects: vec!["photo".to_string(), "sun photo".to_string()],
        model: None,
        cleanup_on_failure,
        max_images: None,
        max_size: None,
    }
}

#[tokio::test]
async fn test_categories_are_downloaded_resized_and_pruned() {
    let server = image_host().await;
    let search = Arc::new(ScriptedSearch::new(host_urls(&server)));
    let (tx, mut rx) = progress::channel();
    let ctx = context(search.clone()).with_progress(ProgressReporter::new(tx));

    let dir = tempfile::tempdir().unwrap();
    let categories = create_category_directories(&["bird"], dir.path()).unwrap();

    let subjects = vec!["photo".to_string()];
    let reports = download_images_for_categories(&ctx, &categories, &subjects, &options())
        .await
        .unwrap();

    assert_eq!(search.terms(), vec!["bird photo"]);
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.category, "bird");
    assert_eq!(report.searches[0].found, 3);
    assert_eq!(report.searches[0].kept, 2);
    assert_eq!(report.downloaded(), 2);
    assert_eq!(report.resize.resized, 1);
    assert_eq!(report.pruned, 1);

    let files = get_image_files(&dir.path().join("bird"));
    assert_eq!(files.len(), 1);
    assert_eq!(image::image_dimensions(&files[0]).unwrap(), (400, 266));

    let mut kinds = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        kinds.push(ev.event);
    }
    assert!(matches!(
        kinds.first(),
        Some(ProgressEventKind::CategoryStarted { searches: 1, .. })
    ));
    assert!(kinds.contains(&ProgressEventKind::UrlsFiltered {
        term: "bird photo".to_string(),
        kept: 2,
        dropped: 1,
    }));
    assert!(kinds.contains(&ProgressEventKind::Pruned {
        category: "bird".to_string(),
        failed: 1,
    }));
    assert!(matches!(
        kinds.last(),
        Some(ProgressEventKind::CategoryCompleted { .. })
    ));
}

#[tokio::test]
async fn test_content_check_can_be_skipped() {
    let server = image_host().await;
    let search = Arc::new(ScriptedSearch::new(host_urls(&server)));
    let ctx = context(search);

    let dir = tempfile::tempdir().unwrap();
    let categories = create_category_directories(&["forest"], dir.path()).unwrap();
    let mut opts = options();
    opts.check_content_type = false;

    let reports = download_images_for_categories(&ctx, &categories, &[], &opts)
        .await
        .unwrap();

    // The HTML page lands as a `.jpg` and is pruned alongside the corrupt JPEG.
    assert_eq!(reports[0].searches[0].term, "forest");
    assert_eq!(reports[0].downloaded(), 3);
    assert_eq!(reports[0].pruned, 2);
    assert_eq!(get_image_files(&dir.path().join("forest")).len(), 1);
}

#[tokio::test]
async fn test_every_subject_is_searched_per_category() {
    let search = Arc::new(ScriptedSearch::new(Vec::new()));
    let ctx = context(search.clone());
    let dir = tempfile::tempdir().unwrap();
    let recipe = recipe(dir.path().join("images"), false);

    let report = prepare_dataset(&ctx, &recipe, &options(), false)
        .await
        .unwrap();

    assert_eq!(
        search.terms(),
        vec![
            "bird photo",
            "bird sun photo",
            "forest photo",
            "forest sun photo"
        ]
    );
    match report.outcome {
        PrepareOutcome::Downloaded { categories } => {
            assert_eq!(categories.len(), 2);
            assert!(categories.iter().all(|c| c.downloaded() == 0));
        }
        PrepareOutcome::AlreadyDownloaded => panic!("expected a download run"),
    }
}

#[tokio::test]
async fn test_prepare_skips_when_images_exist() {
    let dir = tempfile::tempdir().unwrap();
    let recipe = recipe(dir.path().join("images"), false);
    for category in &recipe.categories {
        let cat_dir = recipe.root.join(category);
        std::fs::create_dir_all(&cat_dir).unwrap();
        std::fs::write(cat_dir.join("existing.jpg"), png_bytes(4, 4)).unwrap();
    }

    let ctx = context(Arc::new(FailingSearch));
    let report = prepare_dataset(&ctx, &recipe, &options(), false)
        .await
        .unwrap();
    assert!(matches!(report.outcome, PrepareOutcome::AlreadyDownloaded));
    assert_eq!(report.categories.len(), 2);

    // Forcing a run goes to the search backend again.
    assert!(prepare_dataset(&ctx, &recipe, &options(), true).await.is_err());
    assert!(recipe.root.join("bird").join("existing.jpg").exists());
}

#[tokio::test]
async fn test_failed_prepare_removes_root_when_requested() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("images").join("bear");
    let recipe = recipe(root.clone(), true);

    let ctx = context(Arc::new(FailingSearch));
    let err = prepare_dataset(&ctx, &recipe, &options(), false)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("search backend refused 'bird photo'"));
    assert!(!root.exists());
}

#[tokio::test]
async fn test_failed_prepare_keeps_root_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("images");
    let recipe = recipe(root.clone(), false);

    let ctx = context(Arc::new(FailingSearch));
    assert!(prepare_dataset(&ctx, &recipe, &options(), false)
        .await
        .is_err());
    assert!(root.join("bird").is_dir());
    assert!(root.join("forest").is_dir());
}

/// Fails every search and records which terms were attempted.
struct RefusingSearch {
    terms: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageSearch for RefusingSearch {
    async fn search(&self, term: &str, _max_images: usize) -> Result<Vec<ImageHit>> {
        self.terms.lock().unwrap().push(term.to_string());
        bail!("rate limited on '{term}'")
    }
}

#[tokio::test]
async fn test_failed_search_stops_later_categories() {
    let search = Arc::new(RefusingSearch {
        terms: Mutex::new(Vec::new()),
    });
    let ctx = context(search.clone());
    let dir = tempfile::tempdir().unwrap();
    let categories = create_category_directories(&["bird", "forest"], dir.path()).unwrap();

    let err = download_images_for_categories(&ctx, &categories, &[], &options())
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("rate limited on 'bird'"));
    assert_eq!(*search.terms.lock().unwrap(), vec!["bird".to_string()]);
}
