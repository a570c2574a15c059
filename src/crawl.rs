use crate::config::ExtractorConfig;
use crate::error::{ExtractError, SessionError};
use crate::extract::Extractor;
use crate::results::{PageExtraction, PageReport};
use crate::session::WebDriverSession;
use crate::store::DedupStore;
use crate::vision::VisionAnnotator;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Duration, timeout};

/// Starts extracting `urls` and returns a receiver that yields one report per page.
///
/// Up to `max_concurrency` workers each own one WebDriver session, connected
/// lazily when the worker takes its first URL. The channel closes once
/// every worker has drained the queue.
///
/// # Arguments
///
/// * `config` - Extractor configuration
/// * `scope` - Audit scope the dedup store keys records under
/// * `urls` - Pages to extract; repeated URLs are extracted once
pub async fn start(
    config: &ExtractorConfig,
    scope: &str,
    urls: Vec<String>,
    store: Arc<dyn DedupStore>,
    annotator: Option<Arc<dyn VisionAnnotator>>,
) -> mpsc::Receiver<PageReport> {
    ::log::info!("Starting extraction of {} pages", urls.len());

    let mut extractor = Extractor::new(config.clone(), store);
    if let Some(annotator) = annotator {
        extractor = extractor.with_annotator(annotator);
    }

    let (queue_tx, queue_rx) = mpsc::channel::<String>(urls.len().max(1));
    let (result_tx, result_rx) = mpsc::channel::<PageReport>(urls.len().max(1));

    for url in urls {
        if queue_tx.send(url).await.is_err() {
            ::log::error!("Extraction queue closed before all URLs were queued");
            break;
        }
    }
    // Workers stop when the queue is empty and closed
    drop(queue_tx);

    let queue_rx = Arc::new(Mutex::new(queue_rx));
    let visited = Arc::new(Mutex::new(HashSet::new()));
    let scope = Arc::new(scope.to_string());

    for worker_id in 0..config.max_concurrency.max(1) {
        spawn_worker(
            worker_id,
            extractor.clone(),
            Arc::clone(&scope),
            Arc::clone(&queue_rx),
            result_tx.clone(),
            Arc::clone(&visited),
        );
    }

    result_rx
}

/// Spawns a single worker
///
/// Creates an async task that will process URLs from the queue until
/// the queue is empty.
fn spawn_worker(
    worker_id: usize,
    extractor: Extractor,
    scope: Arc<String>,
    queue_rx: Arc<Mutex<mpsc::Receiver<String>>>,
    result_tx: mpsc::Sender<PageReport>,
    visited: Arc<Mutex<HashSet<String>>>,
) {
    ::log::trace!("Spawning worker {}", worker_id);

    tokio::spawn(async move {
        worker_processing_loop(worker_id, &extractor, &scope, &queue_rx, &result_tx, &visited)
            .await;
        ::log::debug!("Worker {} finished", worker_id);
    });
}

/// Main processing loop for a worker
async fn worker_processing_loop(
    worker_id: usize,
    extractor: &Extractor,
    scope: &str,
    queue_rx: &Arc<Mutex<mpsc::Receiver<String>>>,
    result_tx: &mpsc::Sender<PageReport>,
    visited: &Arc<Mutex<HashSet<String>>>,
) {
    let webdriver_url = extractor.config().webdriver_url.clone();
    let mut session: Option<WebDriverSession> = None;

    while let Some(url) = get_next_url(worker_id, queue_rx).await {
        if !mark_url_as_visited(worker_id, &url, visited).await {
            continue;
        }

        // Lazily initialize the WebDriver session
        if session.is_none() {
            ::log::debug!("Worker {} connecting to WebDriver", worker_id);
            match WebDriverSession::connect(&webdriver_url).await {
                Ok(connected) => session = Some(connected),
                Err(e) => {
                    ::log::error!("Worker {} could not connect: {}", worker_id, e);
                    if result_tx.send(PageReport::failed(&url, e)).await.is_err() {
                        break;
                    }
                    continue;
                }
            }
        }
        let Some(current) = session.as_mut() else {
            continue;
        };

        let report = match process_url(worker_id, extractor, current, scope, &url).await {
            Ok(extraction) => PageReport::extracted(&url, extraction),
            Err(e) => {
                ::log::error!("Worker {} failed to extract {}: {}", worker_id, url, e);
                PageReport::failed(&url, e)
            }
        };

        if let Err(e) = result_tx.send(report).await {
            ::log::error!("Worker {} failed to send result: {}", worker_id, e);
            break;
        }
    }

    if let Some(session) = session {
        if let Err(e) = session.close().await {
            ::log::warn!("Worker {} failed to close session: {}", worker_id, e);
        }
    }
}

/// Gets the next URL to process from the queue
async fn get_next_url(
    worker_id: usize,
    queue_rx: &Arc<Mutex<mpsc::Receiver<String>>>,
) -> Option<String> {
    let mut rx = queue_rx.lock().await;
    let url = rx.recv().await;
    match &url {
        Some(url) => ::log::trace!("Worker {} processing: {}", worker_id, url),
        None => ::log::debug!("Worker {} found the queue empty", worker_id),
    }
    url
}

/// Checks if a URL has been visited and marks it as visited if not
async fn mark_url_as_visited(
    worker_id: usize,
    url: &str,
    visited: &Arc<Mutex<HashSet<String>>>,
) -> bool {
    let mut seen = visited.lock().await;
    if !seen.insert(url.to_string()) {
        ::log::trace!("Worker {} skipping already visited: {}", worker_id, url);
        return false;
    }
    true
}

/// Extracts a URL, reconnecting once if the browser session was lost
async fn process_url(
    worker_id: usize,
    extractor: &Extractor,
    session: &mut WebDriverSession,
    scope: &str,
    url: &str,
) -> Result<PageExtraction, ExtractError> {
    let result = extract_url(extractor, session, scope, url).await;
    if !matches!(result, Err(ExtractError::Session(SessionError::SessionLost(_)))) {
        return result;
    }

    ::log::warn!("Worker {} lost its session while extracting {}", worker_id, url);
    attempt_reconnect(worker_id, session, &extractor.config().webdriver_url).await?;
    extract_url(extractor, session, scope, url).await
}

/// Navigates to a URL and extracts it, bounded by the page timeout
async fn extract_url(
    extractor: &Extractor,
    session: &WebDriverSession,
    scope: &str,
    url: &str,
) -> Result<PageExtraction, ExtractError> {
    let limit = extractor.config().page_load_timeout_secs;
    let started = std::time::Instant::now();

    let result = timeout(Duration::from_secs(limit), async {
        session.navigate(url).await?;
        extractor.extract_page(session, scope, None).await
    })
    .await
    .map_err(|_| SessionError::Timeout(limit))?;

    ::log::debug!(
        "Processed {} in {:.2} seconds",
        url,
        started.elapsed().as_secs_f64()
    );
    result
}

/// Replaces the worker's session with a fresh one
async fn attempt_reconnect(
    worker_id: usize,
    session: &mut WebDriverSession,
    webdriver_url: &str,
) -> Result<(), SessionError> {
    ::log::warn!("Worker {} attempting to reconnect WebDriver session", worker_id);
    let fresh = WebDriverSession::connect(webdriver_url).await?;
    *session = fresh;
    ::log::info!("Worker {} successfully reconnected to WebDriver", worker_id);
    Ok(())
}
