//! Search pipeline: drive the BBL form in a real browser, harvest records.
//!
//! The BBL search form refuses plain HTTP automation (its state lives in
//! scripts and the results page is rendered client-side), so this pipeline
//! drives headless Chrome through CDP instead. One browser and one page are
//! launched per search, and both are torn down on every exit path,
//! including fatal errors mid-form; a leaked Chrome process outlives the
//! run otherwise.

use crate::borough::resolve_borough;
use crate::config::SearchConfig;
use crate::error::AcrisError;
use crate::pipeline::extract::{extract_records, DocumentRecord};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Path of the BBL search form.
const FORM_PATH: &str = "/DS/DocumentSearch/BBL";

/// Results land on a URL containing this segment.
const RESULT_URL_MARKER: &str = "DocumentSearch/BBLResult";

/// How long to wait for the borough control to appear after navigation.
const FORM_READY_TIMEOUT: Duration = Duration::from_secs(20);

/// A borough/block/lot triple identifying one tax parcel.
#[derive(Debug, Clone)]
pub struct ParcelQuery {
    /// Free-text borough name, alias, or prefix (resolved via the table).
    pub borough: String,
    pub block: String,
    pub lot: String,
}

impl ParcelQuery {
    pub fn new(
        borough: impl Into<String>,
        block: impl Into<String>,
        lot: impl Into<String>,
    ) -> Self {
        Self {
            borough: borough.into(),
            block: block.into(),
            lot: lot.into(),
        }
    }
}

/// Search ACRIS for documents recorded against a parcel.
///
/// Resolves the borough before touching the browser, drives the search
/// form, waits for the results page, and extracts one record per document
/// row.
///
/// # Errors
/// [`AcrisError::BoroughUnresolved`] before any browser activity;
/// [`AcrisError::Browser`] / [`AcrisError::ResultsTimeout`] from the drive
/// itself. No retries at any stage.
pub async fn search_parcel(
    query: &ParcelQuery,
    config: &SearchConfig,
) -> Result<Vec<DocumentRecord>, AcrisError> {
    let borough_code = resolve_borough(&query.borough).ok_or(AcrisError::BoroughUnresolved {
        input: query.borough.clone(),
    })?;
    info!(
        "Searching parcel borough={} ({}) block={} lot={}",
        borough_code, query.borough, query.block, query.lot
    );

    let (mut browser, mut handler) = Browser::launch(browser_config(config)?)
        .await
        .map_err(cdp)?;

    // The handler task pumps CDP events until the browser goes away.
    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    // Drive the form; whatever happens, the browser is torn down before
    // the result is inspected.
    let markup = drive_form(&browser, borough_code, query, config).await;

    if let Err(e) = browser.close().await {
        warn!("Browser close failed: {e}");
    }
    let _ = browser.wait().await;
    handler_task.abort();

    extract_records(&markup?)
}

/// Fill and submit the BBL form, returning the rendered results markup.
async fn drive_form(
    browser: &Browser,
    borough_code: &str,
    query: &ParcelQuery,
    config: &SearchConfig,
) -> Result<String, AcrisError> {
    let form_url = format!("{}{}", config.base_url, FORM_PATH);

    let page = browser.new_page("about:blank").await.map_err(cdp)?;
    page.goto(&form_url).await.map_err(cdp)?;
    page.wait_for_navigation().await.map_err(cdp)?;
    debug!("BBL form loaded");

    wait_for_element(&page, "select[name='borough']", FORM_READY_TIMEOUT).await?;

    // The borough select only registers through its change event; the code
    // comes from the static table, never from user text.
    page.evaluate(format!(
        "(() => {{ const s = document.querySelector(\"select[name='borough']\"); \
         s.value = '{borough_code}'; \
         s.dispatchEvent(new Event('change', {{ bubbles: true }})); }})()"
    ))
    .await
    .map_err(cdp)?;

    page.find_element("input[name='edt_block']")
        .await
        .map_err(cdp)?
        .click()
        .await
        .map_err(cdp)?
        .type_str(&query.block)
        .await
        .map_err(cdp)?;

    page.find_element("input[name='edt_lot']")
        .await
        .map_err(cdp)?
        .click()
        .await
        .map_err(cdp)?
        .type_str(&query.lot)
        .await
        .map_err(cdp)?;

    // The form wires its submit handler asynchronously; give it a beat.
    tokio::time::sleep(Duration::from_millis(500)).await;

    page.find_element("input[name='Submit2']")
        .await
        .map_err(cdp)?
        .click()
        .await
        .map_err(cdp)?;
    debug!("Form submitted, waiting for results page");

    wait_for_results_url(&page, config.nav_timeout_secs).await?;

    page.content().await.map_err(cdp)
}

/// Poll until the page URL contains the results marker, bounded by the
/// navigation timeout. Timeout is fatal; the driver never retries.
async fn wait_for_results_url(page: &Page, timeout_secs: u64) -> Result<(), AcrisError> {
    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    loop {
        if let Some(url) = page.url().await.map_err(cdp)? {
            if url.contains(RESULT_URL_MARKER) {
                info!("Results page reached: {url}");
                // Let the table finish rendering before the markup is read.
                page.wait_for_navigation().await.ok();
                return Ok(());
            }
        }
        if Instant::now() >= deadline {
            return Err(AcrisError::ResultsTimeout { secs: timeout_secs });
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

/// Poll until a selector matches, bounded by `timeout`.
async fn wait_for_element(
    page: &Page,
    selector: &str,
    timeout: Duration,
) -> Result<(), AcrisError> {
    let deadline = Instant::now() + timeout;
    loop {
        if page.find_element(selector).await.is_ok() {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(AcrisError::Browser {
                detail: format!(
                    "control '{selector}' did not appear within {}s",
                    timeout.as_secs()
                ),
            });
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

fn browser_config(config: &SearchConfig) -> Result<BrowserConfig, AcrisError> {
    let mut builder = BrowserConfig::builder().arg(format!("--user-agent={}", config.user_agent));
    if !config.headless {
        builder = builder.with_head();
    }
    builder
        .build()
        .map_err(|e| AcrisError::Browser { detail: e })
}

fn cdp(e: chromiumoxide::error::CdpError) -> AcrisError {
    AcrisError::Browser {
        detail: e.to_string(),
    }
}
