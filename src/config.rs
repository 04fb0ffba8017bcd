//! Configuration types for the two pipelines.
//!
//! All download behaviour is controlled through [`FetchConfig`] and all
//! search behaviour through [`SearchConfig`], each built via a builder.
//! Keeping every knob in one struct makes it trivial to share configs,
//! log them, and diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::AcrisError;
use crate::progress::FetchProgress;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default ACRIS host. Overridable so tests and mirrors can point the
/// pipelines at another server.
pub const DEFAULT_BASE_URL: &str = "https://a836-acris.nyc.gov";

/// Browser-like user agent sent on every request. ACRIS serves error pages
/// to clients it does not recognise as browsers.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration for a document download.
///
/// Built via [`FetchConfig::builder()`] or [`FetchConfig::default()`].
///
/// # Example
/// ```rust
/// use acris_scout::FetchConfig;
///
/// let config = FetchConfig::builder()
///     .output_dir("/tmp/deeds")
///     .page_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct FetchConfig {
    /// Scheme + host for all ACRIS endpoints. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Directory the artifact is written to. Default: current directory.
    pub output_dir: PathBuf,

    /// User-agent header for every HTTP request. Default: [`USER_AGENT`].
    pub user_agent: String,

    /// Timeout for the best-effort warm-up request. Default: 10.
    ///
    /// The warm-up only primes the cookie jar; a short timeout keeps a slow
    /// policy endpoint from delaying the real work.
    pub warmup_timeout_secs: u64,

    /// Timeout for the viewer-page (metadata) request. Default: 15.
    pub viewer_timeout_secs: u64,

    /// Timeout for each page-image request. Default: 20.
    ///
    /// Scanned TIFF pages run to several megabytes; this is the longest
    /// HTTP timeout in the pipeline.
    pub page_timeout_secs: u64,

    /// Bodies smaller than this with a non-image content type are treated
    /// as a substituted error page rather than image bytes. Default: 5000.
    ///
    /// Real page scans are never this small; ACRIS error pages always are.
    pub min_image_bytes: usize,

    /// Rendering resolution recorded in the artifact, dots per inch.
    /// Default: 100.
    ///
    /// Controls only the page-box scaling (pixels to points); the image
    /// bytes themselves are embedded unscaled.
    pub resolution_dpi: f32,

    /// Optional per-stage progress callback. Default: none.
    pub progress: Option<Arc<dyn FetchProgress>>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from("."),
            user_agent: USER_AGENT.to_string(),
            warmup_timeout_secs: 10,
            viewer_timeout_secs: 15,
            page_timeout_secs: 20,
            min_image_bytes: 5000,
            resolution_dpi: 100.0,
            progress: None,
        }
    }
}

impl fmt::Debug for FetchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("base_url", &self.base_url)
            .field("output_dir", &self.output_dir)
            .field("warmup_timeout_secs", &self.warmup_timeout_secs)
            .field("viewer_timeout_secs", &self.viewer_timeout_secs)
            .field("page_timeout_secs", &self.page_timeout_secs)
            .field("min_image_bytes", &self.min_image_bytes)
            .field("resolution_dpi", &self.resolution_dpi)
            .field("progress", &self.progress.as_ref().map(|_| "<dyn FetchProgress>"))
            .finish()
    }
}

impl FetchConfig {
    /// Create a new builder for `FetchConfig`.
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`FetchConfig`].
#[derive(Debug)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.config.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn warmup_timeout_secs(mut self, secs: u64) -> Self {
        self.config.warmup_timeout_secs = secs.max(1);
        self
    }

    pub fn viewer_timeout_secs(mut self, secs: u64) -> Self {
        self.config.viewer_timeout_secs = secs.max(1);
        self
    }

    pub fn page_timeout_secs(mut self, secs: u64) -> Self {
        self.config.page_timeout_secs = secs.max(1);
        self
    }

    pub fn min_image_bytes(mut self, bytes: usize) -> Self {
        self.config.min_image_bytes = bytes;
        self
    }

    pub fn resolution_dpi(mut self, dpi: f32) -> Self {
        self.config.resolution_dpi = dpi;
        self
    }

    pub fn progress(mut self, cb: Arc<dyn FetchProgress>) -> Self {
        self.config.progress = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<FetchConfig, AcrisError> {
        let c = &self.config;
        if !c.base_url.starts_with("http://") && !c.base_url.starts_with("https://") {
            return Err(AcrisError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if !(c.resolution_dpi.is_finite() && c.resolution_dpi > 0.0) {
            return Err(AcrisError::InvalidConfig(format!(
                "resolution_dpi must be a positive number, got {}",
                c.resolution_dpi
            )));
        }
        Ok(self.config)
    }
}

/// Configuration for a parcel (borough/block/lot) search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Scheme + host for the BBL form. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// User agent the browser context reports. Default: [`USER_AGENT`].
    pub user_agent: String,

    /// Run Chrome without a visible window. Default: true.
    pub headless: bool,

    /// How long to wait for the results page after submitting. Default: 60.
    pub nav_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: USER_AGENT.to_string(),
            headless: true,
            nav_timeout_secs: 60,
        }
    }
}

impl SearchConfig {
    /// Create a new builder for `SearchConfig`.
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SearchConfig`].
#[derive(Debug)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.config.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn headless(mut self, v: bool) -> Self {
        self.config.headless = v;
        self
    }

    pub fn nav_timeout_secs(mut self, secs: u64) -> Self {
        self.config.nav_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SearchConfig, AcrisError> {
        let c = &self.config;
        if !c.base_url.starts_with("http://") && !c.base_url.starts_with("https://") {
            return Err(AcrisError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        Ok(self.config)
    }
}
