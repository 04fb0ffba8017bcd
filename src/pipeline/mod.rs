//! Pipeline stages for document download and result extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. feed the retriever scripted pages in tests)
//! without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! docid ──▶ metadata ──▶ retrieve ──▶ assemble        (download pipeline)
//! (token)   (page count)  (TIFF→RGB)   (multi-page PDF)
//!
//! search ──▶ extract                                  (search pipeline)
//! (browser)  (table rows → records)
//! ```
//!
//! 1. [`metadata`] — fetch the viewer page and pull the total page count
//!    out of its percent-encoded embedded state
//! 2. [`retrieve`] — fetch page images in order, stopping at the first
//!    failure and keeping the contiguous prefix
//! 3. [`assemble`] — compose decoded pages into one PDF; runs in
//!    `spawn_blocking` because encoding and writing are CPU-bound
//! 4. [`extract`] — parse the rendered results markup into records

pub mod assemble;
pub mod extract;
pub mod metadata;
pub mod retrieve;
