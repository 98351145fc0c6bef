//! WASM bindings for the filing viewer's validation highlighting
//!
//! The rendered filing lives in an iframe. All anchoring, highlighting and
//! navigation state is held in Rust; JavaScript calls the validation and
//! revision services and hands their responses to [`FilingViewer`].
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { FilingViewer, extractSection } from './pkg/filing_viewer_wasm.js';
//!
//! await init();
//!
//! const viewer = new FilingViewer(iframe);
//! const run = viewer.beginValidation();
//! const response = await validateSection(viewer.plainTextForValidation());
//! const summary = viewer.applyValidationJson(run, JSON.stringify(response));
//! showStatus(summary.message);
//!
//! // later, from the issue list
//! viewer.navigateToIssue(2);
//! ```

pub mod dom_tree;
pub mod logging;
pub mod sections;
pub mod timers;
pub mod viewer;

use wasm_bindgen::prelude::*;

pub use dom_tree::DomTree;
pub use sections::{extract_section_html, merge_section_html, plain_text_of_html};
pub use timers::WindowTimers;
pub use viewer::{FilingViewer, PassSummary, RevisionRequest, ValidationRun};

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::init_logging(tracing::Level::INFO);
    web_sys::console::log_1(&format!("filing-viewer-wasm {} loaded", get_version()).into());
}

/// Change the console log level ("error", "warn", "info", "debug", "trace")
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) {
    logging::init_logging(logging::parse_level(level));
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
