//! Stateful viewer bound to the document shown in the filing iframe
//!
//! Holds the validation session, the navigator's active flash and the
//! document binding in Rust; JavaScript drives the service calls and feeds
//! results back in.

use crate::dom_tree::DomTree;
use crate::timers::WindowTimers;
use serde::Serialize;
use shared_types::ValidationResult;
use span_anchor::{
    plain_text_for_validation, AnchorConfig, AnchorError, HighlightReport, Highlighter, Navigator,
    RevisionTicket, RunTicket, ValidationPhase, ValidationSession, ValidationStatus,
};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlIFrameElement, Node};

fn to_js(err: AnchorError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Handle for one validation run, passed back with its result
#[wasm_bindgen]
pub struct ValidationRun {
    ticket: RunTicket,
}

#[wasm_bindgen]
impl ValidationRun {
    #[wasm_bindgen(getter)]
    pub fn generation(&self) -> f64 {
        self.ticket.generation() as f64
    }
}

/// Handle for one revision request
#[wasm_bindgen]
pub struct RevisionRequest {
    ticket: RevisionTicket,
}

#[wasm_bindgen]
impl RevisionRequest {
    #[wasm_bindgen(getter, js_name = issueIndex)]
    pub fn issue_index(&self) -> usize {
        self.ticket.issue_index
    }
}

/// Summary returned to JavaScript after a highlight pass
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassSummary {
    pub message: String,
    pub approved: bool,
    pub issue_count: usize,
    pub highlighted: Vec<usize>,
    pub unmatched: Vec<usize>,
    pub failed: Vec<usize>,
}

impl PassSummary {
    fn new<N>(message: &str, result: &ValidationResult, report: &HighlightReport<N>) -> Self {
        Self {
            message: message.to_string(),
            approved: result.is_approved(),
            issue_count: result.issues.len(),
            highlighted: report.markers.iter().map(|m| m.issue_index).collect(),
            unmatched: report.unmatched.clone(),
            failed: report.failed.iter().map(|f| f.issue_index).collect(),
        }
    }
}

#[wasm_bindgen]
pub struct FilingViewer {
    tree: DomTree,
    timers: WindowTimers,
    session: ValidationSession,
    navigator: Navigator<Node, i32>,
}

impl FilingViewer {
    fn with_tree(tree: DomTree, config: AnchorConfig) -> Result<Self, AnchorError> {
        let timers = WindowTimers::new(tree.clone())?;
        Ok(Self {
            tree,
            timers,
            session: ValidationSession::new(Highlighter::new(config.clone())),
            navigator: Navigator::new(config),
        })
    }

    /// Complete a run with a parsed result (testable without JsValue)
    pub fn complete_run(
        &mut self,
        run: &ValidationRun,
        result: ValidationResult,
    ) -> Result<PassSummary, AnchorError> {
        self.navigator.cancel_flash(&mut self.tree, &mut self.timers);
        let report = self.session.complete(run.ticket, result, &mut self.tree)?;
        let result = self
            .session
            .result()
            .ok_or_else(|| AnchorError::Mutation("validation result was not stored".to_string()))?;
        Ok(PassSummary::new(self.session.message(), result, &report))
    }
}

#[wasm_bindgen]
impl FilingViewer {
    /// Bind to the document loaded in `iframe` with default settings
    #[wasm_bindgen(constructor)]
    pub fn new(iframe: &HtmlIFrameElement) -> Result<FilingViewer, JsValue> {
        let tree = DomTree::from_iframe(iframe).map_err(to_js)?;
        Self::with_tree(tree, AnchorConfig::default()).map_err(to_js)
    }

    /// Bind with a JSON configuration object; missing fields take defaults
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(iframe: &HtmlIFrameElement, config_json: &str) -> Result<FilingViewer, JsValue> {
        let config = AnchorConfig::from_json(config_json).map_err(to_js)?;
        let tree = DomTree::from_iframe(iframe).map_err(to_js)?;
        Self::with_tree(tree, config).map_err(to_js)
    }

    /// Start a validation run: discards previous results and highlights
    #[wasm_bindgen(js_name = beginValidation)]
    pub fn begin_validation(&mut self) -> ValidationRun {
        self.navigator.cancel_flash(&mut self.tree, &mut self.timers);
        ValidationRun {
            ticket: self.session.begin(&mut self.tree),
        }
    }

    /// Report progress; `step` is 1 to 4
    #[wasm_bindgen(js_name = setPhase)]
    pub fn set_phase(&mut self, run: &ValidationRun, step: u8) -> Result<(), JsValue> {
        let phase = match step {
            1 => ValidationPhase::AnalyzingStructure,
            2 => ValidationPhase::ExtractingContent,
            3 => ValidationPhase::Validating,
            4 => ValidationPhase::ProcessingResults,
            _ => return Err(JsValue::from_str(&format!("Unknown validation step: {}", step))),
        };
        self.session.set_phase(run.ticket, phase).map_err(to_js)
    }

    /// Feed the validation service's JSON response for `run`
    #[wasm_bindgen(js_name = applyValidationJson)]
    pub fn apply_validation_json(&mut self, run: &ValidationRun, json: &str) -> Result<JsValue, JsValue> {
        let result: ValidationResult = serde_json::from_str(json)
            .map_err(|e| JsValue::from_str(&format!("Invalid validation response: {}", e)))?;
        let summary = self.complete_run(run, result).map_err(to_js)?;
        to_js_value(&summary)
    }

    /// Record a failed run; highlighting is not attempted
    #[wasm_bindgen(js_name = failValidation)]
    pub fn fail_validation(&mut self, run: &ValidationRun, message: Option<String>) -> Result<(), JsValue> {
        self.session.fail(run.ticket, message.as_deref()).map_err(to_js)
    }

    #[wasm_bindgen(getter, js_name = statusMessage)]
    pub fn status_message(&self) -> String {
        self.session.message().to_string()
    }

    #[wasm_bindgen(getter, js_name = isValidating)]
    pub fn is_validating(&self) -> bool {
        self.session.is_running()
    }

    /// Percent complete of the current run: the phase's progress while
    /// running, 100 once completed, otherwise 0
    #[wasm_bindgen(getter)]
    pub fn progress(&self) -> u8 {
        match self.session.status() {
            ValidationStatus::Running { phase } => phase.progress(),
            ValidationStatus::Completed => 100,
            _ => 0,
        }
    }

    /// Current status as `{ state, ... }`
    pub fn status(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.session.status())
    }

    /// Current validation result, or `null`
    pub fn result(&self) -> Result<JsValue, JsValue> {
        match self.session.result() {
            Some(result) => to_js_value(result),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = hideMessage)]
    pub fn hide_message(&mut self) {
        self.session.hide_message();
    }

    #[wasm_bindgen(js_name = clearResult)]
    pub fn clear_result(&mut self) {
        self.session.clear_result();
    }

    /// Scroll to and flash the marker for `index`. Returns whether a target
    /// was found.
    #[wasm_bindgen(js_name = navigateToIssue)]
    pub fn navigate_to_issue(&mut self, index: usize) -> Result<bool, JsValue> {
        let issue = self.session.issue(index).map_err(to_js)?;
        let hit = self
            .navigator
            .navigate_to(&mut self.tree, &mut self.timers, issue, index);
        Ok(hit.is_some())
    }

    /// Remove every marker; returns how many were removed
    #[wasm_bindgen(js_name = clearHighlights)]
    pub fn clear_highlights(&mut self) -> usize {
        self.navigator.cancel_flash(&mut self.tree, &mut self.timers);
        self.session.highlighter().clear_highlights(&mut self.tree)
    }

    /// Document text as sent to the validation service
    #[wasm_bindgen(js_name = plainTextForValidation)]
    pub fn plain_text_for_validation(&self) -> String {
        plain_text_for_validation(&self.tree)
    }

    /// Serialized document, for saving
    #[wasm_bindgen(js_name = documentHtml)]
    pub fn document_html(&self) -> Result<String, JsValue> {
        self.tree.to_html().map_err(to_js)
    }

    #[wasm_bindgen(js_name = setEditable)]
    pub fn set_editable(&mut self, editable: bool) -> Result<(), JsValue> {
        if editable {
            self.clear_highlights();
        }
        self.tree.set_editable(editable).map_err(to_js)
    }

    #[wasm_bindgen(getter, js_name = isEditable)]
    pub fn is_editable(&self) -> bool {
        self.tree.is_editable()
    }

    /// Mark a revision as in flight; returns the issue to send as JSON
    #[wasm_bindgen(js_name = beginRevision)]
    pub fn begin_revision(&mut self, index: usize) -> Result<RevisionRequest, JsValue> {
        let ticket = self.session.begin_revision(index).map_err(to_js)?;
        Ok(RevisionRequest { ticket })
    }

    /// The issue a revision request is for, as sent to the revision service
    #[wasm_bindgen(js_name = revisionPayload)]
    pub fn revision_payload(&self, request: &RevisionRequest) -> Result<JsValue, JsValue> {
        let issue = self.session.issue(request.ticket.issue_index).map_err(to_js)?;
        to_js_value(issue)
    }

    /// Record the revision service's answer: pass `revised` on success or
    /// `error` on failure. Returns the message to show.
    #[wasm_bindgen(js_name = finishRevision)]
    pub fn finish_revision(
        &mut self,
        request: &RevisionRequest,
        revised: Option<String>,
        error: Option<String>,
    ) -> Result<String, JsValue> {
        let outcome = match revised {
            Some(text) => Ok(text),
            None => Err(error.unwrap_or_default()),
        };
        self.session
            .finish_revision(request.ticket, outcome)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = isRevising)]
    pub fn is_revising(&self, index: usize) -> bool {
        self.session.is_revising(index)
    }

    #[wasm_bindgen(js_name = revisedText)]
    pub fn revised_text(&self, index: usize) -> Option<String> {
        self.session.revised_text(index).map(str::to_string)
    }
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    const RESPONSE: &str = r#"{
        "quality": {"context_use": 0.5, "guideline_adherence": 0.5, "factuality": 0.5, "clarity": 0.5},
        "decision": "revise",
        "issues": [
            {"span": "본 문서는 초안입니다", "reason": "초안", "suggestion": "삭제", "severity": "high"},
            {"span": "없는 문장입니다만", "reason": "x", "suggestion": "y", "severity": "low"}
        ]
    }"#;

    fn viewer() -> FilingViewer {
        let document = web_sys::window().unwrap().document().unwrap();
        let iframe: HtmlIFrameElement = document.create_element("iframe").unwrap().unchecked_into();
        document.body().unwrap().append_child(&iframe).unwrap();
        let inner = iframe.content_document().unwrap();
        inner
            .body()
            .unwrap()
            .set_inner_html("<p>본 문서는 초안입니다</p><p>공모가격</p>");
        FilingViewer::new(&iframe).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_validation_run_highlights_and_navigates() {
        let mut viewer = viewer();
        let run = viewer.begin_validation();
        assert!(viewer.is_validating());
        assert_eq!(viewer.progress(), 20);
        viewer.set_phase(&run, 3).unwrap();
        assert_eq!(viewer.progress(), 60);

        let result: ValidationResult = serde_json::from_str(RESPONSE).unwrap();
        let summary = viewer.complete_run(&run, result).unwrap();
        assert_eq!(summary.highlighted, vec![0]);
        assert_eq!(summary.unmatched, vec![1]);
        assert!(summary.message.contains("2 issues found"));
        assert_eq!(viewer.progress(), 100);

        assert!(viewer.navigate_to_issue(0).unwrap());
        assert!(!viewer.navigate_to_issue(1).unwrap());
        assert!(viewer.navigate_to_issue(5).is_err());
    }

    #[wasm_bindgen_test]
    fn test_stale_run_rejected() {
        let mut viewer = viewer();
        let old = viewer.begin_validation();
        let _new = viewer.begin_validation();
        let result: ValidationResult = serde_json::from_str(RESPONSE).unwrap();
        assert!(viewer.complete_run(&old, result).is_err());
        assert_eq!(viewer.clear_highlights(), 0);
    }
}
