//! Validation run bookkeeping
//!
//! A session owns the result, the status message and the per-issue revision
//! state of the most recent validation run. Starting a run discards all of
//! it and clears the document's highlights; results and revisions that
//! arrive for a superseded run are rejected.

use crate::error::AnchorError;
use crate::highlight::{HighlightReport, Highlighter};
use crate::tree::TextTree;
use serde::Serialize;
use shared_types::{Issue, Severity, ValidationResult};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

pub const DEFAULT_FAILURE_MESSAGE: &str = "An error occurred during validation.";
pub const DEFAULT_REVISION_FAILURE: &str = "Revision failed.";
pub const REVISION_READY: &str = "Revised text is ready.";

/// Progress steps reported while a run is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationPhase {
    AnalyzingStructure,
    ExtractingContent,
    Validating,
    ProcessingResults,
}

impl ValidationPhase {
    pub fn step(&self) -> u8 {
        match self {
            ValidationPhase::AnalyzingStructure => 1,
            ValidationPhase::ExtractingContent => 2,
            ValidationPhase::Validating => 3,
            ValidationPhase::ProcessingResults => 4,
        }
    }

    /// Percent complete when the phase starts
    pub fn progress(&self) -> u8 {
        self.step() * 20
    }

    pub fn message(&self) -> &'static str {
        match self {
            ValidationPhase::AnalyzingStructure => "Analyzing document structure...",
            ValidationPhase::ExtractingContent => "Extracting document content...",
            ValidationPhase::Validating => "Running validation...",
            ValidationPhase::ProcessingResults => "Processing validation results...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum ValidationStatus {
    Idle,
    Running { phase: ValidationPhase },
    Completed,
    Failed { message: String, retryable: bool },
}

/// Identifies one validation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunTicket(u64);

impl RunTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Identifies one revision request for one issue of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevisionTicket {
    generation: u64,
    pub issue_index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationSession {
    highlighter: Highlighter,
    generation: u64,
    status: Option<ValidationStatus>,
    result: Option<ValidationResult>,
    message: String,
    revising: BTreeSet<usize>,
    revised: BTreeMap<usize, String>,
}

impl ValidationSession {
    pub fn new(highlighter: Highlighter) -> Self {
        Self {
            highlighter,
            ..Default::default()
        }
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    pub fn status(&self) -> ValidationStatus {
        self.status.clone().unwrap_or(ValidationStatus::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, Some(ValidationStatus::Running { .. }))
    }

    pub fn result(&self) -> Option<&ValidationResult> {
        self.result.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Start a run. Discards the previous result, message, revisions and
    /// highlights, and invalidates every outstanding ticket.
    pub fn begin<T: TextTree>(&mut self, tree: &mut T) -> RunTicket {
        self.generation += 1;
        self.result = None;
        self.revising.clear();
        self.revised.clear();
        self.highlighter.clear_highlights(tree);

        let phase = ValidationPhase::AnalyzingStructure;
        self.message = phase.message().to_string();
        self.status = Some(ValidationStatus::Running { phase });
        info!(generation = self.generation, "validation started");
        RunTicket(self.generation)
    }

    fn check(&self, ticket: RunTicket) -> Result<(), AnchorError> {
        if ticket.0 != self.generation {
            return Err(AnchorError::StaleRun(ticket.0));
        }
        Ok(())
    }

    pub fn set_phase(&mut self, ticket: RunTicket, phase: ValidationPhase) -> Result<(), AnchorError> {
        self.check(ticket)?;
        self.message = phase.message().to_string();
        self.status = Some(ValidationStatus::Running { phase });
        Ok(())
    }

    /// Accept the validator's result for `ticket`, highlight its issues and
    /// set the summary message
    pub fn complete<T: TextTree>(
        &mut self,
        ticket: RunTicket,
        result: ValidationResult,
        tree: &mut T,
    ) -> Result<HighlightReport<T::Node>, AnchorError> {
        if let Err(e) = self.check(ticket) {
            warn!(generation = ticket.0, current = self.generation, "discarding stale validation result");
            return Err(e);
        }

        let report = self.highlighter.highlight_issues(tree, &result.issues);
        self.message = summary_message(&result);
        self.status = Some(ValidationStatus::Completed);
        info!(
            generation = ticket.0,
            issues = result.issues.len(),
            markers = report.marker_count(),
            "validation complete"
        );
        self.result = Some(result);
        Ok(report)
    }

    /// Record a failed run. Highlighting is not attempted; the run can be
    /// retried by beginning a new one.
    pub fn fail(&mut self, ticket: RunTicket, message: Option<&str>) -> Result<(), AnchorError> {
        self.check(ticket)?;
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_FAILURE_MESSAGE)
            .to_string();
        warn!(generation = ticket.0, %message, "validation failed");
        self.message = message.clone();
        self.status = Some(ValidationStatus::Failed {
            message,
            retryable: true,
        });
        Ok(())
    }

    /// Hide the status message but keep the result for editing
    pub fn hide_message(&mut self) {
        self.message.clear();
    }

    /// Drop the result and message without touching the document
    pub fn clear_result(&mut self) {
        self.result = None;
        self.message.clear();
    }

    pub fn issue(&self, issue_index: usize) -> Result<&Issue, AnchorError> {
        self.result
            .as_ref()
            .and_then(|result| result.issues.get(issue_index))
            .ok_or(AnchorError::UnknownIssue(issue_index))
    }

    /// Mark a revision request for an issue as in flight
    pub fn begin_revision(&mut self, issue_index: usize) -> Result<RevisionTicket, AnchorError> {
        self.issue(issue_index)?;
        self.revising.insert(issue_index);
        Ok(RevisionTicket {
            generation: self.generation,
            issue_index,
        })
    }

    /// Record the revision service's answer. Returns the message to show;
    /// a failed revision is reported, not raised.
    pub fn finish_revision(
        &mut self,
        ticket: RevisionTicket,
        outcome: Result<String, String>,
    ) -> Result<String, AnchorError> {
        if ticket.generation != self.generation {
            return Err(AnchorError::StaleRun(ticket.generation));
        }
        self.revising.remove(&ticket.issue_index);
        match outcome {
            Ok(text) if !text.trim().is_empty() => {
                self.revised.insert(ticket.issue_index, text);
                Ok(REVISION_READY.to_string())
            }
            Ok(_) => Ok(DEFAULT_REVISION_FAILURE.to_string()),
            Err(message) if message.trim().is_empty() => Ok(DEFAULT_REVISION_FAILURE.to_string()),
            Err(message) => {
                warn!(issue_index = ticket.issue_index, %message, "revision failed");
                Ok(message)
            }
        }
    }

    pub fn is_revising(&self, issue_index: usize) -> bool {
        self.revising.contains(&issue_index)
    }

    pub fn revised_text(&self, issue_index: usize) -> Option<&str> {
        self.revised.get(&issue_index).map(String::as_str)
    }

    pub fn revised_texts(&self) -> &BTreeMap<usize, String> {
        &self.revised
    }
}

/// Status line for a finished run
pub fn summary_message(result: &ValidationResult) -> String {
    if result.is_approved() {
        return "Validation complete: no issues found".to_string();
    }
    let total = result.issues.len();
    let high = result.count_by_severity(Severity::High);
    let medium = result.count_by_severity(Severity::Medium);
    if high > 0 {
        format!("Validation complete: {} issues found ({} high)", total, high)
    } else if medium > 0 {
        format!("Validation complete: {} issues found ({} medium)", total, medium)
    } else {
        format!("Validation complete: {} suggestions found", total)
    }
}
