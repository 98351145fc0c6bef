pub mod sections;
pub mod types;

pub use sections::{
    find_section_by_id, is_leaf_section, section_key_for_id, DocumentSection, SectionType,
};
pub use types::{Decision, Issue, QualityScores, Severity, ValidationResult};
