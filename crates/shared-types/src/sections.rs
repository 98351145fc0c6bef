//! Table-of-contents model for a registration statement
//!
//! A filing is split into parts (`section1`..`section6` in the version store),
//! each of which may contain `section-1` / `section-2` subdivisions. Only leaf
//! sections are edited and validated independently.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Section key used when an id cannot be resolved
pub const DEFAULT_SECTION_KEY: &str = "section1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionType {
    #[serde(rename = "part")]
    Part,
    #[serde(rename = "section-1")]
    Section1,
    #[serde(rename = "section-2")]
    Section2,
}

impl SectionType {
    /// Class name the rendered HTML uses for this subdivision
    pub fn class_name(&self) -> &'static str {
        match self {
            SectionType::Part => "part",
            SectionType::Section1 => "section-1",
            SectionType::Section2 => "section-2",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "part" => Some(SectionType::Part),
            "section-1" => Some(SectionType::Section1),
            "section-2" => Some(SectionType::Section2),
            _ => None,
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSection {
    pub id: String,
    pub title: String,
    pub section_key: String, // Maps to the version store's section1..section6
    #[serde(rename = "type")]
    pub section_type: SectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentSection>,
}

impl DocumentSection {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Depth-first search for a section by id
pub fn find_section_by_id<'a>(
    sections: &'a [DocumentSection],
    id: &str,
) -> Option<&'a DocumentSection> {
    for section in sections {
        if section.id == id {
            return Some(section);
        }
        if let Some(found) = find_section_by_id(&section.children, id) {
            return Some(found);
        }
    }
    None
}

/// A missing section is never editable
pub fn is_leaf_section(section: Option<&DocumentSection>) -> bool {
    section.map(DocumentSection::is_leaf).unwrap_or(false)
}

/// Version-store key for a section id, falling back to [`DEFAULT_SECTION_KEY`]
pub fn section_key_for_id(sections: &[DocumentSection], id: &str) -> String {
    find_section_by_id(sections, id)
        .map(|section| section.section_key.clone())
        .unwrap_or_else(|| DEFAULT_SECTION_KEY.to_string())
}
