use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalizes a procedure-code token: trimmed, uppercased, no internal whitespace.
pub fn normalize_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Document-local group number joining diagnosis codes to their paragraph.
///
/// Raw values arrive as JSON numbers or strings; both are canonicalized so that
/// `1`, `"1"` and `" 01 "` name the same group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
            let stripped = trimmed.trim_start_matches('0');
            if stripped.is_empty() {
                return Self("0".to_string());
            }
            return Self(stripped.to_string());
        }
        Self(trimmed.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for GroupId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A CPT/HCPCS code listed by a coverage document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcedureCode {
    pub code: String,
    pub description: String,
    /// `hcpc_code_group` the document lists the code under, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
}

impl ProcedureCode {
    pub fn new(code: &str, description: impl Into<String>) -> Self {
        Self {
            code: normalize_code(code),
            description: description.into(),
            group: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<GroupId>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn to_ref(&self) -> ProcedureRef {
        ProcedureRef {
            code: self.code.clone(),
            description: self.description.clone(),
        }
    }
}

/// An ICD-10 code tied to exactly one group of its document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosisCode {
    pub code: String,
    pub description: String,
    pub group: GroupId,
}

impl DiagnosisCode {
    pub fn new(code: &str, description: impl Into<String>, group: impl Into<GroupId>) -> Self {
        Self {
            code: code.trim().to_string(),
            description: description.into(),
            group: group.into(),
        }
    }

    pub fn to_ref(&self) -> DiagnosisRef {
        DiagnosisRef {
            code: self.code.clone(),
            description: self.description.clone(),
        }
    }
}

/// The rationale paragraph of one group. `text` may carry HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupParagraph {
    pub group: GroupId,
    pub text: String,
}

impl GroupParagraph {
    pub fn new(group: impl Into<GroupId>, text: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            text: text.into(),
        }
    }
}

/// Diagnosis code as it appears inside a mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosisRef {
    pub code: String,
    pub description: String,
}

/// Procedure code as it appears inside a reverse mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcedureRef {
    pub code: String,
    pub description: String,
}
