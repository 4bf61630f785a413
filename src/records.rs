//! Typed records from coverage API article sub-resource rows.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::codes::{DiagnosisCode, GroupId, GroupParagraph, ProcedureCode};
use crate::error::RecordError;
use crate::mapping::{ArticleMapping, MappingOptions, build_article_mapping_with, group_listing};

/// Row of `/v1/data/article/hcpc-code`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HcpcCodeRow {
    pub hcpc_code_id: Option<String>,
    pub long_description: Option<String>,
    pub short_description: Option<String>,
    pub hcpc_code_group: Option<Value>,
}

/// Row of `/v1/data/article/hcpc-code-group`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HcpcCodeGroupRow {
    pub hcpc_code_group: Option<Value>,
    pub paragraph: Option<String>,
}

/// Row of `/v1/data/article/icd10-covered`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Icd10CoveredRow {
    pub icd10_code_id: Option<String>,
    pub description: Option<String>,
    pub icd10_covered_group: Option<Value>,
}

/// Row of `/v1/data/article/icd10-covered-group`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Icd10CoveredGroupRow {
    pub icd10_covered_group: Option<Value>,
    pub paragraph: Option<String>,
}

/// Row of `/v1/data/article/icd10-noncovered`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Icd10NoncoveredRow {
    pub icd10_code_id: Option<String>,
    pub description: Option<String>,
    pub icd10_noncovered_group: Option<Value>,
}

/// Row of `/v1/data/article/icd10-noncovered-group`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Icd10NoncoveredGroupRow {
    pub icd10_noncovered_group: Option<Value>,
    pub paragraph: Option<String>,
}

/// Accepts either a bare array of rows or the API envelope `{"data": [...]}`.
pub fn rows_from_payload<T: DeserializeOwned>(
    kind: &'static str,
    payload: &Value,
) -> Result<Vec<T>, RecordError> {
    let rows = match payload {
        Value::Null => return Ok(Vec::new()),
        Value::Object(obj) => obj.get("data").cloned().unwrap_or(Value::Array(Vec::new())),
        other => other.clone(),
    };
    serde_json::from_value(rows).map_err(|source| RecordError::InvalidPayload { kind, source })
}

/// Rows without a code are skipped; description prefers the long form. The
/// `hcpc_code_group` is optional here, and an empty or unusable value leaves
/// the code ungrouped.
pub fn procedure_codes(rows: &[HcpcCodeRow]) -> Vec<ProcedureCode> {
    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let code = row.hcpc_code_id.as_deref().map(str::trim).unwrap_or("");
            if code.is_empty() {
                return None;
            }
            let description = non_empty(row.long_description.as_deref())
                .or_else(|| non_empty(row.short_description.as_deref()))
                .unwrap_or("");
            let procedure = ProcedureCode::new(code, description);
            Some(
                match group_id("hcpc-code", index, code, row.hcpc_code_group.as_ref()) {
                    Ok(group) => procedure.with_group(group),
                    Err(_) => procedure,
                },
            )
        })
        .collect()
}

pub fn diagnosis_codes(rows: &[Icd10CoveredRow]) -> Result<Vec<DiagnosisCode>, RecordError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let code = row.icd10_code_id.as_deref().unwrap_or("").trim();
            let group = group_id("icd10-covered", index, code, row.icd10_covered_group.as_ref())?;
            Ok(DiagnosisCode::new(
                code,
                row.description.clone().unwrap_or_default(),
                group,
            ))
        })
        .collect()
}

pub fn noncovered_codes(rows: &[Icd10NoncoveredRow]) -> Result<Vec<DiagnosisCode>, RecordError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let code = row.icd10_code_id.as_deref().unwrap_or("").trim();
            let group = group_id(
                "icd10-noncovered",
                index,
                code,
                row.icd10_noncovered_group.as_ref(),
            )?;
            Ok(DiagnosisCode::new(
                code,
                row.description.clone().unwrap_or_default(),
                group,
            ))
        })
        .collect()
}

pub fn group_paragraphs(rows: &[Icd10CoveredGroupRow]) -> Result<Vec<GroupParagraph>, RecordError> {
    paragraphs_of(
        "icd10-covered-group",
        rows.iter()
            .map(|row| (row.icd10_covered_group.as_ref(), row.paragraph.as_deref())),
    )
}

pub fn noncovered_paragraphs(
    rows: &[Icd10NoncoveredGroupRow],
) -> Result<Vec<GroupParagraph>, RecordError> {
    paragraphs_of(
        "icd10-noncovered-group",
        rows.iter()
            .map(|row| (row.icd10_noncovered_group.as_ref(), row.paragraph.as_deref())),
    )
}

pub fn procedure_paragraphs(rows: &[HcpcCodeGroupRow]) -> Result<Vec<GroupParagraph>, RecordError> {
    paragraphs_of(
        "hcpc-code-group",
        rows.iter()
            .map(|row| (row.hcpc_code_group.as_ref(), row.paragraph.as_deref())),
    )
}

fn paragraphs_of<'a>(
    kind: &'static str,
    rows: impl Iterator<Item = (Option<&'a Value>, Option<&'a str>)>,
) -> Result<Vec<GroupParagraph>, RecordError> {
    rows.enumerate()
        .map(|(index, (group, paragraph))| {
            let group = group_id(kind, index, "paragraph", group)?;
            Ok(GroupParagraph::new(group, paragraph.unwrap_or_default()))
        })
        .collect()
}

fn group_id(
    kind: &'static str,
    index: usize,
    code: &str,
    value: Option<&Value>,
) -> Result<GroupId, RecordError> {
    let missing = || RecordError::MissingGroup {
        kind,
        index,
        code: code.to_string(),
    };
    match value {
        None | Some(Value::Null) => Err(missing()),
        Some(Value::Number(n)) => Ok(match n.as_u64() {
            Some(v) => GroupId::from(v),
            None => GroupId::new(n.to_string()),
        }),
        Some(Value::String(s)) if s.trim().is_empty() => Err(missing()),
        Some(Value::String(s)) => Ok(GroupId::new(s)),
        Some(other) => Err(RecordError::InvalidGroup {
            kind,
            index,
            value: other.to_string(),
        }),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Raw sub-resource payloads of one article. `Value::Null` reads as no rows.
#[derive(Debug, Clone, Default)]
pub struct ArticlePayloads {
    pub hcpc_codes: Value,
    pub hcpc_code_groups: Value,
    pub icd10_covered: Value,
    pub icd10_covered_groups: Value,
    pub icd10_noncovered: Value,
    pub icd10_noncovered_groups: Value,
}

/// The code lists of one article: the three the mapping consumes, plus the
/// procedure-code groups and the non-covered diagnosis codes it reports.
#[derive(Debug, Clone, Default)]
pub struct ArticleCodes {
    pub procedure_codes: Vec<ProcedureCode>,
    pub diagnosis_codes: Vec<DiagnosisCode>,
    pub group_paragraphs: Vec<GroupParagraph>,
    pub procedure_paragraphs: Vec<GroupParagraph>,
    pub noncovered_codes: Vec<DiagnosisCode>,
    pub noncovered_paragraphs: Vec<GroupParagraph>,
}

impl ArticleCodes {
    pub fn from_article_payloads(payloads: &ArticlePayloads) -> Result<Self, RecordError> {
        let mut codes = Self::from_payloads(
            &payloads.hcpc_codes,
            &payloads.icd10_covered,
            &payloads.icd10_covered_groups,
        )?;

        let hcpc_group_rows: Vec<HcpcCodeGroupRow> =
            rows_from_payload("hcpc-code-group", &payloads.hcpc_code_groups)?;
        let noncovered_rows: Vec<Icd10NoncoveredRow> =
            rows_from_payload("icd10-noncovered", &payloads.icd10_noncovered)?;
        let noncovered_group_rows: Vec<Icd10NoncoveredGroupRow> =
            rows_from_payload("icd10-noncovered-group", &payloads.icd10_noncovered_groups)?;

        codes.procedure_paragraphs = procedure_paragraphs(&hcpc_group_rows)?;
        codes.noncovered_codes = noncovered_codes(&noncovered_rows)?;
        codes.noncovered_paragraphs = noncovered_paragraphs(&noncovered_group_rows)?;
        Ok(codes)
    }

    pub fn from_payloads(
        hcpc_codes: &Value,
        icd10_covered: &Value,
        icd10_covered_groups: &Value,
    ) -> Result<Self, RecordError> {
        let hcpc_rows: Vec<HcpcCodeRow> = rows_from_payload("hcpc-code", hcpc_codes)?;
        let icd10_rows: Vec<Icd10CoveredRow> = rows_from_payload("icd10-covered", icd10_covered)?;
        let group_rows: Vec<Icd10CoveredGroupRow> =
            rows_from_payload("icd10-covered-group", icd10_covered_groups)?;

        Ok(Self {
            procedure_codes: procedure_codes(&hcpc_rows),
            diagnosis_codes: diagnosis_codes(&icd10_rows)?,
            group_paragraphs: group_paragraphs(&group_rows)?,
            ..Self::default()
        })
    }

    pub fn lists_procedure(&self, code: &str) -> bool {
        self.procedure_codes.iter().any(|p| p.code.eq_ignore_ascii_case(code))
    }

    pub fn lists_diagnosis(&self, code: &str) -> bool {
        self.diagnosis_codes.iter().any(|d| d.code.eq_ignore_ascii_case(code))
    }

    pub fn build(&self, opts: &MappingOptions) -> ArticleMapping {
        let mut mapping = build_article_mapping_with(
            &self.procedure_codes,
            &self.diagnosis_codes,
            &self.group_paragraphs,
            opts,
        );
        mapping.procedure_groups = group_listing(
            &self.procedure_codes,
            |p| p.group.as_ref(),
            ProcedureCode::to_ref,
            &self.procedure_paragraphs,
        );
        mapping.noncovered_icd10 = group_listing(
            &self.noncovered_codes,
            |d| Some(&d.group),
            DiagnosisCode::to_ref,
            &self.noncovered_paragraphs,
        );
        mapping
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_enveloped_and_bare_payloads() {
        let hcpc = json!({"data": [
            {"hcpc_code_id": " 81235 ", "long_description": "", "short_description": "EGFR"},
            {"hcpc_code_id": "", "long_description": "blank"},
            {"hcpc_code_id": "j9271", "long_description": "Pembrolizumab"}
        ]});
        let icd = json!([
            {"icd10_code_id": "C34.10", "description": "Lung cancer", "icd10_covered_group": 1},
            {"icd10_code_id": "C50.911", "description": null, "icd10_covered_group": "2"}
        ]);
        let groups = json!({"data": [
            {"icd10_covered_group": 1, "paragraph": "&lt;p&gt;CPT code 81235&lt;/p&gt;"}
        ]});

        let codes = ArticleCodes::from_payloads(&hcpc, &icd, &groups).unwrap();
        assert_eq!(codes.procedure_codes.len(), 2);
        assert_eq!(codes.procedure_codes[0].description, "EGFR");
        assert_eq!(codes.procedure_codes[1].code, "J9271");
        assert_eq!(codes.diagnosis_codes[1].description, "");
        assert_eq!(codes.diagnosis_codes[0].group, GroupId::new("1"));
        assert!(codes.lists_procedure("j9271"));
        assert!(codes.lists_diagnosis("c34.10"));

        let mapping = codes.build(&MappingOptions::default());
        let egfr = mapping.by_cpt.get("81235").unwrap();
        assert_eq!(egfr.icd10_codes.len(), 2);
        assert_eq!(mapping.by_cpt.get("J9271").unwrap().icd10_codes.len(), 1);
    }

    #[test]
    fn missing_group_fails_at_ingestion() {
        let icd = json!([
            {"icd10_code_id": "C34.10", "description": "Lung cancer", "icd10_covered_group": 1},
            {"icd10_code_id": "C50.911", "description": "Breast cancer"}
        ]);
        let rows: Vec<Icd10CoveredRow> = rows_from_payload("icd10-covered", &icd).unwrap();
        let err = diagnosis_codes(&rows).unwrap_err();
        assert!(matches!(
            err,
            RecordError::MissingGroup { index: 1, ref code, .. } if code == "C50.911"
        ));
    }

    #[test]
    fn unsupported_group_value() {
        let groups = json!([{"icd10_covered_group": [1], "paragraph": "x"}]);
        let rows: Vec<Icd10CoveredGroupRow> =
            rows_from_payload("icd10-covered-group", &groups).unwrap();
        assert!(matches!(
            group_paragraphs(&rows),
            Err(RecordError::InvalidGroup { .. })
        ));
    }

    #[test]
    fn malformed_payload() {
        let err = rows_from_payload::<HcpcCodeRow>("hcpc-code", &json!("nope")).unwrap_err();
        assert!(err.to_string().starts_with("invalid hcpc-code payload"));
    }

    #[test]
    fn article_payloads_carry_groups_and_noncovered_codes() {
        let payloads = ArticlePayloads {
            hcpc_codes: json!({"data": [
                {"hcpc_code_id": "81162", "long_description": "BRCA", "hcpc_code_group": 1},
                {"hcpc_code_id": "81235", "long_description": "EGFR", "hcpc_code_group": "2"},
                {"hcpc_code_id": "J9271", "long_description": "Pembrolizumab", "hcpc_code_group": null}
            ]}),
            hcpc_code_groups: json!({"data": [
                {"hcpc_code_group": 1, "paragraph": "&lt;p&gt;Hereditary cancer testing&lt;/p&gt;"}
            ]}),
            icd10_covered: json!([
                {"icd10_code_id": "Z15.01", "description": "Susceptibility", "icd10_covered_group": 1}
            ]),
            icd10_covered_groups: json!([
                {"icd10_covered_group": 1, "paragraph": "CPT code 81162"}
            ]),
            icd10_noncovered: json!([
                {"icd10_code_id": "Z00.00", "description": "Routine exam", "icd10_noncovered_group": 1},
                {"icd10_code_id": "Z13.89", "description": "Screening", "icd10_noncovered_group": 1}
            ]),
            icd10_noncovered_groups: json!([
                {"icd10_noncovered_group": 1, "paragraph": "Screening is not covered."}
            ]),
        };

        let codes = ArticleCodes::from_article_payloads(&payloads).unwrap();
        assert_eq!(codes.procedure_codes[0].group, Some(GroupId::new("1")));
        assert_eq!(codes.procedure_codes[2].group, None);

        let report = codes.build(&MappingOptions::default());
        assert_eq!(report.by_cpt.get("81162").unwrap().icd10_codes.len(), 1);
        assert!(report.by_cpt.get("81235").unwrap().icd10_codes.is_empty());

        assert_eq!(report.procedure_groups.len(), 2);
        assert_eq!(report.procedure_groups[0].paragraph, "Hereditary cancer testing");
        assert_eq!(report.procedure_groups[0].codes[0].code, "81162");
        assert_eq!(report.procedure_groups[1].group, GroupId::new("2"));
        assert_eq!(report.procedure_groups[1].paragraph, "");

        assert_eq!(report.noncovered_icd10.len(), 1);
        assert_eq!(report.noncovered_icd10[0].codes.len(), 2);
        assert_eq!(report.noncovered_icd10[0].paragraph, "Screening is not covered.");
        assert!(report.unmapped_icd10.is_empty());
    }

    #[test]
    fn absent_payloads_read_as_no_rows() {
        let payloads = ArticlePayloads {
            icd10_noncovered: json!([{"icd10_code_id": "Z00.00", "description": "Exam"}]),
            ..ArticlePayloads::default()
        };
        assert!(matches!(
            ArticleCodes::from_article_payloads(&payloads),
            Err(RecordError::MissingGroup { kind: "icd10-noncovered", .. })
        ));

        let codes = ArticleCodes::from_article_payloads(&ArticlePayloads::default()).unwrap();
        assert!(codes.procedure_codes.is_empty());
        assert!(codes.noncovered_paragraphs.is_empty());
    }
}
