//! Procedure -> diagnosis mapping assembled from one document's code lists.
//!
//! The coverage API never links a procedure code to a diagnosis code directly.
//! Each diagnosis code names a group, each group has a paragraph, and the
//! paragraph mentions the procedure codes it applies to. The builder extracts
//! those references per group and fans the group's diagnosis codes out to them.
//! A group whose paragraph resolves to no known procedure code goes through the
//! [`FallbackPolicy`].

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::codes::{DiagnosisCode, DiagnosisRef, GroupId, GroupParagraph, ProcedureCode, ProcedureRef};
use crate::extract::{CodeReference, ExtractOptions, extract_codes_with};
use crate::html;

/// What to do with a group whose paragraph names no known procedure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Attach the group's diagnosis codes to every procedure code of the
    /// document. Broad, but no diagnosis code is ever dropped.
    AllProcedureCodes,
    /// Leave the group's diagnosis codes unattached; they are reported in
    /// [`ArticleMapping::unmapped_icd10`].
    NoAssociation,
}

pub const DEFAULT_FALLBACK_POLICY: FallbackPolicy = FallbackPolicy::AllProcedureCodes;

impl Default for FallbackPolicy {
    fn default() -> Self {
        DEFAULT_FALLBACK_POLICY
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MappingOptions {
    pub fallback: FallbackPolicy,
    pub extract: ExtractOptions,
}

/// Entries that know their own key.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Insertion-ordered map keyed by code. Serializes as a JSON object in
/// insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeMap<V> {
    entries: Vec<V>,
    index: HashMap<String, usize>,
}

impl<V> Default for CodeMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V: Keyed> CodeMap<V> {
    pub fn get(&self, code: &str) -> Option<&V> {
        self.index.get(code).map(|&i| &self.entries[i])
    }

    pub fn contains_key(&self, code: &str) -> bool {
        self.index.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Keyed::key)
    }

    /// Inserts unless the key exists; returns the slot either way.
    fn entry_or_insert_with(&mut self, code: &str, make: impl FnOnce() -> V) -> usize {
        if let Some(&i) = self.index.get(code) {
            return i;
        }
        let i = self.entries.len();
        self.entries.push(make());
        self.index.insert(code.to_string(), i);
        i
    }
}

impl<'a, V> IntoIterator for &'a CodeMap<V> {
    type Item = &'a V;
    type IntoIter = std::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<V: Keyed + Serialize> Serialize for CodeMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(entry.key(), entry)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcedureEntry {
    pub code: String,
    pub description: String,
    pub icd10_codes: Vec<DiagnosisRef>,
}

impl Keyed for ProcedureEntry {
    fn key(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReverseEntry {
    pub code: String,
    pub description: String,
    pub cpt_codes: Vec<ProcedureRef>,
}

impl Keyed for ReverseEntry {
    fn key(&self) -> &str {
        &self.code
    }
}

/// Procedure code -> diagnosis codes.
pub type Mapping = CodeMap<ProcedureEntry>;

/// Diagnosis code -> procedure codes.
pub type ReverseMapping = CodeMap<ReverseEntry>;

impl Mapping {
    /// Every diagnosis code attached under at least one key.
    pub fn diagnosis_union(&self) -> HashSet<&str> {
        self.entries
            .iter()
            .flat_map(|e| e.icd10_codes.iter().map(|d| d.code.as_str()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The paragraph named at least one known procedure code.
    Resolved,
    /// Nothing usable was extracted; the fallback policy applied.
    Fallback,
}

/// How one group was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupResolution {
    pub group: GroupId,
    /// Decoded, tag-free paragraph text.
    pub paragraph: String,
    pub extracted_codes: Vec<CodeReference>,
    /// Extracted codes that exist in the document's procedure-code list.
    pub resolved_codes: Vec<CodeReference>,
    pub resolution: Resolution,
    pub icd10_codes: Vec<DiagnosisRef>,
}

/// Codes listed under one group, with the group's paragraph as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeGroup<R> {
    pub group: GroupId,
    pub paragraph: String,
    pub codes: Vec<R>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleMapping {
    pub by_cpt: Mapping,
    pub groups: Vec<GroupResolution>,
    /// Diagnosis codes attached to no procedure code.
    pub unmapped_icd10: Vec<DiagnosisRef>,
    /// `hcpc-code-group` listing; reported only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub procedure_groups: Vec<CodeGroup<ProcedureRef>>,
    /// `icd10-noncovered` listing; never attached to procedure codes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub noncovered_icd10: Vec<CodeGroup<DiagnosisRef>>,
}

pub fn build_mapping(
    procedure_codes: &[ProcedureCode],
    diagnosis_codes: &[DiagnosisCode],
    group_paragraphs: &[GroupParagraph],
) -> Mapping {
    build_mapping_with(
        procedure_codes,
        diagnosis_codes,
        group_paragraphs,
        &MappingOptions::default(),
    )
}

pub fn build_mapping_with(
    procedure_codes: &[ProcedureCode],
    diagnosis_codes: &[DiagnosisCode],
    group_paragraphs: &[GroupParagraph],
    opts: &MappingOptions,
) -> Mapping {
    build_article_mapping_with(procedure_codes, diagnosis_codes, group_paragraphs, opts).by_cpt
}

pub fn build_article_mapping(
    procedure_codes: &[ProcedureCode],
    diagnosis_codes: &[DiagnosisCode],
    group_paragraphs: &[GroupParagraph],
) -> ArticleMapping {
    build_article_mapping_with(
        procedure_codes,
        diagnosis_codes,
        group_paragraphs,
        &MappingOptions::default(),
    )
}

pub fn build_article_mapping_with(
    procedure_codes: &[ProcedureCode],
    diagnosis_codes: &[DiagnosisCode],
    group_paragraphs: &[GroupParagraph],
    opts: &MappingOptions,
) -> ArticleMapping {
    let mut builder = Builder::new(procedure_codes);

    let mut paragraphs: HashMap<&GroupId, &str> = HashMap::new();
    for p in group_paragraphs {
        paragraphs.entry(&p.group).or_insert(p.text.as_str());
    }

    let mut groups = Vec::new();
    for (group, members) in partition_by_group(diagnosis_codes) {
        let text = paragraphs.get(group).copied().unwrap_or_default();
        let resolution = builder.resolve_group(group, text, &members, opts);
        groups.push(resolution);
    }

    // Paragraphs with no diagnosis codes still show up in the report.
    let mut reported: HashSet<GroupId> = groups.iter().map(|g| g.group.clone()).collect();
    for p in group_paragraphs {
        if !reported.insert(p.group.clone()) {
            continue;
        }
        let extracted = extract_codes_with(&p.text, &opts.extract);
        let resolved = builder.known(&extracted);
        groups.push(GroupResolution {
            group: p.group.clone(),
            paragraph: html::plain_text(&p.text),
            resolution: resolution_for(&resolved),
            extracted_codes: extracted,
            resolved_codes: resolved,
            icd10_codes: Vec::new(),
        });
    }

    let by_cpt = builder.finish();
    let attached = by_cpt.diagnosis_union();
    let mut unmapped_seen = HashSet::new();
    let unmapped_icd10 = diagnosis_codes
        .iter()
        .filter(|d| !attached.contains(d.code.as_str()))
        .filter(|d| unmapped_seen.insert(d.code.as_str()))
        .map(DiagnosisCode::to_ref)
        .collect();

    ArticleMapping {
        by_cpt,
        groups,
        unmapped_icd10,
        procedure_groups: Vec::new(),
        noncovered_icd10: Vec::new(),
    }
}

/// Lists `items` under their groups, paired with each group's paragraph.
///
/// Groups come in order of first appearance among `items`, followed by groups
/// that only have a paragraph. Items without a group are left out.
pub fn group_listing<'a, T, R>(
    items: &'a [T],
    group_of: impl Fn(&'a T) -> Option<&'a GroupId>,
    to_ref: impl Fn(&T) -> R,
    paragraphs: &[GroupParagraph],
) -> Vec<CodeGroup<R>> {
    let mut texts: HashMap<&GroupId, &str> = HashMap::new();
    for p in paragraphs {
        texts.entry(&p.group).or_insert(p.text.as_str());
    }

    let mut listing: Vec<CodeGroup<R>> = partition_by(items, group_of)
        .into_iter()
        .map(|(group, members)| CodeGroup {
            group: group.clone(),
            paragraph: html::plain_text(texts.get(group).copied().unwrap_or_default()),
            codes: members.into_iter().map(&to_ref).collect(),
        })
        .collect();

    let mut listed: HashSet<GroupId> = listing.iter().map(|g| g.group.clone()).collect();
    for p in paragraphs {
        if listed.insert(p.group.clone()) {
            listing.push(CodeGroup {
                group: p.group.clone(),
                paragraph: html::plain_text(&p.text),
                codes: Vec::new(),
            });
        }
    }
    listing
}

/// Diagnosis code -> procedure codes view of a mapping, ordered by first
/// appearance.
pub fn reverse_mapping(mapping: &Mapping) -> ReverseMapping {
    let mut reverse = ReverseMapping::default();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for entry in mapping {
        for dx in &entry.icd10_codes {
            let slot = reverse.entry_or_insert_with(&dx.code, || ReverseEntry {
                code: dx.code.clone(),
                description: dx.description.clone(),
                cpt_codes: Vec::new(),
            });
            if seen.insert((dx.code.clone(), entry.code.clone())) {
                reverse.entries[slot].cpt_codes.push(ProcedureRef {
                    code: entry.code.clone(),
                    description: entry.description.clone(),
                });
            }
        }
    }
    reverse
}

fn partition_by_group(diagnosis_codes: &[DiagnosisCode]) -> Vec<(&GroupId, Vec<&DiagnosisCode>)> {
    partition_by(diagnosis_codes, |dx| Some(&dx.group))
}

/// Groups in order of first appearance, members in input order.
fn partition_by<'a, T>(
    items: &'a [T],
    group_of: impl Fn(&'a T) -> Option<&'a GroupId>,
) -> Vec<(&'a GroupId, Vec<&'a T>)> {
    let mut order: HashMap<&GroupId, usize> = HashMap::new();
    let mut out: Vec<(&GroupId, Vec<&T>)> = Vec::new();
    for item in items {
        let Some(group) = group_of(item) else {
            continue;
        };
        let slot = *order.entry(group).or_insert_with(|| {
            out.push((group, Vec::new()));
            out.len() - 1
        });
        out[slot].1.push(item);
    }
    out
}

fn resolution_for(resolved: &[CodeReference]) -> Resolution {
    if resolved.is_empty() {
        Resolution::Fallback
    } else {
        Resolution::Resolved
    }
}

struct Builder {
    mapping: Mapping,
    /// Diagnosis codes already attached, per mapping slot.
    attached: Vec<HashSet<String>>,
}

impl Builder {
    /// One slot per distinct code. Blank codes name nothing and get no slot, so
    /// a list of only blank codes maps like an empty list.
    fn new(procedure_codes: &[ProcedureCode]) -> Self {
        let mut mapping = Mapping::default();
        for pc in procedure_codes {
            if pc.code.is_empty() {
                continue;
            }
            mapping.entry_or_insert_with(&pc.code, || ProcedureEntry {
                code: pc.code.clone(),
                description: pc.description.clone(),
                icd10_codes: Vec::new(),
            });
        }
        let attached = vec![HashSet::new(); mapping.len()];
        Self { mapping, attached }
    }

    fn known(&self, extracted: &[CodeReference]) -> Vec<CodeReference> {
        extracted
            .iter()
            .filter(|code| self.mapping.contains_key(code.as_str()))
            .cloned()
            .collect()
    }

    fn resolve_group(
        &mut self,
        group: &GroupId,
        text: &str,
        members: &[&DiagnosisCode],
        opts: &MappingOptions,
    ) -> GroupResolution {
        let extracted = extract_codes_with(text, &opts.extract);
        let resolved = self.known(&extracted);
        let resolution = resolution_for(&resolved);

        match resolution {
            Resolution::Resolved => {
                tracing::debug!(
                    "group {} resolved to {} of {} extracted codes",
                    group,
                    resolved.len(),
                    extracted.len()
                );
                for code in &resolved {
                    if let Some(&slot) = self.mapping.index.get(code) {
                        self.attach(slot, members);
                    }
                }
            }
            Resolution::Fallback => {
                tracing::debug!(
                    "group {} extracted no known codes ({} candidates); fallback={:?}",
                    group,
                    extracted.len(),
                    opts.fallback
                );
                if opts.fallback == FallbackPolicy::AllProcedureCodes {
                    for slot in 0..self.mapping.len() {
                        self.attach(slot, members);
                    }
                }
            }
        }

        GroupResolution {
            group: group.clone(),
            paragraph: html::plain_text(text),
            extracted_codes: extracted,
            resolved_codes: resolved,
            resolution,
            icd10_codes: members.iter().map(|d| d.to_ref()).collect(),
        }
    }

    fn attach(&mut self, slot: usize, members: &[&DiagnosisCode]) {
        let seen = &mut self.attached[slot];
        let entry = &mut self.mapping.entries[slot];
        for dx in members {
            if seen.insert(dx.code.clone()) {
                entry.icd10_codes.push(dx.to_ref());
            }
        }
    }

    fn finish(self) -> Mapping {
        self.mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn procedures() -> Vec<ProcedureCode> {
        vec![
            ProcedureCode::new("81162", "BRCA1&2 seq & full dup/del"),
            ProcedureCode::new("81235", "EGFR gene analysis"),
        ]
    }

    fn codes_of(entry: &ProcedureEntry) -> Vec<&str> {
        entry.icd10_codes.iter().map(|d| d.code.as_str()).collect()
    }

    #[test]
    fn resolved_group_is_restricted() {
        let dx = vec![
            DiagnosisCode::new("C34.10", "Lung cancer", "1"),
            DiagnosisCode::new("C50.911", "Breast cancer", "2"),
        ];
        let paragraphs = vec![
            GroupParagraph::new("1", "<p>CPT code 81235 is covered for:</p>"),
            GroupParagraph::new("2", "<p>CPT code 81162 is covered for:</p>"),
        ];
        let mapping = build_mapping(&procedures(), &dx, &paragraphs);

        assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["81162", "81235"]);
        assert_eq!(codes_of(mapping.get("81235").unwrap()), vec!["C34.10"]);
        assert_eq!(codes_of(mapping.get("81162").unwrap()), vec!["C50.911"]);
    }

    #[test]
    fn missing_paragraph_falls_back() {
        let dx = vec![DiagnosisCode::new("Z15.01", "Genetic susceptibility", "7")];
        let report = build_article_mapping(&procedures(), &dx, &[]);

        for entry in &report.by_cpt {
            assert_eq!(codes_of(entry), vec!["Z15.01"]);
        }
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].resolution, Resolution::Fallback);
        assert!(report.unmapped_icd10.is_empty());
    }

    #[test]
    fn unknown_references_are_discarded() {
        let dx = vec![DiagnosisCode::new("C34.10", "Lung cancer", "1")];
        let paragraphs = vec![GroupParagraph::new("1", "CPT codes 99999, 81235")];
        let report = build_article_mapping(&procedures(), &dx, &paragraphs);

        assert_eq!(report.groups[0].extracted_codes, vec!["99999", "81235"]);
        assert_eq!(report.groups[0].resolved_codes, vec!["81235"]);
        assert!(report.by_cpt.get("99999").is_none());
        assert!(report.by_cpt.get("81162").unwrap().icd10_codes.is_empty());
    }

    #[test]
    fn only_unknown_references_trigger_fallback() {
        let dx = vec![DiagnosisCode::new("C34.10", "Lung cancer", "1")];
        let paragraphs = vec![GroupParagraph::new("1", "CPT code 99999")];
        let mapping = build_mapping(&procedures(), &dx, &paragraphs);

        assert_eq!(mapping.len(), 2);
        assert!(mapping.iter().all(|e| codes_of(e) == vec!["C34.10"]));
    }

    #[test]
    fn no_association_policy_reports_unmapped() {
        let dx = vec![
            DiagnosisCode::new("C34.10", "Lung cancer", "1"),
            DiagnosisCode::new("C50.911", "Breast cancer", "2"),
        ];
        let paragraphs = vec![
            GroupParagraph::new("1", "CPT code 81235"),
            GroupParagraph::new("2", "Covered when medically necessary."),
        ];
        let opts = MappingOptions {
            fallback: FallbackPolicy::NoAssociation,
            ..MappingOptions::default()
        };
        let report = build_article_mapping_with(&procedures(), &dx, &paragraphs, &opts);

        assert_eq!(codes_of(report.by_cpt.get("81235").unwrap()), vec!["C34.10"]);
        assert!(report.by_cpt.get("81162").unwrap().icd10_codes.is_empty());
        assert_eq!(report.unmapped_icd10.len(), 1);
        assert_eq!(report.unmapped_icd10[0].code, "C50.911");
    }

    #[test]
    fn diagnosis_codes_are_unique_per_entry() {
        let dx = vec![
            DiagnosisCode::new("C34.10", "Lung cancer", "1"),
            DiagnosisCode::new("C34.10", "Lung cancer", "2"),
            DiagnosisCode::new("C34.10", "Lung cancer", "1"),
        ];
        let paragraphs = vec![
            GroupParagraph::new("1", "CPT code 81235"),
            GroupParagraph::new("2", "CPT codes 81235 and 81162"),
        ];
        let mapping = build_mapping(&procedures(), &dx, &paragraphs);

        assert_eq!(codes_of(mapping.get("81235").unwrap()), vec!["C34.10"]);
        assert_eq!(codes_of(mapping.get("81162").unwrap()), vec!["C34.10"]);
    }

    #[test]
    fn duplicate_procedure_codes_keep_first() {
        let procedures = vec![
            ProcedureCode::new("81235", "first"),
            ProcedureCode::new("81235 ", "second"),
            ProcedureCode::new("", "blank"),
        ];
        let mapping = build_mapping(&procedures, &[], &[]);
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("81235").unwrap().description, "first");
    }

    #[test]
    fn numeric_and_string_groups_join() {
        let dx = vec![DiagnosisCode::new("C34.10", "Lung cancer", 1u64)];
        let paragraphs = vec![GroupParagraph::new("01", "CPT code 81235")];
        let mapping = build_mapping(&procedures(), &dx, &paragraphs);
        assert!(mapping.get("81162").unwrap().icd10_codes.is_empty());
    }

    #[test]
    fn paragraph_only_groups_are_reported() {
        let paragraphs = vec![GroupParagraph::new("3", "CPT code 81162")];
        let report = build_article_mapping(&procedures(), &[], &paragraphs);
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].resolution, Resolution::Resolved);
        assert!(report.groups[0].icd10_codes.is_empty());
    }

    #[test]
    fn reverse_view_lists_procedures_per_diagnosis() {
        let dx = vec![
            DiagnosisCode::new("C34.10", "Lung cancer", "1"),
            DiagnosisCode::new("C50.911", "Breast cancer", "2"),
        ];
        let paragraphs = vec![GroupParagraph::new("2", "CPT code 81162")];
        let mapping = build_mapping(&procedures(), &dx, &paragraphs);
        let reverse = reverse_mapping(&mapping);

        let lung: Vec<&str> = reverse
            .get("C34.10")
            .unwrap()
            .cpt_codes
            .iter()
            .map(|p| p.code.as_str())
            .collect();
        assert_eq!(lung, vec!["81162", "81235"]);

        let breast = reverse.get("C50.911").unwrap();
        assert_eq!(breast.cpt_codes.len(), 1);
        assert_eq!(breast.cpt_codes[0].code, "81162");
        assert_eq!(breast.description, "Breast cancer");
    }

    #[test]
    fn serializes_in_insertion_order() {
        let procedures = vec![
            ProcedureCode::new("99215", "Office visit"),
            ProcedureCode::new("81162", "BRCA"),
        ];
        let mapping = build_mapping(&procedures, &[], &[]);
        let json = serde_json::to_string(&mapping).unwrap();
        assert!(json.find("99215").unwrap() < json.find("81162").unwrap());
        assert!(json.starts_with("{\"99215\":{\"code\":\"99215\""));
    }

    #[test]
    fn blank_procedure_codes_map_like_an_empty_list() {
        let blank = vec![ProcedureCode::new("  ", "blank")];
        let dx = vec![DiagnosisCode::new("C34.10", "Lung cancer", "1")];

        let report = build_article_mapping(&blank, &dx, &[]);
        assert!(report.by_cpt.is_empty());
        assert_eq!(report.unmapped_icd10.len(), 1);
        assert_eq!(report.unmapped_icd10[0].code, "C34.10");

        let mut mixed = blank.clone();
        mixed.push(ProcedureCode::new("81235", "EGFR gene analysis"));
        let mapping = build_mapping(&mixed, &dx, &[]);
        assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["81235"]);
        assert_eq!(codes_of(mapping.get("81235").unwrap()), vec!["C34.10"]);
    }

    #[test]
    fn group_listing_pairs_members_with_paragraphs() {
        let procedures = vec![
            ProcedureCode::new("81162", "BRCA").with_group("2"),
            ProcedureCode::new("J9271", "Pembrolizumab"),
            ProcedureCode::new("81163", "BRCA seq").with_group(2u64),
            ProcedureCode::new("81235", "EGFR").with_group("1"),
        ];
        let paragraphs = vec![
            GroupParagraph::new("1", "&lt;p&gt;Lung panel&lt;/p&gt;"),
            GroupParagraph::new("02", "Hereditary cancer"),
            GroupParagraph::new("3", "Not otherwise classified"),
        ];

        let listing = group_listing(
            &procedures,
            |p| p.group.as_ref(),
            ProcedureCode::to_ref,
            &paragraphs,
        );
        let shape: Vec<(&str, &str, usize)> = listing
            .iter()
            .map(|g| (g.group.as_str(), g.paragraph.as_str(), g.codes.len()))
            .collect();
        assert_eq!(
            shape,
            vec![
                ("2", "Hereditary cancer", 2),
                ("1", "Lung panel", 1),
                ("3", "Not otherwise classified", 0),
            ]
        );
        assert_eq!(listing[0].codes[1].code, "81163");
    }

    #[test]
    fn article_listings_are_omitted_when_empty() {
        let report = build_article_mapping(&procedures(), &[], &[]);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("procedure_groups").is_none());
        assert!(json.get("noncovered_icd10").is_none());
        assert!(json.get("unmapped_icd10").is_some());
    }
}
