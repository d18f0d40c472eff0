use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::catalog::types::{Criticality, PatternClass, RawRule, Rule, RuleType};
use crate::error::{GateError, Result};

/// Parses raw rule records into a classified, grouped catalog ready for
/// dispatch. Individual malformed records are tolerated up to half the
/// catalog; past that the whole load is rejected.
#[derive(Debug, Default)]
pub struct CatalogProcessor;

impl CatalogProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn process(&self, raw_records: &[Value]) -> Result<ProcessedCatalog> {
        info!(records = raw_records.len(), "processing rule catalog");

        let (rules, mut report) = self.parse_records(raw_records)?;
        self.validate_structure(&rules, &mut report);

        let mut catalog = ProcessedCatalog {
            structural: Vec::new(),
            content: Vec::new(),
            semantic: Vec::new(),
            required_files: BTreeSet::new(),
            by_primary_reference: BTreeMap::new(),
            by_pattern_class: BTreeMap::new(),
            rules_without_references: Vec::new(),
            criticality: CriticalityDistribution::default(),
            report,
        };

        for rule in &rules {
            for reference in &rule.references {
                catalog.required_files.insert(reference.clone());
            }
            match rule.primary_reference() {
                Some(primary) => {
                    catalog
                        .by_primary_reference
                        .entry(primary.to_string())
                        .or_default()
                        .push(rule.id.clone());
                    catalog
                        .by_pattern_class
                        .entry(PatternClass::detect(primary))
                        .or_default()
                        .push(rule.id.clone());
                }
                None => catalog.rules_without_references.push(rule.id.clone()),
            }
        }

        catalog.criticality = CriticalityDistribution::from_rules(&rules);

        for rule in rules {
            match rule.rule_type {
                RuleType::Structural => catalog.structural.push(rule),
                RuleType::Content => catalog.content.push(rule),
                RuleType::Semantic => catalog.semantic.push(rule),
            }
        }

        info!(
            structural = catalog.structural.len(),
            content = catalog.content.len(),
            semantic = catalog.semantic.len(),
            required_files = catalog.required_files.len(),
            "catalog processed"
        );

        Ok(catalog)
    }

    fn parse_records(&self, raw_records: &[Value]) -> Result<(Vec<Rule>, CatalogReport)> {
        let mut report = CatalogReport::default();
        let mut rules = Vec::with_capacity(raw_records.len());

        for (index, record) in raw_records.iter().enumerate() {
            match serde_json::from_value::<RawRule>(record.clone()) {
                Ok(raw) => rules.push(self.normalize(raw, &mut report)),
                Err(err) => {
                    warn!(index, %err, "rejecting malformed rule record");
                    report.parse_errors.push(format!("record {}: {}", index, err));
                }
            }
        }

        if !raw_records.is_empty() && report.parse_errors.len() * 2 > raw_records.len() {
            return Err(GateError::CatalogParse {
                failed: report.parse_errors.len(),
                total: raw_records.len(),
            });
        }

        debug!(
            parsed = rules.len(),
            rejected = report.parse_errors.len(),
            "catalog records parsed"
        );

        Ok((rules, report))
    }

    fn normalize(&self, raw: RawRule, report: &mut CatalogReport) -> Rule {
        let rule_type = RuleType::from_raw(&raw.rule_type).unwrap_or_else(|| {
            warn!(rule_id = %raw.id, raw_type = %raw.rule_type, "unknown rule type, defaulting to content");
            report.unknown_types.push(raw.rule_type.clone());
            RuleType::Content
        });

        let criticality = Criticality::from_raw(&raw.criticality).unwrap_or_else(|| {
            report.unknown_criticalities.push(format!(
                "rule {} has unknown criticality '{}'",
                raw.id, raw.criticality
            ));
            Criticality::Medium
        });

        Rule {
            id: raw.id,
            description: raw.description,
            rule_type,
            criticality,
            references: raw.references,
            explanation: raw.explanation,
            tags: raw.tags,
        }
    }

    fn validate_structure(&self, rules: &[Rule], report: &mut CatalogReport) {
        let mut seen = HashSet::new();
        for rule in rules {
            if !seen.insert(rule.id.as_str()) {
                report.duplicate_ids.push(rule.id.clone());
            }
            if rule.description.trim().is_empty() {
                report.empty_descriptions.push(rule.id.clone());
            }
            if rule.references.is_empty() {
                report
                    .missing_references
                    .push(format!("rule {} ({}) has no file references", rule.id, rule.rule_type));
            }
        }

        for duplicate in &report.duplicate_ids {
            warn!(rule_id = %duplicate, "duplicate rule id in catalog");
        }
    }
}

/// The result of catalog processing: rules partitioned by type, the union
/// of required files, and groupings used by content-loading collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedCatalog {
    pub structural: Vec<Rule>,
    pub content: Vec<Rule>,
    pub semantic: Vec<Rule>,
    pub required_files: BTreeSet<String>,
    /// Rule ids grouped by their primary (first) file reference.
    pub by_primary_reference: BTreeMap<String, Vec<String>>,
    /// Rule ids grouped by the shape of their primary reference.
    pub by_pattern_class: BTreeMap<PatternClass, Vec<String>>,
    pub rules_without_references: Vec<String>,
    pub criticality: CriticalityDistribution,
    pub report: CatalogReport,
}

impl ProcessedCatalog {
    pub fn all_rules(&self) -> impl Iterator<Item = &Rule> {
        self.structural
            .iter()
            .chain(self.content.iter())
            .chain(self.semantic.iter())
    }

    pub fn total_rules(&self) -> usize {
        self.structural.len() + self.content.len() + self.semantic.len()
    }

    /// All rules whose references cover `path`, honoring wildcards.
    pub fn rules_for_file(&self, path: &str) -> Vec<&Rule> {
        self.all_rules()
            .filter(|rule| rule.matches_file(path))
            .collect()
    }
}

/// Criticality spread across the catalog, used to prioritize remediation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriticalityDistribution {
    pub counts: BTreeMap<Criticality, usize>,
    pub percentages: BTreeMap<Criticality, f32>,
    pub critical_rule_ids: Vec<String>,
}

impl CriticalityDistribution {
    fn from_rules(rules: &[Rule]) -> Self {
        let mut distribution = Self::default();
        for rule in rules {
            *distribution.counts.entry(rule.criticality).or_insert(0) += 1;
            if rule.criticality == Criticality::High {
                distribution.critical_rule_ids.push(rule.id.clone());
            }
        }
        let total = rules.len().max(1) as f32;
        for (criticality, count) in &distribution.counts {
            distribution
                .percentages
                .insert(*criticality, *count as f32 / total * 100.0);
        }
        distribution
    }
}

/// Warnings collected while loading a catalog. None of these are fatal on
/// their own; parse errors become fatal only past the 50% threshold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogReport {
    pub parse_errors: Vec<String>,
    pub duplicate_ids: Vec<String>,
    pub empty_descriptions: Vec<String>,
    pub unknown_types: Vec<String>,
    pub unknown_criticalities: Vec<String>,
    pub missing_references: Vec<String>,
}

impl CatalogReport {
    pub fn has_warnings(&self) -> bool {
        !self.duplicate_ids.is_empty()
            || !self.empty_descriptions.is_empty()
            || !self.unknown_types.is_empty()
            || !self.unknown_criticalities.is_empty()
            || !self.missing_references.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, rule_type: &str, criticality: &str, references: &[&str]) -> Value {
        json!({
            "id": id,
            "description": format!("rule {}", id),
            "type": rule_type,
            "criticality": criticality,
            "references": references,
        })
    }

    #[test]
    fn test_classification_partitions_rules() {
        let records = vec![
            record("S1", "structural", "high", &["README.md"]),
            record("C1", "content", "medium", &["src/*.rs"]),
            record("M1", "semantic", "low", &["docs/arch.md"]),
        ];
        let catalog = CatalogProcessor::new().process(&records).unwrap();
        assert_eq!(catalog.structural.len(), 1);
        assert_eq!(catalog.content.len(), 1);
        assert_eq!(catalog.semantic.len(), 1);
        assert_eq!(catalog.total_rules(), 3);
    }

    #[test]
    fn test_unknown_type_defaults_to_content() {
        let records = vec![record("X1", "mystery", "medium", &["a.txt"])];
        let catalog = CatalogProcessor::new().process(&records).unwrap();
        assert_eq!(catalog.content.len(), 1);
        assert_eq!(catalog.report.unknown_types, vec!["mystery".to_string()]);
    }

    #[test]
    fn test_unknown_criticality_defaults_to_medium() {
        let records = vec![record("X1", "content", "urgent", &["a.txt"])];
        let catalog = CatalogProcessor::new().process(&records).unwrap();
        assert_eq!(catalog.content[0].criticality, Criticality::Medium);
        assert_eq!(catalog.report.unknown_criticalities.len(), 1);
    }

    #[test]
    fn test_parse_failures_tolerated_below_half() {
        let records = vec![
            record("R1", "structural", "high", &["README.md"]),
            record("R2", "content", "medium", &["src/*.rs"]),
            json!({"description": "missing id and type"}),
        ];
        let catalog = CatalogProcessor::new().process(&records).unwrap();
        assert_eq!(catalog.total_rules(), 2);
        assert_eq!(catalog.report.parse_errors.len(), 1);
    }

    #[test]
    fn test_parse_failures_above_half_are_fatal() {
        let records = vec![
            record("R1", "structural", "high", &["README.md"]),
            json!({"bogus": 1}),
            json!({"bogus": 2}),
        ];
        let err = CatalogProcessor::new().process(&records).unwrap_err();
        assert!(matches!(
            err,
            GateError::CatalogParse { failed: 2, total: 3 }
        ));
    }

    #[test]
    fn test_required_files_is_union_of_references() {
        let records = vec![
            record("R1", "structural", "high", &["README.md", "LICENSE"]),
            record("R2", "content", "medium", &["README.md", "src/*.rs"]),
        ];
        let catalog = CatalogProcessor::new().process(&records).unwrap();
        let expected: BTreeSet<String> = ["README.md", "LICENSE", "src/*.rs"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(catalog.required_files, expected);
    }

    #[test]
    fn test_grouping_by_primary_reference() {
        let records = vec![
            record("R1", "content", "medium", &["README.md", "LICENSE"]),
            record("R2", "semantic", "low", &["README.md"]),
            record("R3", "content", "medium", &[]),
        ];
        let catalog = CatalogProcessor::new().process(&records).unwrap();
        assert_eq!(
            catalog.by_primary_reference.get("README.md").unwrap(),
            &vec!["R1".to_string(), "R2".to_string()]
        );
        assert_eq!(catalog.rules_without_references, vec!["R3".to_string()]);
        assert_eq!(catalog.report.missing_references.len(), 1);
    }

    #[test]
    fn test_duplicate_ids_flagged_not_fatal() {
        let records = vec![
            record("R1", "content", "medium", &["a.md"]),
            record("R1", "content", "medium", &["b.md"]),
        ];
        let catalog = CatalogProcessor::new().process(&records).unwrap();
        assert_eq!(catalog.total_rules(), 2);
        assert_eq!(catalog.report.duplicate_ids, vec!["R1".to_string()]);
    }

    #[test]
    fn test_criticality_distribution() {
        let records = vec![
            record("R1", "content", "high", &["a.md"]),
            record("R2", "content", "high", &["b.md"]),
            record("R3", "content", "low", &["c.md"]),
            record("R4", "content", "medium", &["d.md"]),
        ];
        let catalog = CatalogProcessor::new().process(&records).unwrap();
        assert_eq!(catalog.criticality.counts[&Criticality::High], 2);
        assert_eq!(
            catalog.criticality.critical_rule_ids,
            vec!["R1".to_string(), "R2".to_string()]
        );
        assert!((catalog.criticality.percentages[&Criticality::High] - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_rules_for_file_honors_wildcards() {
        let records = vec![
            record("R1", "content", "medium", &["src/*.rs"]),
            record("R2", "content", "medium", &["README.md"]),
        ];
        let catalog = CatalogProcessor::new().process(&records).unwrap();
        let matching = catalog.rules_for_file("src/lib.rs");
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, "R1");
    }
}
