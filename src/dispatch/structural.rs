//! Programmatic checks for structural rules. No evaluator call is made;
//! the verdict comes straight from the file listing.

use std::collections::BTreeMap;

use crate::catalog::Rule;
use crate::config::StructuralThresholds;
use crate::dispatch::types::{Confidence, Verdict};

const SPECIAL_CHARS: &[char] = &[
    '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '+', '=', '{', '}', '[', ']',
];

/// Routes a structural rule to the matching check based on its wording.
pub fn run_structural_check(
    rule: &Rule,
    content: &BTreeMap<String, String>,
    thresholds: &StructuralThresholds,
) -> (Verdict, Confidence, String) {
    let description = rule.description.to_lowercase();

    if description.contains("exist") || description.contains("present") {
        check_existence(rule, content)
    } else if description.contains("directory")
        || description.contains("organization")
        || description.contains("organized")
    {
        check_directory_organization(content, thresholds)
    } else if description.contains("naming") || description.contains("name") {
        check_naming(content, thresholds)
    } else {
        check_generic(content)
    }
}

/// Every reference the rule names must match at least one provided file.
fn check_existence(
    rule: &Rule,
    content: &BTreeMap<String, String>,
) -> (Verdict, Confidence, String) {
    let missing: Vec<&str> = rule
        .references
        .iter()
        .filter(|reference| {
            !content
                .keys()
                .any(|path| crate::catalog::types::reference_matches(reference, path))
        })
        .map(String::as_str)
        .collect();

    if missing.is_empty() {
        (
            Verdict::Complies,
            Confidence::High,
            format!("all {} required references found", rule.references.len()),
        )
    } else {
        (
            Verdict::Fails,
            Confidence::High,
            format!("missing required references: {}", missing.join(", ")),
        )
    }
}

/// Fraction of files placed inside directories, measured against the
/// configured organization thresholds.
fn check_directory_organization(
    content: &BTreeMap<String, String>,
    thresholds: &StructuralThresholds,
) -> (Verdict, Confidence, String) {
    if content.is_empty() {
        return (
            Verdict::Fails,
            Confidence::High,
            "no files available to assess directory organization".to_string(),
        );
    }

    let in_directories = content.keys().filter(|path| path.contains('/')).count();
    let ratio = in_directories as f32 / content.len() as f32;
    let summary = format!(
        "{} of {} files live in directories ({:.0}%)",
        in_directories,
        content.len(),
        ratio * 100.0
    );

    if ratio >= thresholds.good_organization {
        (Verdict::Complies, Confidence::High, summary)
    } else if ratio >= thresholds.partial_organization {
        (Verdict::Partial, Confidence::Medium, summary)
    } else {
        (Verdict::Fails, Confidence::High, summary)
    }
}

/// Flags names with spaces, special characters, excessive length, or
/// inconsistent casing, then rates the clean fraction.
fn check_naming(
    content: &BTreeMap<String, String>,
    thresholds: &StructuralThresholds,
) -> (Verdict, Confidence, String) {
    if content.is_empty() {
        return (
            Verdict::Fails,
            Confidence::High,
            "no files available to assess naming".to_string(),
        );
    }

    let mut flagged = Vec::new();
    for path in content.keys() {
        let name = path.rsplit('/').next().unwrap_or(path);
        if let Some(issue) = naming_issue(name, thresholds) {
            flagged.push(format!("{} ({})", path, issue));
        }
    }

    let clean_ratio = (content.len() - flagged.len()) as f32 / content.len() as f32;
    let summary = if flagged.is_empty() {
        format!("all {} file names are consistent", content.len())
    } else {
        format!(
            "{:.0}% of names clean; flagged: {}",
            clean_ratio * 100.0,
            flagged.join("; ")
        )
    };

    if clean_ratio >= thresholds.excellent_naming {
        (Verdict::Complies, Confidence::High, summary)
    } else if clean_ratio >= thresholds.acceptable_naming {
        (Verdict::Partial, Confidence::Medium, summary)
    } else {
        (Verdict::Fails, Confidence::High, summary)
    }
}

fn naming_issue(name: &str, thresholds: &StructuralThresholds) -> Option<&'static str> {
    if name.contains(' ') {
        return Some("contains spaces");
    }
    if name.contains(SPECIAL_CHARS) {
        return Some("contains special characters");
    }
    let stem = name.split('.').next().unwrap_or(name);
    if stem.len() > thresholds.max_filename_length {
        return Some("name too long");
    }
    let has_upper = stem.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = stem.chars().any(|c| c.is_ascii_lowercase());
    if has_upper && !has_lower {
        return Some("all-uppercase name");
    }
    if has_upper && has_lower && !stem.contains('_') && !stem.contains('-') {
        return Some("mixed case without separators");
    }
    None
}

/// A structural rule with no recognizable wording just checks that any
/// matching content was provided at all.
fn check_generic(content: &BTreeMap<String, String>) -> (Verdict, Confidence, String) {
    if content.is_empty() {
        (
            Verdict::Fails,
            Confidence::Medium,
            "no matching content found for structural check".to_string(),
        )
    } else {
        (
            Verdict::Complies,
            Confidence::Medium,
            format!("{} matching files present", content.len()),
        )
    }
}
