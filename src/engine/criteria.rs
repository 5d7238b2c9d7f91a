use super::domain::PriorAuthRequest;

/// Result of evaluating a single criterion string against a request.
#[derive(Debug, Clone, PartialEq)]
pub struct CriterionOutcome {
    pub passed: bool,
    pub rationale: String,
}

const COMPARISON_MARKERS: &[&str] = &[">=", "at least", "or older", "minimum", "over"];

/// Evaluate one textual criterion against the structured request.
///
/// This is a strategy table keyed by recognizable phrasings, not free-text NLP.
/// Numeric age criteria compare the first integer in the criterion against the
/// patient age; everything else falls back to a permissive token-in-rationale
/// match. False positives are tolerated because every outcome carries its
/// rationale for human review.
pub fn evaluate_criterion(criterion: &str, request: &PriorAuthRequest) -> CriterionOutcome {
    let lowered = criterion.to_lowercase();

    if lowered.contains("age") && has_comparison(&lowered) {
        if let Some(required) = first_integer(criterion) {
            let age = u32::from(request.patient_age);
            return CriterionOutcome {
                passed: age >= required,
                rationale: format!("Patient age {age} vs required {required}"),
            };
        }
    }

    let clinical_text = request.clinical_rationale.to_lowercase();
    let matched = tokens(&lowered)
        .into_iter()
        .find(|token| clinical_text.contains(token.as_str()));

    match matched {
        Some(token) => CriterionOutcome {
            passed: true,
            rationale: format!("Criterion mentioned in clinical rationale ('{token}')"),
        },
        None => CriterionOutcome {
            passed: false,
            rationale: "Criterion not documented".to_string(),
        },
    }
}

/// First run of ASCII digits in the text, parsed as an integer.
pub(crate) fn first_integer(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn has_comparison(lowered: &str) -> bool {
    COMPARISON_MARKERS.iter().any(|marker| lowered.contains(marker))
        && lowered.chars().any(|c| c.is_ascii_digit())
}

/// Lowercase word tokens of length >= 4, punctuation stripped.
fn tokens(lowered: &str) -> Vec<String> {
    lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| word.len() >= 4)
        .map(|word| word.to_string())
        .collect()
}
