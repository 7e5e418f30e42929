//! Record validation: the only gate before persistence and the only
//! trigger for a re-queue.

use crate::models::{BeneficiaryGroup, SummaryRecord};

/// Names of the required fields that are empty, in declaration order.
pub fn missing_fields(record: &SummaryRecord) -> Vec<&'static str> {
    let mut missing = Vec::new();

    let scalars = [
        ("eo_id", &record.eo_id),
        ("title", &record.title),
        ("date_issued", &record.date_issued),
        ("president", &record.president),
        ("html_url", &record.html_url),
        ("pdf_url", &record.pdf_url),
    ];
    for (name, value) in scalars {
        if value.is_empty() {
            missing.push(name);
        }
    }

    if record.summary.is_empty() {
        missing.push("summary");
    }

    for group in BeneficiaryGroup::ALL {
        if record.impact.get(&group).map_or(true, |s| s.is_empty()) {
            missing.push(match group {
                BeneficiaryGroup::Average => "impact.average",
                BeneficiaryGroup::Poorest => "impact.poorest",
                BeneficiaryGroup::Richest => "impact.richest",
            });
        }
    }

    missing
}

/// True when every scalar field, the summary, and all three impact entries
/// are non-empty.
pub fn validate(record: &SummaryRecord) -> bool {
    missing_fields(record).is_empty()
}
