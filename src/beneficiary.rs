//! Rule-based primary-beneficiary inference.
//!
//! Pure and infallible. Rules, first match wins:
//!
//! 1. summary mentions capital framing (`corporate`, `investment`, `capital`) → `richest`
//! 2. summary mentions direct aid (`job training`, `food`, `housing`) → `poorest`
//! 3. all three impact entries present → the group with the longest sentence
//! 4. otherwise → `average`
//!
//! Keyword matching is case-insensitive. Length ties in rule 3 resolve to
//! the earlier group in `average`, `poorest`, `richest` order.

use crate::models::{BeneficiaryGroup, ImpactMapping};

const CAPITAL_KEYWORDS: &[&str] = &["corporate", "investment", "capital"];
const DIRECT_AID_KEYWORDS: &[&str] = &["job training", "food", "housing"];

pub fn infer_primary(summary: &str, impact: &ImpactMapping) -> BeneficiaryGroup {
    let summary = summary.to_lowercase();

    if CAPITAL_KEYWORDS.iter().any(|k| summary.contains(k)) {
        return BeneficiaryGroup::Richest;
    }
    if DIRECT_AID_KEYWORDS.iter().any(|k| summary.contains(k)) {
        return BeneficiaryGroup::Poorest;
    }

    if impact.len() == BeneficiaryGroup::ALL.len() {
        let mut best = BeneficiaryGroup::Average;
        let mut best_len = 0usize;
        for group in BeneficiaryGroup::ALL {
            let len = impact.get(&group).map_or(0, |s| s.chars().count());
            if len > best_len {
                best = group;
                best_len = len;
            }
        }
        return best;
    }

    BeneficiaryGroup::Average
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impact(average: &str, poorest: &str, richest: &str) -> ImpactMapping {
        let mut m = ImpactMapping::new();
        m.insert(BeneficiaryGroup::Average, average.into());
        m.insert(BeneficiaryGroup::Poorest, poorest.into());
        m.insert(BeneficiaryGroup::Richest, richest.into());
        m
    }

    #[test]
    fn capital_keywords_win() {
        let m = impact("a much longer sentence than the others", "", "");
        assert_eq!(
            infer_primary("- Encourages Investment in ports", &m),
            BeneficiaryGroup::Richest
        );
    }

    #[test]
    fn capital_beats_direct_aid() {
        assert_eq!(
            infer_primary("food subsidies funded by capital gains", &ImpactMapping::new()),
            BeneficiaryGroup::Richest
        );
    }

    #[test]
    fn direct_aid_keywords() {
        assert_eq!(
            infer_primary("- Expands Job Training grants", &ImpactMapping::new()),
            BeneficiaryGroup::Poorest
        );
        assert_eq!(
            infer_primary("- Funds public housing", &impact("long long long", "", "")),
            BeneficiaryGroup::Poorest
        );
    }

    #[test]
    fn longest_impact_sentence() {
        let m = impact("short", "medium one", "the longest sentence here");
        assert_eq!(infer_primary("- Renames a holiday", &m), BeneficiaryGroup::Richest);

        let m = impact("short", "the longest sentence here", "medium one");
        assert_eq!(infer_primary("- Renames a holiday", &m), BeneficiaryGroup::Poorest);
    }

    #[test]
    fn ties_prefer_average_then_poorest() {
        assert_eq!(
            infer_primary("neutral", &impact("same", "same", "same")),
            BeneficiaryGroup::Average
        );
        assert_eq!(
            infer_primary("neutral", &impact("a", "same", "same")),
            BeneficiaryGroup::Poorest
        );
    }

    #[test]
    fn partial_mapping_defaults_to_average() {
        let mut m = ImpactMapping::new();
        m.insert(BeneficiaryGroup::Richest, "a very long sentence indeed".into());
        assert_eq!(infer_primary("neutral", &m), BeneficiaryGroup::Average);
    }
}
