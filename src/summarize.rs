//! Summarization engine.
//!
//! Three calls to the generation service per document shape:
//!
//! 1. [`Summarizer::summarize_chunk`] once per chunk, backing off linearly
//!    while the service rate limits;
//! 2. [`Summarizer::merge_summaries`] to fold the chunk summaries into one
//!    bullet list;
//! 3. [`Summarizer::assess_impact`] to get one impact sentence per
//!    [`BeneficiaryGroup`].
//!
//! The impact response is parsed in two tiers: a strict JSON decode
//! ([`parse_impact_strict`]) and, failing that, a line scan
//! ([`parse_impact_lenient`]). When both come up empty the mapping carries a
//! sentinel in `average` and nothing else, which fails validation downstream.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::generation::{GenerationError, GenerationRequest, TextGenerator};
use crate::models::{BeneficiaryGroup, ImpactMapping};

const CHUNK_SYSTEM_PROMPT: &str = "You are a civic analyst. Return a concise bullet-point summary \
of a U.S. executive order in plain English. Use clear, short points (4-6 max). Avoid filler or \
legal language.";

const MERGE_SYSTEM_PROMPT: &str = "You are a civic analyst. Return a final, concise, plain-English \
bullet-point summary of the executive order, combining all prior chunks. Use clear Markdown-style \
bullets. Avoid jargon or legalese.";

const IMPACT_SYSTEM_PROMPT: &str = "You are a civic economist focused on equity. Consider not only \
explicit benefits but also which group accrues the most power or economic gain.";

/// Prefix of the `average` entry when an impact response could not be parsed.
pub const UNPARSED_IMPACT_PREFIX: &str = "Could not parse impact response: ";

/// Issues the summary and impact calls for one document.
#[derive(Clone)]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    model: String,
    rate_limit_attempts: u32,
    backoff_step: Duration,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &GenerationConfig) -> Self {
        Self {
            generator,
            model: config.model.clone(),
            rate_limit_attempts: config.rate_limit_attempts.max(1),
            backoff_step: Duration::from_secs(config.backoff_step_secs),
        }
    }

    /// Overrides the linear backoff unit (5s by default).
    pub fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    fn request(&self, system: &str, user: String) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            system: system.to_string(),
            user,
        }
    }

    /// Summarize one chunk into bullet points.
    ///
    /// On [`GenerationError::RateLimited`] the call is repeated, waiting
    /// `attempt * backoff_step` after the n-th limited attempt, for at most
    /// `rate_limit_attempts` attempts in total. Any other error is returned
    /// immediately.
    pub async fn summarize_chunk(
        &self,
        text: &str,
        chunk_index: usize,
    ) -> Result<String, GenerationError> {
        let request = self.request(CHUNK_SYSTEM_PROMPT, text.to_string());

        let mut attempt = 1u32;
        loop {
            match self.generator.generate(&request).await {
                Ok(summary) => return Ok(summary.trim().to_string()),
                Err(e) if e.is_rate_limited() && attempt < self.rate_limit_attempts => {
                    let wait = self.backoff_step * attempt;
                    warn!(
                        chunk = chunk_index,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!(chunk = chunk_index, attempt, error = %e, "chunk summary failed");
                    return Err(e);
                }
            }
        }
    }

    /// Merge ordered chunk summaries into a single bullet list.
    pub async fn merge_summaries(&self, summaries: &[String]) -> Result<String, GenerationError> {
        let request = self.request(MERGE_SYSTEM_PROMPT, summaries.join("\n"));
        let merged = self.generator.generate(&request).await?;
        Ok(merged.trim().to_string())
    }

    /// Ask for one impact sentence per beneficiary group and parse the answer.
    pub async fn assess_impact(&self, final_summary: &str) -> Result<ImpactMapping, GenerationError> {
        let request = self.request(IMPACT_SYSTEM_PROMPT, impact_prompt(final_summary));
        let raw = self.generator.generate(&request).await?;
        Ok(parse_impact(&raw))
    }
}

fn impact_prompt(summary: &str) -> String {
    format!(
        r#"Given the following executive order summary:

"{}"

Write ONE short sentence for each of the following groups, explaining how this executive order might affect them. Be clear, direct, and avoid policy jargon. Think critically about structural and long-term effects.

Respond in strict JSON format like this:
{{
  "average": "One sentence here.",
  "poorest": "One sentence here.",
  "richest": "One sentence here."
}}"#,
        summary
    )
}

/// Parse an impact response: strict JSON first, then the line scan, then the
/// sentinel mapping.
pub fn parse_impact(raw: &str) -> ImpactMapping {
    if let Some(mapping) = parse_impact_strict(raw) {
        return mapping;
    }
    if let Some(mapping) = parse_impact_lenient(raw) {
        debug!("impact response parsed by line scan");
        return mapping;
    }

    warn!("impact response could not be parsed");
    let mut mapping = ImpactMapping::new();
    mapping.insert(
        BeneficiaryGroup::Average,
        format!("{}{}", UNPARSED_IMPACT_PREFIX, raw.trim()),
    );
    mapping.insert(BeneficiaryGroup::Poorest, String::new());
    mapping.insert(BeneficiaryGroup::Richest, String::new());
    mapping
}

/// Strict tier: the response (optionally inside a Markdown code fence) must be
/// a JSON object of string values. Returns `None` unless at least one group
/// key is present.
pub fn parse_impact_strict(raw: &str) -> Option<ImpactMapping> {
    let body = strip_code_fence(raw);
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body).ok()?;

    let mut mapping = ImpactMapping::new();
    for (key, value) in object {
        let Some(group) = BeneficiaryGroup::from_key(&key) else {
            continue;
        };
        let serde_json::Value::String(sentence) = value else {
            return None;
        };
        mapping.insert(group, sentence.trim().to_string());
    }

    (!mapping.is_empty()).then_some(mapping)
}

/// Permissive tier: split on newlines, then on the first colon of each line,
/// trimming quotes, braces, commas and whitespace from both sides.
pub fn parse_impact_lenient(raw: &str) -> Option<ImpactMapping> {
    let mut mapping = ImpactMapping::new();
    for line in raw.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim_matches(|c: char| matches!(c, '"' | '{' | '}' | ',') || c.is_whitespace());
        let Some(group) = BeneficiaryGroup::from_key(key) else {
            continue;
        };
        let value = value
            .trim_matches(|c: char| matches!(c, '"' | '{' | '}' | ',') || c.is_whitespace());
        mapping.insert(group, value.to_string());
    }

    (!mapping.is_empty()).then_some(mapping)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Extract Markdown bullet items (`- ` or `* `) from a summary, in order.
pub fn split_bullets(markdown: &str) -> Vec<String> {
    markdown
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")))
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parses_plain_json() {
        let raw = r#"{"average": "Costs rise.", "poorest": "Aid shrinks.", "richest": "Taxes fall."}"#;
        let mapping = parse_impact_strict(raw).unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping[&BeneficiaryGroup::Richest], "Taxes fall.");
    }

    #[test]
    fn strict_parses_fenced_json() {
        let raw = "```json\n{\"average\": \"A.\", \"poorest\": \"P.\", \"richest\": \"R.\"}\n```";
        let mapping = parse_impact_strict(raw).unwrap();
        assert_eq!(mapping[&BeneficiaryGroup::Average], "A.");
    }

    #[test]
    fn strict_rejects_prose() {
        assert!(parse_impact_strict("average: fine\npoorest: worse").is_none());
    }

    #[test]
    fn strict_ignores_unknown_keys_but_requires_one_group() {
        assert!(parse_impact_strict(r#"{"middle": "x"}"#).is_none());
        let mapping = parse_impact_strict(r#"{"middle": "x", "Poorest": "y"}"#).unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping[&BeneficiaryGroup::Poorest], "y");
    }

    #[test]
    fn lenient_scans_almost_json() {
        // Trailing comma after the last entry makes this invalid JSON.
        let raw = "{\n  \"average\": \"Prices: stable.\",\n  \"poorest\": \"Benefits cut.\",\n  \"richest\": \"Gains.\",\n}";
        assert!(parse_impact_strict(raw).is_none());
        let mapping = parse_impact_lenient(raw).unwrap();
        assert_eq!(mapping[&BeneficiaryGroup::Average], "Prices: stable.");
        assert_eq!(mapping[&BeneficiaryGroup::Poorest], "Benefits cut.");
        assert_eq!(mapping[&BeneficiaryGroup::Richest], "Gains.");
    }

    #[test]
    fn lenient_handles_bare_lines() {
        let mapping = parse_impact_lenient("Average: ok\nRICHEST: better").unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping[&BeneficiaryGroup::Richest], "better");
    }

    #[test]
    fn lenient_strips_commas_from_keys() {
        // Leading-comma style puts the separator in front of the key.
        let raw = "{ \"average\": \"Flat.\"\n, \"poorest\": \"Worse.\"\n, \"richest\": \"Better.\" }";
        let mapping = parse_impact_lenient(raw).unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping[&BeneficiaryGroup::Poorest], "Worse.");
        assert_eq!(mapping[&BeneficiaryGroup::Richest], "Better.");
    }

    #[test]
    fn lenient_returns_none_without_group_keys() {
        assert!(parse_impact_lenient("I cannot answer that.").is_none());
        assert!(parse_impact_lenient("note: nothing here").is_none());
    }

    #[test]
    fn unparseable_response_yields_sentinel() {
        let mapping = parse_impact("I cannot answer that.");
        assert!(mapping[&BeneficiaryGroup::Average].starts_with(UNPARSED_IMPACT_PREFIX));
        assert!(mapping[&BeneficiaryGroup::Average].contains("I cannot answer that."));
        assert_eq!(mapping[&BeneficiaryGroup::Poorest], "");
        assert_eq!(mapping[&BeneficiaryGroup::Richest], "");
    }

    #[test]
    fn bullets_keep_order_and_skip_prose() {
        let md = "Summary:\n- First point\n  * Second point\nnot a bullet\n-\n- Third";
        assert_eq!(
            split_bullets(md),
            vec!["First point", "Second point", "Third"]
        );
    }

    #[test]
    fn bullets_empty_when_no_markers() {
        assert!(split_bullets("1. numbered\n2. list").is_empty());
    }
}
