//! Risk assessment - the parsed output of the summarization agent.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref RISK_LEVEL: Regex =
        Regex::new(r#"(?i)risk\s+level[\s:*'"]*(low|medium|high)\b"#).unwrap();
}

/// Risk label assigned by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    /// Find "Risk level" followed by Low, Medium or High in free text.
    ///
    /// Falls back to [`RiskLevel::Unknown`] when the phrase is absent.
    pub fn extract(text: &str) -> Self {
        let Some(captures) = RISK_LEVEL.captures(text) else {
            return RiskLevel::Unknown;
        };
        match captures[1].to_lowercase().as_str() {
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            _ => RiskLevel::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Unknown => "unknown",
        }
    }

    /// Badge icon shown next to the label
    pub fn icon(&self) -> &'static str {
        match self {
            RiskLevel::Low => "✅",
            RiskLevel::Medium => "⚠️",
            RiskLevel::High => "🚨",
            RiskLevel::Unknown => "❔",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Explanation returned by the model together with its extracted label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub explanation: String,
    pub risk: RiskLevel,
}

impl Assessment {
    pub fn from_response(text: String) -> Self {
        let risk = RiskLevel::extract(&text);
        Self {
            explanation: text,
            risk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_common_phrasings() {
        assert_eq!(RiskLevel::extract("Risk level: High"), RiskLevel::High);
        assert_eq!(RiskLevel::extract("**Risk Level: Medium**"), RiskLevel::Medium);
        assert_eq!(RiskLevel::extract("risk level **low**."), RiskLevel::Low);
        assert_eq!(RiskLevel::extract("RISK LEVEL 'LOW'"), RiskLevel::Low);
    }

    #[test]
    fn missing_phrase_is_unknown() {
        assert_eq!(RiskLevel::extract("This page looks fine."), RiskLevel::Unknown);
        assert_eq!(RiskLevel::extract("The risk is High"), RiskLevel::Unknown);
        assert_eq!(RiskLevel::extract("Risk level: moderate"), RiskLevel::Unknown);
        assert_eq!(RiskLevel::extract("Risk level: lowish"), RiskLevel::Unknown);
    }

    #[test]
    fn assessment_keeps_text_verbatim() {
        let text = "## Summary\nRisk Level: High\nThe page asks for card details.".to_string();
        let assessment = Assessment::from_response(text.clone());
        assert_eq!(assessment.explanation, text);
        assert_eq!(assessment.risk, RiskLevel::High);
        assert_eq!(assessment.risk.to_string(), "high");
    }

    #[test]
    fn error_strings_are_unknown() {
        let assessment = Assessment::from_response("Error analyzing: API error: 500".to_string());
        assert_eq!(assessment.risk, RiskLevel::Unknown);
    }
}
