//! Rule and classification type definitions.

use serde::{Deserialize, Serialize};

use crate::error::RulesError;
use sentinel_core::defaults::{DEFAULT_FLAG_TTL_SECS, DEFAULT_SEMANTIC_THRESHOLD};

/// Action to take when a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Allow,
    Block,
    Flag,
    Alert,
    Sanitize,
    SetFlag,
    Pass,
}

impl Action {
    /// Static label for metrics and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Block => "block",
            Action::Flag => "flag",
            Action::Alert => "alert",
            Action::Sanitize => "sanitize",
            Action::SetFlag => "set_flag",
            Action::Pass => "pass",
        }
    }

    /// Ordering weight: cheap non-blocking actions evaluate first so their
    /// flag side-effects are visible to later rules in the same pass.
    pub fn weight(&self) -> u32 {
        match self {
            Action::Pass => 0,
            Action::SetFlag => 1,
            Action::Flag => 2,
            Action::Alert => 3,
            Action::Block => 4,
            Action::Allow | Action::Sanitize => 5,
        }
    }

    /// Check if this is the BLOCK action.
    pub fn is_block(&self) -> bool {
        matches!(self, Action::Block)
    }
}

/// Severity of the threat a rule describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Threat class a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PromptInjection,
    Jailbreak,
    DataExfiltration,
    SocialEngineering,
    MaliciousCode,
    PolicyViolation,
    /// Classes this build does not know about deserialize here.
    #[serde(other)]
    Other,
}

/// Flag directives attached to a rule.
///
/// `check` gates eligibility (all listed flags must currently be true);
/// `set`/`unset` mutate conversation state when the rule fires; `ttl`
/// refreshes the state lifetime in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagDirectives {
    #[serde(default)]
    pub set: Vec<String>,
    #[serde(default)]
    pub unset: Vec<String>,
    #[serde(default)]
    pub check: Vec<String>,
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl FlagDirectives {
    /// True when no directive is present at all.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty() && self.check.is_empty()
    }
}

/// An immutable threat rule record.
///
/// Rules arrive as structured records (JSON or equivalent); the engine never
/// compiles a rule language. A rule declares up to three match stages
/// (content, pcre, semantic) and matches iff every declared stage passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Stable unique identifier; used as the map key across components.
    pub id: String,

    /// Literal keywords, AND-joined: every keyword must be a substring.
    #[serde(default)]
    pub content: Vec<String>,
    /// Regex patterns, AND-joined: every pattern must find a match.
    #[serde(default)]
    pub pcre: Vec<String>,
    /// Exemplar phrases for similarity matching, OR-joined.
    #[serde(default)]
    pub semantic: Vec<String>,
    /// Similarity floor in [0, 1] for the semantic stage.
    #[serde(default)]
    pub semantic_threshold: Option<f64>,

    /// Flag directives (gate, mutations, state lifetime).
    #[serde(default)]
    pub flags: Option<FlagDirectives>,

    /// Fire only after this many matches within `window` seconds.
    #[serde(default)]
    pub threshold: Option<u32>,
    /// Rolling window in seconds for `threshold`.
    #[serde(default)]
    pub window: Option<u64>,

    pub category: Category,
    pub severity: Severity,
    pub action: Action,

    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Case-insensitive matching for content and pcre stages.
    #[serde(default = "default_true")]
    pub nocase: bool,
}

fn default_true() -> bool {
    true
}

impl Rule {
    /// True when the rule declares a content stage.
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    /// True when the rule declares a pcre stage.
    pub fn has_pcre(&self) -> bool {
        !self.pcre.is_empty()
    }

    /// True when the rule declares a semantic stage.
    pub fn has_semantic(&self) -> bool {
        !self.semantic.is_empty()
    }

    /// True when any flag directive (set, unset or check) is present.
    pub fn has_flag_directives(&self) -> bool {
        self.flags.as_ref().is_some_and(|f| !f.is_empty())
    }

    /// Flags that must all be true for the rule to be eligible.
    pub fn check_flags(&self) -> &[String] {
        self.flags.as_ref().map_or(&[], |f| f.check.as_slice())
    }

    /// A rule with no stage inputs and no check gate can never match.
    /// Inert rules are accepted on load but produce no results.
    pub fn is_inert(&self) -> bool {
        !self.has_content()
            && !self.has_pcre()
            && !self.has_semantic()
            && self.check_flags().is_empty()
    }

    /// Similarity floor for the semantic stage.
    pub fn semantic_floor(&self) -> f64 {
        self.semantic_threshold.unwrap_or(DEFAULT_SEMANTIC_THRESHOLD)
    }

    /// State lifetime in seconds applied when this rule fires.
    pub fn flag_ttl_secs(&self) -> u64 {
        self.flags
            .as_ref()
            .and_then(|f| f.ttl)
            .unwrap_or(DEFAULT_FLAG_TTL_SECS)
    }

    /// Integer priority key; lower evaluates first.
    ///
    /// `action_weight * 10 + type_cost`, where type cost counts the stages
    /// the rule declares. The sort over this key must be stable so
    /// equal-priority rules retain author order.
    pub fn priority(&self) -> u32 {
        let type_cost = u32::from(self.has_content())
            + if self.has_pcre() { 2 } else { 0 }
            + if self.has_semantic() { 3 } else { 0 }
            + if self.has_flag_directives() { 4 } else { 0 };
        self.action.weight() * 10 + type_cost
    }
}

/// Parse a batch of rule records from a JSON array.
pub fn rules_from_json(json: &str) -> Result<Vec<Rule>, RulesError> {
    serde_json::from_str(json).map_err(|e| RulesError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(id: &str, action: Action) -> Rule {
        Rule {
            id: id.into(),
            content: vec![],
            pcre: vec![],
            semantic: vec![],
            semantic_threshold: None,
            flags: None,
            threshold: None,
            window: None,
            category: Category::Other,
            severity: Severity::Low,
            action,
            enabled: true,
            nocase: true,
        }
    }

    #[test]
    fn priority_key_composition() {
        let mut r = minimal("r", Action::Block);
        r.content = vec!["a".into()];
        r.pcre = vec!["b".into()];
        // block = 4, content(1) + pcre(2) = 3
        assert_eq!(r.priority(), 43);

        let mut r = minimal("r", Action::Pass);
        r.flags = Some(FlagDirectives {
            set: vec!["s1".into()],
            ..Default::default()
        });
        // pass = 0, flags(4)
        assert_eq!(r.priority(), 4);

        let mut r = minimal("r", Action::Allow);
        r.semantic = vec!["phrase".into()];
        // other = 5, semantic(3)
        assert_eq!(r.priority(), 53);
    }

    #[test]
    fn serde_defaults() {
        let json = r#"{
            "id": "r1",
            "content": ["verify"],
            "category": "social_engineering",
            "severity": "medium",
            "action": "pass"
        }"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert!(rule.enabled);
        assert!(rule.nocase);
        assert!(rule.pcre.is_empty());
        assert!(rule.flags.is_none());
        assert!((rule.semantic_floor() - 0.85).abs() < f64::EPSILON);
        assert_eq!(rule.flag_ttl_secs(), 86_400);
    }

    #[test]
    fn unknown_category_tolerated() {
        let json = r#"{
            "id": "r1",
            "content": ["x"],
            "category": "brand_new_threat",
            "severity": "low",
            "action": "flag"
        }"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.category, Category::Other);
    }

    #[test]
    fn inert_rule_detection() {
        let r = minimal("r", Action::Block);
        assert!(r.is_inert());

        let mut gated = minimal("r", Action::Block);
        gated.flags = Some(FlagDirectives {
            check: vec!["f".into()],
            ..Default::default()
        });
        assert!(!gated.is_inert());

        let mut content = minimal("r", Action::Block);
        content.content = vec!["x".into()];
        assert!(!content.is_inert());
    }

    #[test]
    fn rules_from_json_batch() {
        let json = r#"[
            {"id": "a", "content": ["x"], "category": "jailbreak",
             "severity": "high", "action": "block"},
            {"id": "b", "pcre": ["y+"], "category": "prompt_injection",
             "severity": "low", "action": "flag", "enabled": false}
        ]"#;
        let rules = rules_from_json(json).unwrap();
        assert_eq!(rules.len(), 2);
        assert!(!rules[1].enabled);
    }

    #[test]
    fn rules_from_json_malformed() {
        assert!(rules_from_json("not json").is_err());
    }
}
