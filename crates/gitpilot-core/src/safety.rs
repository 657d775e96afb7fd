//! Risk classification
//!
//! Commands are matched against two fixed pattern tables. The dangerous
//! table is evaluated first and in full; when any dangerous pattern matches,
//! caution patterns are not consulted. Within a table every matching
//! pattern contributes its warning (and alternatives), in table order.

use gitpilot_llm::Verdict;
use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::messages::{SafetyCheckRequest, SafetyCheckResponse};
use crate::supervisor::Worker;

struct DangerPattern {
    matcher: Regex,
    /// Suppresses an occurrence when it matches the text following it
    exclude: Option<Regex>,
    warning: &'static str,
    alternatives: &'static [&'static str],
}

struct CautionPattern {
    matcher: Regex,
    exclude: Option<Regex>,
    warning: &'static str,
}

/// Outcome of classifying one command.
#[derive(Debug, Clone)]
pub struct Classification {
    /// Safe when no pattern matched
    pub verdict: Verdict,
    /// One warning per matching pattern, in table order
    pub warnings: Vec<String>,
    /// Safer alternatives, in table order
    pub alternatives: Vec<String>,
}

/// Pattern-table risk classifier.
pub struct RiskClassifier {
    dangerous: Vec<DangerPattern>,
    caution: Vec<CautionPattern>,
}

impl RiskClassifier {
    /// Classifier loaded with the built-in pattern tables.
    ///
    /// Patterns are compiled from static literals; compilation cannot fail
    /// at runtime for any input, so this constructor is infallible.
    #[must_use]
    pub fn with_default_patterns() -> Self {
        let re = |s: &str| Regex::new(s).unwrap_or_else(|e| panic!("builtin pattern {s:?}: {e}"));

        let dangerous = vec![
            DangerPattern {
                matcher: re(r"(?i)git\s+reset\s+--hard"),
                exclude: None,
                warning: "Permanently discards all uncommitted changes and commits",
                alternatives: &[
                    "git reset --soft HEAD~1 (keeps changes staged)",
                    "git stash (temporarily save changes)",
                    "git revert <commit> (safe undo)",
                ],
            },
            DangerPattern {
                matcher: re(r"(?i)git\s+push\s+(-f|--force)"),
                exclude: Some(re(r"(?i)^-with-lease")),
                warning: "Overwrites remote history, can cause data loss for team members",
                alternatives: &[
                    "git push --force-with-lease (safer, checks for new commits)",
                    "git revert <commit> then push (preserves history)",
                ],
            },
            DangerPattern {
                matcher: re(r"(?i)git\s+clean\s+-f"),
                exclude: None,
                warning: "Permanently deletes untracked files",
                alternatives: &[
                    "git clean -n (dry run first)",
                    "git stash --include-untracked (save instead of delete)",
                ],
            },
            DangerPattern {
                // -D stays case-sensitive: plain -d refuses unmerged deletes
                // and is safe on its own
                matcher: re(r"(?i:git\s+branch\s+)-D"),
                exclude: None,
                warning: "Force deletes branch even if not merged",
                alternatives: &[
                    "git branch -d (only deletes if merged)",
                    "Check merge status first: git branch --merged",
                ],
            },
            DangerPattern {
                matcher: re(r"(?i)git\s+rebase.*(main|master)"),
                exclude: None,
                warning: "Rebasing shared branches can cause conflicts for team",
                alternatives: &[
                    "git merge main (preserves history)",
                    "Only rebase local/feature branches",
                ],
            },
        ];

        let caution = vec![
            CautionPattern {
                // the dangerous table has already claimed --hard by the time
                // this is consulted
                matcher: re(r"(?i)git\s+reset"),
                exclude: None,
                warning: "Modifies commit history, use with care",
            },
            CautionPattern {
                matcher: re(r"(?i)git\s+checkout\s+--"),
                exclude: None,
                warning: "Discards local changes to file",
            },
            CautionPattern {
                matcher: re(r"(?i)git\s+restore"),
                exclude: Some(re(r"(?i)--staged")),
                warning: "Discards uncommitted changes",
            },
            CautionPattern {
                matcher: re(r"(?i)git\s+stash\s+drop"),
                exclude: None,
                warning: "Permanently deletes stashed changes",
            },
            CautionPattern {
                matcher: re(r"(?i)git\s+merge"),
                exclude: None,
                warning: "May cause merge conflicts",
            },
            CautionPattern {
                matcher: re(r"(?i)git\s+rebase"),
                exclude: None,
                warning: "Rewrites commit history",
            },
            CautionPattern {
                matcher: re(r"(?i)git\s+push\s+--force-with-lease"),
                exclude: None,
                warning: "Safer force push, but still overwrites remote",
            },
        ];

        Self { dangerous, caution }
    }

    /// Classify one command string.
    #[must_use]
    pub fn classify(&self, command: &str) -> Classification {
        let mut warnings = Vec::new();
        let mut alternatives = Vec::new();

        for p in &self.dangerous {
            if pattern_hits(&p.matcher, p.exclude.as_ref(), command) {
                warnings.push(p.warning.to_owned());
                alternatives.extend(p.alternatives.iter().map(|a| (*a).to_owned()));
            }
        }
        if !warnings.is_empty() {
            return Classification {
                verdict: Verdict::Dangerous,
                warnings,
                alternatives,
            };
        }

        for p in &self.caution {
            if pattern_hits(&p.matcher, p.exclude.as_ref(), command) {
                warnings.push(p.warning.to_owned());
            }
        }
        let verdict = if warnings.is_empty() {
            Verdict::Safe
        } else {
            Verdict::Caution
        };
        Classification {
            verdict,
            warnings,
            alternatives,
        }
    }
}

/// A pattern hits when at least one occurrence is not excused by its
/// exclude regex. The exclude is tested against the text following that
/// occurrence only, so one excused occurrence does not shield another
/// match later in a compound command.
fn pattern_hits(matcher: &Regex, exclude: Option<&Regex>, command: &str) -> bool {
    matcher.find_iter(command).any(|m| match exclude {
        Some(x) => !x.is_match(&command[m.end()..]),
        None => true,
    })
}

/// Messages accepted by the classification stage.
pub enum SafetyMsg {
    /// Vet one command and reply with the verdict.
    Check {
        /// The request
        request: SafetyCheckRequest,
        /// Reply address
        reply: tokio::sync::oneshot::Sender<SafetyCheckResponse>,
    },
}

/// Classification stage worker.
pub struct SafetyStage {
    classifier: RiskClassifier,
}

impl SafetyStage {
    /// Stage with the built-in pattern tables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            classifier: RiskClassifier::with_default_patterns(),
        }
    }
}

impl Default for SafetyStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Worker for SafetyStage {
    type Msg = SafetyMsg;

    async fn handle(&mut self, msg: SafetyMsg) -> Result<()> {
        let SafetyMsg::Check { request, reply } = msg;
        let classification = self.classifier.classify(&request.command);
        debug!(
            session_id = %request.session_id,
            command = %request.command,
            verdict = %classification.verdict,
            "classified"
        );
        let response = SafetyCheckResponse {
            session_id: request.session_id,
            command: request.command,
            approved: classification.verdict.approved(),
            verdict: classification.verdict,
            warnings: classification.warnings,
            alternatives: classification.alternatives,
        };
        // the asker may have timed out; that is its problem, not ours
        let _ = reply.send(response);
        Ok(())
    }
}
