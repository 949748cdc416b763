use regex::Regex;
use std::sync::LazyLock;

/// Why a command was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectCategory {
    /// Destructive, privilege-escalating, or network-reaching.
    Dangerous,
    /// Attempts to leave the workspace (cd, `..`, `$HOME`, substitution).
    Escaping,
    /// Empty or whitespace-only input.
    Empty,
}

/// Verdict of the command classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Safe,
    Rejected {
        category: RejectCategory,
        reason: &'static str,
    },
}

impl Classification {
    pub fn is_safe(&self) -> bool {
        matches!(self, Classification::Safe)
    }
}

pub const REASON_EMPTY: &str = "Command cannot be empty";
pub const REASON_DIRECTORY_CHANGE: &str = "Directory change commands are not allowed";
pub const REASON_HOME_REFERENCE: &str = "Home directory references are not allowed";
pub const REASON_PARENT_TRAVERSAL: &str = "Parent directory traversal is not allowed";
pub const REASON_ESCAPE: &str = "Command attempts to escape workspace";

struct RuleSpec {
    pattern: &'static str,
    category: RejectCategory,
    reason: &'static str,
}

/// Ordered rule table. Dangerous rules run before escape rules so that a
/// command matching both (e.g. `cp ../x .`) classifies as dangerous
/// regardless of how the escape rules evolve.
const RULES: &[RuleSpec] = &[
    // --- dangerous ---
    RuleSpec {
        pattern: r"\brm\s+(?:-rf|-fr|-r\s+-f|-f\s+-r)\s+(?:/|~/?|\*)(?:\s|$)",
        category: RejectCategory::Dangerous,
        reason: "Recursive removal of root, home, or glob targets is not allowed",
    },
    RuleSpec {
        pattern: r"^(?:sudo|su)(?:\s|$)",
        category: RejectCategory::Dangerous,
        reason: "Privilege escalation commands are not allowed",
    },
    RuleSpec {
        pattern: r"\bchmod\b.*\b777\b",
        category: RejectCategory::Dangerous,
        reason: "Making files world-writable is not allowed",
    },
    RuleSpec {
        pattern: r"\bchown\b.*\broot\b",
        category: RejectCategory::Dangerous,
        reason: "Changing ownership to root is not allowed",
    },
    RuleSpec {
        pattern: r"\b(?:curl|wget)\b.*\|\s*(?:sh|bash|zsh|fish)\b",
        category: RejectCategory::Dangerous,
        reason: "Piping downloads into a shell is not allowed",
    },
    RuleSpec {
        pattern: r"\|\s*(?:sh|bash|zsh|fish)\s*$",
        category: RejectCategory::Dangerous,
        reason: "Piping into a shell is not allowed",
    },
    RuleSpec {
        pattern: r"^(?:wget|curl|nc|ncat|telnet|ftp|ssh|scp|rsync)(?:\s|$)",
        category: RejectCategory::Dangerous,
        reason: "Network commands are not allowed",
    },
    RuleSpec {
        pattern: r"\bkill\s+-9\b",
        category: RejectCategory::Dangerous,
        reason: "Force-killing processes is not allowed",
    },
    RuleSpec {
        pattern: r"^(?:killall|pkill)(?:\s|$)",
        category: RejectCategory::Dangerous,
        reason: "Killing processes by name is not allowed",
    },
    RuleSpec {
        pattern: r"^(?:shutdown|reboot|halt)(?:\s|$)|^init\s+[06](?:\s|$)",
        category: RejectCategory::Dangerous,
        reason: "System control commands are not allowed",
    },
    RuleSpec {
        pattern: r"^(?:mount|umount|fdisk|mkfs|fsck)(?:\.|\s|$)",
        category: RejectCategory::Dangerous,
        reason: "Filesystem administration commands are not allowed",
    },
    RuleSpec {
        pattern: r"`[^`]*(?:sudo|\bsu\b|rm\s+-rf\s+/|shutdown|reboot)[^`]*`",
        category: RejectCategory::Dangerous,
        reason: "Dangerous commands inside command substitution are not allowed",
    },
    RuleSpec {
        pattern: r"\$\([^)]*(?:sudo|\bsu\b|rm\s+-rf\s+/|shutdown|reboot)[^)]*\)",
        category: RejectCategory::Dangerous,
        reason: "Dangerous commands inside command substitution are not allowed",
    },
    RuleSpec {
        pattern: r"^(?:cp|mv|ln)\b.*\.\./",
        category: RejectCategory::Dangerous,
        reason: "Copying or linking across parent directories is not allowed",
    },
    RuleSpec {
        pattern: r"\bln\s+-s\b",
        category: RejectCategory::Dangerous,
        reason: "Symlink creation is not allowed",
    },
    // --- escaping ---
    RuleSpec {
        pattern: r"(?:^|[;&|(]\s*)(?:cd|pushd|popd)(?:\s|$)",
        category: RejectCategory::Escaping,
        reason: REASON_DIRECTORY_CHANGE,
    },
    RuleSpec {
        pattern: r"\bexport\s+(?:path|home|pwd)=",
        category: RejectCategory::Escaping,
        reason: REASON_ESCAPE,
    },
    RuleSpec {
        pattern: r"~/|\$home\b|\$\{home\}",
        category: RejectCategory::Escaping,
        reason: REASON_HOME_REFERENCE,
    },
    RuleSpec {
        pattern: r"\.\./|\.\.\\",
        category: RejectCategory::Escaping,
        reason: REASON_PARENT_TRAVERSAL,
    },
    RuleSpec {
        pattern: r"`|\$\(",
        category: RejectCategory::Escaping,
        reason: REASON_ESCAPE,
    },
];

struct CommandRule {
    regex: Regex,
    category: RejectCategory,
    reason: &'static str,
}

static COMPILED_RULES: LazyLock<Vec<CommandRule>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|spec| CommandRule {
            regex: Regex::new(spec.pattern).expect("command policy regex"),
            category: spec.category,
            reason: spec.reason,
        })
        .collect()
});

/// Classify a command string as safe, dangerous, or workspace-escaping.
///
/// Pure and deterministic: rules are evaluated in table order against the
/// trimmed, lowercased command with shell line continuations collapsed, and
/// the first match wins.
pub fn classify_command(command: &str) -> Classification {
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return Classification::Rejected {
            category: RejectCategory::Empty,
            reason: REASON_EMPTY,
        };
    }

    // "rm \<newline>-rf /" must look like "rm -rf /" to the rules below.
    let normalized = trimmed.replace("\\\n", " ").to_lowercase();

    for rule in COMPILED_RULES.iter() {
        if rule.regex.is_match(&normalized) {
            return Classification::Rejected {
                category: rule.category,
                reason: rule.reason,
            };
        }
    }

    Classification::Safe
}

#[cfg(test)]
mod tests;
