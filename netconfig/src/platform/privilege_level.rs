//! Prompt-identified privilege levels.

use regex::bytes::Regex;

/// One CLI mode of a device, recognised by its prompt.
///
/// Levels form a tree through `parent`; the session walks that tree
/// with the escalate/de-escalate commands to reach a target mode.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    /// Level name (`exec`, `privilege_exec`, `configuration`).
    pub name: String,

    /// Prompt pattern for this level.
    pub pattern: Regex,

    /// Parent level, `None` for the root.
    pub parent: Option<String>,

    /// Command sent from the parent to enter this level.
    pub escalate_command: Option<String>,

    /// Command sent from this level to return to the parent.
    pub deescalate_command: Option<String>,

    /// Password prompt shown while escalating, if any.
    pub escalate_prompt: Option<Regex>,

    /// Prompt substrings that rule this level out.
    pub not_contains: Vec<String>,
}

impl PrivilegeLevel {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            parent: None,
            escalate_command: None,
            deescalate_command: None,
            escalate_prompt: None,
            not_contains: vec![],
        })
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_escalate(mut self, command: impl Into<String>) -> Self {
        self.escalate_command = Some(command.into());
        self
    }

    pub fn with_deescalate(mut self, command: impl Into<String>) -> Self {
        self.deescalate_command = Some(command.into());
        self
    }

    /// Escalation asks for a password matching `prompt_pattern`.
    pub fn with_auth(mut self, prompt_pattern: &str) -> Result<Self, regex::Error> {
        self.escalate_prompt = Some(Regex::new(prompt_pattern)?);
        Ok(self)
    }

    pub fn with_not_contains(mut self, pattern: impl Into<String>) -> Self {
        self.not_contains.push(pattern.into());
        self
    }

    pub fn needs_auth(&self) -> bool {
        self.escalate_prompt.is_some()
    }

    /// Check whether `prompt` belongs to this level.
    pub fn matches(&self, prompt: &str) -> bool {
        if self.not_contains.iter().any(|nc| prompt.contains(nc.as_str())) {
            return false;
        }
        self.pattern.is_match(prompt.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_contains_excludes_prompt() {
        let level = PrivilegeLevel::new("privilege_exec", r"(?m)^\S+#\s?$")
            .unwrap()
            .with_not_contains("(config");

        assert!(level.matches("core1#"));
        assert!(!level.matches("core1(config)#"));
    }

    #[test]
    fn test_auth_prompt() {
        let level = PrivilegeLevel::new("privilege_exec", r"#\s?$")
            .unwrap()
            .with_parent("exec")
            .with_escalate("enable")
            .with_auth(r"(?im)^password:\s?$")
            .unwrap();

        assert!(level.needs_auth());
        assert_eq!(level.parent.as_deref(), Some("exec"));
        let prompt = level.escalate_prompt.as_ref().unwrap();
        assert!(prompt.is_match(b"Password: "));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(PrivilegeLevel::new("broken", r"(unclosed").is_err());
    }
}
