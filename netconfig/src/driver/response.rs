//! Result of one command sent over the shell.

use std::time::Duration;

/// Output of a single command.
#[derive(Debug, Clone)]
pub struct Response {
    pub command: String,

    /// Output with the command echo and trailing prompt removed.
    pub result: String,

    /// Everything read after sending the command.
    pub raw_result: String,

    /// Prompt the output ended with.
    pub prompt: String,

    pub elapsed: Duration,

    /// First platform failure string found in the output.
    pub failure_message: Option<String>,
}

impl Response {
    /// Build a response from the raw bytes read after `command`.
    ///
    /// The prompt is the last non-blank line. Failure strings are checked
    /// against the cleaned output.
    pub fn from_raw(
        command: &str,
        raw: &str,
        elapsed: Duration,
        failure_patterns: &[String],
    ) -> Self {
        let mut lines: Vec<&str> = raw
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();

        while lines.last().is_some_and(|line| line.trim().is_empty()) {
            lines.pop();
        }
        let prompt = lines.pop().map(|p| p.trim().to_string()).unwrap_or_default();

        if lines
            .first()
            .is_some_and(|first| first.trim_end().ends_with(command.trim()))
        {
            lines.remove(0);
        }

        let result = lines.join("\n");
        let failure_message = failure_patterns
            .iter()
            .find(|pattern| result.contains(pattern.as_str()))
            .cloned();

        Self {
            command: command.to_string(),
            result,
            raw_result: raw.to_string(),
            prompt,
            elapsed,
            failure_message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    /// Raw output split into lines, prompt included.
    pub fn raw_lines(&self) -> impl Iterator<Item = &str> {
        self.raw_result
            .lines()
            .map(|line| line.trim_end_matches('\r'))
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failures() -> Vec<String> {
        vec!["% Invalid input detected".to_string()]
    }

    #[test]
    fn test_strips_echo_and_prompt() {
        let raw = "show clock\r\n*10:01:22.123 UTC Mon Oct 19 2026\r\nsw1#";
        let response = Response::from_raw("show clock", raw, Duration::ZERO, &failures());
        assert_eq!(response.result, "*10:01:22.123 UTC Mon Oct 19 2026");
        assert_eq!(response.prompt, "sw1#");
        assert!(response.is_success());
    }

    #[test]
    fn test_detects_failure() {
        let raw = "switchport voice vlan abc\r\n                      ^\r\n% Invalid input detected at '^' marker.\r\n\r\nsw1(config-if)#";
        let response =
            Response::from_raw("switchport voice vlan abc", raw, Duration::ZERO, &failures());
        assert_eq!(
            response.failure_message.as_deref(),
            Some("% Invalid input detected")
        );
        assert_eq!(response.prompt, "sw1(config-if)#");
        assert_eq!(response.raw_lines().count(), 5);
    }

    #[test]
    fn test_empty_output() {
        let response = Response::from_raw("end", "end\r\nsw1#", Duration::ZERO, &failures());
        assert_eq!(response.result, "");
        assert_eq!(response.lines().count(), 0);
    }
}
