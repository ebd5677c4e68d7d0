//! Prompt and session definition for one OS family.

use indexmap::IndexMap;

use super::privilege_level::PrivilegeLevel;

/// Everything an SSH session needs to drive one OS family: its modes,
/// which mode commands run in, and how failures show up in output.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name, equal to the command set name (`cisco_ios`, ...).
    pub name: String,

    /// Privilege levels for this platform.
    pub privilege_levels: IndexMap<String, PrivilegeLevel>,

    /// Level that show commands run from.
    pub default_privilege: String,

    /// Level that configuration sequences run in.
    pub configuration_privilege: String,

    /// Output substrings that mark a command as failed.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when the session opens.
    pub on_open_commands: Vec<String>,

    /// Commands to run before the session closes.
    pub on_close_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl PlatformDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privilege_levels: IndexMap::new(),
            default_privilege: String::new(),
            configuration_privilege: String::new(),
            failed_when_contains: vec![],
            on_open_commands: vec![],
            on_close_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege_levels.insert(level.name.clone(), level);
        self
    }

    pub fn with_default_privilege(mut self, name: impl Into<String>) -> Self {
        self.default_privilege = name.into();
        self
    }

    pub fn with_configuration_privilege(mut self, name: impl Into<String>) -> Self {
        self.configuration_privilege = name.into();
        self
    }

    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    pub fn with_on_close_command(mut self, command: impl Into<String>) -> Self {
        self.on_close_commands.push(command.into());
        self
    }

    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    pub fn get_privilege(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.privilege_levels.get(name)
    }

    /// First failure pattern contained in `output`.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .map(String::as_str)
            .find(|pattern| output.contains(pattern))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_failure_detection() {
        let platform = PlatformDefinition::new("lab")
            .with_privilege(PrivilegeLevel::new("exec", r">\s?$").unwrap())
            .with_default_privilege("exec")
            .with_configuration_privilege("exec")
            .with_failure_pattern("% Invalid input")
            .with_on_open_command("terminal length 0")
            .with_terminal_size(200, 40);

        assert_eq!(platform.privilege_levels.len(), 1);
        assert!(platform.get_privilege("exec").is_some());
        assert_eq!(platform.terminal_width, 200);
        assert_eq!(
            platform.detect_failure("   ^\n% Invalid input detected at '^' marker."),
            Some("% Invalid input")
        );
        assert_eq!(platform.detect_failure("Building configuration...\n[OK]"), None);
    }
}
