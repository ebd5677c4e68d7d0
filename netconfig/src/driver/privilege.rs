//! Privilege level tracking and navigation.
//!
//! Levels form a tree through `parent`. Moving between two levels
//! climbs from the current level to the closest shared ancestor, then
//! descends to the target, one transition command per edge.

use indexmap::IndexMap;
use regex::bytes::Regex;

use crate::error::{Result, SessionError};
use crate::platform::PrivilegeLevel;

/// Tracks the session's privilege level and plans transitions.
#[derive(Debug)]
pub struct PrivilegeManager {
    levels: IndexMap<String, PrivilegeLevel>,
    current: Option<String>,
}

/// One edge of a privilege path.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Level the transition lands on.
    pub target: String,

    /// Command that performs the transition.
    pub command: String,

    /// Password prompt the device may show after `command`.
    pub auth_prompt: Option<Regex>,
}

impl PrivilegeManager {
    pub fn new(levels: IndexMap<String, PrivilegeLevel>) -> Self {
        Self {
            levels,
            current: None,
        }
    }

    /// Find the level whose pattern matches `prompt`.
    pub fn determine_from_prompt(&self, prompt: &str) -> Result<&PrivilegeLevel> {
        self.levels
            .values()
            .find(|level| level.matches(prompt))
            .ok_or_else(|| {
                SessionError::UnknownPrivilege {
                    prompt: prompt.to_string(),
                }
                .into()
            })
    }

    /// Update the current level from a prompt, returning its name.
    pub fn observe_prompt(&mut self, prompt: &str) -> Result<String> {
        let name = self.determine_from_prompt(prompt)?.name.clone();
        self.current = Some(name.clone());
        Ok(name)
    }

    pub fn current(&self) -> Option<&PrivilegeLevel> {
        self.current.as_ref().and_then(|name| self.levels.get(name))
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn set_current(&mut self, name: &str) -> Result<()> {
        if !self.levels.contains_key(name) {
            return Err(SessionError::UnknownPrivilege {
                prompt: name.to_string(),
            }
            .into());
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    /// Forget the current level, e.g. after the session closes.
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn get(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.levels.get(name)
    }

    /// `name` followed by its ancestors up to the root.
    fn lineage(&self, name: &str) -> Option<Vec<&str>> {
        let mut chain = Vec::new();
        let mut level = self.levels.get(name)?;
        loop {
            chain.push(level.name.as_str());
            match &level.parent {
                Some(parent) => {
                    // A cycle would loop forever; treat it as unreachable.
                    if chain.len() > self.levels.len() {
                        return None;
                    }
                    level = self.levels.get(parent)?;
                }
                None => return Some(chain),
            }
        }
    }

    /// Level names from `from` to `to`, both included.
    pub fn find_path(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let no_path = || SessionError::NoPrivilegePath {
            from: from.to_string(),
            to: to.to_string(),
        };

        let up = self.lineage(from).ok_or_else(no_path)?;
        let down = self.lineage(to).ok_or_else(no_path)?;

        let (up_idx, down_idx) = up
            .iter()
            .enumerate()
            .find_map(|(i, name)| down.iter().position(|d| d == name).map(|j| (i, j)))
            .ok_or_else(no_path)?;

        let path = up[..=up_idx]
            .iter()
            .chain(down[..down_idx].iter().rev())
            .map(|name| name.to_string())
            .collect();
        Ok(path)
    }

    /// Transition between two adjacent levels.
    pub fn transition(&self, from: &str, to: &str) -> Option<Transition> {
        let from_level = self.levels.get(from)?;
        let to_level = self.levels.get(to)?;

        if to_level.parent.as_deref() == Some(from) {
            return Some(Transition {
                target: to.to_string(),
                command: to_level.escalate_command.clone()?,
                auth_prompt: to_level.escalate_prompt.clone(),
            });
        }

        if from_level.parent.as_deref() == Some(to) {
            return Some(Transition {
                target: to.to_string(),
                command: from_level.deescalate_command.clone()?,
                auth_prompt: None,
            });
        }

        None
    }

    /// Transitions needed to get from the current level to `target`.
    pub fn plan(&self, target: &str) -> Result<Vec<Transition>> {
        let from = self.current.as_deref().ok_or(SessionError::NotConnected)?;
        let path = self.find_path(from, target)?;
        path.windows(2)
            .map(|pair| {
                self.transition(&pair[0], &pair[1]).ok_or_else(|| {
                    SessionError::NoPrivilegePath {
                        from: pair[0].clone(),
                        to: pair[1].clone(),
                    }
                    .into()
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::DeviceCommandSet;
    use crate::platform::vendors::cisco_ios::CiscoIos;
    use crate::platform::vendors::cisco_nxos::CiscoNxos;

    fn ios_manager() -> PrivilegeManager {
        PrivilegeManager::new(CiscoIos.platform().privilege_levels)
    }

    #[test]
    fn test_determine_from_prompt() {
        let manager = ios_manager();
        assert_eq!(manager.determine_from_prompt("sw1>").unwrap().name, "exec");
        assert_eq!(
            manager.determine_from_prompt("sw1#").unwrap().name,
            "privilege_exec"
        );
        assert_eq!(
            manager.determine_from_prompt("sw1(config-if)#").unwrap().name,
            "configuration"
        );
        assert!(manager.determine_from_prompt("login:").is_err());
    }

    #[test]
    fn test_find_path_up_and_down() {
        let manager = ios_manager();
        assert_eq!(
            manager.find_path("exec", "configuration").unwrap(),
            vec!["exec", "privilege_exec", "configuration"]
        );
        assert_eq!(
            manager.find_path("configuration", "exec").unwrap(),
            vec!["configuration", "privilege_exec", "exec"]
        );
        assert_eq!(
            manager.find_path("privilege_exec", "privilege_exec").unwrap(),
            vec!["privilege_exec"]
        );
    }

    #[test]
    fn test_find_path_across_branches() {
        let levels = CiscoIos
            .platform()
            .with_privilege(
                PrivilegeLevel::new("shell", r"(?m)^bash-\d\.\d\$\s?$")
                    .unwrap()
                    .with_parent("privilege_exec")
                    .with_escalate("run bash")
                    .with_deescalate("exit"),
            )
            .privilege_levels;
        let manager = PrivilegeManager::new(levels);
        assert_eq!(
            manager.find_path("configuration", "shell").unwrap(),
            vec!["configuration", "privilege_exec", "shell"]
        );
    }

    #[test]
    fn test_find_path_unknown_level() {
        let manager = ios_manager();
        assert!(manager.find_path("exec", "rommon").is_err());
    }

    #[test]
    fn test_plan_from_exec() {
        let mut manager = ios_manager();
        manager.observe_prompt("sw1>").unwrap();

        let plan = manager.plan("configuration").unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].command, "enable");
        assert!(plan[0].auth_prompt.is_some());
        assert_eq!(plan[1].command, "configure terminal");
        assert_eq!(plan[1].target, "configuration");
    }

    #[test]
    fn test_plan_down_from_configuration() {
        let mut manager = PrivilegeManager::new(CiscoNxos.platform().privilege_levels);
        manager.observe_prompt("leaf1(config-if)#").unwrap();

        let plan = manager.plan("privilege_exec").unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].command, "end");
        assert!(plan[0].auth_prompt.is_none());
    }

    #[test]
    fn test_plan_requires_known_level() {
        let manager = ios_manager();
        assert!(manager.plan("configuration").is_err());
    }
}
