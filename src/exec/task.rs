// src/exec/task.rs

use std::fmt;

use crate::config::TasksSection;
use crate::types::BuildMode;

/// Task script to run in the runtime container.
///
/// Always `<source_dir>` + the suffix configured for the build mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCommand {
    mode: BuildMode,
    path: String,
}

impl TaskCommand {
    pub fn resolve(source_dir: &str, mode: BuildMode, tasks: &TasksSection) -> Self {
        let suffix = match mode {
            BuildMode::Full => &tasks.full_suffix,
            BuildMode::Incremental => &tasks.incremental_suffix,
        };
        Self {
            mode,
            path: format!("{source_dir}{suffix}"),
        }
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Arguments handed to the exec transport.
    pub fn argv(&self) -> Vec<String> {
        vec!["/bin/sh".to_string(), "-c".to_string(), self.path.clone()]
    }
}

impl fmt::Display for TaskCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_selects_suffix_under_shared_prefix() {
        let tasks = TasksSection {
            full_suffix: "/.udo/bin/full.sh".into(),
            incremental_suffix: "/.udo/bin/inc.sh".into(),
        };

        let full = TaskCommand::resolve("/idp/src", BuildMode::Full, &tasks);
        let inc = TaskCommand::resolve("/idp/src", BuildMode::Incremental, &tasks);

        assert_eq!(full.path(), "/idp/src/.udo/bin/full.sh");
        assert_eq!(inc.path(), "/idp/src/.udo/bin/inc.sh");
        assert_eq!(full.mode(), BuildMode::Full);
        assert_eq!(inc.to_string(), inc.path());
    }

    #[test]
    fn argv_runs_script_through_shell() {
        let cmd = TaskCommand::resolve("/idp/src", BuildMode::Full, &TasksSection::default());
        assert_eq!(
            cmd.argv(),
            vec!["/bin/sh", "-c", "/idp/src/.udo/bin/full-build-and-run.sh"]
        );
    }
}
