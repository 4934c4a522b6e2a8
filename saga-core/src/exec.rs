//! Fan-out execution modes shared by both coordinators.

use serde::{Deserialize, Serialize};

/// How a coordinator runs its collaborator set.
///
/// Either mode isolates failures to the collaborator that failed; the
/// difference is only whether collaborators overlap in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Start every collaborator at once and wait for all of them.
    #[default]
    Parallel,
    /// Run collaborators one at a time in dependency order.
    Sequential,
}

impl ExecutionMode {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            ExecutionMode::Parallel => "parallel",
            ExecutionMode::Sequential => "sequential",
        }
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parallel" => Ok(ExecutionMode::Parallel),
            "sequential" => Ok(ExecutionMode::Sequential),
            other => Err(format!("unknown execution mode: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!("parallel".parse(), Ok(ExecutionMode::Parallel));
        assert_eq!("Sequential".parse(), Ok(ExecutionMode::Sequential));
        assert!("eager".parse::<ExecutionMode>().is_err());
    }
}
