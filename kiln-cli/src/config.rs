//! CLI configuration
//!
//! Log levels: one global level plus optional per-phase overrides.

use kiln_config::Phase;
use std::collections::HashMap;
use tracing::Level;

/// CLI log configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub phases: HashMap<Phase, Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::WARN,
            phases: HashMap::new(),
        }
    }
}

impl LogConfig {
    /// Get log level for a specific phase
    pub fn level_for(&self, phase: Phase) -> Level {
        self.phases.get(&phase).copied().unwrap_or(self.global)
    }

    /// Apply a `phase=level` override
    pub fn apply_override(&mut self, spec: &str) -> Result<(), String> {
        let (phase, level) = spec
            .split_once('=')
            .ok_or_else(|| format!("expected PHASE=LEVEL, got '{}'", spec))?;
        let phase = parse_phase(phase.trim())?;
        let level = parse_level(level.trim())?;
        self.phases.insert(phase, level);
        Ok(())
    }
}

/// Parse log level string
pub fn parse_level(s: &str) -> Result<Level, String> {
    match s.to_lowercase().as_str() {
        // silent = only errors
        "silent" | "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        other => Err(format!("unknown log level '{}'", other)),
    }
}

fn parse_phase(s: &str) -> Result<Phase, String> {
    Phase::ALL
        .iter()
        .copied()
        .find(|p| p.as_str() == s)
        .ok_or_else(|| {
            let known: Vec<&str> = Phase::ALL.iter().map(|p| p.as_str()).collect();
            format!("unknown phase '{}' (expected one of: {})", s, known.join(", "))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_falls_back_to_global() {
        let mut config = LogConfig {
            global: Level::INFO,
            ..LogConfig::default()
        };
        config.apply_override("graph=trace").unwrap();

        assert_eq!(config.level_for(Phase::Graph), Level::TRACE);
        assert_eq!(config.level_for(Phase::Emit), Level::INFO);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG").unwrap(), Level::DEBUG);
        assert_eq!(parse_level("silent").unwrap(), Level::ERROR);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn test_bad_overrides() {
        let mut config = LogConfig::default();
        assert!(config.apply_override("graph").is_err());
        assert!(config.apply_override("linker=debug").is_err());
        assert!(config.apply_override("emit=noisy").is_err());
    }
}
