//! The immutable build context: which audience is being compiled, and in
//! which environment.
//!
//! A [`BuildContext`] is constructed once per target at the start of a build
//! invocation and passed explicitly to every resolver and assembler. No
//! component below the CLI reads process environment variables; the two
//! context fields determine every downstream decision.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Compilation output audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetId {
    /// Browser-executed code: esm output, code splitting, hydration chunks.
    Browser,
    /// Server-executed code: commonjs output, dependencies externalized.
    Server,
}

impl TargetId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Server => "server",
        }
    }

    /// Both defined targets, in browser-first order.
    pub fn all() -> [TargetId; 2] {
        [Self::Browser, Self::Server]
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "browser" => Ok(Self::Browser),
            "server" => Ok(Self::Server),
            other => Err(ConfigError::UnknownTarget(other.to_string())),
        }
    }
}

/// Build environment. Exactly two values; anything else is a configuration
/// error, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Interpret a process-level environment indicator (`NODE_ENV`).
    ///
    /// The invocation surface defaults to development semantics: only the
    /// exact value `production` selects production, everything else
    /// (including unset) is development. Strict parsing lives in
    /// [`FromStr`]; this lenient form is reserved for the process boundary.
    pub fn from_process_value(value: Option<&str>) -> Self {
        match value {
            Some("production") => Self::Production,
            _ => Self::Development,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// One target's immutable build parameters.
///
/// Two contexts exist per invocation (one per target). They share no mutable
/// state; the only coordination point between the resulting builds is the
/// chunk manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildContext {
    pub target: TargetId,
    pub environment: Environment,
}

impl BuildContext {
    pub fn new(target: TargetId, environment: Environment) -> Self {
        Self {
            target,
            environment,
        }
    }

    /// All four defined `(target, environment)` combinations.
    pub fn all_combinations() -> [BuildContext; 4] {
        [
            Self::new(TargetId::Browser, Environment::Development),
            Self::new(TargetId::Browser, Environment::Production),
            Self::new(TargetId::Server, Environment::Development),
            Self::new(TargetId::Server, Environment::Production),
        ]
    }
}

impl fmt::Display for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.target, self.environment)
    }
}
