use clap::ValueEnum;

use janus_config::TargetId;

/// Target selection for `janus build`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum TargetSelector {
    /// Browser bundle only: esm output with code splitting
    #[value(name = "browser")]
    Browser,

    /// Server bundle only: commonjs output with externalized dependencies
    #[value(name = "server")]
    Server,

    /// Both bundles, compiled concurrently
    #[value(name = "both")]
    Both,
}

impl TargetSelector {
    /// Expand the selection into concrete targets, browser first.
    pub fn targets(&self) -> Vec<TargetId> {
        match self {
            Self::Browser => vec![TargetId::Browser],
            Self::Server => vec![TargetId::Server],
            Self::Both => vec![TargetId::Browser, TargetId::Server],
        }
    }
}
