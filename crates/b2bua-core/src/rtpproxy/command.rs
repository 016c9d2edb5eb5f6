use std::fmt;

/// Version token of a compatible RTP proxy control protocol
pub const SUPPORTED_VERSION: &str = "20040107";

/// Optional proxy features probed after the version check, in probe order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Recording (`C` command)
    Copy,
    /// Per-session statistics (`Q` extensions)
    Stat,
    /// Session timeout notifications
    Tnot,
    /// Automatic bridging of sockets
    Sbind,
}

impl Capability {
    /// Feature token sent with `VF`
    pub fn token(self) -> &'static str {
        match self {
            Capability::Copy => "20071218",
            Capability::Stat => "20080403",
            Capability::Tnot => "20081224",
            Capability::Sbind => "20090810",
        }
    }
}

/// A control-channel command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCommand {
    Version,
    Feature(Capability),
    Stats,
}

impl fmt::Display for RelayCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayCommand::Version => f.write_str("V"),
            RelayCommand::Feature(capability) => write!(f, "VF {}", capability.token()),
            RelayCommand::Stats => f.write_str("Ib"),
        }
    }
}
