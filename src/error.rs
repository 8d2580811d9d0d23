use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("capture engine `{0}` is not installed or not in PATH")]
    EngineMissing(String),

    #[error("unable to open capture interface `{interface}`: {message}")]
    CaptureDenied { interface: String, message: String },

    #[error("either --src-ip or --select must be specified")]
    NoTarget,

    #[error("no active UE interfaces with IP addresses found")]
    NoActiveInterfaces,

    #[error("no valid interfaces found")]
    NoInterfaces,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Operator-facing hint for environment errors.
    pub fn remedy(&self) -> Option<&'static str> {
        match self {
            Error::EngineMissing(_) => Some("Install with: sudo apt-get install tshark"),
            Error::CaptureDenied { .. } => Some(
                "Try running with sudo or specify a different --interface that exists on this host.",
            ),
            Error::NoActiveInterfaces => {
                Some("Make sure PacketRusher UEs are running with assigned IPs.")
            }
            Error::NoTarget | Error::NoInterfaces | Error::Io(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
