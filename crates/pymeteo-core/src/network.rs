//! Network liveness as seen by the main loop

use thiserror_no_std::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Wi-Fi association failed: {0}")]
    Association(heapless::String<64>),
    #[error("No IPv4 address acquired")]
    NoAddress,
}

impl NetworkError {
    pub fn association(details: &str) -> Self {
        Self::Association(crate::truncated(details))
    }
}

/// Station-mode network link.
pub trait Network {
    /// `true` once a non-zero IPv4 address is assigned.
    fn is_connected(&self) -> bool;

    /// Associate with the configured access point and wait for an address.
    fn connect(&mut self) -> impl Future<Output = Result<(), NetworkError>>;
}
