use crate::ecs::SystemError;
use thiserror::Error;

/// Errors that can occur while registering a system.
#[derive(Debug, Error)]
pub enum SystemRegistrationError {
    #[error("system '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("system '{name}' failed to initialise: {source}")]
    Init {
        name: String,
        #[source]
        source: SystemError,
    },
}
