pub mod constants;
mod errors;
mod timeout;
mod wait_for_element;

pub use errors::{
    ArtifactFailure, ArtifactKind, ErrorKind, ScrapeError, SessionStage,
};
pub use timeout::{validate_navigation_timeout, validate_settle_delay};
pub use wait_for_element::wait_for_element;
