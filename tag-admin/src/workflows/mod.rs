pub mod activation;
pub mod latest;
pub mod tag_verifier;

pub use activation::{ActivationStep, ActivationWizard};
pub use latest::{LatestByKey, LatestOnly, Ticket};
pub use tag_verifier::should_verify;
