pub mod gateway;
pub mod kms;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod traits;

pub use gateway::GatewaySubmitter;
pub use kms::KmsAuthorizer;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::{MockSubmitter, SubmitBehavior};
pub use traits::{Authorizer, SigningIdentity, TransactionRequest, TransactionSubmitter};
