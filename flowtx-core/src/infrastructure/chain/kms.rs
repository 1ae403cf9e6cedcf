use super::traits::{Authorizer, SigningIdentity};
use crate::foundation::KeyIndex;

/// Binds account key slots to one KMS key resource.
#[derive(Clone, Debug)]
pub struct KmsAuthorizer {
    resource_name: String,
}

impl KmsAuthorizer {
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self { resource_name: resource_name.into() }
    }
}

impl Authorizer for KmsAuthorizer {
    fn authorize(&self, address: &str, key_index: KeyIndex) -> SigningIdentity {
        SigningIdentity { address: address.to_string(), key_index, kms_resource: self.resource_name.clone() }
    }
}
