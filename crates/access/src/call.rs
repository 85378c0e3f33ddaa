//! State-changing calls accepted by the contract.

use fileguard_types::Identity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ContractCall {
    /// Fingerprint is validated by the contract, not by the caller.
    RegisterContent { fingerprint: String },
    GrantAccess { subject: Identity },
    RevokeAccess { subject: Identity },
}

impl ContractCall {
    pub fn method(&self) -> &'static str {
        match self {
            ContractCall::RegisterContent { .. } => "register_content",
            ContractCall::GrantAccess { .. } => "grant_access",
            ContractCall::RevokeAccess { .. } => "revoke_access",
        }
    }

    /// Canonical bytes used when hashing the transaction: the method name,
    /// a NUL separator, then the argument.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = self.method().as_bytes().to_vec();
        bytes.push(0);
        match self {
            ContractCall::RegisterContent { fingerprint } => {
                bytes.extend_from_slice(fingerprint.as_bytes())
            }
            ContractCall::GrantAccess { subject } | ContractCall::RevokeAccess { subject } => {
                bytes.extend_from_slice(subject.to_string().as_bytes())
            }
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_separates_method_and_argument() {
        let subject = Identity::account(1);
        let grant = ContractCall::GrantAccess { subject };
        let revoke = ContractCall::RevokeAccess { subject };
        assert_ne!(grant.encode(), revoke.encode());
        assert_eq!(grant.encode(), ContractCall::GrantAccess { subject }.encode());

        let register = ContractCall::RegisterContent {
            fingerprint: "Qm 123".into(),
        };
        assert_eq!(register.encode(), b"register_content\0Qm 123".to_vec());
    }

    #[test]
    fn test_wire_shape_is_method_tagged() {
        let call = ContractCall::RegisterContent {
            fingerprint: "Qm123".into(),
        };
        let value = serde_json::to_value(&call).unwrap();
        assert_eq!(value["method"], "register_content");
        assert_eq!(value["fingerprint"], "Qm123");
    }
}
