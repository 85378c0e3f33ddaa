//! Access-control state machine
//!
//! Holds the owner, the authorized set and the single registration slot.
//! Writes are owner-gated and return the event they emit; reads never mutate.

use crate::call::ContractCall;
use crate::errors::*;
use fileguard_types::{ContractEvent, Fingerprint, Identity, Registration};
use std::collections::BTreeSet;
use tracing::debug;

/// Why a read was refused. Logged, never returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialCause {
    NothingRegistered,
    NotAuthorized,
}

/// Contract storage: `Uninitialized` while `registration` is `None`,
/// `Registered` afterwards. There is no terminal state.
#[derive(Debug, Clone)]
pub struct AccessState {
    owner: Identity,
    registration: Option<Registration>,
    authorized: BTreeSet<Identity>,
}

impl AccessState {
    pub fn new(owner: Identity) -> Self {
        Self {
            owner,
            registration: None,
            authorized: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }

    /// Explicitly granted identities (the owner is implicit).
    pub fn authorized(&self) -> impl Iterator<Item = &Identity> {
        self.authorized.iter()
    }

    pub fn is_authorized(&self, identity: &Identity) -> bool {
        *identity == self.owner || self.authorized.contains(identity)
    }

    /// Apply a write on behalf of `caller`.
    pub fn apply(&mut self, caller: &Identity, call: &ContractCall) -> Result<ContractEvent> {
        match call {
            ContractCall::RegisterContent { fingerprint } => {
                self.register_content(caller, fingerprint)
            }
            ContractCall::GrantAccess { subject } => self.grant_access(caller, subject),
            ContractCall::RevokeAccess { subject } => self.revoke_access(caller, subject),
        }
    }

    pub fn register_content(&mut self, caller: &Identity, fingerprint: &str) -> Result<ContractEvent> {
        self.ensure_owner(caller)?;
        let fingerprint = Fingerprint::new(fingerprint)?;

        self.registration = Some(Registration {
            fingerprint: fingerprint.clone(),
            registered_by: *caller,
        });

        Ok(ContractEvent::ContentRegistered {
            fingerprint,
            by: *caller,
        })
    }

    pub fn grant_access(&mut self, caller: &Identity, subject: &Identity) -> Result<ContractEvent> {
        self.ensure_owner(caller)?;
        if !self.authorized.insert(*subject) {
            debug!("{} already authorized", subject);
        }
        Ok(ContractEvent::AccessGranted { subject: *subject })
    }

    pub fn revoke_access(&mut self, caller: &Identity, subject: &Identity) -> Result<ContractEvent> {
        self.ensure_owner(caller)?;
        if !self.authorized.remove(subject) {
            debug!("{} was not authorized", subject);
        }
        Ok(ContractEvent::AccessRevoked { subject: *subject })
    }

    /// Gated read of the registered fingerprint.
    ///
    /// Registration is checked before membership; both failures collapse to
    /// [`AccessError::AccessDenied`].
    pub fn access_file(&self, caller: &Identity) -> Result<Fingerprint> {
        self.check_access(caller).map_err(|cause| {
            debug!(caller = %caller, ?cause, "access denied");
            AccessError::AccessDenied
        })
    }

    /// Like [`AccessState::access_file`] but exposes the denial cause.
    pub fn check_access(&self, caller: &Identity) -> std::result::Result<Fingerprint, DenialCause> {
        let registration = self
            .registration
            .as_ref()
            .ok_or(DenialCause::NothingRegistered)?;
        if !self.is_authorized(caller) {
            return Err(DenialCause::NotAuthorized);
        }
        Ok(registration.fingerprint.clone())
    }

    fn ensure_owner(&self, caller: &Identity) -> Result<()> {
        if *caller != self.owner {
            return Err(AccessError::Unauthorized { caller: *caller });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Identity {
        Identity::account(0)
    }

    fn user() -> Identity {
        Identity::account(1)
    }

    #[test]
    fn test_starts_uninitialized() {
        let state = AccessState::new(owner());
        assert!(state.registration().is_none());
        assert_eq!(state.authorized().count(), 0);
        assert_eq!(
            state.check_access(&owner()),
            Err(DenialCause::NothingRegistered)
        );
    }

    #[test]
    fn test_register_requires_owner() {
        let mut state = AccessState::new(owner());
        let err = state.register_content(&user(), "Qm123").unwrap_err();
        assert_eq!(err, AccessError::Unauthorized { caller: user() });
        assert!(state.registration().is_none());
    }

    #[test]
    fn test_register_rejects_empty_fingerprint() {
        let mut state = AccessState::new(owner());
        let err = state.register_content(&owner(), "").unwrap_err();
        assert!(matches!(err, AccessError::InvalidArgument(_)));
    }

    #[test]
    fn test_register_accepts_any_non_empty_string() {
        let mut state = AccessState::new(owner());
        state.register_content(&owner(), "Qm 123").unwrap();
        assert_eq!(state.access_file(&owner()).unwrap().as_str(), "Qm 123");

        state.register_content(&owner(), "   ").unwrap();
        assert_eq!(state.access_file(&owner()).unwrap().as_str(), "   ");
    }

    #[test]
    fn test_non_owner_checked_before_argument() {
        let mut state = AccessState::new(owner());
        let err = state.register_content(&user(), "").unwrap_err();
        assert!(matches!(err, AccessError::Unauthorized { .. }));
    }

    #[test]
    fn test_register_overwrites() {
        let mut state = AccessState::new(owner());
        state.register_content(&owner(), "f1").unwrap();
        state.register_content(&owner(), "f2").unwrap();
        assert_eq!(
            state.access_file(&owner()).unwrap(),
            Fingerprint::new("f2").unwrap()
        );
        assert_eq!(state.registration().unwrap().registered_by, owner());
    }

    #[test]
    fn test_denial_causes() {
        let mut state = AccessState::new(owner());
        state.register_content(&owner(), "Qm123").unwrap();
        assert_eq!(state.check_access(&user()), Err(DenialCause::NotAuthorized));
        assert_eq!(state.access_file(&user()), Err(AccessError::AccessDenied));

        state.grant_access(&owner(), &user()).unwrap();
        assert_eq!(state.check_access(&user()).unwrap().as_str(), "Qm123");
    }

    #[test]
    fn test_grant_and_revoke_emit_events_even_when_noop() {
        let mut state = AccessState::new(owner());
        let first = state.grant_access(&owner(), &user()).unwrap();
        let second = state.grant_access(&owner(), &user()).unwrap();
        assert_eq!(first, second);
        assert_eq!(state.authorized().count(), 1);

        state.revoke_access(&owner(), &user()).unwrap();
        let event = state.revoke_access(&owner(), &user()).unwrap();
        assert_eq!(event, ContractEvent::AccessRevoked { subject: user() });
        assert_eq!(state.authorized().count(), 0);
    }

    #[test]
    fn test_apply_dispatches() {
        let mut state = AccessState::new(owner());
        let call = ContractCall::GrantAccess { subject: user() };
        state.apply(&owner(), &call).unwrap();
        assert!(state.is_authorized(&user()));

        let err = state.apply(&user(), &call).unwrap_err();
        assert!(matches!(err, AccessError::Unauthorized { .. }));
    }
}
