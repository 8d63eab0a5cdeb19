// ============================================================================
// Access Registry - administrator and trusted sources
// ============================================================================
//
// One administrator, fixed at construction. Trusted sources (oracles) are
// append-only: there is no removal, so trust once granted stays granted.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::errors::{MarketError, MarketResult};
use crate::types::Identity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRegistry {
    admin: Identity,
    trusted_sources: BTreeSet<Identity>,
}

impl AccessRegistry {
    pub fn new(admin: Identity) -> Self {
        Self {
            admin,
            trusted_sources: BTreeSet::new(),
        }
    }

    pub fn admin(&self) -> &Identity {
        &self.admin
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        &self.admin == identity
    }

    pub fn is_trusted_source(&self, identity: &Identity) -> bool {
        self.trusted_sources.contains(identity)
    }

    pub fn trusted_sources(&self) -> impl Iterator<Item = &Identity> {
        self.trusted_sources.iter()
    }

    /// Fails with `Unauthorized` unless `caller` is the administrator
    pub fn require_admin(&self, caller: &Identity, action: &'static str) -> MarketResult<()> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(MarketError::Unauthorized {
                caller: caller.clone(),
                action,
            })
        }
    }

    /// Fails with `Unauthorized` unless `caller` is a trusted source
    pub fn require_trusted_source(
        &self,
        caller: &Identity,
        action: &'static str,
    ) -> MarketResult<()> {
        if self.is_trusted_source(caller) {
            Ok(())
        } else {
            Err(MarketError::Unauthorized {
                caller: caller.clone(),
                action,
            })
        }
    }

    /// Grant oracle rights. Returns `false` when `identity` was already trusted.
    pub fn add_trusted_source(&mut self, caller: &Identity, identity: Identity) -> MarketResult<bool> {
        self.require_admin(caller, "add a trusted source")?;
        Ok(self.trusted_sources.insert(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AccessRegistry {
        AccessRegistry::new(Identity::from("admin"))
    }

    #[test]
    fn test_admin_is_set() {
        let reg = registry();
        assert_eq!(reg.admin(), &Identity::from("admin"));
        assert!(reg.is_admin(&Identity::from("admin")));
        assert!(!reg.is_admin(&Identity::from("player_one")));
    }

    #[test]
    fn test_admin_adds_trusted_source() {
        let mut reg = registry();
        let oracle = Identity::from("oracle");

        assert!(!reg.is_trusted_source(&oracle));
        assert!(reg.add_trusted_source(&Identity::from("admin"), oracle.clone()).unwrap());
        assert!(reg.is_trusted_source(&oracle));
    }

    #[test]
    fn test_adding_twice_is_noop() {
        let mut reg = registry();
        let admin = Identity::from("admin");
        let oracle = Identity::from("oracle");

        assert!(reg.add_trusted_source(&admin, oracle.clone()).unwrap());
        assert!(!reg.add_trusted_source(&admin, oracle.clone()).unwrap());
        assert_eq!(reg.trusted_sources().count(), 1);
    }

    #[test]
    fn test_non_admin_cannot_add_trusted_source() {
        let mut reg = registry();
        let result = reg.add_trusted_source(&Identity::from("player_one"), Identity::from("oracle"));

        assert!(matches!(result, Err(MarketError::Unauthorized { .. })));
        assert!(!reg.is_trusted_source(&Identity::from("oracle")));
    }

    #[test]
    fn test_admin_is_not_implicitly_trusted() {
        let reg = registry();
        assert!(reg
            .require_trusted_source(&Identity::from("admin"), "resolve a question")
            .is_err());
    }
}
