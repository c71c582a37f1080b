//! Authorization policy.

use std::collections::HashSet;

/// Users allowed to run privileged commands.
///
/// Membership is the only check: there are no roles and no per-command rules.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationPolicy {
    allowed: HashSet<u64>,
}

impl AuthorizationPolicy {
    pub fn new(allowed: impl IntoIterator<Item = u64>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn allows(&self, user_id: u64) -> bool {
        self.allowed.contains(&user_id)
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_is_the_gate() {
        let policy = AuthorizationPolicy::new([42, 7, 42]);
        assert_eq!(policy.len(), 2);
        assert!(policy.allows(42));
        assert!(!policy.allows(43));
        assert!(!AuthorizationPolicy::default().allows(42));
    }
}
