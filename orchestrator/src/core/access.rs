//! Team allow-list

use std::collections::HashSet;

use shared::RequesterId;

/// Reply sent to anyone outside the team
pub const UNAUTHORIZED_REPLY: &str = "Este bot es privado. Para regularización, visita tuspapeles2026.es";

/// Fixed allow-list checked before any generation work
#[derive(Debug, Clone, Default)]
pub struct AccessGuard {
    allowed: HashSet<RequesterId>,
}

impl AccessGuard {
    pub fn new(allowed: impl IntoIterator<Item = RequesterId>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn authorize(&self, requester: RequesterId) -> bool {
        self.allowed.contains(&requester)
    }

    pub fn team_size(&self) -> usize {
        self.allowed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_listed_requesters_pass() {
        let guard = AccessGuard::new([RequesterId(1), RequesterId(2)]);
        assert!(guard.authorize(RequesterId(1)));
        assert!(!guard.authorize(RequesterId(3)));
        assert_eq!(guard.team_size(), 2);
    }

    #[test]
    fn test_empty_list_rejects_everyone() {
        assert!(!AccessGuard::default().authorize(RequesterId(1)));
    }
}
