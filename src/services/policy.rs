//! Ownership rule for buyer-scoped bid listings.
//!
//! Only `GET /bids?email=` consults this policy. Product and bid mutations
//! carry no ownership check at all; that gap is known and kept as-is.

use crate::services::auth_service::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// An unscoped request is always allowed; a scoped one only when the
/// requested owner is the caller (exact, case-sensitive match).
pub fn authorize(principal: &Principal, requested_owner: Option<&str>) -> Decision {
    match requested_owner {
        None => Decision::Allow,
        Some(owner) if owner == principal.email => Decision::Allow,
        Some(_) => Decision::Deny,
    }
}
