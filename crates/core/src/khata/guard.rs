//! Tenant scope enforcement.
//!
//! Every ledger operation runs against exactly one shop. Rather than
//! scattering shop checks through business logic, authorization happens
//! once: [`TenantGuard::authorize`] compares the authenticated shop with
//! the target shop and mints a [`ShopScope`]. Repositories only accept a
//! `&ShopScope` and key every query on it, so cross-tenant access is
//! unrepresentable downstream of the guard.

use uuid::Uuid;

use super::error::KhataError;

/// Proof that the caller is authorized for one specific shop.
///
/// The inner ID is private; the only way to obtain a `ShopScope` is
/// through [`TenantGuard::authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopScope {
    shop_id: Uuid,
}

impl ShopScope {
    /// Returns the authorized shop ID.
    #[must_use]
    pub const fn shop_id(&self) -> Uuid {
        self.shop_id
    }
}

/// Stateless guard that attaches the owning shop to every operation.
pub struct TenantGuard;

impl TenantGuard {
    /// Authorizes access to `target` for a caller authenticated as
    /// `authenticated`.
    ///
    /// # Errors
    ///
    /// Returns `KhataError::TenantMismatch` when the shops differ. This
    /// check runs before any store access.
    pub const fn authorize(authenticated: Uuid, target: Uuid) -> Result<ShopScope, KhataError> {
        if authenticated.as_u128() != target.as_u128() {
            return Err(KhataError::TenantMismatch { requested: target });
        }
        Ok(ShopScope { shop_id: target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_shop_is_authorized() {
        let shop = Uuid::new_v4();
        let scope = TenantGuard::authorize(shop, shop).unwrap();
        assert_eq!(scope.shop_id(), shop);
    }

    #[test]
    fn test_mismatched_shop_is_rejected() {
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();

        let result = TenantGuard::authorize(mine, theirs);
        match result {
            Err(KhataError::TenantMismatch { requested }) => assert_eq!(requested, theirs),
            _ => panic!("expected TenantMismatch"),
        }
    }

    #[test]
    fn test_scope_reports_target_shop() {
        let shop = Uuid::new_v4();
        let scope = TenantGuard::authorize(shop, shop).unwrap();
        assert_eq!(scope.shop_id(), shop);
    }
}
