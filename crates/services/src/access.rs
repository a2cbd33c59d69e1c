use domain::{FeedxError, Principal};

/// Admin-only operations.
pub fn require_admin(caller: &Principal) -> Result<(), FeedxError> {
    if caller.role.is_admin() {
        Ok(())
    } else {
        Err(FeedxError::forbidden("Admin access required"))
    }
}

/// Faculty and admin operations.
pub fn require_staff(caller: &Principal) -> Result<(), FeedxError> {
    if caller.role.is_staff() {
        Ok(())
    } else {
        Err(FeedxError::forbidden("Faculty access required"))
    }
}
