use serde::{Deserialize, Serialize};

use crate::roles::Role;

/// Role chosen on the sign-up form before handing off to an external OAuth
/// flow. Stored client-side, applied once after sign-in, then erased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRoleMarker {
    pub role: Role,
}

impl PendingRoleMarker {
    pub fn new(role: Role) -> Self {
        Self { role }
    }
}
