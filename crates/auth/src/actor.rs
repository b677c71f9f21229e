use serde::{Deserialize, Serialize};

use freightdesk_core::{OfficeId, UserId};

use crate::Role;

/// Resolved requesting-user identity, attached to every workflow call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub username: String,
    pub office_id: Option<OfficeId>,
    pub role: Role,
}
