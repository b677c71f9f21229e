use freightdesk_auth::Actor;

/// Authenticated actor for a request.
///
/// Inserted by the auth middleware and must be present for all domain
/// routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor: Actor,
}

impl ActorContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }
}
