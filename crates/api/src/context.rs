use loyalty_auth::Actor;
use loyalty_core::ClientId;

/// Authenticated actor attached to the request by the auth middleware.
///
/// Handlers never read tokens; they read this.
#[derive(Debug, Clone)]
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

    pub fn uid(&self) -> ClientId {
        self.actor.uid
    }

    pub fn email(&self) -> &str {
        &self.actor.email
    }
}
