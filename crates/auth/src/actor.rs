use serde::{Deserialize, Serialize};

use loyalty_core::ClientId;

/// Identity of an authenticated actor.
///
/// The identity provider's `uid` doubles as the actor's client document id,
/// so a verified token is all that is needed to address "the actor's own
/// client".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub uid: ClientId,
    pub email: String,
}

impl Actor {
    pub fn new(uid: ClientId, email: impl Into<String>) -> Self {
        Self {
            uid,
            email: email.into(),
        }
    }
}
