use crate::identity::IdentityClient;

/// Shared state for all handlers. The proxy itself is stateless — this
/// only carries the injected identity client.
pub struct AppState {
    pub identity: IdentityClient,
}

impl AppState {
    pub fn new(identity: IdentityClient) -> Self {
        Self { identity }
    }
}
