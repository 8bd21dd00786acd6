//! State shared by every request handler.

use std::sync::Arc;

use heal_auth::JwtValidator;
use heal_chat::Companion;

use crate::config::GatewayConfig;

/// Handler state: the companion pipeline, the token validator and the HTTP
/// settings. Handlers receive it as `State<Arc<GatewayState<C, V>>>`.
pub struct GatewayState<C, V> {
    /// Conversation and crisis operations.
    pub companion: Arc<C>,
    /// Resolves bearer tokens to user ids.
    pub jwt_validator: Arc<V>,
    /// HTTP surface settings.
    pub config: GatewayConfig,
}

impl<C: Companion, V: JwtValidator> GatewayState<C, V> {
    /// Bundle the collaborators a router needs.
    #[must_use]
    pub fn new(companion: Arc<C>, jwt_validator: Arc<V>, config: GatewayConfig) -> Self {
        Self {
            companion,
            jwt_validator,
            config,
        }
    }
}

// Manual impl: derive would demand `C: Clone` and `V: Clone`.
impl<C, V> Clone for GatewayState<C, V> {
    fn clone(&self) -> Self {
        Self {
            companion: Arc::clone(&self.companion),
            jwt_validator: Arc::clone(&self.jwt_validator),
            config: self.config.clone(),
        }
    }
}
