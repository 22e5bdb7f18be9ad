use std::sync::Arc;

use crate::auth::service::TokenService;
use crate::notify::NotificationHub;
use crate::render::assembler::DocumentAssembler;
use crate::render::compiler::LatexCompiler;
use crate::store::PortfolioStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub portfolio: Arc<dyn PortfolioStore>,
    pub tokens: TokenService,
    pub assembler: DocumentAssembler,
    pub compiler: LatexCompiler,
    /// Live WebSocket subscriptions, keyed by user.
    pub hub: NotificationHub,
}
