use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use sb_auth::{SignatureVerifier, TokenIssuer};
use sb_domain::config::Config;
use sb_steam::deals::DealsClient;
use sb_steam::SteamClient;
use sb_store::Store;

/// Shared application state passed to all API handlers.
///
/// Everything here is built once at startup and immutable afterwards,
/// apart from the nonce cache living inside the verifier and the
/// scheduler liveness flag.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub steam: Arc<SteamClient>,
    /// Deal aggregator collaborator; `None` serves empty sequences.
    pub deals: Option<Arc<DealsClient>>,
    pub tokens: Arc<TokenIssuer>,
    pub verifier: Arc<SignatureVerifier>,
    /// Flipped by the scheduler on start/shutdown; reported by `/health`.
    pub scheduler_running: Arc<AtomicBool>,
}
