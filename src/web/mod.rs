mod handlers;
mod routes;
mod types;

#[cfg(test)]
mod test_helpers;

pub use routes::create_router;
pub use types::AppError;

use crate::auth::session::SessionStore;
use crate::frontend::routes::RouteResolver;
use crate::mailer::Mailer;
use crate::metrics::Metrics;
use crate::store::Storage;

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppState {
    pub storage: Storage,
    pub sessions: SessionStore,
    pub resolver: RouteResolver,
    pub mailer: Mailer,
    pub metrics: Metrics,
}
