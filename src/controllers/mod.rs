pub mod auth;
pub mod bookings;
pub mod calendar;
pub mod history;
pub mod payments;
pub mod report;
pub mod rooms;

use axum::{middleware::from_fn_with_state, Router};
use std::sync::Arc;

use crate::AppState;

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let staff = Router::new()
        .merge(rooms::routes())
        .merge(bookings::routes())
        .merge(payments::routes())
        .merge(history::routes())
        .merge(report::routes())
        .merge(calendar::routes());

    let staff = if state.config.features.enable_auth {
        staff.route_layer(from_fn_with_state(state, crate::middleware::require_session))
    } else {
        staff
    };

    Router::new().merge(auth::routes()).merge(staff)
}
