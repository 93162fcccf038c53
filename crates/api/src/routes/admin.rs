//! Guarded admin endpoints.

use axum::{Extension, Json};

use crate::middleware::AdminSession;
use crate::response::AdminSummary;

/// GET /admin/index.php - Admin landing data.
pub async fn index_handler(
    Extension(AdminSession(session)): Extension<AdminSession>,
) -> Json<AdminSummary> {
    Json(AdminSummary::from(&session))
}

/// GET /admin/api/whoami
pub async fn whoami_handler(
    Extension(AdminSession(session)): Extension<AdminSession>,
) -> Json<AdminSummary> {
    Json(AdminSummary::from(&session))
}
