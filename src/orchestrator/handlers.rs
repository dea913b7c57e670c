use super::protocol::*;
use super::scheduler::Scheduler;
use super::types::*;

use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    routing::{delete, get, post},
};
use std::sync::Arc;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: SchedulerError) -> ApiError {
    let status = match &err {
        SchedulerError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
        stale if stale.is_stale_report() => StatusCode::CONFLICT,
        _ => StatusCode::NOT_FOUND,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

pub fn router(scheduler: Arc<Scheduler>) -> Router {
    Router::new()
        .route(ENDPOINT_CALCULATE, post(handle_calculate))
        .route(ENDPOINT_EXPRESSIONS, get(handle_list_expressions))
        .route(ENDPOINT_EXPRESSION, get(handle_get_expression))
        .route(ENDPOINT_TASK, get(handle_lease_task).post(handle_task_result))
        .route(ENDPOINT_TASK_CANCEL, delete(handle_cancel_task))
        .layer(Extension(scheduler))
}

pub async fn handle_calculate(
    Extension(scheduler): Extension<Arc<Scheduler>>,
    Json(req): Json<CalculateRequest>,
) -> Result<(StatusCode, Json<CalculateResponse>), ApiError> {
    match scheduler.create_expression(&req.expression) {
        Ok(id) => Ok((StatusCode::CREATED, Json(CalculateResponse { id }))),
        Err(e) => {
            tracing::info!("Invalid expression submitted: {}", e);
            Err(api_error(e))
        }
    }
}

pub async fn handle_list_expressions(
    Extension(scheduler): Extension<Arc<Scheduler>>,
) -> (StatusCode, Json<ExpressionsResponse>) {
    (
        StatusCode::OK,
        Json(ExpressionsResponse {
            expressions: scheduler.expressions(),
        }),
    )
}

pub async fn handle_get_expression(
    Extension(scheduler): Extension<Arc<Scheduler>>,
    Path(id): Path<u64>,
) -> Result<(StatusCode, Json<ExpressionView>), ApiError> {
    scheduler
        .expression_status(id)
        .map(|view| (StatusCode::OK, Json(view)))
        .map_err(api_error)
}

pub async fn handle_lease_task(
    Extension(scheduler): Extension<Arc<Scheduler>>,
) -> Result<(StatusCode, Json<TaskToProcess>), ApiError> {
    match scheduler.lease_next_task() {
        Ok(descriptor) => Ok((StatusCode::OK, Json(TaskToProcess::from(descriptor)))),
        Err(e) => {
            tracing::trace!("Lease request found nothing: {}", e);
            Err(api_error(e))
        }
    }
}

pub async fn handle_task_result(
    Extension(scheduler): Extension<Arc<Scheduler>>,
    Json(req): Json<TaskResultRequest>,
) -> Result<StatusCode, ApiError> {
    let outcome = match (req.failure_detail(), req.result) {
        (Some(detail), _) => scheduler.report_failure(req.id, detail),
        (None, Some(result)) => scheduler.report_success(req.id, result),
        (None, None) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("task {} report carries neither result nor error", req.id),
                }),
            ));
        }
    };

    outcome.map(|()| StatusCode::OK).map_err(api_error)
}

pub async fn handle_cancel_task(
    Extension(scheduler): Extension<Arc<Scheduler>>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    scheduler
        .cancel_task(id)
        .map(|()| StatusCode::OK)
        .map_err(api_error)
}
