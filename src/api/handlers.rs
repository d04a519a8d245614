use crate::{
    api::models::*,
    auth::jwt::Claims,
    core::{
        errors::CofundError,
        models::{
            address::DeliveryAddress,
            assignment::Assignment,
            audit::{AppLog, Incident, SessionAudit},
            contribution::{ContributionReceipt, ContributionRequest},
            order::OrderReference,
            room::Room,
            session::{CartSummary, CheckoutSnapshot, FundingProgress, OrphanedPledge},
        },
        services::{CheckoutService, NewAddress},
    },
    infrastructure::{
        logging::in_memory::InMemoryLogging, orders::in_memory::InMemoryOrderService,
        storage::in_memory::InMemoryStorage,
    },
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post, put},
};
use http::header;

use std::sync::Arc;

pub type AppService = CheckoutService<InMemoryLogging, InMemoryStorage, InMemoryOrderService>;

// Validates the bearer token and stores its claims on the request
async fn auth_middleware(
    State(service): State<Arc<AppService>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| CofundError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| CofundError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

fn ensure_room(claims: &Claims, room_id: &str) -> Result<(), CofundError> {
    if claims.room_id != room_id {
        return Err(CofundError::Unauthorized(format!(
            "Token is not valid for room {}",
            room_id
        )));
    }
    Ok(())
}

async fn ensure_session(service: &AppService, claims: &Claims, session_id: &str) -> Result<(), CofundError> {
    service.session_for(session_id, &claims.room_id).await.map(|_| ())
}

// Define API routes
pub fn api_routes(service: Arc<AppService>) -> Router {
    let protected_routes = Router::new()
        .route("/rooms/{room_id}", get(get_room))
        .route("/rooms/{room_id}/addresses", post(save_address).get(list_addresses))
        .route(
            "/rooms/{room_id}/addresses/{address_id}",
            axum::routing::delete(delete_address),
        )
        .route("/sessions", post(open_session))
        .route("/sessions/{session_id}", get(get_snapshot))
        .route("/sessions/{session_id}/summary", get(get_cart_summary))
        .route("/sessions/{session_id}/items/{item_id}/progress", get(get_progress))
        .route("/sessions/{session_id}/contributions", post(contribute))
        .route(
            "/sessions/{session_id}/assignments/{item_id}",
            put(assign_item).delete(unassign_item),
        )
        .route("/sessions/{session_id}/address", put(select_delivery_address))
        .route("/sessions/{session_id}/order", post(place_order))
        .route("/sessions/{session_id}/abandon", post(abandon_session))
        .route("/sessions/{session_id}/audits", get(get_session_audits))
        .route("/reconciliation/orphaned-pledges", get(get_orphaned_pledges))
        .route("/incidents", get(get_incidents))
        .route("/logs", get(get_app_logs))
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware));

    Router::new()
        .route("/login", post(login))
        .route("/rooms", post(create_room)) // Unprotected
        .merge(protected_routes)
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created successfully", body = Room),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub(crate) async fn create_room(
    State(service): State<Arc<AppService>>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    let room = service.create_room(req.code, req.members).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Member token issued", body = LoginResponse),
        (status = 401, description = "Wrong room code", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
        (status = 422, description = "User is not a room member", body = ErrorResponse)
    )
)]
pub(crate) async fn login(
    State(service): State<Arc<AppService>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let token = service.issue_member_token(&req.room_id, &req.user_id, &req.code).await?;
    Ok(Json(LoginResponse { token }))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}",
    params(("room_id" = String, Path, description = "Room id")),
    responses(
        (status = 200, description = "Room retrieved", body = Room),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_room(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, ApiError> {
    ensure_room(&claims, &room_id)?;
    Ok(Json(service.get_room(&room_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/rooms/{room_id}/addresses",
    request_body = NewAddress,
    params(("room_id" = String, Path, description = "Room id")),
    responses(
        (status = 201, description = "Address saved", body = DeliveryAddress),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn save_address(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(room_id): Path<String>,
    Json(req): Json<NewAddress>,
) -> Result<(StatusCode, Json<DeliveryAddress>), ApiError> {
    ensure_room(&claims, &room_id)?;
    let address = service.save_address(&room_id, req, &claims.sub).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}/addresses",
    params(("room_id" = String, Path, description = "Room id")),
    responses(
        (status = 200, description = "Saved addresses", body = Vec<DeliveryAddress>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn list_addresses(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<DeliveryAddress>>, ApiError> {
    ensure_room(&claims, &room_id)?;
    Ok(Json(service.list_addresses(&room_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/rooms/{room_id}/addresses/{address_id}",
    params(
        ("room_id" = String, Path, description = "Room id"),
        ("address_id" = String, Path, description = "Address to delete")
    ),
    responses(
        (status = 204, description = "Address deleted"),
        (status = 404, description = "Address not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn delete_address(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path((room_id, address_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    ensure_room(&claims, &room_id)?;
    service.delete_address(&room_id, &address_id, &claims.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = OpenSessionRequest,
    responses(
        (status = 201, description = "Checkout session opened", body = CheckoutSnapshot),
        (status = 400, description = "Invalid cart", body = ErrorResponse),
        (status = 404, description = "Room not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn open_session(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<CheckoutSnapshot>), ApiError> {
    let snapshot = service.open_session(&claims.room_id, req.items, &claims.sub).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}",
    params(("session_id" = String, Path, description = "Checkout session id")),
    responses(
        (status = 200, description = "Current checkout state", body = CheckoutSnapshot),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_snapshot(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<String>,
) -> Result<Json<CheckoutSnapshot>, ApiError> {
    ensure_session(&service, &claims, &session_id).await?;
    Ok(Json(service.snapshot(&session_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}/summary",
    params(("session_id" = String, Path, description = "Checkout session id")),
    responses(
        (status = 200, description = "Cart funding summary", body = CartSummary),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_cart_summary(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<String>,
) -> Result<Json<CartSummary>, ApiError> {
    ensure_session(&service, &claims, &session_id).await?;
    Ok(Json(service.cart_summary(&session_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}/items/{item_id}/progress",
    params(
        ("session_id" = String, Path, description = "Checkout session id"),
        ("item_id" = String, Path, description = "Cart item id")
    ),
    responses(
        (status = 200, description = "Item funding progress", body = FundingProgress),
        (status = 404, description = "Session or item not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_progress(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path((session_id, item_id)): Path<(String, String)>,
) -> Result<Json<FundingProgress>, ApiError> {
    ensure_session(&service, &claims, &session_id).await?;
    Ok(Json(service.progress(&session_id, &item_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/contributions",
    request_body = ContributeRequest,
    params(("session_id" = String, Path, description = "Checkout session id")),
    responses(
        (status = 201, description = "Contribution committed", body = ContributionReceipt),
        (status = 400, description = "Invalid amount or cash on delivery not allowed", body = ErrorResponse),
        (status = 402, description = "Payment channel failed", body = ErrorResponse),
        (status = 409, description = "Amount exceeds remaining", body = ErrorResponse),
        (status = 410, description = "Session closed", body = ErrorResponse),
        (status = 500, description = "Compensation failed", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn contribute(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<String>,
    Json(req): Json<ContributeRequest>,
) -> Result<(StatusCode, Json<ContributionReceipt>), ApiError> {
    ensure_session(&service, &claims, &session_id).await?;
    let receipt = service
        .contribute(
            &session_id,
            ContributionRequest {
                item_id: req.item_id,
                user_id: claims.sub,
                amount: req.amount,
                method: req.method,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[utoipa::path(
    put,
    path = "/api/sessions/{session_id}/assignments/{item_id}",
    request_body = AssignItemRequest,
    params(
        ("session_id" = String, Path, description = "Checkout session id"),
        ("item_id" = String, Path, description = "Cart item id")
    ),
    responses(
        (status = 200, description = "Item assigned", body = Assignment),
        (status = 404, description = "Unknown item or address", body = ErrorResponse),
        (status = 410, description = "Session closed", body = ErrorResponse),
        (status = 422, description = "Item not funded or unknown member", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn assign_item(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path((session_id, item_id)): Path<(String, String)>,
    Json(req): Json<AssignItemRequest>,
) -> Result<Json<Assignment>, ApiError> {
    ensure_session(&service, &claims, &session_id).await?;
    let assignment = service
        .assign(&session_id, &item_id, &req.member_id, &req.address_id, &claims.sub)
        .await?;
    Ok(Json(assignment))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{session_id}/assignments/{item_id}",
    params(
        ("session_id" = String, Path, description = "Checkout session id"),
        ("item_id" = String, Path, description = "Cart item id")
    ),
    responses(
        (status = 204, description = "Assignment removed"),
        (status = 410, description = "Session closed", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn unassign_item(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path((session_id, item_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    ensure_session(&service, &claims, &session_id).await?;
    service.unassign(&session_id, &item_id, &claims.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/sessions/{session_id}/address",
    request_body = SelectAddressRequest,
    params(("session_id" = String, Path, description = "Checkout session id")),
    responses(
        (status = 200, description = "Cart-level delivery address selected", body = DeliveryAddress),
        (status = 404, description = "Unknown address", body = ErrorResponse),
        (status = 410, description = "Session closed", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn select_delivery_address(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<String>,
    Json(req): Json<SelectAddressRequest>,
) -> Result<Json<DeliveryAddress>, ApiError> {
    ensure_session(&service, &claims, &session_id).await?;
    let address = service
        .select_delivery_address(&session_id, &req.address_id, &claims.sub)
        .await?;
    Ok(Json(address))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/order",
    params(("session_id" = String, Path, description = "Checkout session id")),
    responses(
        (status = 200, description = "Order placed, or the original reference on retry", body = OrderReference),
        (status = 410, description = "Session abandoned", body = ErrorResponse),
        (status = 422, description = "Cart not funded or delivery address missing", body = ErrorResponse),
        (status = 502, description = "Order service failed; safe to retry", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn place_order(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<String>,
) -> Result<Json<OrderReference>, ApiError> {
    ensure_session(&service, &claims, &session_id).await?;
    Ok(Json(service.place_order(&session_id, &claims.sub).await?))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/abandon",
    params(("session_id" = String, Path, description = "Checkout session id")),
    responses(
        (status = 200, description = "Session abandoned", body = CheckoutSnapshot),
        (status = 410, description = "Order already placed", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn abandon_session(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<String>,
) -> Result<Json<CheckoutSnapshot>, ApiError> {
    ensure_session(&service, &claims, &session_id).await?;
    Ok(Json(service.abandon_session(&session_id, &claims.sub).await?))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}/audits",
    params(("session_id" = String, Path, description = "Checkout session id")),
    responses(
        (status = 200, description = "Session audit trail", body = Vec<SessionAudit>),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_session_audits(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<SessionAudit>>, ApiError> {
    ensure_session(&service, &claims, &session_id).await?;
    Ok(Json(service.get_session_audits(&session_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/reconciliation/orphaned-pledges",
    responses(
        (status = 200, description = "Contributed pledges in the room's abandoned sessions", body = Vec<OrphanedPledge>)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_orphaned_pledges(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Json<Vec<OrphanedPledge>> {
    Json(service.orphaned_pledges(&claims.room_id).await)
}

#[utoipa::path(
    get,
    path = "/api/incidents",
    responses(
        (status = 200, description = "The room's compensation failures awaiting manual reconciliation", body = Vec<Incident>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_incidents(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Incident>>, ApiError> {
    Ok(Json(service.get_incidents(&claims.room_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Application log entries for the room", body = Vec<AppLog>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("Bearer" = []))
)]
pub(crate) async fn get_app_logs(
    State(service): State<Arc<AppService>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<AppLog>>, ApiError> {
    Ok(Json(service.get_app_logs(&claims.room_id).await?))
}
