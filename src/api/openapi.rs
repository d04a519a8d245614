use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{
    api::models::{
        AssignItemRequest, ContributeRequest, CreateRoomRequest, ErrorResponse, LoginRequest, LoginResponse,
        OpenSessionRequest, SelectAddressRequest,
    },
    core::{
        errors::ErrorKind,
        models::{
            address::DeliveryAddress,
            assignment::Assignment,
            audit::{AppLog, Incident, SessionAudit},
            cart::CartItem,
            contribution::{ContributionReceipt, ContributionStatus, Contributor, PaymentMethod},
            order::OrderReference,
            room::{Role, Room, RoomMember},
            session::{
                CartSummary, CheckoutSnapshot, FundingProgress, ItemSnapshot, ItemState, OrphanedPledge,
                SessionStatus,
            },
        },
        services::NewAddress,
    },
};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::create_room,
        super::handlers::login,
        super::handlers::get_room,
        super::handlers::save_address,
        super::handlers::list_addresses,
        super::handlers::delete_address,
        super::handlers::open_session,
        super::handlers::get_snapshot,
        super::handlers::get_cart_summary,
        super::handlers::get_progress,
        super::handlers::contribute,
        super::handlers::assign_item,
        super::handlers::unassign_item,
        super::handlers::select_delivery_address,
        super::handlers::place_order,
        super::handlers::abandon_session,
        super::handlers::get_session_audits,
        super::handlers::get_orphaned_pledges,
        super::handlers::get_incidents,
        super::handlers::get_app_logs
    ),
    components(schemas(
        CreateRoomRequest,
        LoginRequest,
        LoginResponse,
        OpenSessionRequest,
        ContributeRequest,
        AssignItemRequest,
        SelectAddressRequest,
        ErrorResponse,
        ErrorKind,
        NewAddress,
        Room,
        RoomMember,
        Role,
        CartItem,
        DeliveryAddress,
        Assignment,
        PaymentMethod,
        ContributionStatus,
        Contributor,
        ContributionReceipt,
        OrderReference,
        SessionStatus,
        ItemState,
        FundingProgress,
        CartSummary,
        ItemSnapshot,
        CheckoutSnapshot,
        OrphanedPledge,
        AppLog,
        SessionAudit,
        Incident
    )),
    modifiers(&BearerAuth),
    info(
        title = "Cofund API",
        description = "API for jointly funding a group cart and placing its order",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
