pub const ROOM_CREATED: &str = "ROOM_CREATED";
pub const ADDRESS_SAVED: &str = "ADDRESS_SAVED";
pub const ADDRESS_DELETED: &str = "ADDRESS_DELETED";
pub const SESSION_OPENED: &str = "SESSION_OPENED";
pub const CONTRIBUTION_COMMITTED: &str = "CONTRIBUTION_COMMITTED";
pub const CONTRIBUTION_REJECTED: &str = "CONTRIBUTION_REJECTED";
pub const ALL_ITEMS_FUNDED: &str = "ALL_ITEMS_FUNDED";
pub const ITEM_ASSIGNED: &str = "ITEM_ASSIGNED";
pub const ITEM_UNASSIGNED: &str = "ITEM_UNASSIGNED";
pub const DELIVERY_ADDRESS_SELECTED: &str = "DELIVERY_ADDRESS_SELECTED";
pub const ORDER_PLACED: &str = "ORDER_PLACED";
pub const ORDER_SUBMISSION_FAILED: &str = "ORDER_SUBMISSION_FAILED";
pub const SESSION_ABANDONED: &str = "SESSION_ABANDONED";
pub const COMPENSATION_FAILED: &str = "COMPENSATION_FAILED";
pub const MEMBER_TOKEN_ISSUED: &str = "MEMBER_TOKEN_ISSUED";
