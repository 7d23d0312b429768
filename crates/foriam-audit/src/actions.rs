//! Well-known audit action names.

pub const AUTH_LOGIN: &str = "auth.login";
pub const AUTH_LOGOUT: &str = "auth.logout";

pub const USER_CREATE: &str = "user.create";
pub const USER_UPDATE: &str = "user.update";
pub const USER_DELETE: &str = "user.delete";

pub const ROLE_CREATE: &str = "role.create";
pub const ROLE_UPDATE: &str = "role.update";
pub const ROLE_DELETE: &str = "role.delete";
pub const ROLE_ASSIGN: &str = "role.assign";
pub const ROLE_UNASSIGN: &str = "role.unassign";

pub const GROUP_CREATE: &str = "group.create";
pub const GROUP_UPDATE: &str = "group.update";
pub const GROUP_DELETE: &str = "group.delete";
pub const GROUP_ADD_MEMBER: &str = "group.add_member";
pub const GROUP_REMOVE_MEMBER: &str = "group.remove_member";

pub const PERMISSION_GRANT: &str = "permission.grant";
pub const PERMISSION_REVOKE: &str = "permission.revoke";
