//! Logical endpoint names, relative to the service base URLs.

pub const LOGIN: &str = "login";
pub const SIGNUP: &str = "signup-direct";
pub const REFRESH_TOKEN: &str = "refresh-token";
pub const LOGOUT: &str = "logout";

pub const CREATE_TABLE: &str = "create-table";
pub const TABLE_DATA: &str = "table-data";
pub const INSERT: &str = "insert";
pub const READ: &str = "read";
pub const UPDATE: &str = "update";
pub const DELETE: &str = "delete";
