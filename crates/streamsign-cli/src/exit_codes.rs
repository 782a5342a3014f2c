//! Process exit codes.
//! Scripts branch on these, so treat them as a public contract.

use streamsign_core::Status;

pub const SUCCESS: i32 = 0;
pub const ERROR: i32 = 1; // Config, key file or I/O failure
pub const BAD_REQUEST: i32 = 2;
pub const FORBIDDEN: i32 = 3;
pub const GONE: i32 = 4;

pub fn for_status(status: Status) -> i32 {
    match status {
        Status::Ok => SUCCESS,
        Status::BadRequest => BAD_REQUEST,
        Status::Forbidden => FORBIDDEN,
        Status::Gone => GONE,
    }
}
