pub mod request_id;

pub use request_id::{request_context, RequestId, REQUEST_ID_HEADER};
