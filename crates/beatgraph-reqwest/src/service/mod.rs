//! Backend trait implementations for [`ReqwestClient`](crate::ReqwestClient).

mod job;
mod store;
