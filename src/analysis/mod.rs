pub mod advice;
pub mod client;
pub mod engine;
pub mod mapper;
pub mod session;
pub mod weights;
