pub mod intent;
pub mod permit;
pub mod session;
