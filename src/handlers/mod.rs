mod health;
pub mod proxy;

pub use health::{HEALTH_BODY, health_check};
pub use proxy::viewstats_proxy;
