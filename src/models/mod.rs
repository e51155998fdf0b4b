mod api;

pub use api::ProxyQuery;
