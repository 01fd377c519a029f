mod client;
mod response;

pub mod prelude {
    pub use crate::client::ProxyClient;
    pub use crate::response::ApiResponse;
}
