mod error;
mod http_client;

pub mod prelude {
    pub use crate::error::{handle_http_err, HttpClientError};
    pub use crate::http_client::{HttpClientInstrumented as HttpClient, HttpResponse};

    /// Re-export of the body type of [HttpResponse].
    pub use bytes::Bytes;
}
