use anyhow::Context;
use breeze_runner::prelude::UserValuesConstraint;
use http_client_instrumented::prelude::HttpClient;

/// Values owned by one virtual user.
#[derive(Default, Debug)]
pub struct HttpAgentContext {
    pub(crate) client: Option<HttpClient>,
}

impl HttpAgentContext {
    /// The client created by [crate::prelude::configure_http_client].
    pub fn client(&self) -> anyhow::Result<&HttpClient> {
        self.client
            .as_ref()
            .context("HTTP client is not configured, use configure_http_client as the agent setup")
    }
}

impl UserValuesConstraint for HttpAgentContext {}
