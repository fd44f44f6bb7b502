// ── Agent seam ──
//
// The panel talks to the agent through `AgentApi` so tests can substitute a
// scripted agent. Every method splits into a synchronous part (building the
// request URL) and the in-flight call it returns; a failure in the first
// part never leaves a call running.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tsplpanel_api::client::{BIND_PATH, DEVICES_PATH, IDENTITY_PATH, PRINT_PATH};
use tsplpanel_api::{
    AgentClient, BindRequest, BindResponse, DevicesResponse, IdentityResponse, PrintRequest,
    PrintResponse,
};

use crate::error::CoreError;

/// A started agent call.
pub type AgentCall<T> = BoxFuture<'static, Result<T, CoreError>>;

/// Operations the panel needs from the agent.
pub trait AgentApi: Send + Sync {
    fn list_devices(&self) -> Result<AgentCall<DevicesResponse>, CoreError>;

    fn identity(&self) -> Result<AgentCall<IdentityResponse>, CoreError>;

    fn bind(&self, request: BindRequest) -> Result<AgentCall<BindResponse>, CoreError>;

    fn print(&self, request: PrintRequest) -> Result<AgentCall<PrintResponse>, CoreError>;
}

impl AgentApi for AgentClient {
    fn list_devices(&self) -> Result<AgentCall<DevicesResponse>, CoreError> {
        let url = self.endpoint(DEVICES_PATH)?;
        let client = self.clone();
        Ok(async move {
            client
                .get::<DevicesResponse>(url)
                .await
                .map_err(CoreError::from)
        }
        .boxed())
    }

    fn identity(&self) -> Result<AgentCall<IdentityResponse>, CoreError> {
        let url = self.endpoint(IDENTITY_PATH)?;
        let client = self.clone();
        Ok(async move {
            client
                .get::<IdentityResponse>(url)
                .await
                .map_err(CoreError::from)
        }
        .boxed())
    }

    fn bind(&self, request: BindRequest) -> Result<AgentCall<BindResponse>, CoreError> {
        let url = self.endpoint(BIND_PATH)?;
        let client = self.clone();
        Ok(async move {
            client
                .post::<BindResponse>(url, &request)
                .await
                .map_err(CoreError::from)
        }
        .boxed())
    }

    fn print(&self, request: PrintRequest) -> Result<AgentCall<PrintResponse>, CoreError> {
        let url = self.endpoint(PRINT_PATH)?;
        let client = self.clone();
        Ok(async move {
            client
                .post::<PrintResponse>(url, &request)
                .await
                .map_err(CoreError::from)
        }
        .boxed())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use tsplpanel_api::TransportConfig;

    use super::*;

    #[test]
    fn unusable_base_url_fails_before_sending() {
        let client = AgentClient::new("not a url", &TransportConfig::default()).unwrap();
        let rejected = |result: Result<(), CoreError>| match result {
            Err(CoreError::Config { message }) => message.starts_with("Invalid agent URL"),
            _ => false,
        };

        assert!(rejected(AgentApi::list_devices(&client).map(drop)));
        assert!(rejected(AgentApi::identity(&client).map(drop)));
        assert!(rejected(
            AgentApi::bind(
                &client,
                BindRequest {
                    vid: "1203".into(),
                    pid: "0230".into(),
                    serial: None,
                    friendly_name: None,
                },
            )
            .map(drop)
        ));
        assert!(rejected(
            AgentApi::print(
                &client,
                PrintRequest {
                    vid: "1203".into(),
                    pid: "0230".into(),
                    serial: None,
                    data_base64: "Q0xTDQo=".into(),
                },
            )
            .map(drop)
        ));
    }
}
