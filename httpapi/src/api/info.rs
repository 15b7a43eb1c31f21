use crate::api::auth::AuthRequirement;
use crate::api::endpoint::Endpoint;
use crate::api::response::Response;
use serde::{Deserialize, Serialize};

/// Build information served on `GET /v1/info`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InfoResponse {
    pub url: String,
    pub version: String,
    pub commit: String,
}

/// Unauthenticated endpoint returning `info` as JSON
pub fn endpoint(info: InfoResponse) -> Endpoint {
    Endpoint::get("/v1/info", AuthRequirement::Open, move |_| {
        Response::ok(info.clone())
    })
}
