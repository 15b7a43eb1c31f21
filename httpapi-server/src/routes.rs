use httpapi::api::info;
use httpapi::{AuthRequirement, Endpoint, InfoResponse, Response};

/// Scopes accepted by the admin endpoint
pub const ADMIN_SCOPES: [&str; 2] = ["httpapi.admin", "cloud_controller.admin"];

pub fn endpoints(info: InfoResponse) -> Vec<Endpoint> {
    vec![
        Endpoint::get("/", AuthRequirement::Open, |_| Response::ok_template("index")),
        info::endpoint(info),
        Endpoint::get("/v1/me", AuthRequirement::AnyAuthenticated, |request| {
            match request.current_user() {
                Some(user) => Response::ok(user.clone()),
                None => Response::unauthorized(),
            }
        }),
        Endpoint::get(
            "/v1/admin/scopes",
            AuthRequirement::any_scope(ADMIN_SCOPES),
            |request| {
                let scopes = request
                    .current_user()
                    .map(|user| user.scopes.clone())
                    .unwrap_or_default();
                Response::ok(scopes)
            },
        ),
    ]
}
