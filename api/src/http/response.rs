use http::StatusCode;

use crate::json;

pub type Response = http::Response<String>;

pub trait IntoResponse {
    fn into_response(self) -> Response;
}

pub struct Json(pub String);

impl IntoResponse for Json {
    fn into_response(self) -> Response {
        http::Response::new(self.0)
    }
}

impl IntoResponse for &str {
    fn into_response(self) -> Response {
        Json(json::encode_error(self)).into_response()
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        self.as_str().into_response()
    }
}

impl<B: IntoResponse> IntoResponse for (StatusCode, B) {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        *response.status_mut() = self.0;

        response
    }
}
