use http::{Method, StatusCode};

use crate::{
    domains::Dinosaur,
    http::{IntoResponse, Json, Request, Response},
    json::{self, NAME_KEY},
    AppState,
};

pub async fn route_request(request: Request, app_state: AppState) -> Response {
    let path = request.uri().path();

    macro_rules! routes {
        (@bind $rest:ident $v:ident => $f:expr) => {
            if !$rest.is_empty() {
                let $v = $rest;
                return $f;
            }
        };
        (@bind $rest:ident => $f:expr) => {
            if $rest.is_empty() {
                return $f;
            }
        };
        (
            $($m:ident $p:literal $($v:ident)? => $f:expr),*
            $(, _ => $wc:expr)?
        ) => {
            $(if request.method() == Method::$m {
                if let Some(rest) = path.strip_prefix($p) {
                    let rest = rest.strip_suffix('/').unwrap_or(rest);
                    routes!(@bind rest $($v)? => $f);
                }
            })*
            $(return $wc;)?
        };
    }

    routes!(
        GET "/api/dinosaurios" => list_dinosaurs(app_state).await,
        GET "/api/dinosaurio" => list_dinosaurs(app_state).await,
        POST "/api/dinosaurio" => create_dinosaur(app_state, &request).await,
        PUT "/api/dinosaurio/" id => update_dinosaur(app_state, id, &request).await,
        DELETE "/api/dinosaurio/" id => delete_dinosaur(app_state, id).await,
        _ => {
            let msg = format!("Unknown route {} {path}", request.method());
            (StatusCode::NOT_FOUND, msg).into_response()
        }
    );
}

async fn list_dinosaurs(app_state: AppState) -> Response {
    match app_state.repository.list().await {
        Ok(dinosaurs) => listing(StatusCode::OK, &dinosaurs),
        Err(err) => repository_failure(err),
    }
}

async fn create_dinosaur(app_state: AppState, request: &Request) -> Response {
    let Some(name) = dinosaur_name(request) else {
        return missing_name();
    };

    match app_state.repository.append(name).await {
        Ok(snapshot) => {
            tracing::debug!(id = snapshot.outcome.id, name, "dinosaur received");
            listing(StatusCode::CREATED, &snapshot.dinosaurs)
        }
        Err(err) => repository_failure(err),
    }
}

/// Unknown or non-numeric ids leave the collection untouched and still
/// answer with the listing.
async fn update_dinosaur(app_state: AppState, id: &str, request: &Request) -> Response {
    let Some(name) = dinosaur_name(request) else {
        return missing_name();
    };

    let result = match id.parse::<u64>() {
        Ok(id) => app_state
            .repository
            .update_by_id(id, name)
            .await
            .map(|snapshot| {
                tracing::debug!(id, name, updated = snapshot.outcome, "dinosaur update");
                snapshot.dinosaurs
            }),
        Err(_) => {
            tracing::debug!(id, "ignoring update of non-numeric id");
            app_state.repository.list().await
        }
    };

    match result {
        Ok(dinosaurs) => listing(StatusCode::OK, &dinosaurs),
        Err(err) => repository_failure(err),
    }
}

async fn delete_dinosaur(app_state: AppState, id: &str) -> Response {
    let result = match id.parse::<u64>() {
        Ok(id) => app_state.repository.delete_by_id(id).await.map(|snapshot| {
            tracing::debug!(id, deleted = snapshot.outcome, "dinosaur delete");
            snapshot.dinosaurs
        }),
        Err(_) => {
            tracing::debug!(id, "ignoring delete of non-numeric id");
            app_state.repository.list().await
        }
    };

    match result {
        Ok(dinosaurs) => listing(StatusCode::OK, &dinosaurs),
        Err(err) => repository_failure(err),
    }
}

fn dinosaur_name(request: &Request) -> Option<&str> {
    let body = request.body().as_deref()?;
    json::extract_field(body, NAME_KEY)
}

fn listing(status: StatusCode, dinosaurs: &[Dinosaur]) -> Response {
    (status, Json(json::encode_list(dinosaurs))).into_response()
}

fn missing_name() -> Response {
    let msg = format!("request body must contain a \"{NAME_KEY}\" string field");
    (StatusCode::BAD_REQUEST, msg).into_response()
}

fn repository_failure(err: anyhow::Error) -> Response {
    tracing::error!(%err, "dinosaur repository failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}
