use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Error as AxumError, Header},
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use std::sync::Arc;

use crate::{budgets, dashboard, expenses, lookups, notifications, recurring};
use engine::{Actor, Engine};

static ACTOR_NAME_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("x-actor-name");
static ACTOR_ROLE_HEADER: axum::http::HeaderName =
    axum::http::HeaderName::from_static("x-actor-role");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    /// Defines "today" for the scheduler, the dashboard and budget alerts.
    pub timezone: Tz,
}

impl ServerState {
    pub fn new(engine: Engine, timezone: Tz) -> Self {
        Self {
            engine: Arc::new(engine),
            timezone,
        }
    }

    pub(crate) fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

fn decode_text<'i, I>(values: &mut I) -> Result<String, AxumError>
where
    I: Iterator<Item = &'i axum::http::HeaderValue>,
{
    let value = values.next().ok_or_else(AxumError::invalid)?;
    // Names are commonly Thai, so accept raw UTF-8 and not only visible ASCII.
    let Ok(value) = std::str::from_utf8(value.as_bytes()) else {
        return Err(AxumError::invalid());
    };
    Ok(value.to_string())
}

fn encode_text<E: Extend<axum::http::HeaderValue>>(value: &str, values: &mut E) {
    match axum::http::HeaderValue::from_bytes(value.as_bytes()) {
        Ok(value) => values.extend(std::iter::once(value)),
        Err(_) => tracing::error!("failed to encode actor header"),
    }
}

/// `TypedHeader` for the acting person's display name.
#[derive(Debug)]
pub struct ActorName(pub String);

impl Header for ActorName {
    fn name() -> &'static axum::http::HeaderName {
        &ACTOR_NAME_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        decode_text(values).map(ActorName)
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        encode_text(&self.0, values);
    }
}

/// `TypedHeader` for the acting person's role.
#[derive(Debug)]
pub struct ActorRole(pub String);

impl Header for ActorRole {
    fn name() -> &'static axum::http::HeaderName {
        &ACTOR_ROLE_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        decode_text(values).map(ActorRole)
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        encode_text(&self.0, values);
    }
}

/// Resolves the actor from the identity headers and stores it in the request
/// extensions. Missing headers fall back to `System` / `User`.
async fn identify(
    name: Option<TypedHeader<ActorName>>,
    role: Option<TypedHeader<ActorRole>>,
    mut request: Request,
    next: Next,
) -> Response {
    let actor = Actor::resolve(
        name.as_ref().map(|header| header.0.0.as_str()),
        role.as_ref().map(|header| header.0.0.as_str()),
    );
    request.extensions_mut().insert(actor);
    next.run(request).await
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/lookups", get(lookups::list))
        .route("/departments", post(lookups::department_new))
        .route("/expenses", get(expenses::list).post(expenses::create))
        .route("/expenses/export", get(expenses::export))
        .route(
            "/expenses/{id}",
            get(expenses::detail)
                .put(expenses::edit)
                .delete(expenses::remove),
        )
        .route("/expenses/{id}/status", post(expenses::update_status))
        .route("/expenses/{id}/audit", get(expenses::audit))
        .route("/budgets", get(budgets::list).post(budgets::create))
        .route("/budgets/check", post(budgets::check))
        .route("/budgets/alerts", get(budgets::alerts))
        .route("/budgets/{id}", put(budgets::update).delete(budgets::remove))
        .route("/recurring", get(recurring::list).post(recurring::create))
        .route("/recurring/check", post(recurring::check))
        .route(
            "/recurring/{id}",
            get(recurring::get)
                .put(recurring::update)
                .delete(recurring::remove),
        )
        .route("/notifications", get(notifications::list))
        .route("/notifications/mark-read", post(notifications::mark_read))
        .route("/dashboard", get(dashboard::get))
        .route_layer(middleware::from_fn(identify))
        .with_state(state)
}

pub async fn run(engine: Engine, timezone: Tz, bind: &str) {
    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {bind}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, timezone, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    timezone: Tz,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState::new(engine, timezone);
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_extra::headers::HeaderMapExt;

    #[test]
    fn actor_headers_accept_thai_names() {
        let mut headers = axum::http::HeaderMap::new();
        headers.typed_insert(ActorName("สมชาย".to_string()));
        headers.typed_insert(ActorRole("admin".to_string()));

        let name: Option<ActorName> = headers.typed_get();
        let role: Option<ActorRole> = headers.typed_get();
        assert_eq!(name.map(|n| n.0).as_deref(), Some("สมชาย"));
        assert_eq!(role.map(|r| r.0).as_deref(), Some("admin"));
    }
}
