//! Request handlers for directory pages, sitemaps and the creation API

use axum::{
    extract::{Path, Query, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE},
        HeaderMap, StatusCode,
    },
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use localbiz_common::{BusinessForm, BusinessRecord, Catalog, Error, FormErrors};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::backend::{Backend, StoredBusiness, User};
use crate::render::{self, PageContext};
use crate::sitemap;

const SESSION_COOKIE: &str = "session";
const NEW_BUSINESS_PATH: &str = "/business/new";

/// Shared application state
pub struct AppState {
    pub catalog: Catalog,
    pub backend: Arc<dyn Backend>,
    pub site_name: String,
    /// Public origin without trailing slash
    pub base_url: String,
    pub sign_in_path: String,
}

impl AppState {
    pub fn new(catalog: Catalog, backend: Arc<dyn Backend>, base_url: impl Into<String>) -> Self {
        Self {
            catalog,
            backend,
            site_name: "Local Business Directory".to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sign_in_path: "/sign-in".to_string(),
        }
    }

    pub fn with_site_name(mut self, site_name: impl Into<String>) -> Self {
        self.site_name = site_name.into();
        self
    }

    pub fn with_sign_in_path(mut self, sign_in_path: impl Into<String>) -> Self {
        self.sign_in_path = sign_in_path.into();
        self
    }

    fn page<'a>(&'a self, user: Option<&'a User>) -> PageContext<'a> {
        PageContext {
            site_name: &self.site_name,
            base_url: &self.base_url,
            user,
        }
    }

    fn not_found(&self, user: Option<&User>) -> PageError {
        PageError {
            status: StatusCode::NOT_FOUND,
            html: render::not_found_page(&self.page(user)),
        }
    }

    fn internal(&self, err: Error) -> PageError {
        error!("Page render failed: {:#}", err);
        PageError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            html: render::error_page(&self.page(None)),
        }
    }

    fn sign_in_redirect(&self) -> Response {
        Redirect::to(&format!(
            "{}?redirect_to={}",
            self.sign_in_path,
            urlencoding::encode(NEW_BUSINESS_PATH)
        ))
        .into_response()
    }

    /// Resolve the request's session, propagating backend failures
    async fn current_user(&self, headers: &HeaderMap) -> Result<Option<User>, Error> {
        match session_token(headers) {
            Some(token) => self.backend.get_current_user(&token).await,
            None => Ok(None),
        }
    }

    /// Resolve the session for display only; failures read as signed out
    async fn optional_user(&self, headers: &HeaderMap) -> Option<User> {
        match self.current_user(headers).await {
            Ok(user) => user,
            Err(err) => {
                warn!("Session lookup failed: {:#}", err);
                None
            }
        }
    }
}

/// HTML error response
#[derive(Debug)]
pub struct PageError {
    pub status: StatusCode,
    pub html: String,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        (self.status, Html(self.html)).into_response()
    }
}

/// API Error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Option<FormErrors>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.errors {
            Some(errors) => serde_json::json!({
                "error": self.message,
                "errors": errors,
            }),
            None => serde_json::json!({
                "error": self.message
            }),
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound { .. } => ApiError::new(StatusCode::NOT_FOUND, err.to_string()),
            Error::Conflict(message) => ApiError::new(StatusCode::CONFLICT, message),
            Error::Unauthenticated => ApiError::new(StatusCode::UNAUTHORIZED, err.to_string()),
            other => {
                error!("Backend error: {:#}", other);
                ApiError::new(StatusCode::BAD_GATEWAY, other.to_string())
            }
        }
    }
}

/// Session token from `Authorization: Bearer` or the `session` cookie
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.backend.health_check().await {
        Ok(()) => Json(serde_json::json!({
            "status": "healthy",
            "service": "directory-server",
            "catalog_businesses": state.catalog.len(),
        }))
        .into_response(),
        Err(err) => {
            error!("Backend health check failed: {:#}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unhealthy",
                    "service": "directory-server",
                    "error": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    pub category: Option<String>,
}

/// Directory listing, optionally filtered by category
pub async fn directory_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DirectoryQuery>,
    headers: HeaderMap,
) -> Result<Html<String>, PageError> {
    let user = state.optional_user(&headers).await;
    let selected = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let businesses: Vec<&BusinessRecord> = state
        .catalog
        .businesses()
        .filter(|b| selected.map_or(true, |c| b.category == c))
        .collect();
    debug!(
        "Directory listing category={:?} results={}",
        selected,
        businesses.len()
    );

    let categories = state.catalog.categories();
    render::directory_page(&state.page(user.as_ref()), &businesses, &categories, selected)
        .map(Html)
        .map_err(|e| state.internal(e))
}

/// Catalog business page
pub async fn business_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Html<String>, PageError> {
    let user = state.optional_user(&headers).await;

    let Some(record) = state.catalog.business(&slug) else {
        info!("Business not found: {}", slug);
        return Err(state.not_found(user.as_ref()));
    };

    let locations = state.catalog.locations_for(&slug);
    render::business_page(&state.page(user.as_ref()), record, &locations)
        .map(Html)
        .map_err(|e| state.internal(e))
}

/// Catalog location page
pub async fn location_handler(
    State(state): State<Arc<AppState>>,
    Path((slug, location_slug)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Html<String>, PageError> {
    let user = state.optional_user(&headers).await;

    let found = state
        .catalog
        .business(&slug)
        .zip(state.catalog.location(&slug, &location_slug));
    let Some((parent, location)) = found else {
        info!("Location not found: {}/{}", slug, location_slug);
        return Err(state.not_found(user.as_ref()));
    };

    let siblings = state.catalog.locations_for(&slug);
    render::location_page(&state.page(user.as_ref()), location, parent, &siblings)
        .map(Html)
        .map_err(|e| state.internal(e))
}

/// Live business fetched from the backend by id
pub async fn stored_business_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Html<String>, PageError> {
    let user = state.optional_user(&headers).await;

    let Ok(id) = Uuid::parse_str(&id) else {
        debug!("Malformed business id: {}", id);
        return Err(state.not_found(user.as_ref()));
    };

    let stored = state
        .backend
        .get_by_id(id)
        .await
        .map_err(|e| state.internal(e))?;
    let Some(stored) = stored else {
        info!("Stored business not found: {}", id);
        return Err(state.not_found(user.as_ref()));
    };

    render::stored_business_page(&state.page(user.as_ref()), &stored)
        .map(Html)
        .map_err(|e| state.internal(e))
}

/// Empty creation form; signed-out users are sent to sign in
pub async fn new_business_form_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let user = match state.current_user(&headers).await {
        Ok(Some(user)) => user,
        Ok(None) => return state.sign_in_redirect(),
        Err(err) => return state.internal(err).into_response(),
    };

    let page = render::create_form_page(
        &state.page(Some(&user)),
        &BusinessForm::default(),
        &FormErrors::new(),
    );
    Html(page).into_response()
}

/// Form submission: validate, create, then redirect to the new page
pub async fn create_business_form_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<BusinessForm>,
) -> Response {
    let user = match state.current_user(&headers).await {
        Ok(Some(user)) => user,
        Ok(None) => return state.sign_in_redirect(),
        Err(err) => return state.internal(err).into_response(),
    };

    let new = match form.validate() {
        Ok(new) => new,
        Err(errors) => {
            warn!("Rejected business form from {}: {}", user.id, errors);
            let page = render::create_form_page(&state.page(Some(&user)), &form, &errors);
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response();
        }
    };

    info!("Creating business {} for {}", new.slug(), user.id);
    match state.backend.create(new, &user).await {
        Ok(stored) => Redirect::to(&stored.path()).into_response(),
        Err(err) => {
            let mut errors = FormErrors::new();
            let status = match err {
                Error::Conflict(message) => {
                    errors.add("name", message);
                    StatusCode::CONFLICT
                }
                other => {
                    error!("Backend create failed: {:#}", other);
                    errors.add("form", "We couldn't save your business. Please try again.");
                    StatusCode::BAD_GATEWAY
                }
            };
            let page = render::create_form_page(&state.page(Some(&user)), &form, &errors);
            (status, Html(page)).into_response()
        }
    }
}

/// JSON creation endpoint
pub async fn api_create_business_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(form): Json<BusinessForm>,
) -> Result<(StatusCode, Json<StoredBusiness>), ApiError> {
    let user = state
        .current_user(&headers)
        .await?
        .ok_or(Error::Unauthenticated)?;

    let new = form.validate().map_err(|errors| {
        warn!("Rejected business payload from {}: {}", user.id, errors);
        ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Validation failed".to_string(),
            errors: Some(errors),
        }
    })?;

    info!("Creating business {} for {} via API", new.slug(), user.id);
    let stored = state.backend.create(new, &user).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// Catalog record as JSON
pub async fn api_get_business_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<BusinessRecord>, ApiError> {
    state
        .catalog
        .business(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| Error::not_found("Business", slug).into())
}

fn xml(body: String) -> Response {
    ([(CONTENT_TYPE, "application/xml")], body).into_response()
}

pub async fn sitemap_index_handler(State(state): State<Arc<AppState>>) -> Response {
    xml(sitemap::sitemap_index(&state.base_url))
}

pub async fn businesses_sitemap_handler(State(state): State<Arc<AppState>>) -> Response {
    xml(sitemap::businesses_sitemap(&state.base_url, &state.catalog))
}

pub async fn locations_sitemap_handler(State(state): State<Arc<AppState>>) -> Response {
    xml(sitemap::locations_sitemap(&state.base_url, &state.catalog))
}

pub async fn robots_handler(State(state): State<Arc<AppState>>) -> String {
    sitemap::robots_txt(&state.base_url)
}

/// Unknown routes
pub async fn fallback_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> PageError {
    let user = state.optional_user(&headers).await;
    state.not_found(user.as_ref())
}
