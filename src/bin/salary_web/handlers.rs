use askama::Template;
use axum::{
    extract::{Extension, Form, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use bytes::Bytes;
use chrono::NaiveDate;
use palkkalaskuri::components::attendance::{CompanyHoursSummary, PayPeriod};
use palkkalaskuri::components::directory::{Company, DirectoryHandle, Worker};
use palkkalaskuri::components::report::{export_pdf, ReportContext, ReportOptions, ReportTemplate};
use palkkalaskuri::components::salary::{calculate, split_payment, SalaryBreakdown, SalaryInput, TierRule, TierSplit};
use palkkalaskuri::components::store::load_template;
use palkkalaskuri::error::{component_error, Error};
use palkkalaskuri::utils::time::now_in;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::auth::{AuthError, Credentials, JwtAuth, AUTH_COOKIE};
use crate::AppState;

/// Login error messages the form is allowed to show
const ALLOWED_ERROR_MESSAGES: [&str; 2] = ["Invalid credentials", "Authentication error occurred"];

/// Error returned from the JSON API
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Validation(_) | Error::Template(_) | Error::Serialization(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Api(_) => StatusCode::BAD_GATEWAY,
            Error::Component(_) | Error::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn directory(state: &AppState) -> ApiResult<&DirectoryHandle> {
    state
        .directory
        .as_ref()
        .ok_or_else(|| component_error("Worker API is not configured").into())
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    title: String,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    title: String,
    username: String,
    currency: String,
    companies: Vec<Company>,
    templates: Vec<String>,
}

fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render page: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Handler for the index page
pub async fn index_handler() -> Redirect {
    Redirect::to("/dashboard")
}

/// Liveness check
pub async fn health_handler() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    error: Option<String>,
}

/// Handler for the login form page
pub async fn login_form_handler(Query(query): Query<LoginQuery>) -> Response {
    // Only display known messages
    let error = query
        .error
        .filter(|msg| ALLOWED_ERROR_MESSAGES.contains(&msg.as_str()));

    render(&LoginTemplate {
        title: t!("web_login_title").to_string(),
        error,
    })
}

/// Handler for login form submission
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> (CookieJar, Redirect) {
    match state
        .auth_service
        .authenticate(&credentials.username, &credentials.password)
    {
        Ok(token) => {
            info!("User {} successfully authenticated", credentials.username);
            let minutes = state.auth_service.config().token_expiration_minutes;
            let cookie = Cookie::build((AUTH_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Strict)
                .max_age(time::Duration::minutes(minutes));
            (jar.add(cookie), Redirect::to("/dashboard"))
        }
        Err(err) => {
            let message = match err {
                AuthError::Unauthorized => {
                    warn!("Failed login attempt for user: {}", credentials.username);
                    ALLOWED_ERROR_MESSAGES[0]
                }
                other => {
                    error!("Authentication error: {:?}", other);
                    ALLOWED_ERROR_MESSAGES[1]
                }
            };
            let location = format!("/login?error={}", urlencoding::encode(message));
            (
                jar.remove(Cookie::build(AUTH_COOKIE).path("/")),
                Redirect::to(&location),
            )
        }
    }
}

/// Clear the session cookie
pub async fn logout_handler(jar: CookieJar) -> (CookieJar, Redirect) {
    (
        jar.remove(Cookie::build(AUTH_COOKIE).path("/")),
        Redirect::to("/login"),
    )
}

/// Handler for the dashboard page
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<JwtAuth>,
) -> Response {
    let companies = state.store.get_companies().await.unwrap_or_else(|e| {
        error!("Failed to load companies: {}", e);
        Vec::new()
    });
    let templates = state.store.list_templates().await.unwrap_or_else(|e| {
        error!("Failed to list templates: {}", e);
        Vec::new()
    });

    render(&DashboardTemplate {
        title: t!("web_dashboard_title").to_string(),
        username: auth.claims.sub,
        currency: state.config.read().await.currency.clone(),
        companies,
        templates,
    })
}

pub async fn workers_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<Worker>>> {
    Ok(Json(directory(&state)?.list_workers().await?))
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    from: NaiveDate,
    to: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct WorkerHours {
    worker_id: String,
    period: PayPeriod,
    companies: Vec<CompanyHoursSummary>,
    total_hours: f64,
}

/// Hours per company from a worker's attendance calendar
pub async fn worker_hours_handler(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<WorkerHours>> {
    let period = PayPeriod::new(query.from, query.to)?;
    let calendar = directory(&state)?.get_calendar(&worker_id, period).await?;

    Ok(Json(WorkerHours {
        companies: calendar.summaries(&period),
        total_hours: calendar.total_hours(&period),
        worker_id,
        period,
    }))
}

pub async fn calculate_handler(
    State(state): State<AppState>,
    Json(mut input): Json<SalaryInput>,
) -> ApiResult<Json<SalaryBreakdown>> {
    input.apply_defaults(&*state.config.read().await);
    Ok(Json(calculate(&input)?))
}

#[derive(Debug, Deserialize)]
pub struct SplitRequest {
    total: f64,
    tiers: Vec<TierRule>,
}

pub async fn split_handler(Json(request): Json<SplitRequest>) -> ApiResult<Json<TierSplit>> {
    Ok(Json(split_payment(request.total, &request.tiers)?))
}

pub async fn list_templates_handler(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.store.list_templates().await?))
}

pub async fn get_template_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<Response> {
    match load_template(state.store.as_ref(), &name).await {
        Ok(template) => Ok(Json(template).into_response()),
        Err(Error::Template(_)) => Ok(StatusCode::NOT_FOUND.into_response()),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct TemplateBody {
    body: String,
}

pub async fn put_template_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<TemplateBody>,
) -> ApiResult<StatusCode> {
    let template = ReportTemplate::new(name, payload.body);
    state.store.set_template(&template).await?;
    info!("Template '{}' saved", template.name);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_template_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    if state.store.delete_template(&name).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    worker: Worker,
    input: SalaryInput,
    #[serde(default)]
    template: Option<String>,
    #[serde(default)]
    locale: Option<String>,
}

/// Calculate and render the salary report as PDF
pub async fn report_handler(
    State(state): State<AppState>,
    Json(mut request): Json<ReportRequest>,
) -> ApiResult<Response> {
    request.input.apply_defaults(&*state.config.read().await);
    let breakdown = calculate(&request.input)?;
    let template_name = request
        .template
        .as_deref()
        .unwrap_or(palkkalaskuri::components::report::DEFAULT_TEMPLATE_NAME);
    let template = load_template(state.store.as_ref(), template_name).await?;

    let options = {
        let config = state.config.read().await;
        ReportOptions {
            locale: request
                .locale
                .clone()
                .unwrap_or_else(|| config.report_locale.clone()),
            currency: config.currency.clone(),
            generated_at: now_in(config.tz()?),
        }
    };

    let context = ReportContext::build(&request.worker, &request.input, &breakdown, &options);
    let pdf = Bytes::from(export_pdf(&template, &context)?);

    let filename = format!(
        "salary-{}-{}.pdf",
        request.worker.id,
        breakdown.period.start.format("%Y-%m")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        pdf,
    )
        .into_response())
}
