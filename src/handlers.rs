use crate::auth::SESSION_COOKIE;
use crate::dates::resolve_range;
use crate::errors::AppError;
use crate::extract::extract_basis;
use crate::models::{
    Basis, DashboardResponse, DateRange, LoginForm, LoginRequest, LoginResponse, RangeQuery, Session,
    UserRecord,
};
use crate::state::AppState;
use crate::ui::{render_dashboard, render_login, DashboardView};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Local;
use tracing::info;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password. Please try again.";

pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Response {
    if current_session(&state, &jar).await.is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    Html(render_login(None)).into_response()
}

pub async fn login_page() -> Html<String> {
    Html(render_login(None))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.credentials.authenticate(&form.email, &form.password).await {
        Some(user) => {
            let jar = start_session(&state, jar, user).await;
            (jar, Redirect::to("/dashboard")).into_response()
        }
        None => {
            info!("rejected login attempt");
            (StatusCode::UNAUTHORIZED, Html(render_login(Some(INVALID_CREDENTIALS)))).into_response()
        }
    }
}

pub async fn api_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let user = state
        .credentials
        .authenticate(&payload.username, &payload.password)
        .await
        .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

    let response = LoginResponse {
        username: user.username.clone(),
        companies: user.companies.clone(),
    };
    let jar = start_session(&state, jar, user).await;
    Ok((jar, Json(response)))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value()).await;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}

pub async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<RangeQuery>,
) -> Result<Response, AppError> {
    let Some(session) = current_session(&state, &jar).await else {
        return Ok(Redirect::to("/").into_response());
    };

    let range = resolve_range(&query)?;
    let report = build_report(&state, &range).await;
    let page = render_dashboard(&DashboardView {
        session: &session,
        today: Local::now().date_naive(),
        report: &report,
    });
    Ok(Html(page).into_response())
}

pub async fn api_pnl(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<RangeQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    if current_session(&state, &jar).await.is_none() {
        return Err(AppError::login_required());
    }

    let range = resolve_range(&query)?;
    Ok(Json(build_report(&state, &range).await))
}

pub async fn health() -> &'static str {
    "ok"
}

async fn build_report(state: &AppState, range: &DateRange) -> DashboardResponse {
    let fetched = state.pnl.fetch_both(range).await;
    let [accrual, cash] = Basis::ALL.map(|basis| {
        let slot = fetched.basis(basis);
        let mut report = extract_basis(basis, &slot.sections);
        if let Some(warning) = &slot.warning {
            report.warnings.insert(0, warning.clone());
        }
        report
    });

    DashboardResponse {
        from: range.from,
        to: range.to,
        accrual,
        cash,
    }
}

async fn start_session(state: &AppState, jar: CookieJar, user: UserRecord) -> CookieJar {
    let previous = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string());
    let token = state.sessions.replace(previous.as_deref(), user).await;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

async fn current_session(state: &AppState, jar: &CookieJar) -> Option<Session> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    state.sessions.get(&token).await
}
