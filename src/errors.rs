use axum::http::StatusCode;
use chrono::NaiveDate;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }
}

impl AppError {
    pub fn login_required() -> Self {
        Self::unauthorized("login required")
    }

    pub fn invalid_date(field: &str) -> Self {
        Self::bad_request(format!("{field} must be a YYYY-MM-DD date"))
    }

    pub fn inverted_range(from: NaiveDate, to: NaiveDate) -> Self {
        Self::bad_request(format!("start date {from} is after end date {to}"))
    }

    pub fn out_of_bounds(earliest: NaiveDate, latest: NaiveDate) -> Self {
        Self::bad_request(format!("date range must overlap {earliest} to {latest}"))
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
