use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One node of the P&L report tree returned by the webhook.
///
/// A borrowed view over the raw JSON: `name`, `total` and
/// `account_transactions` are each decoded only when read, so a field nobody
/// looks at can never fail the walk.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    raw: &'a serde_json::Map<String, Value>,
}

impl<'a> Section<'a> {
    pub fn from_value(value: &'a Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(raw) => Ok(Self { raw }),
            other => Err(de::Error::custom(format!("expected a section object, found {other}"))),
        }
    }

    pub fn name(&self) -> Result<Option<&'a str>, serde_json::Error> {
        match self.raw.get("name") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(name)) => Ok(Some(name.as_str())),
            Some(other) => Err(de::Error::custom(format!("invalid section name {other}"))),
        }
    }

    /// Lowercased name used for matching; absent names match as "".
    pub fn match_key(&self) -> Result<String, serde_json::Error> {
        Ok(self.name()?.unwrap_or_default().to_lowercase())
    }

    pub fn total(&self) -> Result<f64, serde_json::Error> {
        match self.raw.get("total") {
            None => Ok(0.0),
            Some(value) => lenient_amount(value),
        }
    }

    pub fn children(&self) -> Result<&'a [Value], serde_json::Error> {
        match self.raw.get("account_transactions") {
            None | Some(Value::Null) => Ok(Default::default()),
            Some(Value::Array(items)) => Ok(items.as_slice()),
            Some(other) => Err(de::Error::custom(format!(
                "invalid account_transactions {other}"
            ))),
        }
    }
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(Raw::Number(value)) => Ok(value),
        Some(Raw::Text(text)) => {
            let cleaned = text.trim().replace(',', "");
            if cleaned.is_empty() {
                return Ok(0.0);
            }
            cleaned
                .parse()
                .map_err(|_| de::Error::custom(format!("invalid amount {text:?}")))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct Metrics {
    #[serde(rename = "Sales")]
    pub sales: f64,
    #[serde(rename = "COGS")]
    pub cogs: f64,
    #[serde(rename = "Gross Profit")]
    pub gross_profit: f64,
    #[serde(rename = "Operating Expenses")]
    pub operating_expenses: f64,
    #[serde(rename = "Operating Profit")]
    pub operating_profit: f64,
    #[serde(rename = "Net Profit")]
    pub net_profit: f64,
}

impl Metrics {
    pub fn tiles(&self) -> [(&'static str, f64); 6] {
        [
            ("Sales", self.sales),
            ("COGS", self.cogs),
            ("Gross Profit", self.gross_profit),
            ("Operating Expenses", self.operating_expenses),
            ("Operating Profit", self.operating_profit),
            ("Net Profit", self.net_profit),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseRow {
    pub name: String,
    pub amount: f64,
}

impl TryFrom<Section<'_>> for ExpenseRow {
    type Error = serde_json::Error;

    fn try_from(section: Section<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            name: section.name()?.unwrap_or("Unknown").to_string(),
            amount: section.total()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Basis {
    Accrual,
    Cash,
}

impl Basis {
    pub const ALL: [Basis; 2] = [Basis::Accrual, Basis::Cash];

    pub fn label(self) -> &'static str {
        match self {
            Basis::Accrual => "Accrual",
            Basis::Cash => "Cash",
        }
    }

    /// Value of the `cash_basis` field the webhook expects.
    pub fn cash_basis_flag(self) -> &'static str {
        match self {
            Basis::Accrual => "false",
            Basis::Cash => "true",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PnlRequest {
    pub from_date: String,
    pub to_date: String,
    pub cash_basis: String,
}

impl PnlRequest {
    pub fn new(range: &DateRange, basis: Basis) -> Self {
        Self {
            from_date: range.from.format("%Y-%m-%d").to_string(),
            to_date: range.to.format("%Y-%m-%d").to_string(),
            cash_basis: basis.cash_basis_flag().to_string(),
        }
    }
}

/// Shapes the webhook is known to answer with.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookBody {
    Sections(Vec<Value>),
    ByBasis(serde_json::Map<String, Value>),
}

impl WebhookBody {
    /// Returns `None` for anything that is neither a section list nor an
    /// object keyed by `Accrual` / `Cash`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(sections) => Some(Self::Sections(sections)),
            Value::Object(map) if map.contains_key("Accrual") || map.contains_key("Cash") => {
                Some(Self::ByBasis(map))
            }
            _ => None,
        }
    }

    /// Only the requested basis's key is checked; a malformed sibling key
    /// does not hide a well-formed one.
    pub fn into_sections(self, basis: Basis) -> Option<Vec<Value>> {
        match self {
            Self::Sections(sections) => Some(sections),
            Self::ByBasis(mut map) => take_list(map.remove(basis.label())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub companies: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialFile {
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub username: String,
    pub companies: Vec<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub companies: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BasisReport {
    pub basis: Basis,
    pub metrics: Metrics,
    pub expenses: Vec<ExpenseRow>,
    pub has_data: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub accrual: BasisReport,
    pub cash: BasisReport,
}
