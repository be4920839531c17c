//! Core data models for the loan assistant client

use crate::error::ClientError;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//
// ================= Form =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    CreditScore,
    AnnualIncome,
    RequestedAmount,
}

impl FormField {
    pub const ALL: [FormField; 3] = [
        FormField::CreditScore,
        FormField::AnnualIncome,
        FormField::RequestedAmount,
    ];

    /// Field name on the prediction wire contract
    pub fn wire_name(self) -> &'static str {
        match self {
            FormField::CreditScore => "avg_credit_score",
            FormField::AnnualIncome => "avg_annual_income",
            FormField::RequestedAmount => "avg_requested_amount",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::CreditScore => "Credit Score",
            FormField::AnnualIncome => "Annual Income",
            FormField::RequestedAmount => "Requested Amount",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

impl FromStr for FormField {
    type Err = ClientError;

    /// Accepts wire names (`avg_credit_score`), short names (`credit_score`,
    /// `credit-score`) and camelCase (`creditScore`)
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let normalized = normalized.strip_prefix("avg").unwrap_or(&normalized);

        match normalized {
            "creditscore" => Ok(FormField::CreditScore),
            "annualincome" => Ok(FormField::AnnualIncome),
            "requestedamount" => Ok(FormField::RequestedAmount),
            _ => Err(ClientError::UnknownField(s.to_string())),
        }
    }
}

/// Raw text of the three applicant fields, stored exactly as typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormRecord {
    pub credit_score: String,
    pub annual_income: String,
    pub requested_amount: String,
}

impl FormRecord {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::CreditScore => &self.credit_score,
            FormField::AnnualIncome => &self.annual_income,
            FormField::RequestedAmount => &self.requested_amount,
        }
    }

    pub fn set(&mut self, field: FormField, raw: String) {
        match field {
            FormField::CreditScore => self.credit_score = raw,
            FormField::AnnualIncome => self.annual_income = raw,
            FormField::RequestedAmount => self.requested_amount = raw,
        }
    }

    /// Fields that are still blank, in form order
    pub fn missing_fields(&self) -> Vec<FormField> {
        FormField::ALL
            .into_iter()
            .filter(|field| self.get(*field).trim().is_empty())
            .collect()
    }

    pub fn to_request(&self) -> PredictionRequest {
        PredictionRequest {
            avg_credit_score: coerce_number(&self.credit_score),
            avg_annual_income: coerce_number(&self.annual_income),
            avg_requested_amount: coerce_number(&self.requested_amount),
        }
    }
}

/// Text to number; anything unparseable becomes NaN (sent as `null`)
pub fn coerce_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

//
// ================= Prediction wire =================
//

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PredictionRequest {
    pub avg_credit_score: f64,
    pub avg_annual_income: f64,
    pub avg_requested_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanDecision {
    pub loan_approved: bool,
    pub approval_confidence: f64,
    #[serde(default)]
    pub predicted_interest_rate: Option<f64>,
}

impl LoanDecision {
    /// The rate only carries meaning for approved loans
    pub fn interest_rate(&self) -> Option<f64> {
        if self.loan_approved {
            self.predicted_interest_rate
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionResult {
    /// Business-level rejection reported by the service
    Rejected { error: String },
    Decision(LoanDecision),
}

impl PredictionResult {
    /// Classify a response body: any non-null, non-empty `error` field wins
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(ClientError::InvalidResponse(format!(
                "expected a JSON object, got {}",
                value
            )));
        }

        match value.get("error") {
            Some(Value::String(error)) if !error.is_empty() => {
                return Ok(PredictionResult::Rejected {
                    error: error.clone(),
                })
            }
            Some(Value::String(_)) | Some(Value::Null) | None => {}
            Some(other) => {
                return Ok(PredictionResult::Rejected {
                    error: other.to_string(),
                })
            }
        }

        serde_json::from_value::<LoanDecision>(value)
            .map(PredictionResult::Decision)
            .map_err(|e| ClientError::InvalidResponse(format!("prediction body: {}", e)))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, PredictionResult::Rejected { .. })
    }

    pub fn decision(&self) -> Option<&LoanDecision> {
        match self {
            PredictionResult::Decision(decision) => Some(decision),
            PredictionResult::Rejected { .. } => None,
        }
    }
}

//
// ================= Chat =================
//

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Reply text from a chat response body, if it carries a usable one
pub fn chat_reply_text(body: &Value) -> Option<&str> {
    body.get("response")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            sender,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        };
        write!(f, "{}", s)
    }
}
