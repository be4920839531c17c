//! Text rendering of the prediction view

use super::PredictionView;
use crate::models::{FormField, LoanDecision, PredictionResult};
use crate::state::RequestState;

/// Two decimals plus a percent sign
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Confidence arrives as a 0..1 fraction
pub fn format_confidence(decision: &LoanDecision) -> String {
    format_percent(decision.approval_confidence * 100.0)
}

/// Rate arrives already in percent; `None` unless the loan was approved
pub fn format_interest_rate(decision: &LoanDecision) -> Option<String> {
    if !decision.loan_approved {
        return None;
    }
    Some(
        decision
            .predicted_interest_rate
            .map(format_percent)
            .unwrap_or_else(|| "n/a".to_string()),
    )
}

pub fn render_result(result: &PredictionResult) -> Vec<String> {
    match result {
        PredictionResult::Rejected { error } => vec![error.clone()],
        PredictionResult::Decision(decision) => {
            let mut lines = vec![
                format!(
                    "Loan Approved: {}",
                    if decision.loan_approved { "Yes" } else { "No" }
                ),
                format!("Confidence: {}", format_confidence(decision)),
            ];
            if let Some(rate) = format_interest_rate(decision) {
                lines.push(format!("Predicted Interest Rate: {}", rate));
            }
            lines
        }
    }
}

pub fn submit_button_label(state: RequestState) -> &'static str {
    match state {
        RequestState::Pending => "Predicting...",
        RequestState::Idle => "Submit",
    }
}

/// Whole page: form, button, then result or failure notice
pub fn render_view(view: &PredictionView) -> Vec<String> {
    let mut lines: Vec<String> = FormField::ALL
        .iter()
        .map(|field| format!("{}: {}", field.label(), view.form.get(*field)))
        .collect();
    lines.push(format!("[{}]", submit_button_label(view.request_state)));

    if let Some(result) = &view.result {
        lines.extend(render_result(result));
    }
    if let Some(failure) = &view.failure {
        lines.push(failure.notice().to_string());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::FormRecord;
    use crate::prediction::{Failure, FAILURE_NOTICE};

    fn decision(approved: bool, rate: Option<f64>) -> LoanDecision {
        LoanDecision {
            loan_approved: approved,
            approval_confidence: 0.87,
            predicted_interest_rate: rate,
        }
    }

    #[test]
    fn test_approved_lines() {
        let lines = render_result(&PredictionResult::Decision(decision(true, Some(5.25))));
        assert_eq!(
            lines,
            vec![
                "Loan Approved: Yes",
                "Confidence: 87.00%",
                "Predicted Interest Rate: 5.25%"
            ]
        );
    }

    #[test]
    fn test_denied_hides_rate() {
        let lines = render_result(&PredictionResult::Decision(decision(false, Some(9.9))));
        assert_eq!(lines, vec!["Loan Approved: No", "Confidence: 87.00%"]);
    }

    #[test]
    fn test_approved_without_rate() {
        let d = decision(true, None);
        assert_eq!(format_interest_rate(&d).as_deref(), Some("n/a"));
    }

    #[test]
    fn test_rejected_shows_only_error() {
        let lines = render_result(&PredictionResult::Rejected {
            error: "invalid input".to_string(),
        });
        assert_eq!(lines, vec!["invalid input"]);
    }

    #[test]
    fn test_view_with_failure() {
        let view = PredictionView {
            form: FormRecord {
                credit_score: "720".to_string(),
                ..FormRecord::default()
            },
            result: None,
            failure: Some(Failure {
                kind: ErrorKind::Network,
                status: None,
                detail: "connection refused".to_string(),
            }),
            request_state: RequestState::Pending,
        };

        let lines = render_view(&view);
        assert_eq!(lines[0], "Credit Score: 720");
        assert_eq!(lines[3], "[Predicting...]");
        assert_eq!(lines.last().unwrap(), FAILURE_NOTICE);
    }
}
