//! HTML rendering for the form and result pages

use crate::data::LoanRecord;
use crate::inference::Prediction;
use crate::training::TrainingMetrics;

/// One-shot message shown above the form
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    fn class(&self) -> &'static str {
        match self {
            Notice::Success(_) => "notice success",
            Notice::Error(_) => "notice error",
        }
    }

    fn text(&self) -> &str {
        match self {
            Notice::Success(t) | Notice::Error(t) => t,
        }
    }
}

const STYLE: &str = r#"<style>
body { font-family: sans-serif; margin: 2em auto; max-width: 760px; background: #f5f5f5; color: #222; }
.card { background: white; border-radius: 8px; padding: 1.5em; margin: 1em 0; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
h1 { color: #333; } h2 { color: #555; margin-top: 0; }
label { display: block; margin-top: 0.8em; font-weight: bold; }
input, select { width: 100%; padding: 0.4em; margin-top: 0.2em; box-sizing: border-box; }
button { margin-top: 1.2em; padding: 0.6em 1.4em; background: #2563eb; color: white; border: 0; border-radius: 4px; }
.grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 0 1em; }
.notice { padding: 0.8em 1em; border-radius: 4px; }
.success { background: #dcfce7; color: #166534; }
.error { background: #fee2e2; color: #991b1b; }
.metric { font-size: 2em; font-weight: bold; color: #2563eb; }
.approved { color: #166534; } .rejected { color: #991b1b; }
table { width: 100%; border-collapse: collapse; } td { padding: 0.3em 0; border-bottom: 1px solid #eee; }
</style>"#;

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn select(name: &str, label: &str, options: &[(&str, &str)]) -> String {
    let options: String = options
        .iter()
        .map(|(value, text)| format!(r#"<option value="{value}">{text}</option>"#))
        .collect();
    format!(
        r#"<label for="{name}">{label}</label>
<select id="{name}" name="{name}" required><option value="">Select...</option>{options}</select>"#
    )
}

fn metrics_card(metrics: Option<&TrainingMetrics>) -> String {
    let Some(m) = metrics else {
        return r#"<div class="card"><h2>Model</h2><p>No model has been trained yet.</p></div>"#
            .to_string();
    };
    let candidates: String = m
        .candidates
        .iter()
        .map(|c| {
            format!(
                "<tr><td>{}</td><td>{:.1}%</td></tr>",
                escape(&c.model_name),
                c.accuracy * 100.0
            )
        })
        .collect();
    format!(
        r#"<div class="card"><h2>Model</h2>
<div class="grid">
  <div><div>Selected</div><div class="metric">{}</div></div>
  <div><div>Accuracy</div><div class="metric">{:.1}%</div></div>
</div>
<p>Trained on {} rows, tested on {} rows at {}.</p>
<table>{}</table></div>"#,
        escape(&m.model_name),
        m.accuracy * 100.0,
        m.training_samples,
        m.test_samples,
        m.trained_at.format("%Y-%m-%d %H:%M UTC"),
        candidates,
    )
}

/// Application form with current model metrics and an optional notice
pub fn index_page(metrics: Option<&TrainingMetrics>, notice: Option<&Notice>) -> String {
    let notice = notice
        .map(|n| format!(r#"<div class="{}">{}</div>"#, n.class(), escape(n.text())))
        .unwrap_or_default();
    let fields = [
        select("gender", "Gender", &[("Male", "Male"), ("Female", "Female")]),
        select("married", "Married", &[("Yes", "Yes"), ("No", "No")]),
        select(
            "dependents",
            "Dependents",
            &[("0", "0"), ("1", "1"), ("2", "2"), ("3+", "3+")],
        ),
        select(
            "education",
            "Education",
            &[("Graduate", "Graduate"), ("Not Graduate", "Not Graduate")],
        ),
        select("self_employed", "Self Employed", &[("No", "No"), ("Yes", "Yes")]),
        select(
            "property_area",
            "Property Area",
            &[("Urban", "Urban"), ("Semiurban", "Semiurban"), ("Rural", "Rural")],
        ),
        select(
            "credit_history",
            "Credit History",
            &[("1", "Meets guidelines"), ("0", "Does not meet guidelines")],
        ),
    ]
    .concat();

    format!(
        r#"<!DOCTYPE html>
<html lang="en"><head><meta charset="UTF-8"><title>Loan Approval Predictor</title>
{STYLE}</head><body>
<h1>Loan Approval Predictor</h1>
{notice}
{metrics}
<div class="card"><h2>Application</h2>
<form id="loanForm" method="post" action="/predict">
<div class="grid">{fields}</div>
<div class="grid">
<div><label for="applicant_income">Applicant Income</label>
<input type="number" id="applicant_income" name="applicant_income" min="1" step="any" required></div>
<div><label for="coapplicant_income">Coapplicant Income</label>
<input type="number" id="coapplicant_income" name="coapplicant_income" min="0" step="any" value="0"></div>
<div><label for="loan_amount">Loan Amount (thousands)</label>
<input type="number" id="loan_amount" name="loan_amount" min="1" step="any" required></div>
<div><label for="loan_term">Loan Term (months)</label>
<input type="number" id="loan_term" name="loan_term" min="1" value="360"></div>
</div>
<button type="submit">Predict</button>
</form></div>
<div class="card"><form method="post" action="/retrain"><button type="submit">Retrain model</button></form></div>
</body></html>"#,
        metrics = metrics_card(metrics),
    )
}

/// Result page for one served prediction
pub fn result_page(record: &LoanRecord, prediction: &Prediction, income_ratio: f64) -> String {
    let label = prediction.status.label();
    let class = if prediction.label() == 1 { "approved" } else { "rejected" };
    let text = |v: &Option<String>| escape(v.as_deref().unwrap_or(""));
    let number = |v: Option<f64>| v.map(|v| format!("{v:.0}")).unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en"><head><meta charset="UTF-8"><title>Prediction - Loan Approval Predictor</title>
{STYLE}</head><body>
<h1>Loan Approval Predictor</h1>
<div class="card"><h2>Prediction</h2>
<div class="grid">
  <div><div>Decision</div><div class="metric {class}">{label}</div></div>
  <div><div>Confidence</div><div class="metric">{confidence:.1}%</div></div>
  <div><div>Loan to income</div><div class="metric">{income_ratio:.3}</div></div>
</div></div>
<div class="card"><h2>Application</h2><table>
<tr><td>Gender</td><td>{gender}</td></tr>
<tr><td>Married</td><td>{married}</td></tr>
<tr><td>Dependents</td><td>{dependents}</td></tr>
<tr><td>Education</td><td>{education}</td></tr>
<tr><td>Self Employed</td><td>{self_employed}</td></tr>
<tr><td>Applicant Income</td><td>{applicant_income}</td></tr>
<tr><td>Coapplicant Income</td><td>{coapplicant_income}</td></tr>
<tr><td>Loan Amount</td><td>{loan_amount}</td></tr>
<tr><td>Loan Term</td><td>{term}</td></tr>
<tr><td>Credit History</td><td>{credit}</td></tr>
<tr><td>Property Area</td><td>{property_area}</td></tr>
</table></div>
<p><a href="/">New application</a></p>
</body></html>"#,
        confidence = prediction.confidence * 100.0,
        gender = text(&record.gender),
        married = text(&record.married),
        dependents = text(&record.dependents),
        education = text(&record.education),
        self_employed = text(&record.self_employed),
        applicant_income = number(record.applicant_income),
        coapplicant_income = number(record.coapplicant_income),
        loan_amount = number(record.loan_amount),
        term = record.loan_amount_term.map(|t| t.to_string()).unwrap_or_default(),
        credit = record.credit_history.map(|c| c.to_string()).unwrap_or_default(),
        property_area = text(&record.property_area),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LoanStatus;

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"x\" & 'y'</b>"), "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
    }

    #[test]
    fn test_index_page_without_model() {
        let html = index_page(None, Some(&Notice::Error("Failed to retrain model.".into())));
        assert!(html.contains("No model has been trained yet."));
        assert!(html.contains(r#"class="notice error""#));
        assert!(html.contains(r#"name="loan_term""#));
    }

    #[test]
    fn test_result_page() {
        let record = LoanRecord {
            gender: Some("<Male>".to_string()),
            loan_amount: Some(150.0),
            ..Default::default()
        };
        let prediction = Prediction {
            status: LoanStatus::Approved,
            confidence: 0.875,
        };
        let html = result_page(&record, &prediction, 0.03);
        assert!(html.contains("Approved"));
        assert!(html.contains("87.5%"));
        assert!(html.contains("0.030"));
        assert!(html.contains("&lt;Male&gt;"));
    }
}
