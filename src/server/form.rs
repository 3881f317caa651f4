//! Applicant input: form decoding, validation and defaults

use serde::Deserialize;

use crate::data::{CategoricalColumn, LoanRecord, NumericColumn};

pub const DEFAULT_LOAN_TERM: u32 = 360;
pub const DEFAULT_CREDIT_HISTORY: u8 = 1;

/// Raw form submission. Every field arrives as text so malformed numbers
/// surface as validation messages rather than rejected requests.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoanForm {
    pub gender: String,
    pub married: String,
    pub dependents: String,
    pub education: String,
    pub self_employed: String,
    pub applicant_income: String,
    pub coapplicant_income: String,
    pub loan_amount: String,
    #[serde(rename = "loan_term")]
    pub loan_amount_term: String,
    pub credit_history: String,
    pub property_area: String,
}

impl LoanForm {
    pub fn into_record(self) -> Result<LoanRecord, String> {
        let mut record = LoanRecord::default();

        let categorical = [
            (CategoricalColumn::Gender, self.gender),
            (CategoricalColumn::Married, self.married),
            (CategoricalColumn::Dependents, self.dependents),
            (CategoricalColumn::Education, self.education),
            (CategoricalColumn::SelfEmployed, self.self_employed),
            (CategoricalColumn::PropertyArea, self.property_area),
        ];
        for (column, raw) in categorical {
            let raw = raw.trim();
            if !raw.is_empty() {
                record.set_categorical(column, raw);
            }
        }

        let numeric = [
            (NumericColumn::ApplicantIncome, self.applicant_income),
            (NumericColumn::CoapplicantIncome, self.coapplicant_income),
            (NumericColumn::LoanAmount, self.loan_amount),
            (NumericColumn::LoanAmountTerm, self.loan_amount_term),
            (NumericColumn::CreditHistory, self.credit_history),
        ];
        for (column, raw) in numeric {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let value: f64 = raw
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite())
                .ok_or_else(|| format!("{} must be a number", column.name()))?;
            if value < 0.0 {
                return Err(format!("{} must not be negative", column.name()));
            }
            record.set_numeric(column, value);
        }

        prepare_application(record)
    }
}

/// Check a submitted applicant and fill the optional fields.
///
/// All six categorical fields must be present. ApplicantIncome, LoanAmount
/// and a given Loan_Amount_Term must be positive. Missing CoapplicantIncome,
/// Loan_Amount_Term and Credit_History take their form defaults.
pub fn prepare_application(mut record: LoanRecord) -> Result<LoanRecord, String> {
    let mut missing = Vec::new();
    for column in CategoricalColumn::ALL {
        let value = record
            .categorical(column)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        match value {
            Some(v) => record.set_categorical(column, v),
            None => missing.push(column.name()),
        }
    }
    if !missing.is_empty() {
        return Err(format!("Missing required fields: {}", missing.join(", ")));
    }

    let positive = |v: Option<f64>| matches!(v, Some(v) if v.is_finite() && v > 0.0);
    if !positive(record.applicant_income) || !positive(record.loan_amount) {
        return Err("Income and loan amount must be greater than 0.".to_string());
    }

    match record.coapplicant_income {
        Some(v) if !v.is_finite() || v < 0.0 => {
            return Err("CoapplicantIncome must not be negative".to_string());
        }
        Some(_) => {}
        None => record.coapplicant_income = Some(0.0),
    }
    if record.loan_amount_term == Some(0) {
        return Err("Loan_Amount_Term must be greater than 0".to_string());
    }
    if matches!(record.credit_history, Some(c) if c > 1) {
        return Err("Credit_History must be 0 or 1".to_string());
    }

    record.loan_amount_term.get_or_insert(DEFAULT_LOAN_TERM);
    record.credit_history.get_or_insert(DEFAULT_CREDIT_HISTORY);
    record.loan_status = None;
    Ok(record)
}
