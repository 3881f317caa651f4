//! Typed loan application records and their column schema

use serde::{Deserialize, Serialize};

/// Name of the label column in tabular files
pub const LABEL_COLUMN: &str = "Loan_Status";

/// Categorical feature columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoricalColumn {
    Gender,
    Married,
    Dependents,
    Education,
    SelfEmployed,
    PropertyArea,
}

impl CategoricalColumn {
    pub const ALL: [CategoricalColumn; 6] = [
        CategoricalColumn::Gender,
        CategoricalColumn::Married,
        CategoricalColumn::Dependents,
        CategoricalColumn::Education,
        CategoricalColumn::SelfEmployed,
        CategoricalColumn::PropertyArea,
    ];

    /// Header name used in tabular files and in the persisted schema
    pub fn name(self) -> &'static str {
        match self {
            CategoricalColumn::Gender => "Gender",
            CategoricalColumn::Married => "Married",
            CategoricalColumn::Dependents => "Dependents",
            CategoricalColumn::Education => "Education",
            CategoricalColumn::SelfEmployed => "Self_Employed",
            CategoricalColumn::PropertyArea => "Property_Area",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

/// Numeric feature columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NumericColumn {
    ApplicantIncome,
    CoapplicantIncome,
    LoanAmount,
    LoanAmountTerm,
    CreditHistory,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 5] = [
        NumericColumn::ApplicantIncome,
        NumericColumn::CoapplicantIncome,
        NumericColumn::LoanAmount,
        NumericColumn::LoanAmountTerm,
        NumericColumn::CreditHistory,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NumericColumn::ApplicantIncome => "ApplicantIncome",
            NumericColumn::CoapplicantIncome => "CoapplicantIncome",
            NumericColumn::LoanAmount => "LoanAmount",
            NumericColumn::LoanAmountTerm => "Loan_Amount_Term",
            NumericColumn::CreditHistory => "Credit_History",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Whether the column only holds whole numbers
    pub fn is_integer(self) -> bool {
        matches!(self, NumericColumn::LoanAmountTerm | NumericColumn::CreditHistory)
    }
}

/// Any feature column, in the order the model consumes them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureColumn {
    Categorical(CategoricalColumn),
    Numeric(NumericColumn),
}

impl FeatureColumn {
    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::Categorical(c) => c.name(),
            FeatureColumn::Numeric(n) => n.name(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        CategoricalColumn::from_name(name)
            .map(FeatureColumn::Categorical)
            .or_else(|| NumericColumn::from_name(name).map(FeatureColumn::Numeric))
    }
}

/// Canonical feature order of the model input
pub const FEATURE_COLUMNS: [FeatureColumn; 11] = [
    FeatureColumn::Categorical(CategoricalColumn::Gender),
    FeatureColumn::Categorical(CategoricalColumn::Married),
    FeatureColumn::Categorical(CategoricalColumn::Dependents),
    FeatureColumn::Categorical(CategoricalColumn::Education),
    FeatureColumn::Categorical(CategoricalColumn::SelfEmployed),
    FeatureColumn::Numeric(NumericColumn::ApplicantIncome),
    FeatureColumn::Numeric(NumericColumn::CoapplicantIncome),
    FeatureColumn::Numeric(NumericColumn::LoanAmount),
    FeatureColumn::Numeric(NumericColumn::LoanAmountTerm),
    FeatureColumn::Numeric(NumericColumn::CreditHistory),
    FeatureColumn::Categorical(CategoricalColumn::PropertyArea),
];

/// Binary approval outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    NotApproved,
    Approved,
}

impl LoanStatus {
    pub fn code(self) -> u8 {
        match self {
            LoanStatus::NotApproved => 0,
            LoanStatus::Approved => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(LoanStatus::NotApproved),
            1 => Some(LoanStatus::Approved),
            _ => None,
        }
    }

    /// Human-readable label shown to applicants and stored with predictions
    pub fn label(self) -> &'static str {
        match self {
            LoanStatus::NotApproved => "Not Approved",
            LoanStatus::Approved => "Approved",
        }
    }

    /// Parse a label cell: numeric codes, `Y`/`N`, or the display labels
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw {
            "Y" | "y" | "Approved" => return Some(LoanStatus::Approved),
            "N" | "n" | "Not Approved" => return Some(LoanStatus::NotApproved),
            _ => {}
        }
        let value: f64 = raw.parse().ok()?;
        if value == 1.0 {
            Some(LoanStatus::Approved)
        } else if value == 0.0 {
            Some(LoanStatus::NotApproved)
        } else {
            None
        }
    }
}

/// One applicant. Every feature is optional until preprocessing fills it in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    #[serde(rename = "Gender", default)]
    pub gender: Option<String>,
    #[serde(rename = "Married", default)]
    pub married: Option<String>,
    #[serde(rename = "Dependents", default)]
    pub dependents: Option<String>,
    #[serde(rename = "Education", default)]
    pub education: Option<String>,
    #[serde(rename = "Self_Employed", default)]
    pub self_employed: Option<String>,
    #[serde(rename = "ApplicantIncome", default)]
    pub applicant_income: Option<f64>,
    #[serde(rename = "CoapplicantIncome", default)]
    pub coapplicant_income: Option<f64>,
    #[serde(rename = "LoanAmount", default)]
    pub loan_amount: Option<f64>,
    #[serde(rename = "Loan_Amount_Term", default)]
    pub loan_amount_term: Option<u32>,
    #[serde(rename = "Credit_History", default)]
    pub credit_history: Option<u8>,
    #[serde(rename = "Property_Area", default)]
    pub property_area: Option<String>,
    #[serde(rename = "Loan_Status", default, skip_serializing_if = "Option::is_none")]
    pub loan_status: Option<LoanStatus>,
}

impl LoanRecord {
    pub fn categorical(&self, column: CategoricalColumn) -> Option<&str> {
        let value = match column {
            CategoricalColumn::Gender => &self.gender,
            CategoricalColumn::Married => &self.married,
            CategoricalColumn::Dependents => &self.dependents,
            CategoricalColumn::Education => &self.education,
            CategoricalColumn::SelfEmployed => &self.self_employed,
            CategoricalColumn::PropertyArea => &self.property_area,
        };
        value.as_deref()
    }

    pub fn set_categorical(&mut self, column: CategoricalColumn, value: impl Into<String>) {
        let slot = match column {
            CategoricalColumn::Gender => &mut self.gender,
            CategoricalColumn::Married => &mut self.married,
            CategoricalColumn::Dependents => &mut self.dependents,
            CategoricalColumn::Education => &mut self.education,
            CategoricalColumn::SelfEmployed => &mut self.self_employed,
            CategoricalColumn::PropertyArea => &mut self.property_area,
        };
        *slot = Some(value.into());
    }

    pub fn numeric(&self, column: NumericColumn) -> Option<f64> {
        match column {
            NumericColumn::ApplicantIncome => self.applicant_income,
            NumericColumn::CoapplicantIncome => self.coapplicant_income,
            NumericColumn::LoanAmount => self.loan_amount,
            NumericColumn::LoanAmountTerm => self.loan_amount_term.map(f64::from),
            NumericColumn::CreditHistory => self.credit_history.map(f64::from),
        }
    }

    /// Set a numeric feature. Integer columns are rounded to the nearest
    /// admissible whole number.
    pub fn set_numeric(&mut self, column: NumericColumn, value: f64) {
        match column {
            NumericColumn::ApplicantIncome => self.applicant_income = Some(value),
            NumericColumn::CoapplicantIncome => self.coapplicant_income = Some(value),
            NumericColumn::LoanAmount => self.loan_amount = Some(value),
            NumericColumn::LoanAmountTerm => {
                self.loan_amount_term = Some(value.round().max(0.0) as u32)
            }
            NumericColumn::CreditHistory => {
                self.credit_history = Some(value.round().clamp(0.0, 1.0) as u8)
            }
        }
    }

    /// Loan amount over combined income, with the denominator floored at 1
    pub fn income_ratio(&self) -> Option<f64> {
        let loan = self.loan_amount?;
        let income = self.applicant_income.unwrap_or(0.0) + self.coapplicant_income.unwrap_or(0.0);
        Some(loan / income.max(1.0))
    }
}
