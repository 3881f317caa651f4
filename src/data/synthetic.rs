//! Synthetic reference loan dataset
//!
//! Produces a plausible applicant population when no training table exists.
//! The label comes from a weighted eligibility score plus gaussian noise, so
//! the models have a real signal to learn.

use crate::data::record::{LoanRecord, LoanStatus};
use crate::error::{LoanError, Result};
use rand::distributions::WeightedIndex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, LogNormal, StandardNormal};

const GENDER: [(&str, f64); 2] = [("Male", 0.8), ("Female", 0.2)];
const MARRIED: [(&str, f64); 2] = [("Yes", 0.7), ("No", 0.3)];
const DEPENDENTS: [(&str, f64); 4] = [("0", 0.4), ("1", 0.3), ("2", 0.2), ("3+", 0.1)];
const EDUCATION: [(&str, f64); 2] = [("Graduate", 0.75), ("Not Graduate", 0.25)];
const SELF_EMPLOYED: [(&str, f64); 2] = [("Yes", 0.15), ("No", 0.85)];
const PROPERTY_AREA: [(&str, f64); 3] = [("Urban", 0.4), ("Semiurban", 0.4), ("Rural", 0.2)];
const LOAN_TERM: [(u32, f64); 4] = [(6, 0.25), (12, 0.35), (24, 0.25), (48, 0.15)];
const CREDIT_HISTORY: [(u8, f64); 2] = [(0, 0.15), (1, 0.85)];

/// Generator for the reference loan table
#[derive(Debug, Clone)]
pub struct SyntheticLoanGenerator {
    n_samples: usize,
    seed: u64,
}

impl SyntheticLoanGenerator {
    pub fn new(n_samples: usize) -> Self {
        Self { n_samples, seed: 42 }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Generate the table. The same seed always yields the same rows.
    pub fn generate(&self) -> Result<Vec<LoanRecord>> {
        let samplers = Samplers::new()?;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        Ok((0..self.n_samples)
            .map(|_| samplers.sample_record(&mut rng))
            .collect())
    }
}

/// Per-column distributions, built once per table
struct Samplers {
    gender: WeightedIndex<f64>,
    married: WeightedIndex<f64>,
    dependents: WeightedIndex<f64>,
    education: WeightedIndex<f64>,
    self_employed: WeightedIndex<f64>,
    property_area: WeightedIndex<f64>,
    loan_amount_term: WeightedIndex<f64>,
    credit_history: WeightedIndex<f64>,
    applicant_income: LogNormal<f64>,
    coapplicant_income: LogNormal<f64>,
    loan_amount: LogNormal<f64>,
}

impl Samplers {
    fn new() -> Result<Self> {
        Ok(Self {
            gender: weighted(&GENDER)?,
            married: weighted(&MARRIED)?,
            dependents: weighted(&DEPENDENTS)?,
            education: weighted(&EDUCATION)?,
            self_employed: weighted(&SELF_EMPLOYED)?,
            property_area: weighted(&PROPERTY_AREA)?,
            loan_amount_term: weighted(&LOAN_TERM)?,
            credit_history: weighted(&CREDIT_HISTORY)?,
            applicant_income: log_normal(10.0, 0.8)?,
            coapplicant_income: log_normal(8.0, 1.2)?,
            loan_amount: log_normal(5.0, 0.6)?,
        })
    }

    fn sample_record(&self, rng: &mut ChaCha8Rng) -> LoanRecord {
        let gender = GENDER[self.gender.sample(rng)].0;
        let married = MARRIED[self.married.sample(rng)].0;
        let dependents = DEPENDENTS[self.dependents.sample(rng)].0;
        let education = EDUCATION[self.education.sample(rng)].0;
        let self_employed = SELF_EMPLOYED[self.self_employed.sample(rng)].0;
        let property_area = PROPERTY_AREA[self.property_area.sample(rng)].0;

        let applicant_income = self.applicant_income.sample(rng);
        let coapplicant_draw = self.coapplicant_income.sample(rng);
        let coapplicant_income = if married == "Yes" { coapplicant_draw } else { 0.0 };
        let loan_amount = self.loan_amount.sample(rng);
        let loan_amount_term = LOAN_TERM[self.loan_amount_term.sample(rng)].0;
        let credit_history = CREDIT_HISTORY[self.credit_history.sample(rng)].0;

        // log-normal incomes are strictly positive
        let ratio = loan_amount / (applicant_income + coapplicant_income);
        let noise: f64 = rng.sample::<f64, _>(StandardNormal) * 0.1;
        let score = 0.3 * f64::from(credit_history)
            + 0.25 * indicator(education == "Graduate")
            + 0.2 * indicator(ratio < 0.3)
            + 0.15 * indicator(applicant_income > 5000.0)
            + 0.1 * indicator(property_area == "Urban")
            + noise;
        let status = if score > 0.5 {
            LoanStatus::Approved
        } else {
            LoanStatus::NotApproved
        };

        LoanRecord {
            gender: Some(gender.to_string()),
            married: Some(married.to_string()),
            dependents: Some(dependents.to_string()),
            education: Some(education.to_string()),
            self_employed: Some(self_employed.to_string()),
            applicant_income: Some(applicant_income),
            coapplicant_income: Some(coapplicant_income),
            loan_amount: Some(loan_amount),
            loan_amount_term: Some(loan_amount_term),
            credit_history: Some(credit_history),
            property_area: Some(property_area.to_string()),
            loan_status: Some(status),
        }
    }
}

fn weighted<T>(table: &[(T, f64)]) -> Result<WeightedIndex<f64>> {
    WeightedIndex::new(table.iter().map(|(_, w)| *w))
        .map_err(|e| LoanError::DataError(e.to_string()))
}

fn log_normal(mu: f64, sigma: f64) -> Result<LogNormal<f64>> {
    LogNormal::new(mu, sigma).map_err(|e| LoanError::DataError(e.to_string()))
}

fn indicator(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}
