use thiserror::Error;

pub type BomResult<T> = Result<T, BomError>;

#[derive(Error, Debug)]
pub enum BomError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Negative value for {what}: {value}")]
    Negative { what: &'static str, value: f64 },
}
