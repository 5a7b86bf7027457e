mod csv;
mod types;
mod validator;

pub use csv::CsvConnector;
pub use types::BarColumn;
pub use validator::DataValidator;
