pub mod integrated;

pub use integrated::{
    FactorBreakdown, IntegratedSizeResult, IntegratedSizer, SizingInput, SizingInputs,
};
