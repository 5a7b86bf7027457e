/// Columns of a bar file, with the spellings accepted for each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarColumn {
    Timestamp,
    Open,
    High,
    Low,
    Close,
    Signal,
    Volatility,
    Volume,
    RegimeWeight,
    Toxicity,
}

impl BarColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Signal => "signal",
            Self::Volatility => "volatility",
            Self::Volume => "volume",
            Self::RegimeWeight => "regime_weight",
            Self::Toxicity => "toxicity",
        }
    }

    /// Columns every bar file must carry.
    pub fn required() -> Vec<Self> {
        vec![Self::Open, Self::High, Self::Low, Self::Close, Self::Signal]
    }

    pub fn optional() -> Vec<Self> {
        vec![
            Self::Timestamp,
            Self::Volatility,
            Self::Volume,
            Self::RegimeWeight,
            Self::Toxicity,
        ]
    }

    /// Common alternative column names
    pub fn aliases(&self) -> Vec<&'static str> {
        match self {
            Self::Timestamp => vec!["timestamp", "Timestamp", "time", "datetime", "date"],
            Self::Open => vec!["open", "Open", "OPEN", "o"],
            Self::High => vec!["high", "High", "HIGH", "h"],
            Self::Low => vec!["low", "Low", "LOW", "l"],
            Self::Close => vec!["close", "Close", "CLOSE", "c"],
            Self::Signal => vec!["signal", "Signal", "SIGNAL", "side", "direction"],
            Self::Volatility => vec!["volatility", "Volatility", "vol_estimate", "atr", "ATR"],
            Self::Volume => vec!["volume", "Volume", "VOLUME", "vol", "Vol", "v"],
            Self::RegimeWeight => vec!["regime_weight", "regime", "RegimeWeight"],
            Self::Toxicity => vec!["toxicity", "vpin", "Toxicity", "VPIN"],
        }
    }
}
