pub mod config;
pub mod liquidation;
pub mod validation;

pub use config::EngineCfg;
pub use liquidation::LiquidationPreview;
