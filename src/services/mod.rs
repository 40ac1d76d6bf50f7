// src/services/mod.rs

//! Engine services: fees, funding, active-share valuation and close settlement.

pub mod fees;
pub mod funding;
pub mod settlement;
pub mod valuation;

pub use fees::{BasicFeesService, FeesService};
pub use funding::{BasicFundingService, FundingEvent, FundingService, FundingSettlement};
pub use settlement::{settle_close, CloseOutcome, CloseSettlement};
pub use valuation::{BasicValuationService, ValuationService};

use crate::risk::EngineCfg;

pub trait ServicesBundle {
    type Fees: FeesService;
    type Funding: FundingService;
    type Valuation: ValuationService;

    fn fees(&self) -> &Self::Fees;
    fn funding(&self) -> &Self::Funding;
    fn valuation(&self) -> &Self::Valuation;
}

#[derive(Clone, Debug)]
pub struct BasicServicesBundle {
    pub fees: BasicFeesService,
    pub funding: BasicFundingService,
    pub valuation: BasicValuationService,
}

impl BasicServicesBundle {
    pub fn from_cfg(cfg: &EngineCfg) -> Self {
        Self {
            fees: BasicFeesService::from_cfg(cfg),
            funding: BasicFundingService::from_cfg(cfg),
            valuation: BasicValuationService::from_cfg(cfg),
        }
    }
}

impl Default for BasicServicesBundle {
    fn default() -> Self {
        Self::from_cfg(&EngineCfg::default())
    }
}

impl ServicesBundle for BasicServicesBundle {
    type Fees = BasicFeesService;
    type Funding = BasicFundingService;
    type Valuation = BasicValuationService;

    fn fees(&self) -> &Self::Fees {
        &self.fees
    }
    fn funding(&self) -> &Self::Funding {
        &self.funding
    }
    fn valuation(&self) -> &Self::Valuation {
        &self.valuation
    }
}
