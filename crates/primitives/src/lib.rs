#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/jtmom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod date;
pub use date::{
    Date, from_epoch_days, month_end, next_month_begin, parse_date, shift_month_end,
    to_epoch_days, yyyymm_to_month_end,
};

mod security;
pub use security::{ExchangeCode, SecurityId};

mod panel;
pub use panel::{Panel, SecurityMonthRecord};

mod formation;
pub use formation::{FormationRecord, FormationSet, MembershipDiagnostics, RankMembership};

mod holding;
pub use holding::{HoldingRecord, HoldingSet};

mod series;
pub use series::{PortfolioColumn, PortfolioRow, PortfolioSeries};

pub mod frame;

/// Canonical column names shared by the frame conversions.
pub mod columns {
    /// Security identifier.
    pub const SECURITY_ID: &str = "security_id";
    /// Month-end date of a panel record, or realized month of a holding record.
    pub const DATE: &str = "date";
    /// Monthly return.
    pub const RET: &str = "ret";
    /// Price (absolute value after cleaning).
    pub const PRICE: &str = "price";
    /// Shares outstanding, in thousands.
    pub const SHARES: &str = "shares_outstanding";
    /// Exchange code.
    pub const EXCHANGE: &str = "exchange_code";
    /// Share code (used only by the universe filter).
    pub const SHARE_CODE: &str = "share_code";
    /// Market value in millions.
    pub const MARKET_VALUE: &str = "market_value";
    /// Dense calendar-month index.
    pub const MONTH_INDEX: &str = "month_index";
    /// Formation month.
    pub const FORMATION_DATE: &str = "formation_date";
    /// Portfolio rank.
    pub const RANK: &str = "rank";
    /// Cumulative formation-period return.
    pub const PAST_RETURN: &str = "past_return";
    /// First day of the holding window.
    pub const HOLD_START: &str = "hold_start";
    /// Last day of the holding window.
    pub const HOLD_END: &str = "hold_end";
    /// Within-portfolio weight.
    pub const WEIGHT: &str = "weight";
    /// Realized return times formation weight.
    pub const WEIGHTED_RETURN: &str = "weighted_return";
    /// Long-short spread.
    pub const MOM: &str = "mom";
}
