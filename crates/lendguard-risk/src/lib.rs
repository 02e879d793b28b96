//! lendguard-risk: position risk estimation for a two-asset lending pool
//!
//! pure functions over raw on-chain position data. nothing here performs
//! I/O; callers gather positions, token decimals and a collateral factor
//! and get back display values.
//!
//! ## pricing
//!
//! valuation goes through a [`PriceSource`]. the default [`UnitPrice`]
//! values every token at exactly 1, which is the simplification the pool
//! front-end has always used (there is no price oracle). plug in
//! [`FixedPrices`] or your own source to value tokens differently.
//!
//! ## usage
//!
//! ```rust,ignore
//! let factor = CollateralFactor::from_percent(U256::from(75))?;
//! let summary = aggregate_risk(&positions, &decimals, factor);
//! match summary.health_factor {
//!     HealthFactor::Safe => println!("no debt"),
//!     HealthFactor::Ratio(hf) => println!("hf {hf}"),
//!     HealthFactor::Unknown => println!("could not value position"),
//! }
//! ```

pub mod error;
pub mod estimator;
pub mod factor;
pub mod position;
pub mod price;
pub mod token;
pub mod units;

pub use error::*;
pub use estimator::*;
pub use factor::*;
pub use position::*;
pub use price::*;
pub use token::*;
pub use units::*;
