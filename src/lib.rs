//! Sales-operations reporting core for the "Carteira de Vendas" ledger.
//!
//! The pipeline is a chain of pure passes over one normalized table:
//!
//! - [`loader`] ingests the workbook (or a CSV export), coerces
//!   locale-formatted cells and derives calendar and cost fields;
//! - [`filter`] applies an explicit [`filter::FilterSet`] as a conjunction
//!   of predicates;
//! - [`aggregate`], [`profit`], [`rfm`] and [`pareto`] compute the ranked
//!   tables, profitability metrics, customer segmentation and ABC
//!   concentration classes;
//! - [`dashboard::compute_dashboard`] ties them together into one result
//!   the presentation layer can bind to;
//! - [`output`] renders tables and writes report/export files.
//!
//! Missing columns disable features, unparseable cells become absent
//! values, and undefined ratios surface as explicit "n/a" — only a source
//! that cannot be opened at all is fatal.

pub mod aggregate;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod loader;
pub mod output;
pub mod pareto;
pub mod profit;
pub mod rfm;
pub mod types;
pub mod util;

pub use dashboard::{compute_dashboard, Dashboard};
pub use error::{LoadError, Result};
pub use filter::FilterSet;
pub use loader::{load_ledger, Ledger, LoaderConfig};
pub use types::{ColumnCapabilities, OrderLine};
