mod processor;
pub(crate) mod types;

pub use processor::{CatalogProcessor, CatalogReport, CriticalityDistribution, ProcessedCatalog};
pub use types::{Criticality, PatternClass, RawRule, Rule, RuleType};
