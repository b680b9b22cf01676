//! Schemas compiled into the binary for the bundled bindings.

use iso20022_schema::{SchemaAggregator, ValidationPolicy};

pub const PACS_008_SCHEMA: &str = include_str!("../../../schemas/iso20022/pacs.008.001.10.xsd");
pub const PACS_002_SCHEMA: &str = include_str!("../../../schemas/iso20022/pacs.002.001.12.xsd");

/// Resource name and definition text of every bundled schema.
pub const BUNDLED_SCHEMAS: &[(&str, &str)] = &[
    ("pacs.008.001.10.xsd", PACS_008_SCHEMA),
    ("pacs.002.001.12.xsd", PACS_002_SCHEMA),
];

/// An aggregate holding every bundled schema, gated by `policy`.
///
/// The bundled definitions are fixed at build time; a load failure here is
/// logged by the aggregator and leaves the aggregate without that schema.
pub fn bundled_aggregator(policy: ValidationPolicy) -> SchemaAggregator {
    let mut aggregator = SchemaAggregator::with_policy(policy);
    if !aggregator.add_resources(BUNDLED_SCHEMAS, &[]) {
        tracing::error!("bundled schemas did not all load");
    }
    aggregator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_bundled_schema_loads() {
        let aggregator = bundled_aggregator(ValidationPolicy::default());
        assert_eq!(aggregator.definitions().len(), BUNDLED_SCHEMAS.len());
        assert!(aggregator.target_namespaces().contains(&Some(crate::pacs008::NAMESPACE)));
        assert!(aggregator.target_namespaces().contains(&Some(crate::pacs002::NAMESPACE)));
    }
}
