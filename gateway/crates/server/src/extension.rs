use std::sync::Arc;

use gateway_config::{RandomItemConfig, RANDOM_ITEM_FIELD};
use gateway_engine::{RandomItemQueries, RandomItemResolver, SharedResolver};
use schema_composition::{ExtensionError, ResolverMap, SchemaExtension};
use upstream_client::UpstreamClient;

/// The fields the gateway adds to the upstream schema.
pub const RANDOM_ITEM_EXTENSION: &str = r"
extend type Query {
  randomItem: Item
}
";

pub(crate) fn schema_extension() -> Result<SchemaExtension, ExtensionError> {
    SchemaExtension::parse(RANDOM_ITEM_EXTENSION)
}

/// Binds every field of [`RANDOM_ITEM_EXTENSION`] to its resolver.
pub(crate) fn resolvers(client: Arc<dyn UpstreamClient>, config: &RandomItemConfig) -> ResolverMap<SharedResolver> {
    let queries = RandomItemQueries {
        list_field: config.list_field.clone(),
        count_field: config.count_field.clone(),
        item_field: config.item_field.clone(),
        id_argument: config.id_argument.clone(),
    };

    let random_item: SharedResolver = Arc::new(RandomItemResolver::new(client, queries));

    ResolverMap::from([(RANDOM_ITEM_FIELD.to_owned(), random_item)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_extension_declares_random_item() {
        let extension = schema_extension().unwrap();

        assert_eq!("Query", extension.target());
        assert_eq!(
            vec![RANDOM_ITEM_FIELD],
            extension.fields().iter().map(|field| field.name.as_str()).collect::<Vec<_>>()
        );
        assert_eq!("Item", extension.fields()[0].ty.to_string());
    }
}
