//! # Configuration
//!
//! Sessions bootstrapped from a TOML config file instead of hand-added URLs.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use dns_discovery::adapters::{MemoryResolver, TomlConfigProvider};
    use dns_discovery::test_utils::{make_node_id, publish_tree};
    use dns_discovery::{Client, ConfigProvider, NodeId};

    use crate::support::init_logging;

    const A: &str = "a.nodes.example.org";
    const B: &str = "b.nodes.example.org";

    #[test]
    fn test_session_from_toml_discovers_peers() {
        init_logging();
        let resolver = Arc::new(MemoryResolver::new());
        let url_a = publish_tree(&resolver, A, 1, 1, &[1, 2], &[]);
        let url_b = publish_tree(&resolver, B, 2, 1, &[3], &[]);
        let content = format!(
            r#"
            [dns]
            tree_urls = ["{url_a}", "tree://broken", "{url_b}"]

            [dns.sync]
            random_retry_times = 16
            "#
        );
        let provider = TomlConfigProvider::parse(&content).unwrap();
        assert_eq!(provider.get_tree_urls().len(), 2);

        let client = Arc::new(Client::from_provider(resolver, &provider));
        assert_eq!(client.config().random_retry_times, 16);
        assert_eq!(client.config().root_validity_secs, 1800);

        let iterator = client.new_iterator();
        assert_eq!(iterator.add_trees_from(&provider), 2);

        let seen: HashSet<NodeId> = (0..200)
            .filter_map(|_| iterator.next_node())
            .map(|node| node.id)
            .collect();
        let expected: HashSet<NodeId> = [1, 2, 3].into_iter().map(make_node_id).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_empty_config_yields_nothing() {
        let resolver = Arc::new(MemoryResolver::new());
        let provider = TomlConfigProvider::parse("").unwrap();
        let client = Arc::new(Client::from_provider(resolver.clone(), &provider));
        let iterator = client.new_iterator();

        assert_eq!(iterator.add_trees_from(&provider), 0);
        assert!(iterator.next_node().is_none());
        assert_eq!(resolver.lookup_count(), 0);
    }
}
