//! # Resilience
//!
//! Hostile or broken upstreams never surface as errors: they only make
//! `next_node` come back empty, within the configured attempt bound.

#[cfg(test)]
mod tests {
    use dns_discovery::test_utils::{build_tree, make_node, make_node_id, publish_tree};
    use dns_discovery::{DiscoveryConfig, SyncState, TreeEntry};

    use crate::support::{link_to, Network};

    const A: &str = "a.nodes.example.org";
    const B: &str = "b.nodes.example.org";

    // =========================================================================
    // TEST GROUP 1: Resolver Outage
    // =========================================================================

    #[test]
    fn test_total_outage_is_bounded() {
        let config = DiscoveryConfig::for_testing().with_random_retry_times(10);
        let net = Network::new(config);
        let url = publish_tree(&net.resolver, A, 1, 1, &[1], &[]);
        net.resolver.set_offline(true);

        let iterator = net.client.new_iterator();
        iterator.add_tree(&url).unwrap();

        for _ in 0..3 {
            net.resolver.reset_lookup_count();
            assert!(iterator.next_node().is_none());
            assert_eq!(net.resolver.lookup_count(), 10);
        }
    }

    #[test]
    fn test_recovery_after_outage() {
        let net = Network::for_testing();
        let url = publish_tree(&net.resolver, A, 1, 1, &[1], &[]);
        net.resolver.set_offline(true);

        let iterator = net.client.new_iterator();
        iterator.add_tree(&url).unwrap();
        assert!(iterator.next_node().is_none());
        assert_eq!(iterator.tree(&url).unwrap().state(), SyncState::Fresh);

        net.resolver.set_offline(false);
        assert_eq!(iterator.next_node().unwrap().id, make_node_id(1));
    }

    #[test]
    fn test_missing_tree_yields_nothing() {
        let net = Network::for_testing();
        let iterator = net.client.new_iterator();
        iterator.add_tree(&link_to(1, A).to_string()).unwrap();

        assert!(iterator.next_node().is_none());
        assert_eq!(iterator.tree_count(), 1);
    }

    // =========================================================================
    // TEST GROUP 2: Hostile Records
    // =========================================================================

    #[test]
    fn test_forged_root_never_serves_peers() {
        let net = Network::for_testing();
        // Published by key 2 under a URL naming key 1
        net.resolver.publish(A, &build_tree(2, 1, &[1, 2, 3], &[]));
        let url = link_to(1, A).to_string();

        let iterator = net.client.new_iterator();
        iterator.add_tree(&url).unwrap();
        for _ in 0..5 {
            assert!(iterator.next_node().is_none());
        }

        let tree = iterator.tree(&url).unwrap();
        assert_eq!(tree.state(), SyncState::Fresh);
        assert!(tree.signature_failures() >= 5);
    }

    #[test]
    fn test_forged_tree_does_not_block_honest_tree() {
        let net = Network::new(DiscoveryConfig::for_testing().with_random_retry_times(64));
        net.resolver.publish(A, &build_tree(9, 1, &[1], &[]));
        let url_b = publish_tree(&net.resolver, B, 2, 1, &[2], &[]);

        let iterator = net.client.new_iterator();
        iterator.add_tree(&link_to(1, A).to_string()).unwrap();
        iterator.add_tree(&url_b).unwrap();

        for _ in 0..20 {
            assert_eq!(iterator.next_node().unwrap().id, make_node_id(2));
        }
    }

    #[test]
    fn test_tampered_leaf_is_never_served() {
        let net = Network::new(DiscoveryConfig::for_testing().with_random_retry_times(64));
        let tree = build_tree(1, 1, &[1, 2], &[]);
        net.resolver.publish(A, &tree);
        let (hash, _) = tree
            .entries()
            .iter()
            .find(|(_, entry)| **entry == TreeEntry::Node(make_node(1)))
            .unwrap();
        net.resolver.insert(
            &hash.subdomain(A),
            TreeEntry::Node(make_node(66)).to_string(),
        );

        let iterator = net.client.new_iterator();
        iterator.add_tree(&tree.link(A).to_string()).unwrap();
        for _ in 0..50 {
            let node = iterator.next_node().unwrap();
            assert_eq!(node.id, make_node_id(2));
        }
    }

    #[test]
    fn test_rolled_back_root_keeps_serving_newer_tree() {
        let net = Network::for_testing();
        let url = publish_tree(&net.resolver, A, 1, 5, &[5], &[]);
        let iterator = net.client.new_iterator();
        iterator.add_tree(&url).unwrap();
        assert_eq!(iterator.next_node().unwrap().id, make_node_id(5));

        // Replay of an older root
        publish_tree(&net.resolver, A, 1, 3, &[3], &[]);
        net.clock
            .advance(DiscoveryConfig::for_testing().root_validity_secs);
        for _ in 0..10 {
            assert_eq!(iterator.next_node().unwrap().id, make_node_id(5));
        }
        assert_eq!(iterator.tree(&url).unwrap().root().unwrap().seq, 5);
    }

    #[test]
    fn test_malformed_backref_is_skipped_on_rebuild() {
        let net = Network::for_testing();
        let url = publish_tree(&net.resolver, A, 1, 1, &[1], &[]);
        let iterator = net.client.new_iterator();
        iterator.add_tree(&url).unwrap();
        iterator.rebuild_trees();
        iterator.link_cache().add_link(&url, "tree://garbage@nowhere");

        iterator.rebuild_trees();
        assert_eq!(iterator.tree_count(), 1);
        assert!(iterator.next_node().is_some());
    }
}
