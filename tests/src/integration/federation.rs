//! # Federation
//!
//! Trees linking to other trees: peers of every reachable tree are served,
//! links are followed without recursion, and unreferenced trees are
//! garbage collected.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use dns_discovery::test_utils::{make_node_id, publish_tree};
    use dns_discovery::{Client, DiscoveryConfig, NodeId, RandomIterator};

    use crate::support::{link_to, Network};

    const A: &str = "a.nodes.example.org";
    const B: &str = "b.nodes.example.org";
    const C: &str = "c.nodes.example.org";

    fn ids(values: &[u8]) -> HashSet<NodeId> {
        values.iter().map(|&v| make_node_id(v)).collect()
    }

    fn drain(iterator: &RandomIterator, rounds: usize) -> HashSet<NodeId> {
        (0..rounds)
            .filter_map(|_| iterator.next_node())
            .map(|node| node.id)
            .collect()
    }

    // =========================================================================
    // TEST GROUP 1: Linked Trees
    // =========================================================================

    #[test]
    fn test_linked_tree_peers_are_discovered() {
        let net = Network::for_testing();
        let url_b = publish_tree(&net.resolver, B, 2, 1, &[4, 5], &[]);
        let url_a = publish_tree(&net.resolver, A, 1, 1, &[1, 2, 3], &[link_to(2, B)]);

        let iterator = net.client.new_iterator();
        iterator.add_tree(&url_a).unwrap();

        let seen = drain(&iterator, 400);
        assert_eq!(seen, ids(&[1, 2, 3, 4, 5]));
        assert!(iterator.tree(&url_b).is_some());
        assert_eq!(iterator.link_cache().parents(&url_b), vec![url_a]);
    }

    #[test]
    fn test_chain_of_links_is_followed() {
        let net = Network::for_testing();
        publish_tree(&net.resolver, C, 3, 1, &[30], &[]);
        publish_tree(&net.resolver, B, 2, 1, &[20], &[link_to(3, C)]);
        let url_a = publish_tree(&net.resolver, A, 1, 1, &[10], &[link_to(2, B)]);

        let iterator = net.client.new_iterator();
        iterator.add_tree(&url_a).unwrap();

        assert_eq!(drain(&iterator, 400), ids(&[10, 20, 30]));
        assert_eq!(iterator.tree_count(), 3);
    }

    #[test]
    fn test_mutual_links_do_not_recurse() {
        let net = Network::for_testing();
        let url_a = publish_tree(&net.resolver, A, 1, 1, &[1], &[link_to(2, B)]);
        publish_tree(&net.resolver, B, 2, 1, &[2], &[link_to(1, A)]);

        let iterator = net.client.new_iterator();
        iterator.add_tree(&url_a).unwrap();

        assert_eq!(drain(&iterator, 200), ids(&[1, 2]));
        assert_eq!(iterator.tree_count(), 2);
    }

    #[test]
    fn test_several_bootstrap_trees() {
        let net = Network::for_testing();
        let url_a = publish_tree(&net.resolver, A, 1, 1, &[1], &[]);
        let url_b = publish_tree(&net.resolver, B, 2, 1, &[2], &[]);

        let iterator = net.client.new_iterator();
        iterator.add_tree(&url_a).unwrap();
        iterator.add_tree(&url_b).unwrap();

        assert_eq!(drain(&iterator, 200), ids(&[1, 2]));
    }

    #[test]
    fn test_small_tree_is_not_starved() {
        let net = Network::for_testing();
        let big: Vec<u8> = (1..=100).collect();
        let url_big = publish_tree(&net.resolver, A, 1, 1, &big, &[]);
        let url_small = publish_tree(&net.resolver, B, 2, 1, &[200], &[]);

        let iterator = net.client.new_iterator();
        iterator.add_tree(&url_big).unwrap();
        iterator.add_tree(&url_small).unwrap();

        let small_hits = (0..400)
            .filter_map(|_| iterator.next_node())
            .filter(|node| node.id == make_node_id(200))
            .count();
        // Uniform tree choice: about half of all peers come from the small tree
        assert!(small_hits > 100, "small tree served {small_hits} of 400");
    }

    // =========================================================================
    // TEST GROUP 2: Garbage Collection
    // =========================================================================

    #[test]
    fn test_unlinked_tree_is_evicted_after_republish() {
        let net = Network::for_testing();
        let url_b = publish_tree(&net.resolver, B, 2, 1, &[4], &[]);
        let url_a = publish_tree(&net.resolver, A, 1, 1, &[1], &[link_to(2, B)]);

        let iterator = net.client.new_iterator();
        iterator.add_tree(&url_a).unwrap();
        drain(&iterator, 100);
        assert!(iterator.tree(&url_b).is_some());

        // A drops its link to B
        publish_tree(&net.resolver, A, 1, 2, &[1], &[]);
        net.clock
            .advance(DiscoveryConfig::for_testing().root_validity_secs);
        drain(&iterator, 100);

        assert!(!iterator.link_cache().is_referenced(&url_b));
        assert!(iterator.tree(&url_b).is_none());
        assert_eq!(drain(&iterator, 50), ids(&[1]));
    }

    #[test]
    fn test_tree_linked_twice_survives_one_removal() {
        let net = Network::for_testing();
        let url_c = publish_tree(&net.resolver, C, 3, 1, &[3], &[]);
        let url_a = publish_tree(&net.resolver, A, 1, 1, &[1], &[link_to(3, C)]);
        let url_b = publish_tree(&net.resolver, B, 2, 1, &[2], &[link_to(3, C)]);

        let iterator = net.client.new_iterator();
        iterator.add_tree(&url_a).unwrap();
        iterator.add_tree(&url_b).unwrap();
        drain(&iterator, 200);
        assert_eq!(iterator.link_cache().parents(&url_c).len(), 2);

        iterator.remove_tree(&url_a).unwrap();
        iterator.rebuild_trees();
        assert!(iterator.tree(&url_a).is_none());
        assert!(iterator.tree(&url_c).is_some());
        // Only B's link is left holding C
        assert_eq!(iterator.link_cache().parents(&url_c), vec![url_b]);
        assert_eq!(drain(&iterator, 200), ids(&[2, 3]));
    }

    #[test]
    fn test_removed_bootstrap_tree_releases_its_links() {
        let net = Network::for_testing();
        let url_c = publish_tree(&net.resolver, C, 3, 1, &[30], &[]);
        let url_b = publish_tree(&net.resolver, B, 2, 1, &[20], &[link_to(3, C)]);
        let url_a = publish_tree(&net.resolver, A, 1, 1, &[10], &[link_to(2, B)]);
        let url_d = publish_tree(&net.resolver, "d.nodes.example.org", 4, 1, &[40], &[]);

        let iterator = net.client.new_iterator();
        iterator.add_tree(&url_a).unwrap();
        iterator.add_tree(&url_d).unwrap();
        drain(&iterator, 400);
        assert_eq!(iterator.tree_count(), 4);

        iterator.remove_tree(&url_a).unwrap();
        iterator.rebuild_trees();

        for url in [&url_a, &url_b, &url_c] {
            assert!(!iterator.link_cache().is_referenced(url));
            assert!(iterator.tree(url).is_none());
        }
        assert_eq!(drain(&iterator, 50), ids(&[40]));
    }

    #[test]
    fn test_full_sync_matches_random_discovery() {
        let net = Network::for_testing();
        let nodes: Vec<u8> = (1..=40).collect();
        let url = publish_tree(&net.resolver, A, 1, 1, &nodes, &[]);

        let snapshot = net.client.sync_tree(&url).unwrap();
        let synced: HashSet<NodeId> = snapshot.dns_nodes().into_iter().map(|n| n.id).collect();

        let client = std::sync::Arc::new(Client::new(
            net.resolver.clone(),
            DiscoveryConfig::for_testing(),
        ));
        let iterator = client.new_iterator();
        iterator.add_tree(&url).unwrap();
        let discovered = drain(&iterator, 2_000);

        assert_eq!(synced, ids(&nodes));
        assert!(discovered.is_subset(&synced));
        assert!(discovered.len() > 30);
    }
}
