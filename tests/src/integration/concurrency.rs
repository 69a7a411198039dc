//! # Concurrency
//!
//! One session shared by several consumer threads.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use dns_discovery::test_utils::{make_node_id, publish_tree};
    use dns_discovery::{DiscoveryConfig, NodeId};

    use crate::support::{link_to, Network};

    const A: &str = "a.nodes.example.org";
    const B: &str = "b.nodes.example.org";

    #[test]
    fn test_shared_iterator_across_threads() {
        let net = Network::new(DiscoveryConfig::for_testing().with_random_retry_times(32));
        let nodes: Vec<u8> = (1..=30).collect();
        let url_b = publish_tree(&net.resolver, B, 2, 1, &[100, 101], &[]);
        let url_a = publish_tree(&net.resolver, A, 1, 1, &nodes, &[link_to(2, B)]);

        let iterator = Arc::new(net.client.new_iterator());
        iterator.add_tree(&url_a).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let iterator = Arc::clone(&iterator);
                thread::spawn(move || {
                    (0..50)
                        .filter_map(|_| iterator.next_node())
                        .map(|node| node.id)
                        .collect::<Vec<NodeId>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        let mut total = 0;
        for handle in handles {
            let ids = handle.join().unwrap();
            total += ids.len();
            seen.extend(ids);
        }

        let mut known: HashSet<NodeId> = nodes.iter().map(|&v| make_node_id(v)).collect();
        known.extend([make_node_id(100), make_node_id(101)]);
        assert_eq!(total, 400);
        assert!(seen.is_subset(&known));
        assert!(iterator.tree(&url_b).is_some());
    }

    #[test]
    fn test_add_tree_while_iterating() {
        let net = Network::new(DiscoveryConfig::for_testing().with_random_retry_times(32));
        let url_a = publish_tree(&net.resolver, A, 1, 1, &[1], &[]);
        let url_b = publish_tree(&net.resolver, B, 2, 1, &[2], &[]);

        let iterator = Arc::new(net.client.new_iterator());
        iterator.add_tree(&url_a).unwrap();

        let consumer = {
            let iterator = Arc::clone(&iterator);
            thread::spawn(move || {
                (0..300)
                    .filter_map(|_| iterator.next_node())
                    .map(|node| node.id)
                    .collect::<HashSet<NodeId>>()
            })
        };
        iterator.add_tree(&url_b).unwrap();
        let mut seen = consumer.join().unwrap();
        seen.extend((0..100).filter_map(|_| iterator.next_node()).map(|n| n.id));

        assert!(seen.contains(&make_node_id(1)));
        assert!(seen.contains(&make_node_id(2)));
        assert_eq!(iterator.tree_count(), 2);
    }

    #[test]
    fn test_close_from_another_thread() {
        let net = Network::for_testing();
        let url = publish_tree(&net.resolver, A, 1, 1, &[1], &[]);
        let iterator = Arc::new(net.client.new_iterator());
        iterator.add_tree(&url).unwrap();
        assert!(iterator.next_node().is_some());

        let closer = {
            let iterator = Arc::clone(&iterator);
            thread::spawn(move || iterator.close())
        };
        closer.join().unwrap();

        assert!(iterator.is_closed());
        assert!(iterator.next_node().is_none());
        assert_eq!(iterator.tree_count(), 0);
    }
}
