use std::error::Error;

use flowdag::{GraphBuilder, GraphError, INIT_NODE_ID};
use flowdag_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn diamond() -> GraphBuilder<()> {
    GraphBuilder::new()
        .node("D", ())
        .node("B", ())
        .node("C", ())
        .node("A", ())
        .edge("A", "B", "rA")
        .edge("A", "C", "rA")
        .edge("B", "D", "rB")
        .edge("C", "D", "rC")
}

#[test]
fn sort_places_producers_before_consumers() -> TestResult {
    init_tracing();
    let graph = diamond().build()?;

    let pos = |id: &str| {
        graph
            .sorted_nodes()
            .iter()
            .position(|n| n.id() == id)
            .expect("node missing from sort")
    };

    for node in graph.sorted_nodes() {
        for edge in graph.incoming(node.id()) {
            assert!(
                pos(&edge.from) < pos(&edge.to),
                "edge {} -> {} out of order",
                edge.from,
                edge.to
            );
        }
    }

    assert_eq!(graph.start_nodes(), ["A".to_string()]);
    assert_eq!(graph.end_nodes(), ["D".to_string()]);
    Ok(())
}

#[test]
fn full_cycle_is_rejected_with_all_members() {
    init_tracing();
    let err = GraphBuilder::new()
        .node("A", ())
        .node("B", ())
        .node("C", ())
        .edge("A", "B", "rA")
        .edge("B", "C", "rB")
        .edge("C", "A", "rC")
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        GraphError::CycleDetected {
            remaining: vec!["A".into(), "B".into(), "C".into()],
        }
    );
}

#[test]
fn partial_cycle_reports_only_unsortable_nodes() {
    let err = GraphBuilder::new()
        .node("A", ())
        .node("B", ())
        .node("C", ())
        .node("D", ())
        .edge("A", "B", "rA")
        .edge("C", "D", "rC")
        .edge("D", "C", "rD")
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        GraphError::CycleDetected {
            remaining: vec!["C".into(), "D".into()],
        }
    );
}

#[test]
fn self_dependency_is_a_cycle() {
    let err = GraphBuilder::new()
        .node("A", ())
        .edge("A", "A", "r")
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        GraphError::CycleDetected {
            remaining: vec!["A".into()],
        }
    );
}

#[test]
fn duplicate_edge_triples_are_rejected() {
    let err = GraphBuilder::new()
        .node("A", ())
        .node("B", ())
        .edge("A", "B", "r")
        .edge("A", "B", "r")
        .build()
        .unwrap_err();

    assert!(matches!(err, GraphError::DuplicateEdge { .. }));
}

#[test]
fn same_endpoints_with_distinct_results_are_allowed() -> TestResult {
    let graph = GraphBuilder::new()
        .node("A", ())
        .node("B", ())
        .edge("A", "B", "left")
        .edge("A", "B", "right")
        .build()?;

    assert_eq!(graph.incoming("B").len(), 2);
    Ok(())
}

#[test]
fn edges_to_unknown_nodes_are_rejected() {
    let err = GraphBuilder::new()
        .node("A", ())
        .edge("A", "ghost", "r")
        .build()
        .unwrap_err();

    assert!(matches!(err, GraphError::UnknownNode { unknown, .. } if unknown == "ghost"));
}

#[test]
fn empty_and_reserved_node_ids_are_rejected() {
    let err = GraphBuilder::new().node("", ()).build().unwrap_err();
    assert_eq!(err, GraphError::EmptyNodeId);

    let err = GraphBuilder::new()
        .node(INIT_NODE_ID, ())
        .build()
        .unwrap_err();
    assert!(matches!(err, GraphError::ReservedNodeId(_)));

    let err = GraphBuilder::new()
        .node("A", ())
        .node("A", ())
        .build()
        .unwrap_err();
    assert_eq!(err, GraphError::DuplicateNode("A".into()));
}

#[test]
fn init_source_is_synthesized_from_edges() -> TestResult {
    let graph = GraphBuilder::new()
        .node("loader", ())
        .edge(INIT_NODE_ID, "loader", "raw")
        .build()?;

    assert_eq!(graph.len(), 2);
    assert_eq!(graph.start_nodes(), [INIT_NODE_ID.to_string()]);
    assert!(graph.node(INIT_NODE_ID).expect("init node exists").is_init());
    assert_eq!(graph.outgoing(INIT_NODE_ID).len(), 1);
    Ok(())
}

#[test]
fn empty_graph_builds() -> TestResult {
    let graph = GraphBuilder::<()>::new().build()?;
    assert!(graph.is_empty());
    assert!(graph.start_nodes().is_empty());
    assert!(graph.end_nodes().is_empty());
    Ok(())
}

#[test]
fn rendering_lists_every_node_and_edge() -> TestResult {
    let graph = diamond().build()?;
    let rendered = graph.to_string();

    for node in ["A", "B", "C", "D"] {
        assert!(rendered.contains(&format!("- {node}")), "{rendered}");
    }
    for edge in ["<- A (rA)", "<- B (rB)", "<- C (rC)"] {
        assert!(rendered.contains(edge), "{rendered}");
    }
    Ok(())
}

#[test]
fn disconnected_components_are_permitted() -> TestResult {
    let graph = GraphBuilder::new()
        .node("A", ())
        .node("B", ())
        .node("X", ())
        .node("Y", ())
        .edge("A", "B", "rA")
        .edge("X", "Y", "rX")
        .build()?;

    assert_eq!(graph.start_nodes(), ["A".to_string(), "X".to_string()]);
    assert_eq!(graph.end_nodes(), ["B".to_string(), "Y".to_string()]);
    Ok(())
}
