//! Building, analyzing and persisting a pipeline through the public API.

use beatgraph_runtime::document::{self, GraphDocument};
use beatgraph_runtime::graph::{Graph, Position};
use beatgraph_runtime::registry::{NodeKindId, PortDirection, Registry, SemanticType};
use beatgraph_runtime::resolve::{WireOrigin, auto_wire, candidates};
use beatgraph_runtime::schedule::{Phase, RhythmAnalysis, topological_order};

#[test]
fn test_auto_wire_from_prompt_output() {
    let registry = Registry::builtin();
    let mut graph = Graph::new("teaser");
    let prompt = graph.add_node(NodeKindId::Prompt, Position::new(0.0, 0.0));

    let offered = candidates(&registry, SemanticType::PromptText, PortDirection::Output);
    assert!(offered.contains(NodeKindId::ImageGenerator));
    assert!(!offered.contains(NodeKindId::ImageUpload));

    let origin = WireOrigin::output(prompt, "prompt");
    let wired = auto_wire(
        &mut graph,
        &registry,
        &origin,
        "image_generator",
        Position::new(300.0, 0.0),
    )
    .unwrap();

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    let edge = graph.edge(wired.edge_id.unwrap()).unwrap();
    assert_eq!((edge.source, edge.target), (prompt, wired.node_id));
    assert_eq!(edge.target_port, "prompt");
}

#[test]
fn test_text_then_media_rhythm() {
    let mut graph = Graph::new("short");
    let text = graph.add_node(NodeKindId::Prompt, Position::default());
    let media = graph.add_node(NodeKindId::TextToVideo, Position::new(240.0, 0.0));
    graph.connect(text, "prompt", media, "prompt").unwrap();

    let schedule = topological_order(&graph);
    assert_eq!(schedule.order, vec![text, media]);
    assert!(schedule.is_complete());

    let analysis = RhythmAnalysis::analyze(&graph);
    assert!((analysis.beats[0].cumulative_percent - 20.0).abs() < 1e-9);
    assert!((analysis.beats[1].cumulative_percent - 100.0).abs() < 1e-9);
    assert_eq!(analysis.beats[1].phase, Phase::Outro);
}

#[test]
fn test_document_round_trip_then_analyze() {
    let registry = Registry::builtin();
    let mut graph = Graph::new("storyboard");
    let prompt = graph.add_node(NodeKindId::Prompt, Position::default());
    let image = graph.add_node(NodeKindId::ImageGenerator, Position::new(200.0, 0.0));
    let upscale = graph.add_node(NodeKindId::ImageUpscaler, Position::new(400.0, 0.0));
    let video = graph.add_node(NodeKindId::ImageToVideo, Position::new(600.0, 0.0));
    graph.connect(prompt, "prompt", image, "prompt").unwrap();
    graph.connect(image, "image", upscale, "image").unwrap();
    graph.connect(upscale, "image", video, "image").unwrap();
    graph.connect(prompt, "prompt", video, "prompt").unwrap();

    let json = serde_json::to_string(&document::serialize(&graph)).unwrap();
    let parsed: GraphDocument = serde_json::from_str(&json).unwrap();
    let (loaded, report) = document::sanitize(&parsed, &registry);

    assert!(report.is_clean());
    assert_eq!(loaded.nodes(), graph.nodes());
    assert_eq!(loaded.edges(), graph.edges());
    assert_eq!(
        topological_order(&loaded).order,
        vec![prompt, image, upscale, video]
    );
    assert_eq!(
        RhythmAnalysis::analyze(&loaded),
        RhythmAnalysis::analyze(&graph)
    );
}

#[test]
fn test_removing_missing_node_leaves_graph_unchanged() {
    let mut graph = Graph::new("stable");
    let prompt = graph.add_node(NodeKindId::Prompt, Position::default());
    let image = graph.add_node(NodeKindId::ImageGenerator, Position::default());
    graph.connect(prompt, "prompt", image, "prompt").unwrap();
    let before = graph.clone();

    assert!(graph.remove_node(beatgraph_core::NodeId::new()).is_none());
    assert_eq!(graph, before);
}
