use kami_core::KamiError;
use kami_core::config::ResidueContainer;
use kami_core::fact::*;
use kami_core::graph::KamiGraph;
use kami_core::model::Model;
use kami_export::visual::{self, NodePhase};

fn src_raf_graph() -> KamiGraph {
    let facts = [Fact::Phosphorylation(PhosphorylationFact::new(
        "SRC",
        "RAF1",
        ModKind::Phosphorylation,
        None,
    ))];
    KamiGraph::from_facts("example_graph", &facts, ResidueContainer::KeyResidue).unwrap()
}

#[test]
fn test_src_raf_end_to_end() {
    let graph = src_raf_graph();
    let src = graph.agent("SRC").unwrap();
    let raf = graph.agent("RAF1").unwrap();
    let rel = graph.relationships()[0];
    let key = format!("p{}", rel);
    let flag = graph.model().component(raf).unwrap().flags["phos"];

    let dot = visual::render(&graph).unwrap();
    assert_eq!(dot.name, "example_graph");
    assert_eq!(dot.nodes.len(), 4);
    assert_eq!(dot.edges.len(), 3);

    let flag_node = dot.node(&flag.to_string()).unwrap();
    assert_eq!(flag_node.attr("label"), Some(format!("phos: {}", key).as_str()));
    assert_eq!(flag_node.attr("color"), Some("pink"));
    assert_eq!(flag_node.attr("shape"), Some("component"));

    let rel_node = dot.node(&key).unwrap();
    assert_eq!(rel_node.attr("label"), Some(key.as_str()));
    assert_eq!(rel_node.attr("shape"), Some("diamond"));
    assert_eq!(rel_node.attr("color"), Some("lightblue"));

    assert_eq!(dot.node(&src.to_string()).unwrap().attr("color"), Some("lightgrey"));

    let raf_cluster = dot.cluster(&format!("cluster_{}", raf)).unwrap();
    assert_eq!(raf_cluster.nodes, vec![raf.to_string(), flag.to_string()]);
    let src_cluster = dot.cluster(&format!("cluster_{}", src)).unwrap();
    assert_eq!(src_cluster.nodes, vec![src.to_string()]);
}

#[test]
fn test_containment_and_relationship_edges() {
    let graph = src_raf_graph();
    let src = graph.agent("SRC").unwrap().to_string();
    let raf = graph.agent("RAF1").unwrap().to_string();
    let key = format!("p{}", graph.relationships()[0]);

    let dot = visual::render(&graph).unwrap();
    let containment: Vec<_> = dot.edges.iter().filter(|e| e.attr("style").is_none()).collect();
    assert_eq!(containment.len(), 1);
    assert_eq!(containment[0].source, raf);
    assert_eq!(containment[0].attr("label"), Some("flag"));

    let dotted: Vec<_> = dot
        .edges
        .iter()
        .filter(|e| e.attr("style") == Some("dotted"))
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect();
    assert_eq!(dotted, vec![(src, key.clone()), (key, raf)]);
}

#[test]
fn test_relationship_nodes_follow_component_nodes() {
    let facts = [
        Fact::Phosphorylation(PhosphorylationFact::new(
            "MEK2",
            "ERK1",
            ModKind::PhosphorylationThreonine,
            Some("202"),
        )),
        Fact::Complex(ComplexFact {
            members: vec!["ERK1".to_string(), "MEK2".to_string()],
        }),
    ];
    let graph = KamiGraph::from_facts("erk", &facts, ResidueContainer::KeyResidue).unwrap();
    let dot = visual::render(&graph).unwrap();

    let first_rel = dot
        .nodes
        .iter()
        .position(|n| n.id.starts_with(['p', 'b']))
        .unwrap();
    assert!(dot.nodes[..first_rel]
        .iter()
        .all(|n| n.id.chars().all(|c| c.is_ascii_digit())));
    assert!(dot.nodes[first_rel..]
        .iter()
        .all(|n| !n.id.chars().all(|c| c.is_ascii_digit())));

    let bind = dot.nodes.iter().find(|n| n.id.starts_with('b')).unwrap();
    assert_eq!(bind.attr("shape"), Some("square"));
    let into_bind = dot.edges.iter().filter(|e| e.target == bind.id).count();
    assert_eq!(into_bind, 2);
}

#[test]
fn test_edge_phase_rejects_unrendered_endpoint() {
    let mut model = Model::new();
    let src = model.create_agent("SRC");
    let raf = model.create_agent("RAF1");
    let phos = model.add_phosphorylation(src, raf).unwrap();
    let graph = KamiGraph::new("partial", model, [src, phos]).unwrap();

    let mut nodes = NodePhase::new(&graph);
    nodes.render_agent(src).unwrap();
    let mut edges = nodes.finish();
    let err = edges.render_relationship(phos).unwrap_err();
    assert_eq!(
        err,
        KamiError::DanglingEndpoint {
            relationship: format!("p{}", phos),
            endpoint: raf,
        }
    );
}

#[test]
fn test_dot_text_keeps_line_breaks_in_formulas() {
    let facts = [
        Fact::ActivityModification(ActivityModificationFact {
            agent: "RAF1".to_string(),
            activity: "kinase".to_string(),
            modifications: vec![ModKind::Phosphorylation],
            positions: Vec::new(),
            relationship: Qualifier::DirectlyIncreases,
        }),
        Fact::ActivityModification(ActivityModificationFact {
            agent: "RAF1".to_string(),
            activity: "kinase".to_string(),
            modifications: vec![ModKind::PhosphorylationTyrosine],
            positions: vec!["341".to_string()],
            relationship: Qualifier::DirectlyDecreases,
        }),
    ];
    let graph = KamiGraph::from_facts("raf", &facts, ResidueContainer::KeyResidue).unwrap();
    let text = visual::export_dot(&graph).unwrap();

    assert!(text.starts_with("digraph \"raf\" {"));
    assert!(text.contains("label=\"kinase_active: RAF1.phos,\\nnot RAF1.Y341.Yphos\""));
    assert!(text.contains("subgraph \"cluster_"));
    assert!(text.trim_end().ends_with('}'));
}

#[test]
fn test_trailing_backslash_in_names_is_escaped() {
    let mut model = Model::new();
    let agent = model.create_agent("A\\");
    let attr = model.get_or_create_attribute(agent, "x\\_active").unwrap();
    model.accumulate_formula(attr, "A\\.phos", ",\\n").unwrap();
    model.accumulate_formula(attr, "not A\\.phos", ",\\n").unwrap();
    let graph = KamiGraph::new("slash", model, [agent]).unwrap();
    let text = visual::export_dot(&graph).unwrap();

    assert!(text.contains("[label=\"A\\\\\", color=\"lightgrey\""));
    assert!(text.contains("label=\"x\\\\_active: A\\\\.phos,\\nnot A\\\\.phos\""));
}

#[test]
fn test_quotes_are_escaped() {
    let mut model = Model::new();
    let agent = model.create_agent("say \"hi\"");
    let graph = KamiGraph::new("quoted", model, [agent]).unwrap();
    let text = visual::export_dot(&graph).unwrap();
    assert!(text.contains("label=\"say \\\"hi\\\"\""));
}
