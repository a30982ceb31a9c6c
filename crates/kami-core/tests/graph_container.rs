use kami_core::KamiError;
use kami_core::config::ResidueContainer;
use kami_core::fact::*;
use kami_core::graph::{GraphStats, KamiGraph};
use kami_core::model::Model;

fn erk_facts() -> Vec<Fact> {
    vec![
        Fact::Phosphorylation(PhosphorylationFact::new(
            "MEK2",
            "ERK1",
            ModKind::PhosphorylationThreonine,
            Some("202"),
        )),
        Fact::Phosphorylation(PhosphorylationFact::new(
            "MEK2",
            "ERK1",
            ModKind::PhosphorylationTyrosine,
            Some("204"),
        )),
        Fact::ActivityModification(ActivityModificationFact {
            agent: "ERK1".to_string(),
            activity: "kinase".to_string(),
            modifications: vec![
                ModKind::PhosphorylationThreonine,
                ModKind::PhosphorylationTyrosine,
            ],
            positions: vec!["202".to_string(), "204".to_string()],
            relationship: Qualifier::DirectlyIncreases,
        }),
    ]
}

#[test]
fn test_from_facts_collects_agents_and_relationships() {
    let graph = KamiGraph::from_facts("erk", &erk_facts(), ResidueContainer::KeyResidue).unwrap();

    assert_eq!(graph.name, "erk");
    assert_eq!(graph.agents().count(), 2);
    assert!(graph.agent("MEK2").is_some());
    assert!(graph.agent("ERK1").is_some());
    assert_eq!(graph.relationships().len(), 2);
    graph.validate().unwrap();

    assert_eq!(
        graph.stats().unwrap(),
        GraphStats {
            agents: 2,
            sites: 0,
            key_residues: 2,
            flags: 2,
            attributes: 1,
            directed: 2,
            undirected: 0,
        }
    );
}

#[test]
fn test_relationships_keep_creation_order() {
    let graph = KamiGraph::from_facts("erk", &erk_facts(), ResidueContainer::KeyResidue).unwrap();
    let rels = graph.relationships();
    assert!(rels.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_from_facts_halts_on_rejected_fact() {
    let mut facts = erk_facts();
    facts.push(Fact::Complex(ComplexFact {
        members: vec!["ERK1".to_string()],
    }));
    let err = KamiGraph::from_facts("erk", &facts, ResidueContainer::KeyResidue).unwrap_err();
    assert_eq!(err, KamiError::TooFewParticipants(1));
}

#[test]
fn test_duplicate_agent_names_rejected() {
    let mut model = Model::new();
    let a = model.create_agent("SRC");
    let b = model.create_agent("SRC");
    let err = KamiGraph::new("dup", model, [a, b]).unwrap_err();
    assert!(matches!(err, KamiError::DuplicateAgent { .. }));
}

#[test]
fn test_validate_detects_dangling_endpoint() {
    let mut model = Model::new();
    let src = model.create_agent("SRC");
    let raf = model.create_agent("RAF1");
    let residue = model.get_or_create_key_residue(raf, "Y341").unwrap();
    let phos = model.add_phosphorylation(src, residue).unwrap();

    // RAF1 is not selected, so the residue hangs off a missing agent.
    let graph = KamiGraph::new("partial", model, [src, phos]).unwrap();
    let err = graph.validate().unwrap_err();
    assert_eq!(
        err,
        KamiError::DanglingEndpoint {
            relationship: format!("p{}", phos),
            endpoint: residue,
        }
    );
}

#[test]
fn test_sub_nodes_in_selection_are_ignored() {
    let mut model = Model::new();
    let src = model.create_agent("SRC");
    let site = model.get_or_create_site(src, "SH2").unwrap();
    let flag = model.get_or_create_flag(site, "bound").unwrap();

    let graph = KamiGraph::new("sub", model, [site, flag, src, src]).unwrap();
    assert_eq!(graph.agents().collect::<Vec<_>>(), vec![src]);
    assert!(graph.relationships().is_empty());
}

#[test]
fn test_unknown_node_in_selection() {
    let model = Model::new();
    let err = KamiGraph::new("empty", model, [42]).unwrap_err();
    assert_eq!(err, KamiError::UnknownNode(42));
}
