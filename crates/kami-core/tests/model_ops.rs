use kami_core::KamiError;
use kami_core::model::*;

#[test]
fn test_get_or_create_site_is_idempotent() {
    let mut model = Model::new();
    let agent = model.create_agent("RAF1");

    let first = model.get_or_create_site(agent, "kinase").unwrap();
    let second = model.get_or_create_site(agent, "kinase").unwrap();

    assert_eq!(first, second);
    assert_eq!(model.component(agent).unwrap().sites.len(), 1);
    assert_eq!(model.len(), 2);
}

#[test]
fn test_same_name_under_different_parents_is_distinct() {
    let mut model = Model::new();
    let raf = model.create_agent("RAF1");
    let mek = model.create_agent("MEK1");

    let a = model.get_or_create_key_residue(raf, "S338").unwrap();
    let b = model.get_or_create_key_residue(mek, "S338").unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_flag_and_attribute_registries_are_separate() {
    let mut model = Model::new();
    let agent = model.create_agent("RAF1");

    let flag = model.get_or_create_flag(agent, "active").unwrap();
    let attr = model.get_or_create_attribute(agent, "active").unwrap();
    assert_ne!(flag, attr);
    assert_eq!(model.get_or_create_flag(agent, "active").unwrap(), flag);
    assert_eq!(model.get_or_create_attribute(agent, "active").unwrap(), attr);

    assert_eq!(model.annotation(flag).unwrap().kind, AnnotationKind::Flag);
    assert_eq!(model.annotation(attr).unwrap().kind, AnnotationKind::Attribute);
}

#[test]
fn test_identifiers_are_unique_and_monotonic() {
    let mut model = Model::new();
    let mut created = Vec::new();
    let agent = model.create_agent("ERK1");
    created.push(agent);
    created.push(model.get_or_create_site(agent, "activation_loop").unwrap());
    created.push(model.get_or_create_key_residue(created[1], "T202").unwrap());
    created.push(model.get_or_create_key_residue(created[1], "Y204").unwrap());
    created.push(model.get_or_create_flag(created[3], "Yphos").unwrap());
    let other = model.create_agent("MEK2");
    created.push(other);
    created.push(model.add_phosphorylation(other, created[3]).unwrap());

    assert!(created.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(created[0], 1);
}

#[test]
fn test_sites_only_under_agents() {
    let mut model = Model::new();
    let agent = model.create_agent("SRC");
    let site = model.get_or_create_site(agent, "SH2").unwrap();

    let err = model.get_or_create_site(site, "nested").unwrap_err();
    assert!(matches!(err, KamiError::InvalidContainment { .. }));

    let residue = model.get_or_create_key_residue(agent, "Y416").unwrap();
    let err = model.get_or_create_key_residue(residue, "Y417").unwrap_err();
    assert!(matches!(err, KamiError::InvalidContainment { .. }));
}

#[test]
fn test_flags_cannot_hang_off_annotations() {
    let mut model = Model::new();
    let agent = model.create_agent("SRC");
    let flag = model.get_or_create_flag(agent, "phos").unwrap();

    let err = model.get_or_create_flag(flag, "meta").unwrap_err();
    assert!(matches!(err, KamiError::WrongNodeKind { .. }));
}

#[test]
fn test_path_of_nested_key_residue() {
    let mut model = Model::new();
    let agent = model.create_agent("ERK1");
    let site = model.get_or_create_site(agent, "activation_loop").unwrap();
    let residue = model.get_or_create_key_residue(site, "Y204").unwrap();

    assert_eq!(model.path(residue).unwrap(), vec![agent, site, residue]);
    assert_eq!(model.ancestors(residue).unwrap(), vec![residue, site, agent]);
    assert_eq!(model.root_of(residue).unwrap(), agent);
    assert_eq!(model.path(agent).unwrap(), vec![agent]);
}

#[test]
fn test_path_of_flag_includes_flag() {
    let mut model = Model::new();
    let agent = model.create_agent("ERK1");
    let residue = model.get_or_create_key_residue(agent, "T202").unwrap();
    let flag = model.get_or_create_flag(residue, "Tphos").unwrap();

    assert_eq!(model.path(flag).unwrap(), vec![agent, residue, flag]);
}

#[test]
fn test_formula_accumulates_disjunction() {
    let mut model = Model::new();
    let agent = model.create_agent("RAF1");
    let flag = model.get_or_create_flag(agent, "phos").unwrap();
    assert_eq!(model.annotation(flag).unwrap().formula(), None);

    for term in ["p3", "p7", "p12"] {
        model.accumulate_formula(flag, term, OR_SEPARATOR).unwrap();
    }
    let annotation = model.annotation(flag).unwrap();
    assert_eq!(annotation.formula(), Some("p3 or p7 or p12"));
    assert_eq!(
        annotation.disjuncts().collect::<Vec<_>>(),
        vec!["p3", "p7", "p12"]
    );
}

#[test]
fn test_initial_children_share_the_lookup_path() {
    let mut model = Model::new();
    let init = ComponentInit {
        is_abstract: true,
        sites: vec!["SH2".to_string(), "SH3".to_string(), "SH2".to_string()],
        key_residues: vec!["Y416".to_string()],
        flags: vec!["active".to_string()],
        ..ComponentInit::default()
    };
    let agent = model.create_agent_with("SRC", init).unwrap();

    let component = model.component(agent).unwrap();
    assert!(component.is_abstract);
    assert_eq!(component.sites.len(), 2);
    assert_eq!(component.key_residues.len(), 1);
    assert_eq!(component.flags.len(), 1);

    let sh2 = component.sites["SH2"];
    assert_eq!(model.get_or_create_site(agent, "SH2").unwrap(), sh2);
}

#[test]
fn test_site_init_rejects_nested_sites() {
    let mut model = Model::new();
    let agent = model.create_agent("SRC");
    let init = ComponentInit {
        sites: vec!["inner".to_string()],
        ..ComponentInit::default()
    };
    assert!(model.get_or_create_site_with(agent, "outer", init).is_err());
    assert!(model.component(agent).unwrap().sites.is_empty());

    let init = ComponentInit {
        key_residues: vec!["Y416".to_string()],
        ..ComponentInit::default()
    };
    let site = model.get_or_create_site_with(agent, "kinase", init).unwrap();
    assert_eq!(model.component(site).unwrap().key_residues.len(), 1);
}

#[test]
fn test_relationship_keys_carry_type_tag() {
    let mut model = Model::new();
    let a = model.create_agent("SHC1");
    let b = model.create_agent("GRB2");
    let c = model.create_agent("SOS1");

    let phos = model.add_phosphorylation(a, b).unwrap();
    let bind = model.add_bind(a, b).unwrap();
    let complex = model.add_complex(&[a, b, c]).unwrap();

    assert_eq!(model.relationship(phos).unwrap().key(), format!("p{}", phos));
    assert_eq!(model.relationship(bind).unwrap().key(), format!("b{}", bind));
    assert_eq!(
        model.relationship(complex).unwrap().key(),
        format!("cplx{}", complex)
    );
    assert_eq!(
        model.relationship(complex).unwrap().participants(),
        vec![a, b, c]
    );
}

#[test]
fn test_relationship_endpoint_rules() {
    let mut model = Model::new();
    let a = model.create_agent("SRC");
    let flag = model.get_or_create_flag(a, "phos").unwrap();

    assert!(model.add_complex(&[a]).is_err());
    assert!(model.add_bind(a, flag).is_err());
    assert!(model.add_phosphorylation(a, 999).is_err());

    // Directed relationships may target an annotation.
    let phos = model.add_phosphorylation(a, flag).unwrap();
    assert!(model.add_phosphorylation(a, phos).is_err());
}

#[test]
fn test_descendants_are_parent_first() {
    let mut model = Model::new();
    let agent = model.create_agent("ERK1");
    let site = model.get_or_create_site(agent, "loop").unwrap();
    let residue = model.get_or_create_key_residue(site, "Y204").unwrap();
    let flag = model.get_or_create_flag(residue, "Yphos").unwrap();
    let attr = model.get_or_create_attribute(agent, "kinase_active").unwrap();

    assert_eq!(
        model.descendants(agent).unwrap(),
        vec![agent, site, residue, flag, attr]
    );
}

#[test]
fn test_annotate_and_set_abstract() {
    let mut model = Model::new();
    let agent = model.create_agent("RAS");
    model.set_abstract(agent, true).unwrap();
    model
        .annotate(agent, serde_json::json!({"uniprot": "P01112"}))
        .unwrap();

    let component = model.component(agent).unwrap();
    assert!(component.is_abstract);
    assert_eq!(component.annotations.len(), 1);
}
