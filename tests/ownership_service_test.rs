//! Tests for OwnershipService

use std::sync::Arc;

use rust_decimal::Decimal;

use assocent::application::{ApplicationError, EntityStore, OwnershipService, SECTIONS};
use assocent::domain::{
    create_corporate, AccessRights, Affiliation, AffiliationType, Corporate, DomainError, Entity,
    EntityDetails, EntityId, Individual, Percentage, UserAccess,
};

fn pct(value: &str) -> Option<Percentage> {
    Some(Percentage::parse(value).unwrap())
}

fn person(id: &str, affiliation: Vec<Affiliation>) -> Entity {
    Entity {
        id: EntityId::from(id),
        details: EntityDetails::Individual(Individual {
            first_name: id.to_string(),
            ..Default::default()
        }),
        affiliation,
    }
}

fn company(id: &str, affiliation: Vec<Affiliation>) -> Entity {
    Entity {
        id: EntityId::from(id),
        details: EntityDetails::Corporate(Corporate {
            name: id.to_string(),
            ..Default::default()
        }),
        affiliation,
    }
}

fn service(entities: Vec<Entity>) -> OwnershipService {
    OwnershipService::new(
        Arc::new(EntityStore::from_entities(entities).unwrap()),
        "Starbugz",
    )
}

#[test]
fn given_mixed_roles_when_listing_sections_then_members_and_candidates() {
    // Arrange
    let svc = service(vec![
        person("ann", vec![Affiliation::shareholder(pct("60"))]),
        person("ben", vec![Affiliation::role(AffiliationType::Director)]),
        company("acme", vec![Affiliation::shareholder(pct("50"))]),
    ]);

    // Act
    let sections = svc.sections();

    // Assert
    let shareholders = &sections[0];
    assert_eq!(shareholders.spec.kind, AffiliationType::Shareholder);
    assert_eq!(shareholders.members.len(), 2);
    // Corporates are never offered as "existing person" candidates
    let available: Vec<_> = shareholders.available.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(available, vec!["ben"]);
    let summary = shareholders.summary.unwrap();
    assert_eq!(summary.total, Decimal::from(110));
    assert!(summary.over_allocated);

    let directors = &sections[1];
    assert_eq!(directors.members.len(), 1);
    let available: Vec<_> = directors.available.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(available, vec!["ann"]);
}

#[test]
fn given_blank_amount_when_making_shareholder_then_percentage_absent() {
    let svc = service(vec![person("ann", vec![])]);

    svc.make_shareholder(&EntityId::from("ann"), "  ").unwrap();

    let ann = svc.store().get(&EntityId::from("ann")).unwrap();
    assert_eq!(ann.affiliation, vec![Affiliation::shareholder(None)]);
}

#[test]
fn given_non_numeric_amount_when_making_shareholder_then_invalid_percentage() {
    let svc = service(vec![person("ann", vec![])]);

    let err = svc.make_shareholder(&EntityId::from("ann"), "abc").unwrap_err();

    assert!(matches!(
        err.as_domain(),
        Some(DomainError::InvalidPercentage { .. })
    ));
    assert!(svc
        .store()
        .get(&EntityId::from("ann"))
        .unwrap()
        .affiliation
        .is_empty());
}

#[test]
fn given_individual_when_making_user_then_role_and_access_written_together() {
    // Arrange
    let svc = service(vec![person("ann", vec![])]);
    let access = UserAccess {
        mobile_number: "+44 7700 900123".into(),
        access_rights: AccessRights::Reviewer,
    };

    // Act
    svc.make_user(&EntityId::from("ann"), access.clone()).unwrap();

    // Assert
    let ann = svc.store().get(&EntityId::from("ann")).unwrap();
    assert!(ann.has_affiliation(AffiliationType::User));
    assert_eq!(ann.as_individual().unwrap().user_access, Some(access));
}

#[test]
fn given_role_already_held_when_adding_to_role_then_already_satisfied() {
    let svc = service(vec![person(
        "ben",
        vec![Affiliation::role(AffiliationType::Director)],
    )]);

    let err = svc
        .add_to_role(&EntityId::from("ben"), AffiliationType::Director)
        .unwrap_err();

    assert!(err.as_domain().is_some_and(|e| e.is_already_satisfied()));
}

#[test]
fn given_director_when_removing_from_role_then_gone() {
    let svc = service(vec![person(
        "ben",
        vec![Affiliation::role(AffiliationType::Director)],
    )]);

    assert!(svc
        .remove_from_role(&EntityId::from("ben"), AffiliationType::Director)
        .unwrap());
    assert!(!svc
        .remove_from_role(&EntityId::from("ben"), AffiliationType::Director)
        .unwrap());
}

#[test]
fn given_structure_when_listing_link_candidates_then_parent_owners_and_cycles_excluded() {
    // Arrange: acme <- sub <- ann; bob unattached
    let svc = service(vec![
        company("acme", vec![Affiliation::shareholder(pct("40"))]),
        company("sub", vec![Affiliation::indirect("acme".into(), pct("30"))]),
        person("ann", vec![Affiliation::indirect("sub".into(), pct("50"))]),
        person("bob", vec![]),
    ]);

    // Act
    let candidates: Vec<_> = svc
        .link_candidates(&EntityId::from("sub"))
        .iter()
        .map(|e| e.id.as_str().to_string())
        .collect();

    // Assert: sub itself, its owner ann and its ancestor acme are excluded
    assert_eq!(candidates, vec!["bob"]);
}

#[test]
fn given_seed_holder_at_root_sentinel_when_linking_to_root_then_duplicate() {
    let svc = service(vec![company(
        "acme",
        vec![Affiliation::indirect(EntityId::root(), pct("10"))],
    )]);

    let err = svc
        .link_existing(&EntityId::root(), &EntityId::from("acme"), pct("10"))
        .unwrap_err();

    assert!(err.as_domain().is_some_and(|e| e.is_already_satisfied()));
}

#[test]
fn given_structure_when_deriving_then_nodes_and_summary() {
    let svc = service(vec![
        company("acme", vec![Affiliation::shareholder(pct("40"))]),
        person("ann", vec![Affiliation::indirect("acme".into(), pct("50"))]),
    ]);

    let structure = svc.structure().unwrap();

    assert_eq!(structure.root_name, "Starbugz");
    assert_eq!(structure.nodes.len(), 2);
    assert_eq!(structure.nodes[1].effective_shareholding, Some(Decimal::from(20)));
    assert_eq!(structure.summary.total, Decimal::from(40));
}

#[test]
fn given_owner_added_under_node_when_built_then_child_of_that_node() {
    let svc = service(vec![company("acme", vec![Affiliation::shareholder(pct("40"))])]);
    let newco = create_corporate(
        Corporate {
            name: "NewCo".into(),
            ..Default::default()
        },
        vec![],
    );

    let id = svc
        .add_owner(&EntityId::from("acme"), newco, pct("25"))
        .unwrap();

    let nodes = svc.structure().unwrap().nodes;
    assert_eq!(nodes[1].entity.id, id);
    assert_eq!(nodes[1].parent, EntityId::from("acme"));
    assert_eq!(nodes[1].depth, 2);
}

#[test]
fn given_corporate_when_adding_to_directors_section_then_kind_mismatch() {
    let svc = service(vec![]);
    let directors = &SECTIONS[1];

    let err = svc
        .add_to_section(directors, company("acme", vec![]), None)
        .unwrap_err();

    assert!(matches!(err, ApplicationError::KindMismatch { .. }));
    assert!(svc.store().is_empty());
}
