//! Tests for EntityStore

use std::sync::Arc;

use assocent::application::{ApplicationError, EntityStore};
use assocent::domain::{
    AccessRights, Affiliation, AffiliationType, Corporate, DomainError, Entity, EntityDetails,
    EntityId, Individual, Percentage, UserAccess,
};

fn individual(id: &str, first: &str, last: &str, affiliation: Vec<Affiliation>) -> Entity {
    Entity {
        id: EntityId::from(id),
        details: EntityDetails::Individual(Individual {
            first_name: first.to_string(),
            last_name: last.to_string(),
            ..Default::default()
        }),
        affiliation,
    }
}

fn corporate(id: &str, name: &str, affiliation: Vec<Affiliation>) -> Entity {
    Entity {
        id: EntityId::from(id),
        details: EntityDetails::Corporate(Corporate {
            name: name.to_string(),
            ..Default::default()
        }),
        affiliation,
    }
}

fn pct(value: &str) -> Option<Percentage> {
    Some(Percentage::parse(value).unwrap())
}

fn domain_err(err: ApplicationError) -> DomainError {
    err.as_domain().cloned().expect("domain error")
}

fn sample_store() -> EntityStore {
    EntityStore::from_entities(vec![
        individual(
            "jane",
            "Jane",
            "Doe",
            vec![
                Affiliation::shareholder(pct("35")),
                Affiliation::role(AffiliationType::Director),
            ],
        ),
        individual("john", "John", "Roe", vec![Affiliation::role(AffiliationType::Director)]),
        corporate("acme", "Acme Ltd", vec![Affiliation::shareholder(pct("40"))]),
    ])
    .unwrap()
}

#[test]
fn given_update_when_applied_then_other_entities_keep_identity() {
    // Arrange
    let store = sample_store();
    let before = store.snapshot();
    let mut updated = before[0].as_ref().clone();
    updated.affiliation.push(Affiliation::role(AffiliationType::User));

    // Act
    store.update_entity(updated).unwrap();

    // Assert
    let after = store.snapshot();
    assert!(!Arc::ptr_eq(&before[0], &after[0]));
    assert!(Arc::ptr_eq(&before[1], &after[1]));
    assert!(Arc::ptr_eq(&before[2], &after[2]));
    assert_eq!(before[1], after[1]);
    // The old snapshot is untouched
    assert_eq!(before[0].affiliation.len(), 2);
}

#[test]
fn given_entity_with_roles_when_removing_director_then_only_director_removed() {
    // Arrange
    let store = sample_store();
    let jane = EntityId::from("jane");

    // Act
    let removed = store
        .remove_affiliation(&jane, AffiliationType::Director)
        .unwrap();

    // Assert
    assert!(removed);
    let entity = store.get(&jane).unwrap();
    assert_eq!(entity.affiliation, vec![Affiliation::shareholder(pct("35"))]);
    // John keeps his directorship
    assert!(store
        .get(&EntityId::from("john"))
        .unwrap()
        .has_affiliation(AffiliationType::Director));
}

#[test]
fn given_missing_role_when_removing_then_explicit_no_op() {
    let store = sample_store();
    let before = store.snapshot();

    let removed = store
        .remove_affiliation(&EntityId::from("john"), AffiliationType::User)
        .unwrap();

    assert!(!removed);
    assert_eq!(*before, *store.snapshot());
}

#[test]
fn given_unknown_id_when_removing_then_not_found() {
    let store = sample_store();

    let err = store
        .remove_affiliation(&EntityId::from("ghost"), AffiliationType::Director)
        .unwrap_err();

    assert_eq!(domain_err(err), DomainError::EntityNotFound(EntityId::from("ghost")));
}

#[test]
fn given_user_with_access_when_removing_user_then_access_cleared() {
    // Arrange
    let mut jane = individual("jane", "Jane", "Doe", vec![Affiliation::role(AffiliationType::User)]);
    if let EntityDetails::Individual(i) = &mut jane.details {
        i.user_access = Some(UserAccess {
            mobile_number: "+44 7700 900000".into(),
            access_rights: AccessRights::Admin,
        });
    }
    let store = EntityStore::from_entities(vec![jane]).unwrap();

    // Act
    store
        .remove_affiliation(&EntityId::from("jane"), AffiliationType::User)
        .unwrap();

    // Assert
    let jane = store.get(&EntityId::from("jane")).unwrap();
    assert_eq!(jane.as_individual().unwrap().user_access, None);
}

#[test]
fn given_existing_id_when_adding_then_duplicate_rejected() {
    let store = sample_store();

    let err = store
        .add_entity(individual("jane", "Other", "Jane", vec![]))
        .unwrap_err();

    assert_eq!(domain_err(err), DomainError::DuplicateEntity(EntityId::from("jane")));
    assert_eq!(store.len(), 3);
}

#[test]
fn given_root_id_when_adding_then_reserved() {
    let store = EntityStore::new();

    let err = store.add_entity(corporate("root", "Imposter", vec![])).unwrap_err();

    assert!(matches!(domain_err(err), DomainError::ReservedId(_)));
    assert!(store.is_empty());
}

#[test]
fn given_dangling_parent_when_adding_then_rejected() {
    let store = sample_store();

    let err = store
        .add_entity(corporate(
            "sub",
            "Sub Ltd",
            vec![Affiliation::indirect(EntityId::from("nowhere"), pct("10"))],
        ))
        .unwrap_err();

    assert!(matches!(
        domain_err(err),
        DomainError::DanglingParentReference { .. }
    ));
}

#[test]
fn given_indirect_without_parent_when_adding_then_missing_parent() {
    let store = EntityStore::new();
    let mut entity = corporate("sub", "Sub Ltd", vec![]);
    entity.affiliation.push(Affiliation {
        kind: AffiliationType::IndirectShareholder,
        shareholding: pct("5"),
        parent_entity: None,
    });

    let err = store.add_entity(entity).unwrap_err();

    assert!(matches!(domain_err(err), DomainError::MissingParent { .. }));
}

#[test]
fn given_failing_step_when_transacting_then_nothing_published() {
    // Arrange
    let store = sample_store();
    let before = store.snapshot();

    // Act: first step succeeds, second fails
    let result = store.transact(|draft| {
        draft.add_entity(corporate("newco", "NewCo", vec![]))?;
        draft.append_affiliation(
            &EntityId::from("jane"),
            Affiliation::role(AffiliationType::Director),
        )
    });

    // Assert
    assert!(domain_err(result.unwrap_err()).is_already_satisfied());
    assert!(store.get(&EntityId::from("newco")).is_none());
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
}

#[test]
fn given_two_steps_when_transacting_then_both_visible_together() {
    let store = sample_store();

    store
        .transact(|draft| {
            let id = draft.add_entity(corporate("newco", "NewCo", vec![]))?;
            draft.append_affiliation(&id, Affiliation::indirect(EntityId::from("acme"), pct("50")))
        })
        .unwrap();

    let newco = store.get(&EntityId::from("newco")).unwrap();
    assert_eq!(
        newco.affiliation,
        vec![Affiliation::indirect(EntityId::from("acme"), pct("50"))]
    );
}

#[test]
fn given_link_closing_a_loop_when_appending_then_cycle_rejected() {
    // Arrange: acme <- sub (sub owns part of acme)
    let store = sample_store();
    store
        .add_entity(corporate(
            "sub",
            "Sub Ltd",
            vec![Affiliation::indirect(EntityId::from("acme"), pct("30"))],
        ))
        .unwrap();

    // Act: acme would own part of sub
    let err = store
        .append_affiliation(
            &EntityId::from("acme"),
            Affiliation::indirect(EntityId::from("sub"), pct("10")),
        )
        .unwrap_err();

    // Assert
    assert!(matches!(domain_err(err), DomainError::CyclicOwnership { .. }));
}

#[test]
fn given_existing_holding_when_setting_shareholding_then_updated() {
    let store = sample_store();
    let jane = EntityId::from("jane");

    store
        .set_shareholding(&jane, &EntityId::root(), pct("12.5"))
        .unwrap();

    assert_eq!(
        assocent::domain::rules::direct_shareholding(&store.get(&jane).unwrap()),
        pct("12.5")
    );
}

#[test]
fn given_no_such_holding_when_setting_shareholding_then_error() {
    let store = sample_store();

    let err = store
        .set_shareholding(&EntityId::from("john"), &EntityId::from("acme"), pct("5"))
        .unwrap_err();

    assert!(matches!(domain_err(err), DomainError::NoSuchHolding { .. }));
}

#[test]
fn given_store_when_disposed_then_empty_and_contents_returned() {
    let store = sample_store();

    let held = store.dispose();

    assert_eq!(held.len(), 3);
    assert!(store.is_empty());
}

/// sample_store plus "sub", which holds 30% of acme and 5% of jane
fn store_with_sub() -> EntityStore {
    let store = sample_store();
    store
        .add_entity(corporate(
            "sub",
            "Sub Ltd",
            vec![
                Affiliation::indirect(EntityId::from("acme"), pct("30")),
                Affiliation::indirect(EntityId::from("jane"), pct("5")),
            ],
        ))
        .unwrap();
    store
}

#[test]
fn given_two_indirect_links_when_removing_one_then_other_kept() {
    // Arrange
    let store = store_with_sub();
    let sub = EntityId::from("sub");

    // Act
    let removed = store
        .remove_indirect_link(&sub, &EntityId::from("acme"))
        .unwrap();

    // Assert
    assert!(removed);
    assert_eq!(
        store.get(&sub).unwrap().affiliation,
        vec![Affiliation::indirect(EntityId::from("jane"), pct("5"))]
    );
}

#[test]
fn given_no_link_to_parent_when_removing_indirect_link_then_explicit_no_op() {
    let store = store_with_sub();
    let before = store.snapshot();

    let removed = store
        .remove_indirect_link(&EntityId::from("sub"), &EntityId::from("john"))
        .unwrap();

    assert!(!removed);
    assert_eq!(*before, *store.snapshot());
}

#[test]
fn given_unknown_id_when_removing_indirect_link_then_not_found() {
    let store = store_with_sub();

    let err = store
        .remove_indirect_link(&EntityId::from("ghost"), &EntityId::from("acme"))
        .unwrap_err();

    assert_eq!(
        domain_err(err),
        DomainError::EntityNotFound(EntityId::from("ghost"))
    );
}

#[test]
fn given_unknown_id_when_updating_then_not_found_and_snapshot_unchanged() {
    // Arrange
    let store = sample_store();
    let before = store.snapshot();

    // Act
    let err = store
        .update_entity(corporate("ghost", "Ghost Ltd", vec![]))
        .unwrap_err();

    // Assert
    assert_eq!(
        domain_err(err),
        DomainError::EntityNotFound(EntityId::from("ghost"))
    );
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
}

#[test]
fn given_replacement_with_unknown_parent_when_updating_then_dangling_and_snapshot_unchanged() {
    // Arrange
    let store = sample_store();
    let before = store.snapshot();
    let replacement = corporate(
        "acme",
        "Acme Ltd",
        vec![Affiliation::indirect(EntityId::from("nowhere"), pct("10"))],
    );

    // Act
    let err = store.update_entity(replacement).unwrap_err();

    // Assert
    assert!(matches!(
        domain_err(err),
        DomainError::DanglingParentReference { .. }
    ));
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
}

#[test]
fn given_replacement_closing_a_loop_when_updating_then_cycle_and_snapshot_unchanged() {
    // Arrange: sub owns part of acme; the new acme record would own part of sub
    let store = store_with_sub();
    let before = store.snapshot();
    let replacement = corporate(
        "acme",
        "Acme Ltd",
        vec![
            Affiliation::shareholder(pct("40")),
            Affiliation::indirect(EntityId::from("sub"), pct("10")),
        ],
    );

    // Act
    let err = store.update_entity(replacement).unwrap_err();

    // Assert
    assert!(matches!(domain_err(err), DomainError::CyclicOwnership { .. }));
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
}
