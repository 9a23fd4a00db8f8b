//! Smoke tests against the top-level facade

use limsdb::{
    Database, Entity, EntityId, EntityKind, EntityType, PropertyValue, ValidationScript,
};

#[test]
fn test_facade_insert_and_read_back() {
    let db = Database::new();

    db.transaction(|txn, ctx| {
        let sample = Entity::new(
            EntityId::new(1),
            EntityKind::Sample,
            EntityType::new("BACTERIA"),
        )
        .with_property("code", PropertyValue::Text("BC-001".to_string()));
        txn.insert(ctx, sample)
    })
    .unwrap();

    let stored = db.get(EntityKind::Sample, EntityId::new(1)).unwrap();
    assert_eq!(stored.entity_type.code, "BACTERIA");
    assert!(stored.property("code").is_some());
}

#[test]
fn test_facade_validation_rejection_surfaces() {
    let db = Database::new();
    db.scripts()
        .register("reject_all", |_, _, _| Ok(Some("never valid".to_string())));

    let err = db
        .transaction(|txn, ctx| {
            txn.insert(
                ctx,
                Entity::new(
                    EntityId::new(1),
                    EntityKind::Sample,
                    EntityType::with_script("BACTERIA", ValidationScript::named("reject_all")),
                ),
            )
        })
        .unwrap_err();

    assert!(err.to_string().contains("never valid"));
    assert_eq!(db.entity_count(), 0);
}

#[test]
fn test_entity_serializes_through_facade_types() {
    let entity = Entity::new(
        EntityId::new(7),
        EntityKind::Experiment,
        EntityType::new("GROWTH"),
    )
    .with_property("replicates", PropertyValue::Integer(3));

    let json = serde_json::to_string(&entity).unwrap();
    let back: Entity = serde_json::from_str(&json).unwrap();
    assert_eq!(back, entity);
}
