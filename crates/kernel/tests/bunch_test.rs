#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for the bunch storer, bunch↔key links, and service.

mod common;

use keybunch_kernel::Error;
use keybunch_kernel::models::bunch::{
    Bunch, BunchFilter, BunchKey, BunchKeyFilter, BunchKeySort, BunchSort, CreateBunch,
    UpdateBunch,
};
use keybunch_kernel::models::key::CreateKey;
use keybunch_kernel::query::SortDirection;
use keybunch_kernel::services::{BunchService, KeyService};

#[tokio::test]
async fn test_bunch_crud_roundtrip() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = BunchService::new(pool);

    let name = common::unique("bn");
    let created = service
        .create(CreateBunch {
            name: name.clone(),
            description: "editors".into(),
        })
        .await
        .unwrap();
    assert!(created.active, "new bunches start active");

    let updated = service
        .update(
            created.id,
            UpdateBunch {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.active);
    assert_eq!(updated.name, name);

    service.delete(&name).await.unwrap();
    assert!(service.get(&name).await.unwrap().is_none());
}

#[tokio::test]
async fn test_tri_state_active_filter() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = BunchService::new(pool.clone());

    let prefix = common::unique("tri");
    let on = service
        .create(CreateBunch {
            name: format!("{prefix}_on"),
            description: String::new(),
        })
        .await
        .unwrap();
    let off = service
        .create(CreateBunch {
            name: format!("{prefix}_off"),
            description: String::new(),
        })
        .await
        .unwrap();
    service
        .update(
            off.id,
            UpdateBunch {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // Unset: both rows match.
    let page = Bunch::list(
        &pool,
        &BunchFilter {
            name: Some(prefix.clone()),
            ..Default::default()
        },
        &BunchSort::default(),
    )
    .await
    .unwrap();
    assert_eq!(page.total, 2);

    // Explicit false: only the deactivated row, not "unset".
    let page = Bunch::list(
        &pool,
        &BunchFilter {
            name: Some(prefix.clone()),
            active: Some(false),
            ..Default::default()
        },
        &BunchSort::default(),
    )
    .await
    .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, off.id);

    // Explicit true.
    let page = Bunch::list(
        &pool,
        &BunchFilter {
            name: Some(prefix),
            active: Some(true),
            ..Default::default()
        },
        &BunchSort::default(),
    )
    .await
    .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, on.id);
}

#[tokio::test]
async fn test_bunch_key_listing_decodes_all_three_entities() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let bunches = BunchService::new(pool.clone());
    let keys = KeyService::new(pool.clone());

    let bunch_name = common::unique("agg_b");
    let bunch = bunches
        .create(CreateBunch {
            name: bunch_name.clone(),
            description: "aggregate".into(),
        })
        .await
        .unwrap();

    let prefix = common::unique("agg_k");
    for i in 0..2 {
        let key = keys
            .create(CreateKey {
                name: format!("{prefix}_{i}"),
                description: format!("aggregate {i}"),
            })
            .await
            .unwrap();
        bunches.add_key(bunch.id, key.id).await.unwrap();
    }

    let page = bunches
        .list_keys(
            &BunchKeyFilter {
                bunch_name: Some(bunch_name.clone()),
                ..Default::default()
            },
            &BunchKeySort {
                key_name: Some(SortDirection::Ascending),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 2);
    for row in &page.items {
        assert_eq!(row.bunch.id, bunch.id);
        assert_eq!(row.bunch.name, bunch_name);
        assert_eq!(row.link.bunch_id, bunch.id);
        assert_eq!(row.link.key_id, row.key.id);
        assert!(row.key.name.starts_with(&prefix));
    }
    assert!(page.items[0].key.name < page.items[1].key.name);
}

#[tokio::test]
async fn test_duplicate_bunch_key_pair_is_rejected() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let bunches = BunchService::new(pool.clone());
    let keys = KeyService::new(pool.clone());

    let bunch = bunches
        .create(CreateBunch {
            name: common::unique("pair_b"),
            description: String::new(),
        })
        .await
        .unwrap();
    let key = keys
        .create(CreateKey {
            name: common::unique("pair_k"),
            description: String::new(),
        })
        .await
        .unwrap();

    bunches.add_key(bunch.id, key.id).await.unwrap();
    let err = bunches.add_key(bunch.id, key.id).await.unwrap_err();
    assert!(matches!(err, Error::Duplicate(_)), "got {err:?}");
}

#[tokio::test]
async fn test_remove_key_link_is_idempotent() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let bunches = BunchService::new(pool.clone());
    let keys = KeyService::new(pool.clone());

    let bunch = bunches
        .create(CreateBunch {
            name: common::unique("rm_b"),
            description: String::new(),
        })
        .await
        .unwrap();
    let key = keys
        .create(CreateKey {
            name: common::unique("rm_k"),
            description: String::new(),
        })
        .await
        .unwrap();

    let link_id = bunches.add_key(bunch.id, key.id).await.unwrap();
    bunches.remove_key(link_id).await.unwrap();
    bunches.remove_key(link_id).await.unwrap();

    let page = BunchKey::list(
        &pool,
        &BunchKeyFilter {
            bunch_name: Some(bunch.name),
            ..Default::default()
        },
        &BunchKeySort::default(),
    )
    .await
    .unwrap();
    assert_eq!(page.total, 0);
}
