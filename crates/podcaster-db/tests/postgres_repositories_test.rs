//! Postgres repository tests.
//!
//! These need a live server (`DATABASE_URL`) and run with
//! `cargo test -p podcaster-db -- --ignored`.

use std::collections::BTreeSet;

use podcaster_db::test_fixtures::TestDatabase;
use podcaster_db::{
    new_v7, AssociationRepository, Category, CategoryPatch, DesiredSet, EntityRepository,
    Episode, EpisodeRepository, ErrorKind, OverwriteEngine, ParentUpdate, ProgramTag, Wall,
    WallBlock, WallPatch,
};
use uuid::Uuid;

fn wall(name: &str) -> Wall {
    Wall {
        id: new_v7(),
        name: name.to_string(),
        description: format!("{} wall", name),
    }
}

#[tokio::test]
#[ignore]
async fn test_wall_crud_and_partial_update() {
    let test_db = TestDatabase::new().await;
    let walls = &test_db.db.walls;

    let w = wall("Home");
    walls.create(w.clone()).await.unwrap();
    walls
        .update(
            w.id,
            WallPatch {
                name: None,
                description: Some("new desc".to_string()),
            },
        )
        .await
        .unwrap();

    let found = walls.find(w.id).await.unwrap();
    assert_eq!(found.name, "Home");
    assert_eq!(found.description, "new desc");

    walls.delete(w.id).await.unwrap();
    let err = walls.find(w.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn test_update_missing_is_not_found() {
    let test_db = TestDatabase::new().await;
    let err = test_db
        .db
        .walls
        .update(new_v7(), WallPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    test_db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn test_category_parent_update_modes() {
    let test_db = TestDatabase::new().await;
    let categories = &test_db.db.categories;

    let music = Category {
        id: new_v7(),
        name: "Music".to_string(),
        description: "All music".to_string(),
        parent_id: None,
    };
    let jazz = Category {
        id: new_v7(),
        name: "Jazz".to_string(),
        description: "Jazz shows".to_string(),
        parent_id: Some(music.id),
    };
    categories.create(music.clone()).await.unwrap();
    categories.create(jazz.clone()).await.unwrap();

    categories
        .update(
            jazz.id,
            CategoryPatch {
                name: Some("Modern jazz".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        categories.find(jazz.id).await.unwrap().parent_id,
        Some(music.id)
    );

    categories
        .update(
            jazz.id,
            CategoryPatch {
                parent: ParentUpdate::Clear,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(categories.find(jazz.id).await.unwrap().parent_id, None);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn test_episodes_by_program() {
    let test_db = TestDatabase::new().await;
    let episodes = &test_db.db.episodes;
    let program = new_v7();

    for position in [2, 0, 1] {
        episodes
            .create(Episode {
                id: new_v7(),
                name: format!("Episode {}", position),
                description: "Weekly".to_string(),
                program_id: program,
                position,
            })
            .await
            .unwrap();
    }

    let found = episodes.find_by_program(program).await.unwrap();
    let positions: Vec<i32> = found.iter().map(|e| e.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn test_transactional_overwrite_replaces_set() {
    let test_db = TestDatabase::new().await;
    let store = &test_db.db.wall_blocks;
    let engine = OverwriteEngine::new();
    let wall_id = new_v7();
    let (b1, b2, b3) = (new_v7(), new_v7(), new_v7());

    engine
        .overwrite(store, wall_id, DesiredSet::ordered(vec![(b1, 0), (b2, 1)]))
        .await
        .unwrap();
    let report = engine
        .overwrite(store, wall_id, DesiredSet::ordered(vec![(b2, 0), (b3, 1)]))
        .await
        .unwrap();
    assert_eq!((report.removed, report.created), (2, 2));

    let pairs: BTreeSet<(Uuid, i32)> = store
        .find_by_parent(wall_id)
        .await
        .unwrap()
        .into_iter()
        .map(|wb: WallBlock| (wb.block_id, wb.position))
        .collect();
    assert_eq!(pairs, [(b2, 0), (b3, 1)].into_iter().collect());

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn test_association_lookups_and_idempotent_delete() {
    let test_db = TestDatabase::new().await;
    let store = &test_db.db.program_tags;
    let (program, tag) = (new_v7(), new_v7());

    let row = ProgramTag {
        id: new_v7(),
        program_id: program,
        tag_id: tag,
    };
    store.create(row.clone()).await.unwrap();

    assert_eq!(store.find(row.id).await.unwrap(), row);
    assert_eq!(store.find_by_child(tag).await.unwrap().len(), 1);
    assert_eq!(
        store
            .find_by_parent_and_child(program, tag)
            .await
            .unwrap()
            .len(),
        1
    );

    store.delete(row.id).await.unwrap();
    store.delete(row.id).await.unwrap();
    assert!(store.find_by_parent(program).await.unwrap().is_empty());

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn test_failed_transactional_overwrite_is_not_partial() {
    let test_db = TestDatabase::new().await;
    let store = &test_db.db.program_tags;
    let program = new_v7();
    let tag = new_v7();

    let existing = ProgramTag {
        id: new_v7(),
        program_id: program,
        tag_id: new_v7(),
    };
    store.create(existing.clone()).await.unwrap();

    // Two rows for the same (program, tag) violate the unique constraint.
    let rows = vec![
        ProgramTag {
            id: new_v7(),
            program_id: program,
            tag_id: tag,
        },
        ProgramTag {
            id: new_v7(),
            program_id: program,
            tag_id: tag,
        },
    ];
    let err = store.replace_for_parent(program, rows).await.unwrap_err();
    assert!(matches!(
        err,
        podcaster_db::Error::Overwrite { partial: false, .. }
    ));

    assert_eq!(store.find_by_parent(program).await.unwrap(), vec![existing]);

    test_db.cleanup().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_advisory_lock_serializes_independent_engines() {
    let test_db = TestDatabase::new().await;
    let wall_id = new_v7();

    let sets: Vec<Vec<(Uuid, i32)>> = (0..6)
        .map(|_| (0..3).map(|i| (new_v7(), i)).collect())
        .collect();

    // Separate engines share no in-process lock; only Postgres serializes them.
    let tasks = sets.iter().cloned().map(|set| {
        let store = test_db.db.wall_blocks.clone();
        tokio::spawn(async move {
            OverwriteEngine::new()
                .overwrite(&store, wall_id, DesiredSet::ordered(set))
                .await
        })
    });
    for result in futures::future::join_all(tasks).await {
        result.unwrap().unwrap();
    }

    let final_state: BTreeSet<(Uuid, i32)> = test_db
        .db
        .wall_blocks
        .find_by_parent(wall_id)
        .await
        .unwrap()
        .into_iter()
        .map(|wb| (wb.block_id, wb.position))
        .collect();
    assert_eq!(final_state.len(), 3);
    assert!(sets
        .iter()
        .any(|set| set.iter().copied().collect::<BTreeSet<_>>() == final_state));

    test_db.cleanup().await;
}
