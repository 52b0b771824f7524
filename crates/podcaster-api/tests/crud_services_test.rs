//! Entity CRUD, validation and category hierarchy through the services.

use uuid::Uuid;

use podcaster_api::payloads::{
    CategoryPayload, EpisodePayload, MediaPayload, ProgramPayload, WallPayload,
};
use podcaster_api::{AppServices, Stores};
use podcaster_core::{ErrorKind, HierarchyConfig};

fn wall_payload(name: &str, description: &str) -> WallPayload {
    WallPayload {
        name: name.to_string(),
        description: description.to_string(),
    }
}

fn category_payload(name: &str, parent_id: Option<Uuid>) -> CategoryPayload {
    CategoryPayload {
        name: name.to_string(),
        description: format!("{} shows", name),
        parent_id,
        clear_parent: false,
    }
}

#[tokio::test]
async fn test_create_assigns_v7_id() {
    let services = AppServices::in_memory();
    let wall = services
        .walls
        .create(&wall_payload("Home", "Landing wall"))
        .await
        .unwrap();

    assert!(podcaster_core::is_v7(&wall.id));
    assert_eq!(services.walls.find(wall.id).await.unwrap(), wall);
}

#[tokio::test]
async fn test_partial_update_preserves_untouched_fields() {
    let services = AppServices::in_memory();
    let wall = services
        .walls
        .create(&wall_payload("X", "old"))
        .await
        .unwrap();

    services
        .walls
        .update(wall.id, &wall_payload("", "new desc"))
        .await
        .unwrap();

    let found = services.walls.find(wall.id).await.unwrap();
    assert_eq!(found.name, "X");
    assert_eq!(found.description, "new desc");
}

#[tokio::test]
async fn test_blank_update_fields_are_left_alone() {
    let services = AppServices::in_memory();
    let wall = services
        .walls
        .create(&wall_payload("X", "old"))
        .await
        .unwrap();

    services
        .walls
        .update(wall.id, &wall_payload("   ", "new desc"))
        .await
        .unwrap();

    let found = services.walls.find(wall.id).await.unwrap();
    assert_eq!(found.name, "X");
    assert_eq!(found.description, "new desc");
}

#[tokio::test]
async fn test_validation_reports_every_missing_field() {
    let services = AppServices::in_memory();
    let err = services
        .walls
        .create(&wall_payload("", ""))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    let errors = err.validation_errors().unwrap();
    assert!(errors.contains_field("name"));
    assert!(errors.contains_field("description"));
    assert!(err.to_string().starts_with("creating wall"));

    assert!(services.walls.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_entity_is_not_found() {
    let services = AppServices::in_memory();
    let id = Uuid::now_v7();

    let err = services.programs.find(id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = services
        .programs
        .update(id, &ProgramPayload::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = services.programs.delete(Uuid::nil()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_episodes_are_listed_by_position() {
    let services = AppServices::in_memory();
    let program = services
        .programs
        .create(&ProgramPayload {
            name: "Morning show".to_string(),
            description: "Daily news".to_string(),
        })
        .await
        .unwrap();

    for position in [3, 1, 2] {
        services
            .episodes
            .create(&EpisodePayload {
                name: format!("Episode {}", position),
                description: "Weekly".to_string(),
                program_id: Some(program.id),
                position,
            })
            .await
            .unwrap();
    }

    let positions: Vec<i32> = services
        .programs
        .find_episodes(program.id)
        .await
        .unwrap()
        .iter()
        .map(|e| e.position)
        .collect();
    assert_eq!(positions, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_episode_update_with_zero_position_keeps_position() {
    let services = AppServices::in_memory();
    let episode = services
        .episodes
        .create(&EpisodePayload {
            name: "Pilot".to_string(),
            description: "First".to_string(),
            program_id: Some(Uuid::now_v7()),
            position: 4,
        })
        .await
        .unwrap();

    services
        .episodes
        .update(
            episode.id,
            &EpisodePayload {
                name: "Pilot (remastered)".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let found = services.episodes.find(episode.id).await.unwrap();
    assert_eq!(found.name, "Pilot (remastered)");
    assert_eq!(found.position, 4);
    assert_eq!(found.program_id, episode.program_id);
}

#[tokio::test]
async fn test_media_create_requires_episode() {
    let services = AppServices::in_memory();
    let err = services
        .media
        .create(&MediaPayload {
            direct_link: "https://cdn.example.com/ep1.mp3".to_string(),
            kind: "audio".to_string(),
            episode_id: None,
        })
        .await
        .unwrap_err();

    let errors = err.validation_errors().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors.contains_field("episode_id"));
}

#[tokio::test]
async fn test_category_parent_resolution() {
    let services = AppServices::in_memory();
    let categories = &services.categories;

    let music = categories
        .create(&category_payload("Music", None))
        .await
        .unwrap();
    let jazz = categories
        .create(&category_payload("Jazz", Some(music.id)))
        .await
        .unwrap();

    assert_eq!(
        categories.find(jazz.id).await.unwrap().parent_id,
        Some(music.id)
    );
    assert_eq!(categories.ancestors(jazz.id).await.unwrap(), vec![music.clone()]);
    assert_eq!(categories.children(music.id).await.unwrap(), vec![jazz.clone()]);
    assert_eq!(categories.roots().await.unwrap(), vec![music.clone()]);

    categories
        .update(
            jazz.id,
            &CategoryPayload {
                clear_parent: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let found = categories.find(jazz.id).await.unwrap();
    assert_eq!(found.parent_id, None);
    assert_eq!(found.name, "Jazz");
}

#[tokio::test]
async fn test_category_move_and_clear_together_is_rejected() {
    let services = AppServices::in_memory();
    let categories = &services.categories;

    let music = categories
        .create(&category_payload("Music", None))
        .await
        .unwrap();
    let talk = categories
        .create(&category_payload("Talk", None))
        .await
        .unwrap();
    let jazz = categories
        .create(&category_payload("Jazz", Some(music.id)))
        .await
        .unwrap();

    let err = categories
        .update(
            jazz.id,
            &CategoryPayload {
                parent_id: Some(talk.id),
                clear_parent: true,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    let errors = err.validation_errors().unwrap();
    assert!(errors.contains_field("parent_id"));
    assert!(errors.contains_field("clear_parent"));
    assert_eq!(
        categories.find(jazz.id).await.unwrap().parent_id,
        Some(music.id)
    );
}

#[tokio::test]
async fn test_cycles_are_allowed_by_default() {
    let services = AppServices::in_memory();
    let categories = &services.categories;

    let a = categories.create(&category_payload("A", None)).await.unwrap();
    let b = categories
        .create(&category_payload("B", Some(a.id)))
        .await
        .unwrap();

    categories
        .update(a.id, &category_payload("", Some(b.id)))
        .await
        .unwrap();

    // The walk stops at the revisited node.
    let ancestors = categories.ancestors(a.id).await.unwrap();
    assert_eq!(ancestors.iter().map(|c| c.id).collect::<Vec<_>>(), vec![b.id]);
}

#[tokio::test]
async fn test_cycles_rejected_when_enabled() {
    let services = AppServices::new(
        Stores::in_memory(),
        HierarchyConfig {
            reject_cycles: true,
            ..Default::default()
        },
    );
    let categories = &services.categories;

    let a = categories.create(&category_payload("A", None)).await.unwrap();
    let b = categories
        .create(&category_payload("B", Some(a.id)))
        .await
        .unwrap();

    let err = categories
        .update(a.id, &category_payload("", Some(b.id)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err
        .validation_errors()
        .unwrap()
        .contains_field("parent_id"));
    assert_eq!(categories.find(a.id).await.unwrap().parent_id, None);
}

#[tokio::test]
async fn test_program_categories_both_directions() {
    let services = AppServices::in_memory();
    let program = services
        .programs
        .create(&ProgramPayload {
            name: "Late jazz".to_string(),
            description: "Night programme".to_string(),
        })
        .await
        .unwrap();
    let jazz = services
        .categories
        .create(&category_payload("Jazz", None))
        .await
        .unwrap();

    services
        .programs
        .overwrite_categories(program.id, &[jazz.id])
        .await
        .unwrap();

    assert_eq!(
        services.programs.find_categories(program.id).await.unwrap(),
        vec![jazz.clone()]
    );
    assert_eq!(
        services.categories.find_programs(jazz.id).await.unwrap(),
        vec![program]
    );
}
