use rusqlite::Connection;
use smarttodo_core::db::open_db_in_memory;
use smarttodo_core::model::task::TaskValidationError;
use smarttodo_core::time::{now_epoch_ms, DAY_MS};
use smarttodo_core::{
    CategoryRepository, CategorySelector, CategoryService, CategoryServiceError,
    DisabledCapability, NewTask, SqliteCategoryRepository, SqliteContextNoteRepository,
    SqliteTaskRepository, TaskListQuery, TaskPatch, TaskService, TaskServiceError, TaskStatus,
};
use uuid::Uuid;

type Service<'a> = TaskService<
    'a,
    SqliteTaskRepository<'a>,
    SqliteCategoryRepository<'a>,
    SqliteContextNoteRepository<'a>,
>;

fn service<'a>(conn: &'a Connection, capability: &'a DisabledCapability) -> Service<'a> {
    TaskService::new(
        SqliteTaskRepository::try_new(conn).unwrap(),
        SqliteCategoryRepository::try_new(conn).unwrap(),
        SqliteContextNoteRepository::try_new(conn).unwrap(),
        capability,
    )
}

#[test]
fn plain_creation_keeps_caller_values() {
    let conn = open_db_in_memory().unwrap();
    let capability = DisabledCapability;
    let tasks = service(&conn, &capability);

    let created = tasks
        .create_task(
            NewTask::new("Pay rent")
                .with_description("transfer before the 1st")
                .with_priority(8)
                .with_deadline(1_700_000_000_000)
                .with_category(CategorySelector::Name("Finance".into())),
            false,
        )
        .unwrap();

    assert_eq!(created.title, "Pay rent");
    assert_eq!(created.description, "transfer before the 1st");
    assert_eq!(created.priority_score, 8);
    assert_eq!(created.deadline, Some(1_700_000_000_000));
    assert_eq!(created.status, TaskStatus::Pending);
    assert_eq!(created.category_name.as_deref(), Some("Finance"));

    let loaded = tasks.get_task(created.uuid).unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn plain_creation_without_category_or_deadline_leaves_them_empty() {
    let conn = open_db_in_memory().unwrap();
    let capability = DisabledCapability;
    let created = service(&conn, &capability)
        .create_task(NewTask::new("Water plants"), false)
        .unwrap();

    assert_eq!(created.category_id, None);
    assert_eq!(created.deadline, None);
    assert_eq!(created.description, "");
}

#[test]
fn invalid_input_is_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let capability = DisabledCapability;
    let tasks = service(&conn, &capability);

    let cases = [
        NewTask::new("Too urgent").with_priority(11),
        NewTask::new("Negative").with_priority(-1),
        NewTask::new("   "),
        NewTask::new("Unknown category").with_category(CategorySelector::Id(404)),
        NewTask::new("Blank category").with_category(CategorySelector::Name("  ".into())),
    ];
    for input in cases {
        assert!(matches!(
            tasks.create_task(input, true),
            Err(TaskServiceError::Validation(_))
        ));
    }

    let listed = tasks.list_tasks(&TaskListQuery::default()).unwrap();
    assert!(listed.is_empty());
    let categories = SqliteCategoryRepository::try_new(&conn).unwrap();
    assert_eq!(categories.count_categories().unwrap(), 0);
}

#[test]
fn unknown_category_id_reports_the_id() {
    let conn = open_db_in_memory().unwrap();
    let capability = DisabledCapability;
    let err = service(&conn, &capability)
        .create_task(
            NewTask::new("x").with_category(CategorySelector::Id(77)),
            false,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TaskServiceError::Validation(TaskValidationError::UnknownCategory(77))
    ));
}

#[test]
fn list_orders_by_priority_then_recency_and_filters() {
    let conn = open_db_in_memory().unwrap();
    let capability = DisabledCapability;
    let tasks = service(&conn, &capability);

    let low = tasks.create_task(NewTask::new("low").with_priority(1), false).unwrap();
    let high = tasks
        .create_task(NewTask::new("high report").with_priority(9), false)
        .unwrap();
    let done = tasks
        .create_task(
            NewTask::new("done report")
                .with_priority(5)
                .with_status(TaskStatus::Done),
            false,
        )
        .unwrap();

    let ordered: Vec<_> = tasks
        .prioritized_tasks(None)
        .unwrap()
        .into_iter()
        .map(|task| task.uuid)
        .collect();
    assert_eq!(ordered, vec![high.uuid, done.uuid, low.uuid]);

    let limited = tasks.prioritized_tasks(Some(1)).unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].uuid, high.uuid);

    let finished = tasks.tasks_by_status(TaskStatus::Done).unwrap();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].uuid, done.uuid);

    let found = tasks
        .list_tasks(&TaskListQuery {
            search: Some("REPORT".into()),
            ..TaskListQuery::default()
        })
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[test]
fn update_applies_patch_without_touching_usage() {
    let conn = open_db_in_memory().unwrap();
    let capability = DisabledCapability;
    let tasks = service(&conn, &capability);
    let created = tasks.create_task(NewTask::new("Draft"), false).unwrap();

    let updated = tasks
        .update_task(
            created.uuid,
            TaskPatch {
                title: Some("Final".into()),
                priority_score: Some(6),
                deadline: Some(Some(42)),
                category: Some(Some(CategorySelector::Name("Work".into()))),
                ..TaskPatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.title, "Final");
    assert_eq!(updated.priority_score, 6);
    assert_eq!(updated.deadline, Some(42));
    assert_eq!(updated.category_name.as_deref(), Some("Work"));
    assert!(updated.updated_at >= created.updated_at);

    let categories = SqliteCategoryRepository::try_new(&conn).unwrap();
    let work = categories.find_by_name("Work").unwrap().unwrap();
    assert_eq!(work.usage_count, 0);

    let cleared = tasks
        .update_task(
            created.uuid,
            TaskPatch {
                deadline: Some(None),
                category: Some(None),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.deadline, None);
    assert_eq!(cleared.category_id, None);
}

#[test]
fn update_rejects_bad_priority_and_missing_task() {
    let conn = open_db_in_memory().unwrap();
    let capability = DisabledCapability;
    let tasks = service(&conn, &capability);
    let created = tasks.create_task(NewTask::new("Draft"), false).unwrap();

    assert!(matches!(
        tasks.update_task(
            created.uuid,
            TaskPatch {
                priority_score: Some(12),
                ..TaskPatch::default()
            }
        ),
        Err(TaskServiceError::Validation(TaskValidationError::PriorityOutOfRange(12)))
    ));

    let missing = Uuid::new_v4();
    assert!(matches!(
        tasks.update_task_status(missing, TaskStatus::Done),
        Err(TaskServiceError::TaskNotFound(id)) if id == missing
    ));
    assert!(matches!(
        tasks.delete_task(missing),
        Err(TaskServiceError::TaskNotFound(_))
    ));
}

#[test]
fn status_update_and_delete() {
    let conn = open_db_in_memory().unwrap();
    let capability = DisabledCapability;
    let tasks = service(&conn, &capability);
    let created = tasks.create_task(NewTask::new("Ship"), false).unwrap();

    let moved = tasks
        .update_task_status(created.uuid, TaskStatus::InProgress)
        .unwrap();
    assert_eq!(moved.status, TaskStatus::InProgress);

    tasks.delete_task(created.uuid).unwrap();
    assert!(tasks.get_task(created.uuid).unwrap().is_none());
}

#[test]
fn stats_count_status_priority_and_overdue() {
    let conn = open_db_in_memory().unwrap();
    let capability = DisabledCapability;
    let tasks = service(&conn, &capability);
    let now = now_epoch_ms();

    tasks
        .create_task(
            NewTask::new("late")
                .with_priority(7)
                .with_deadline(now - DAY_MS)
                .with_category(CategorySelector::Name("Work".into())),
            false,
        )
        .unwrap();
    tasks
        .create_task(
            NewTask::new("late but done")
                .with_deadline(now - DAY_MS)
                .with_status(TaskStatus::Done),
            false,
        )
        .unwrap();
    tasks
        .create_task(
            NewTask::new("future")
                .with_priority(3)
                .with_deadline(now + DAY_MS)
                .with_status(TaskStatus::InProgress),
            false,
        )
        .unwrap();

    let stats = tasks.task_stats(now).unwrap();
    assert_eq!(stats.tasks.total_tasks, 3);
    assert_eq!(stats.tasks.pending_tasks, 1);
    assert_eq!(stats.tasks.in_progress_tasks, 1);
    assert_eq!(stats.tasks.completed_tasks, 1);
    assert_eq!(stats.tasks.high_priority_tasks, 1);
    assert_eq!(stats.tasks.overdue_tasks, 1);
    assert_eq!(stats.categories_count, 1);
    assert_eq!(stats.context_notes_count, 0);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["total_tasks"], 3);
    assert_eq!(json["categories_count"], 1);
}

#[test]
fn deleting_a_category_keeps_its_tasks() {
    let conn = open_db_in_memory().unwrap();
    let capability = DisabledCapability;
    let tasks = service(&conn, &capability);
    let created = tasks
        .create_task(
            NewTask::new("Gym").with_category(CategorySelector::Name("Health".into())),
            false,
        )
        .unwrap();
    let category_id = created.category_id.unwrap();

    let categories = CategoryService::new(SqliteCategoryRepository::try_new(&conn).unwrap());
    categories.delete_category(category_id).unwrap();

    let reloaded = tasks.get_task(created.uuid).unwrap().unwrap();
    assert_eq!(reloaded.category_id, None);
    assert_eq!(reloaded.category_name, None);
    assert!(matches!(
        categories.delete_category(category_id),
        Err(CategoryServiceError::CategoryNotFound(_))
    ));
}

#[test]
fn category_service_get_or_create_rename_and_popularity() {
    let conn = open_db_in_memory().unwrap();
    let capability = DisabledCapability;
    let tasks = service(&conn, &capability);
    let categories = CategoryService::new(SqliteCategoryRepository::try_new(&conn).unwrap());

    let home = categories.get_or_create_category("  Home ").unwrap();
    assert_eq!(home.name, "Home");
    assert_eq!(home.usage_count, 0);
    let again = categories.get_or_create_category("Home").unwrap();
    assert_eq!(again.id, home.id);

    for title in ["a", "b"] {
        tasks
            .create_task(
                NewTask::new(title).with_category(CategorySelector::Name("Work".into())),
                false,
            )
            .unwrap();
    }
    tasks
        .create_task(
            NewTask::new("c").with_category(CategorySelector::Id(home.id)),
            false,
        )
        .unwrap();
    categories.get_or_create_category("Art").unwrap();

    let popular: Vec<_> = categories
        .popular_categories(None)
        .unwrap()
        .into_iter()
        .map(|category| (category.name, category.usage_count))
        .collect();
    assert_eq!(
        popular,
        vec![
            ("Work".to_string(), 2),
            ("Home".to_string(), 1),
            ("Art".to_string(), 0),
        ]
    );
    assert_eq!(categories.popular_categories(Some(1)).unwrap().len(), 1);

    let renamed = categories.rename_category(home.id, "House").unwrap();
    assert_eq!(renamed.name, "House");
    assert!(matches!(
        categories.rename_category(home.id, "Work"),
        Err(CategoryServiceError::NameConflict(_))
    ));
    assert!(matches!(
        categories.get_or_create_category(""),
        Err(CategoryServiceError::InvalidName(_))
    ));
}
