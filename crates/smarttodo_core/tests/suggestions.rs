use rusqlite::Connection;
use smarttodo_core::db::open_db_in_memory;
use smarttodo_core::service::suggestion_service::SuggestionOutcome;
use smarttodo_core::time::{now_epoch_ms, DAY_MS};
use smarttodo_core::{
    CompletionPurpose, ContextService, InsightRecord, NewTask, ScriptedCapability, SourceKind,
    SqliteCategoryRepository, SqliteContextNoteRepository, SqliteTaskRepository, SuggestionError,
    SuggestionRequest, SuggestionService, SuggestionType, Task, TaskListQuery, TaskRepository,
    TaskService, TaskStatus, TextAnalysisCapability,
};
use uuid::Uuid;

fn seed_notes(conn: &Connection, contents: &[&str]) -> Vec<Uuid> {
    let quiet = ScriptedCapability::disabled();
    let notes = ContextService::new(SqliteContextNoteRepository::try_new(conn).unwrap(), &quiet);
    contents
        .iter()
        .map(|content| {
            notes
                .create_context_note(*content, SourceKind::Email)
                .unwrap()
                .uuid
        })
        .collect()
}

fn seed_task(conn: &Connection, input: NewTask) -> Task {
    let quiet = ScriptedCapability::disabled();
    TaskService::new(
        SqliteTaskRepository::try_new(conn).unwrap(),
        SqliteCategoryRepository::try_new(conn).unwrap(),
        SqliteContextNoteRepository::try_new(conn).unwrap(),
        &quiet,
    )
    .create_task(input, false)
    .unwrap()
}

fn suggestions<'a>(
    conn: &'a Connection,
    capability: &'a dyn TextAnalysisCapability,
) -> SuggestionService<'a, SqliteTaskRepository<'a>, SqliteContextNoteRepository<'a>> {
    SuggestionService::new(
        SqliteTaskRepository::try_new(conn).unwrap(),
        SqliteContextNoteRepository::try_new(conn).unwrap(),
        capability,
    )
}

#[test]
fn default_prioritization_uses_recent_notes_and_open_tasks() {
    let conn = open_db_in_memory().unwrap();
    seed_notes(
        &conn,
        &["Board meeting moved up", "Invoice overdue", "Gym at 6"],
    );
    let first = seed_task(&conn, NewTask::new("Prepare board deck").with_priority(6));
    let second = seed_task(&conn, NewTask::new("Pay invoice").with_priority(2));
    seed_task(
        &conn,
        NewTask::new("Old chore").with_status(TaskStatus::Done),
    );

    let capability = ScriptedCapability::enabled()
        .with_response(
            CompletionPurpose::Insight,
            r#"{"keywords": ["board", "invoice"], "urgency_indicators": ["overdue"]}"#,
        )
        .with_response(CompletionPurpose::Priority, "[7, 12]");

    let result = suggestions(&conn, &capability)
        .get_suggestions(&SuggestionRequest::default())
        .unwrap();

    assert_eq!(result.suggestion_type, SuggestionType::Prioritization);
    assert_eq!(result.context_analysis.keywords, vec!["board", "invoice"]);
    let insight_prompt = &capability.calls()[0].user_prompt;
    for content in ["Board meeting moved up", "Invoice overdue", "Gym at 6"] {
        assert!(insight_prompt.contains(content));
    }

    match result.outcome {
        SuggestionOutcome::PrioritizedTasks(items) => {
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].task_id, first.uuid);
            assert_eq!(items[0].original_priority, 6);
            assert_eq!(items[0].suggested_priority, 7);
            assert_eq!(items[1].task_id, second.uuid);
            assert_eq!(items[1].suggested_priority, 10);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn suggestions_never_write() {
    let conn = open_db_in_memory().unwrap();
    let task = seed_task(&conn, NewTask::new("Call mom").with_priority(3));
    let capability = ScriptedCapability::enabled()
        .with_response(CompletionPurpose::Priority, "[9]")
        .with_response(CompletionPurpose::Category, "Family");

    let service = suggestions(&conn, &capability);
    for suggestion_type in [
        SuggestionType::Prioritization,
        SuggestionType::Categorization,
    ] {
        service
            .get_suggestions(&SuggestionRequest {
                suggestion_type,
                ..SuggestionRequest::default()
            })
            .unwrap();
    }

    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    assert_eq!(repo.get_task(task.uuid).unwrap().unwrap(), task);
    let categories: i64 = conn
        .query_row("SELECT COUNT(*) FROM categories;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(categories, 0);
}

#[test]
fn explicit_ids_keep_requested_order() {
    let conn = open_db_in_memory().unwrap();
    let notes = seed_notes(&conn, &["first", "second", "ignored"]);
    let a = seed_task(&conn, NewTask::new("a"));
    let b = seed_task(&conn, NewTask::new("b").with_status(TaskStatus::Done));

    let capability = ScriptedCapability::enabled()
        .with_response(CompletionPurpose::Insight, "{}")
        .with_response(CompletionPurpose::Category, "Work");
    let result = suggestions(&conn, &capability)
        .get_suggestions(&SuggestionRequest {
            task_ids: vec![b.uuid, a.uuid],
            context_note_ids: vec![notes[1], notes[0]],
            suggestion_type: SuggestionType::Categorization,
        })
        .unwrap();

    let prompt = &capability.calls()[0].user_prompt;
    assert!(prompt.find("second").unwrap() < prompt.find("first").unwrap());
    assert!(!prompt.contains("ignored"));

    match result.outcome {
        SuggestionOutcome::CategorizedTasks(items) => {
            let ids: Vec<_> = items.iter().map(|item| item.task_id).collect();
            assert_eq!(ids, vec![b.uuid, a.uuid]);
            assert!(items.iter().all(|item| item.suggested_category == "Work"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn deadline_and_enhancement_suggestions_fall_back_when_disabled() {
    let conn = open_db_in_memory().unwrap();
    let task = seed_task(
        &conn,
        NewTask::new("Renew insurance").with_description("car"),
    );
    let capability = ScriptedCapability::disabled();
    let service = suggestions(&conn, &capability);
    let before = now_epoch_ms();

    let deadlines = service
        .get_suggestions(&SuggestionRequest {
            suggestion_type: SuggestionType::Deadline,
            ..SuggestionRequest::default()
        })
        .unwrap();
    match deadlines.outcome {
        SuggestionOutcome::DeadlineSuggestions(items) => {
            assert_eq!(items.len(), 1);
            assert_eq!(items[0].current_deadline, None);
            assert!(items[0].suggested_deadline >= before + 7 * DAY_MS);
            assert!(items[0].suggested_deadline <= now_epoch_ms() + 7 * DAY_MS);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    let enhanced = service
        .get_suggestions(&SuggestionRequest {
            task_ids: vec![task.uuid],
            suggestion_type: SuggestionType::Enhancement,
            ..SuggestionRequest::default()
        })
        .unwrap();
    match enhanced.outcome {
        SuggestionOutcome::EnhancedTasks(items) => {
            assert_eq!(items[0].enhanced_description, "car");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(enhanced.context_analysis, InsightRecord::default());
}

#[test]
fn no_tasks_gives_an_empty_outcome() {
    let conn = open_db_in_memory().unwrap();
    let capability = ScriptedCapability::disabled();
    let result = suggestions(&conn, &capability)
        .get_suggestions(&SuggestionRequest::default())
        .unwrap();
    assert!(result.outcome.is_empty());

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["suggestion_type"], "prioritization");
    assert_eq!(json["outcome"]["kind"], "prioritized_tasks");
    assert_eq!(json["context_analysis"]["sentiment_score"], 0.0);
}

#[test]
fn unknown_ids_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    seed_task(&conn, NewTask::new("exists"));
    let capability = ScriptedCapability::disabled();
    let service = suggestions(&conn, &capability);

    let missing_task = Uuid::new_v4();
    assert!(matches!(
        service.get_suggestions(&SuggestionRequest {
            task_ids: vec![missing_task],
            ..SuggestionRequest::default()
        }),
        Err(SuggestionError::TaskNotFound(id)) if id == missing_task
    ));

    let missing_note = Uuid::new_v4();
    assert!(matches!(
        service.get_suggestions(&SuggestionRequest {
            context_note_ids: vec![missing_note],
            ..SuggestionRequest::default()
        }),
        Err(SuggestionError::NoteNotFound(id)) if id == missing_note
    ));

    let listed = SqliteTaskRepository::try_new(&conn)
        .unwrap()
        .list_tasks(&TaskListQuery::default())
        .unwrap();
    assert_eq!(listed.len(), 1);
}
