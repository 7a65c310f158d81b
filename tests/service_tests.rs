use chrono::NaiveDate;
use comic_workflow::{
    ActorId, InitializeRequest, MemoryStore, Project, ProjectStore, RetentionPolicy,
    ScheduleAnchor, SchedulingMode, StageProgress, StepStatus, StepType, StepUpdate,
    TalentAssignments, TalentProgressStatus, TalentRole, TimelineFormData, User, WorkflowError,
    WorkflowService, WorkflowStep,
};
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn editor() -> ActorId {
    ActorId::new("editor@studio")
}

fn setup(project: Project) -> (Arc<MemoryStore>, WorkflowService) {
    comic_workflow::logging::init_test();
    let store = Arc::new(MemoryStore::new());
    store.insert_project(project);
    let service = WorkflowService::new(store.clone()).with_clock(|| date(2025, 1, 1));
    (store, service)
}

fn sample_project() -> Project {
    Project::new(1, "Night Shift #1", date(2025, 1, 6))
}

fn step_of(steps: &[WorkflowStep], step_type: StepType) -> &WorkflowStep {
    steps.iter().find(|s| s.step_type == step_type).unwrap()
}

#[test]
fn initialize_creates_all_stages_in_order() {
    let (_, service) = setup(sample_project());
    let run = service
        .initialize_workflow(1, &InitializeRequest::new(editor()))
        .unwrap();

    assert_eq!(run.project_id, 1);
    assert_eq!(run.actor, editor());
    assert_eq!(run.replaced, 0);
    assert_eq!(run.anchor, ScheduleAnchor::StartOn(date(2025, 1, 6)));
    assert_eq!(run.steps.len(), 9);
    let types: Vec<StepType> = run.steps.iter().map(|s| s.step_type).collect();
    assert_eq!(types, StepType::ALL.to_vec());
    assert!(run.steps.iter().all(|s| s.status == StepStatus::NotStarted));

    let pencils = step_of(&run.steps, StepType::Pencils);
    assert_eq!(pencils.start_date, Some(date(2025, 1, 31)));
    assert_eq!(pencils.due_date, Some(date(2025, 3, 3)));

    assert_eq!(service.steps(1).unwrap(), run.steps);
}

#[test]
fn reinitialize_requires_confirmation() {
    let (_, service) = setup(sample_project());
    let first = service
        .initialize_workflow(1, &InitializeRequest::new(editor()))
        .unwrap();

    let err = service
        .initialize_workflow(1, &InitializeRequest::new(editor()))
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::ReplaceNotConfirmed {
            project_id: 1,
            existing: 9
        }
    ));
    assert_eq!(service.steps(1).unwrap(), first.steps);

    let second = service
        .initialize_workflow(1, &InitializeRequest::new(editor()).confirmed())
        .unwrap();
    assert_eq!(second.replaced, 9);
    assert_eq!(service.steps(1).unwrap().len(), 9);
}

#[test]
fn confirmed_rebuild_keeps_step_state_by_default() {
    let (_, service) = setup(sample_project());
    let run = service
        .initialize_workflow(1, &InitializeRequest::new(editor()))
        .unwrap();
    let pencils_id = step_of(&run.steps, StepType::Pencils).id;
    service
        .update_step(
            pencils_id,
            &StepUpdate {
                status: Some(StepStatus::InProgress),
                progress: Some(40),
                description: Some("issue one layouts".to_string()),
                ..StepUpdate::default()
            },
            &editor(),
        )
        .unwrap();

    let rebuilt = service
        .initialize_workflow(1, &InitializeRequest::new(editor()).confirmed())
        .unwrap();
    let pencils = step_of(&rebuilt.steps, StepType::Pencils);
    assert_ne!(pencils.id, pencils_id);
    assert_eq!(pencils.status, StepStatus::InProgress);
    assert_eq!(pencils.progress, 40);
    assert_eq!(pencils.description.as_deref(), Some("issue one layouts"));
    assert_eq!(pencils.due_date, Some(date(2025, 3, 3)));

    let inks = step_of(&rebuilt.steps, StepType::Inks);
    assert_eq!(inks.status, StepStatus::NotStarted);
}

#[test]
fn replace_policy_resets_step_state() {
    let (_, service) = setup(sample_project());
    let run = service
        .initialize_workflow(1, &InitializeRequest::new(editor()))
        .unwrap();
    let plot_id = step_of(&run.steps, StepType::Plot).id;
    service
        .update_step(
            plot_id,
            &StepUpdate {
                status: Some(StepStatus::InProgress),
                progress: Some(75),
                ..StepUpdate::default()
            },
            &editor(),
        )
        .unwrap();

    let rebuilt = service
        .initialize_workflow(
            1,
            &InitializeRequest::new(editor())
                .confirmed()
                .with_retention(RetentionPolicy::Replace),
        )
        .unwrap();
    let plot = step_of(&rebuilt.steps, StepType::Plot);
    assert_eq!(plot.status, StepStatus::NotStarted);
    assert_eq!(plot.progress, 0);
}

#[test]
fn due_date_change_rebuilds_existing_workflow() {
    let (store, service) = setup(sample_project());
    service
        .initialize_workflow(1, &InitializeRequest::new(editor()))
        .unwrap();

    let run = service
        .recompute_on_due_date_change(1, date(2025, 6, 30), &editor())
        .unwrap()
        .expect("workflow rebuilt");
    assert_eq!(run.anchor, ScheduleAnchor::FinishBy(date(2025, 6, 30)));
    assert_eq!(run.replaced, 9);
    assert_eq!(
        step_of(&run.steps, StepType::Print).due_date,
        Some(date(2025, 6, 30))
    );
    assert_eq!(
        step_of(&run.steps, StepType::Plot).start_date,
        Some(date(2025, 3, 20))
    );
    assert!(run.feasibility.is_feasible());

    let stored = store.get_project(1).unwrap().unwrap();
    assert_eq!(stored.config.due_date, Some(date(2025, 6, 30)));
}

#[test]
fn due_date_change_without_workflow_only_records_date() {
    let (store, service) = setup(sample_project());
    let run = service
        .recompute_on_due_date_change(1, date(2025, 6, 30), &editor())
        .unwrap();
    assert!(run.is_none());
    assert!(service.steps(1).unwrap().is_empty());
    assert_eq!(
        store.get_project(1).unwrap().unwrap().config.due_date,
        Some(date(2025, 6, 30))
    );
}

#[test]
fn invalid_due_date_rebuild_leaves_project_untouched() {
    let (store, service) = setup(sample_project());
    service
        .initialize_workflow(1, &InitializeRequest::new(editor()))
        .unwrap();
    let mut broken = sample_project();
    broken.config.interior_page_count = 5000;
    broken.config.penciler_pages_per_week = 1;
    store.update_project(&broken).unwrap();

    let err = service
        .recompute_on_due_date_change(1, date(2025, 6, 30), &editor())
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidConfiguration { .. }));
    assert_eq!(store.get_project(1).unwrap().unwrap().config.due_date, None);
    assert_eq!(service.steps(1).unwrap().len(), 9);
}

#[test]
fn unknown_project_is_not_found() {
    let (_, service) = setup(sample_project());
    assert!(matches!(
        service.initialize_workflow(99, &InitializeRequest::new(editor())),
        Err(WorkflowError::ProjectNotFound(99))
    ));
    assert!(matches!(
        service.recompute_on_due_date_change(99, date(2025, 6, 30), &editor()),
        Err(WorkflowError::ProjectNotFound(99))
    ));
    assert!(matches!(
        service.feasibility(99),
        Err(WorkflowError::ProjectNotFound(99))
    ));
}

#[test]
fn talent_is_assigned_from_project_and_roles() {
    let mut project = sample_project();
    project.talent = TalentAssignments {
        letterer: Some(30),
        // no such user; falls back to the single writer
        writer: Some(999),
        ..TalentAssignments::default()
    };
    let (store, service) = setup(project);
    store.insert_user(User::new(10, "Ada", TalentRole::Writer));
    store.insert_user(User::new(20, "Ben", TalentRole::Penciler));
    store.insert_user(User::new(21, "Cam", TalentRole::Inker));
    store.insert_user(User::new(22, "Dee", TalentRole::Inker));
    store.insert_user(User::new(30, "Eve", TalentRole::Letterer));
    store.insert_user(User::new(31, "Fin", TalentRole::Letterer));

    let run = service
        .initialize_workflow(1, &InitializeRequest::new(editor()))
        .unwrap();
    assert_eq!(step_of(&run.steps, StepType::Plot).assigned_to, Some(10));
    assert_eq!(step_of(&run.steps, StepType::Script).assigned_to, Some(10));
    assert_eq!(step_of(&run.steps, StepType::Pencils).assigned_to, Some(20));
    assert_eq!(step_of(&run.steps, StepType::Inks).assigned_to, None);
    assert_eq!(step_of(&run.steps, StepType::Letters).assigned_to, Some(30));
    assert_eq!(step_of(&run.steps, StepType::Colors).assigned_to, None);
}

#[test]
fn step_updates_follow_status_rules() {
    let (store, service) = setup(sample_project());
    store.insert_user(User::new(7, "Gus", TalentRole::Colorist));
    let run = service
        .initialize_workflow(1, &InitializeRequest::new(editor()))
        .unwrap();
    let colors_id = step_of(&run.steps, StepType::Colors).id;

    let err = service
        .update_step(
            colors_id,
            &StepUpdate {
                status: Some(StepStatus::Approved),
                ..StepUpdate::default()
            },
            &editor(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidStatusTransition {
            from: StepStatus::NotStarted,
            to: StepStatus::Approved
        }
    ));

    let err = service
        .update_step(
            colors_id,
            &StepUpdate {
                progress: Some(120),
                ..StepUpdate::default()
            },
            &editor(),
        )
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidProgress(120)));

    let err = service
        .update_step(
            colors_id,
            &StepUpdate {
                assigned_to: Some(404),
                ..StepUpdate::default()
            },
            &editor(),
        )
        .unwrap_err();
    assert!(matches!(err, WorkflowError::UserNotFound(404)));

    for status in [StepStatus::InProgress, StepStatus::Completed] {
        service
            .update_step(
                colors_id,
                &StepUpdate {
                    status: Some(status),
                    ..StepUpdate::default()
                },
                &editor(),
            )
            .unwrap();
    }
    let colors = service
        .update_step(
            colors_id,
            &StepUpdate {
                assigned_to: Some(7),
                ..StepUpdate::default()
            },
            &editor(),
        )
        .unwrap();
    assert_eq!(colors.status, StepStatus::Completed);
    assert_eq!(colors.progress, 100);
    assert_eq!(colors.assigned_to, Some(7));

    let cleared = service
        .update_step(
            colors_id,
            &StepUpdate {
                clear_assignment: true,
                ..StepUpdate::default()
            },
            &editor(),
        )
        .unwrap();
    assert_eq!(cleared.assigned_to, None);

    assert!(matches!(
        service.update_step(9999, &StepUpdate::default(), &editor()),
        Err(WorkflowError::StepNotFound(9999))
    ));
}

#[test]
fn stored_workflow_feasibility_tracks_project_dates() {
    let mut project = sample_project();
    project.config.scheduling_mode = SchedulingMode::Forward;
    project.config.due_date = Some(date(2025, 4, 10));
    let (_, service) = setup(project);
    service
        .initialize_workflow(1, &InitializeRequest::new(editor()))
        .unwrap();

    let report = service.feasibility(1).unwrap();
    assert_eq!(report.projected_completion, Some(date(2025, 4, 18)));
    assert_eq!(report.days_late, 8);
    assert_eq!(report.start_in_past_days, 0);
}

#[test]
fn concurrent_rebuilds_do_not_duplicate_steps() {
    let (_, service) = setup(sample_project());
    let service = Arc::new(service);
    service
        .initialize_workflow(1, &InitializeRequest::new(editor()))
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            std::thread::spawn(move || {
                service
                    .initialize_workflow(
                        1,
                        &InitializeRequest::new(ActorId::new(format!("worker-{i}"))).confirmed(),
                    )
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().replaced, 9);
    }
    assert_eq!(service.steps(1).unwrap().len(), 9);
}

#[test]
fn stateless_calculators_are_exposed() {
    let (_, service) = setup(sample_project());
    let timeline = service
        .calculate_timeline(&TimelineFormData::forward_from(date(2025, 1, 1)))
        .unwrap();
    assert_eq!(timeline.in_store_date, date(2025, 2, 3));

    let progress = StageProgress {
        total_pages: 20,
        completed_pages: 20,
        pages_per_week: 5,
        start_date: date(2024, 12, 1),
        due_date: date(2024, 12, 31),
    };
    assert_eq!(
        service.classify_progress(&progress, None),
        TalentProgressStatus::Complete
    );
}
