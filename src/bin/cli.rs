use chrono::NaiveDate;
use comic_workflow::{
    ActorId, AppConfig, DistributionMethod, InitializeRequest, MemoryStore, Project,
    ProjectStore, RetentionPolicy, StepStatus, StepUpdate, TalentRole, TimelineFormData, User,
    WorkflowService, WorkflowStep, logging, save_steps_to_csv, save_steps_to_json,
};
use std::fs;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

fn render_row(cells: &[&str], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(cell.len())));
        line.push_str(" |");
    }
    line
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(headers, &widths));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&render_row(&cells, &widths));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_steps(steps: &[WorkflowStep]) -> String {
    let fmt_date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
    let rows: Vec<Vec<String>> = steps
        .iter()
        .map(|step| {
            vec![
                step.id.to_string(),
                step.sort_order.to_string(),
                step.step_type.to_string(),
                step.status.to_string(),
                step.progress.to_string(),
                fmt_date(step.start_date),
                fmt_date(step.due_date),
                step.assigned_to.map(|id| id.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    render_text_table(
        &[
            "id", "order", "step", "status", "progress", "start", "due", "assigned",
        ],
        &rows,
    )
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  project load <json_path>           Load a project (or array of projects) from JSON\n  project show <id>                  Show project configuration\n  user add <id> <role> <name...>     Register talent (roles: writer, penciler, inker, colorist, letterer, cover_artist, production)\n  init <project_id> [confirm] [keep|replace]\n                                     Initialize the workflow (confirm to replace existing steps)\n  steps <project_id>                 Show workflow steps\n  due <project_id> <YYYY-MM-DD>      Change due date and rebuild the workflow\n  feasibility <project_id>           Report schedule feasibility\n  status <step_id> <status>          Move a step to a new status\n  progress <step_id> <0-100>         Set step progress\n  timeline <forward|backward> <YYYY-MM-DD> <method> [queue printing shipping processing]\n                                     Print/distribution dates (methods: distributor, direct, fulfillment, event)\n  save <json|csv> <project_id> <path>\n                                     Export workflow steps\n  quit|exit                          Exit"
    );
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_role(s: &str) -> Option<TalentRole> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
}

fn parse_method(s: &str) -> Option<DistributionMethod> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
}

fn load_projects(store: &MemoryStore, path: &str) -> Result<Vec<i32>, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("Failed to read {path}: {e}"))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| format!("Invalid JSON: {e}"))?;
    let projects: Vec<Project> = if value.is_array() {
        serde_json::from_value(value).map_err(|e| format!("Invalid project list: {e}"))?
    } else {
        vec![serde_json::from_value(value).map_err(|e| format!("Invalid project: {e}"))?]
    };
    let ids = projects.iter().map(|p| p.id).collect();
    for project in projects {
        store.insert_project(project);
    }
    Ok(ids)
}

fn handle_timeline(args: &[&str]) {
    if args.len() < 3 {
        println!("Usage: timeline <forward|backward> <YYYY-MM-DD> <method> [queue printing shipping processing]");
        return;
    }
    let Some(anchor) = parse_date(args[1]) else {
        println!("Invalid date '{}'. Use YYYY-MM-DD.", args[1]);
        return;
    };
    let mut form = match args[0] {
        "forward" => TimelineFormData::forward_from(anchor),
        "backward" => TimelineFormData::backward_from(anchor),
        other => {
            println!("Unknown direction '{other}'.");
            return;
        }
    };
    let Some(method) = parse_method(args[2]) else {
        println!("Unknown distribution method '{}'.", args[2]);
        return;
    };
    form.distribution_method = method;

    let days: Vec<i64> = match args[3..].iter().map(|v| v.parse::<i64>()).collect() {
        Ok(days) => days,
        Err(_) => {
            println!("Day counts must be whole numbers.");
            return;
        }
    };
    if let Some(&queue) = days.first() {
        form.printer_queue_days = queue;
    }
    if let Some(&printing) = days.get(1) {
        form.printing_days = printing;
    }
    if let Some(&shipping) = days.get(2) {
        form.shipping_days = shipping;
    }
    if let Some(&processing) = days.get(3) {
        match method {
            DistributionMethod::Distributor => form.distributor_processing_days = processing,
            DistributionMethod::Fulfillment => form.fulfillment_processing_days = processing,
            DistributionMethod::Direct | DistributionMethod::Event => {}
        }
    }

    match comic_workflow::calculate_timeline(&form) {
        Ok(result) => {
            println!("Timeline ({}, {:?}):", form.direction, method);
            println!("  Completion        : {}", result.completion_date);
            println!("  Printer queue     : {}", result.printer_queue_date);
            println!("  Printing complete : {}", result.printing_complete_date);
            println!("  Shipping arrival  : {}", result.shipping_arrival_date);
            println!("  In store          : {}", result.in_store_date);
        }
        Err(err) => println!("Error: {err}"),
    }
}

fn main() {
    let config = match AppConfig::load(None) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            AppConfig::default()
        }
    };
    logging::init(&config.log_filter);

    let store = Arc::new(MemoryStore::new());
    let service = match WorkflowService::from_config(store.clone(), &config) {
        Ok(service) => service,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            WorkflowService::new(store.clone())
        }
    };
    let actor = ActorId::new(std::env::var("USER").unwrap_or_else(|_| "cli".to_string()));

    println!("Comic Workflow (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        match parts.as_slice() {
            ["help"] => print_help(),
            ["quit"] | ["exit"] => break,
            ["project", "load", path] => match load_projects(&store, path) {
                Ok(ids) => println!("Loaded projects: {:?}", ids),
                Err(err) => println!("{err}"),
            },
            ["project", "show", id] => {
                let Ok(id) = id.parse::<i32>() else {
                    println!("Invalid project id '{id}'.");
                    continue;
                };
                match store.get_project(id) {
                    Ok(Some(project)) => match serde_json::to_string_pretty(&project) {
                        Ok(json) => println!("{json}"),
                        Err(err) => println!("Error: {err}"),
                    },
                    Ok(None) => println!("Project {id} not found."),
                    Err(err) => println!("Error: {err}"),
                }
            }
            ["user", "add", id, role, name @ ..] if !name.is_empty() => {
                let (Ok(id), Some(role)) = (id.parse::<i32>(), parse_role(role)) else {
                    println!("Usage: user add <id> <role> <name...>");
                    continue;
                };
                store.insert_user(User::new(id, name.join(" "), role));
                println!("Added user {id} as {role}.");
            }
            ["init", id, rest @ ..] => {
                let Ok(id) = id.parse::<i32>() else {
                    println!("Invalid project id '{id}'.");
                    continue;
                };
                let mut request = InitializeRequest::new(actor.clone());
                for flag in rest {
                    match *flag {
                        "confirm" => request = request.confirmed(),
                        "keep" => request = request.with_retention(RetentionPolicy::KeepStepState),
                        "replace" => request = request.with_retention(RetentionPolicy::Replace),
                        other => println!("Ignoring unknown flag '{other}'."),
                    }
                }
                match service.initialize_workflow(id, &request) {
                    Ok(run) => {
                        println!(
                            "Initialized workflow for project {} ({} steps).",
                            id,
                            run.steps.len()
                        );
                        print!("{}", render_steps(&run.steps));
                        for warning in run.feasibility.warnings() {
                            println!("Warning: {warning}");
                        }
                    }
                    Err(err) => println!("Error: {err}"),
                }
            }
            ["steps", id] => match id.parse::<i32>().map(|id| service.steps(id)) {
                Ok(Ok(steps)) => print!("{}", render_steps(&steps)),
                Ok(Err(err)) => println!("Error: {err}"),
                Err(_) => println!("Invalid project id '{id}'."),
            },
            ["due", id, date] => {
                let (Ok(id), Some(date)) = (id.parse::<i32>(), parse_date(date)) else {
                    println!("Usage: due <project_id> <YYYY-MM-DD>");
                    continue;
                };
                match service.recompute_on_due_date_change(id, date, &actor) {
                    Ok(Some(run)) => {
                        println!("Due date set to {date}; workflow rebuilt.");
                        print!("{}", render_steps(&run.steps));
                        for warning in run.feasibility.warnings() {
                            println!("Warning: {warning}");
                        }
                    }
                    Ok(None) => println!("Due date set to {date}."),
                    Err(err) => println!("Error: {err}"),
                }
            }
            ["feasibility", id] => match id.parse::<i32>().map(|id| service.feasibility(id)) {
                Ok(Ok(report)) => {
                    if let Some(done) = report.projected_completion {
                        println!("Projected completion: {done}");
                    }
                    if let Some(due) = report.due_date {
                        println!("Due date            : {due}");
                    }
                    if report.is_feasible() {
                        println!("Schedule is feasible.");
                    }
                    for warning in report.warnings() {
                        println!("Warning: {warning}");
                    }
                }
                Ok(Err(err)) => println!("Error: {err}"),
                Err(_) => println!("Invalid project id '{id}'."),
            },
            ["status", id, status] => {
                let (Ok(id), Ok(status)) = (id.parse::<i32>(), StepStatus::from_str(status))
                else {
                    println!("Usage: status <step_id> <status>");
                    continue;
                };
                let update = StepUpdate {
                    status: Some(status),
                    ..StepUpdate::default()
                };
                match service.update_step(id, &update, &actor) {
                    Ok(step) => println!("Step {} is now {}.", step.id, step.status),
                    Err(err) => println!("Error: {err}"),
                }
            }
            ["progress", id, value] => {
                let (Ok(id), Ok(value)) = (id.parse::<i32>(), value.parse::<i32>()) else {
                    println!("Usage: progress <step_id> <0-100>");
                    continue;
                };
                let update = StepUpdate {
                    progress: Some(value),
                    ..StepUpdate::default()
                };
                match service.update_step(id, &update, &actor) {
                    Ok(step) => println!("Step {} progress {}%.", step.id, step.progress),
                    Err(err) => println!("Error: {err}"),
                }
            }
            ["timeline", args @ ..] => handle_timeline(args),
            ["save", format, id, path] => {
                let Ok(id) = id.parse::<i32>() else {
                    println!("Invalid project id '{id}'.");
                    continue;
                };
                let steps = match service.steps(id) {
                    Ok(steps) => steps,
                    Err(err) => {
                        println!("Error: {err}");
                        continue;
                    }
                };
                let result = match *format {
                    "json" => save_steps_to_json(id, &steps, path),
                    "csv" => save_steps_to_csv(&steps, path),
                    other => {
                        println!("Unknown format '{other}'. Use json or csv.");
                        continue;
                    }
                };
                match result {
                    Ok(()) => println!("Workflow saved to {path}."),
                    Err(err) => println!("Error: {err}"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
