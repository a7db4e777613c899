use std::io::Write;

use anyhow::Context;
use tracing::{debug, instrument};

use crate::cli::{AddArgs, Command, EditArgs, ListArgs};
use crate::dashboard::{Dashboard, InitialStatus, NewTodoForm, NoticeLevel};
use crate::datetime::Clock;
use crate::render::Renderer;
use crate::service::TodoService;
use crate::todo::TodoUpdate;

/// Runs one dashboard command. The list is loaded (and reconciled) first,
/// as the page does on mount.
#[instrument(skip(dashboard, renderer, out, err))]
pub async fn dispatch<S, C, W, E>(
    dashboard: &mut Dashboard<S, C>,
    renderer: &Renderer,
    command: Command,
    out: &mut W,
    err: &mut E,
) -> anyhow::Result<()>
where
    S: TodoService,
    C: Clock,
    W: Write,
    E: Write,
{
    let result = run_command(dashboard, renderer, command, out).await;

    let mut notices = dashboard.take_notices();
    if result.is_err() {
        // Blocking and error notices repeat the returned error.
        notices.retain(|n| n.level == NoticeLevel::Warning);
    }
    renderer.print_notices(err, &notices)?;

    result
}

async fn run_command<S, C, W>(
    dashboard: &mut Dashboard<S, C>,
    renderer: &Renderer,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: TodoService,
    C: Clock,
    W: Write,
{
    debug!(?command, "dispatching command");
    dashboard.mount().await.context("failed to load todos")?;

    match command {
        Command::List(args) => cmd_list(dashboard, renderer, args, out),
        Command::Stats => renderer.print_stats(out, dashboard.stats()),
        Command::Reconcile => {
            if let Some(report) = dashboard.last_report() {
                renderer.print_report(out, report)?;
            }
            Ok(())
        }
        Command::Add(args) => cmd_add(dashboard, args, out).await,
        Command::Delete { id } => {
            dashboard
                .delete_todo(&id)
                .await
                .with_context(|| format!("failed to delete todo {id}"))?;
            writeln!(out, "Deleted todo {id}.")?;
            Ok(())
        }
        Command::Done { id } => {
            dashboard
                .mark_done(&id)
                .await
                .with_context(|| format!("failed to complete todo {id}"))?;
            writeln!(out, "Completed todo {id}.")?;
            Ok(())
        }
        Command::Status { id, status } => {
            dashboard.toggle_menu(&id);
            dashboard
                .quick_update(&id, TodoUpdate::status(status))
                .await
                .with_context(|| format!("failed to update todo {id}"))?;
            writeln!(out, "Todo {id} is now {status}.")?;
            Ok(())
        }
        Command::Priority { id, priority } => {
            dashboard.toggle_menu(&id);
            dashboard
                .quick_update(&id, TodoUpdate::priority(priority))
                .await
                .with_context(|| format!("failed to update todo {id}"))?;
            writeln!(out, "Todo {id} priority is now {priority}.")?;
            Ok(())
        }
        Command::Edit(args) => cmd_edit(dashboard, args, out).await,
        Command::Login { .. } | Command::Logout => {
            anyhow::bail!("session commands are handled before the dashboard is built")
        }
    }
}

fn cmd_list<S, C, W>(
    dashboard: &mut Dashboard<S, C>,
    renderer: &Renderer,
    args: ListArgs,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: TodoService,
    C: Clock,
    W: Write,
{
    dashboard.set_status_filter(args.status);
    dashboard.set_priority_filter(args.priority);

    renderer.print_stats(out, dashboard.stats())?;
    writeln!(out)?;
    renderer.print_todo_table(out, &dashboard.visible(), dashboard.filter(), dashboard.today())
}

async fn cmd_add<S, C, W>(
    dashboard: &mut Dashboard<S, C>,
    args: AddArgs,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: TodoService,
    C: Clock,
    W: Write,
{
    let status = InitialStatus::try_from(args.status)?;
    *dashboard.form_mut() = NewTodoForm {
        title: args.title,
        description: args.description,
        deadline: args.deadline,
        priority: args.priority,
        status,
    };

    let created = dashboard.add_todo().await.context("failed to add todo")?;
    writeln!(out, "Created todo {}.", created.id)?;
    Ok(())
}

async fn cmd_edit<S, C, W>(
    dashboard: &mut Dashboard<S, C>,
    args: EditArgs,
    out: &mut W,
) -> anyhow::Result<()>
where
    S: TodoService,
    C: Clock,
    W: Write,
{
    let id = args.id;
    dashboard.start_edit(&id)?;
    if let Some(draft) = dashboard.draft_mut() {
        if let Some(title) = args.title {
            draft.title = title;
        }
        if let Some(description) = args.description {
            draft.description = description;
        }
        if let Some(deadline) = args.deadline {
            draft.deadline = Some(deadline);
        }
        if let Some(status) = args.status {
            draft.status = status;
        }
        if let Some(priority) = args.priority {
            draft.priority = priority;
        }
    }

    dashboard
        .save_edit()
        .await
        .with_context(|| format!("failed to save todo {id}"))?;
    writeln!(out, "Saved todo {id}.")?;
    Ok(())
}
