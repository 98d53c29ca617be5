//! Command-line front end: the `patient` console and the `staff` dashboard.
//!
//! Output here is the rendering layer; every resolve action is addressed by
//! request `id`, never by the `#n` position shown next to it.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{ArgAction, Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    dashboard::DashboardSnapshot,
    db::PageStorage,
    models::{AdmissionInput, Goals, Patient, PriorityTier},
    queue::{QueueEntry, QueueView},
    ward::{Census, StaffType},
    AppState,
};

#[derive(Debug, Parser)]
#[command(
    name = "careboard",
    version,
    about = "Hospital operations dashboard and patient companion"
)]
pub struct Cli {
    /// Directory holding the page store and settings.json
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep everything in memory for this run only
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Patient companion actions
    #[command(subcommand)]
    Patient(PatientCommand),
    /// Staff dashboard actions
    #[command(subcommand)]
    Staff(StaffCommand),
}

#[derive(Debug, Subcommand)]
pub enum PatientCommand {
    /// Show or change the signed-in patient
    Name { name: Option<String> },
    /// Send an SOS to the staff dashboard
    Sos,
    /// Ask for a doctor connection
    Request {
        #[arg(long)]
        reason: Option<String>,
        /// Low, Medium or High
        #[arg(long)]
        criticality: Option<String>,
    },
    /// Show goal progress, or update any of the goals
    Goals {
        #[arg(long)]
        steps: Option<String>,
        /// Litres per day
        #[arg(long)]
        water: Option<String>,
        /// Hours per night
        #[arg(long)]
        sleep: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum StaffCommand {
    /// Print the waiting queue in display order
    Queue {
        #[arg(long)]
        json: bool,
    },
    /// Print the current SOS alert, if any
    Alerts,
    /// Resolve a doctor request by its id
    Resolve { id: i64 },
    /// Resolve the active SOS alert
    ResolveSos,
    /// Keep the dashboard on screen, refreshing on the configured interval
    Watch,
    /// Admit a new patient
    Admit(AdmitArgs),
    /// List admitted patients
    Patients,
    /// Summary counts for the dashboard cards
    Census,
    /// Order oxygen cylinders
    Cylinders { quantity: String },
    /// Show or set the signed-in staff ID
    Badge { id: Option<String> },
    /// Show staff headcounts, or set one
    StaffCounts {
        #[arg(long, requires = "count")]
        set: Option<String>,
        #[arg(long)]
        count: Option<u32>,
    },
    /// Show or change dashboard settings
    Config {
        #[arg(long)]
        poll_interval_ms: Option<u64>,
        #[arg(long)]
        default_patient_name: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct AdmitArgs {
    #[arg(long, default_value = "")]
    pub id: String,
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub ward: String,
    #[arg(long, default_value = "")]
    pub condition: String,
    #[arg(long, default_value = "")]
    pub age: String,
}

impl From<AdmitArgs> for AdmissionInput {
    fn from(args: AdmitArgs) -> Self {
        Self {
            id: args.id,
            name: args.name,
            ward: args.ward,
            condition: args.condition,
            age: args.age,
        }
    }
}

pub async fn execute<S: PageStorage>(command: Command, state: &AppState<S>) -> Result<()> {
    match command {
        Command::Patient(command) => execute_patient(command, state).await,
        Command::Staff(command) => execute_staff(command, state).await,
    }
}

async fn execute_patient<S: PageStorage>(
    command: PatientCommand,
    state: &AppState<S>,
) -> Result<()> {
    let console = &state.patient;
    match command {
        PatientCommand::Name { name: None } => {
            println!("{}", console.current_name().await?);
        }
        PatientCommand::Name { name: Some(name) } => {
            console.set_current_name(&name).await?;
            println!("Signed in as {}", name.trim());
        }
        PatientCommand::Sos => {
            let alert = console.raise_sos().await?;
            println!("Emergency signal sent: {}", alert.message());
        }
        PatientCommand::Request {
            reason,
            criticality,
        } => {
            let request = console
                .request_doctor(
                    reason.as_deref().unwrap_or_default(),
                    criticality.as_deref().unwrap_or_default(),
                )
                .await?;
            println!(
                "Doctor request sent for {} (Criticality: {}). A staff member will connect with you shortly.",
                request.patient_name, request.criticality
            );
        }
        PatientCommand::Goals {
            steps,
            water,
            sleep,
        } => {
            let goals = if steps.is_none() && water.is_none() && sleep.is_none() {
                console.load_goals().await?
            } else {
                let current = console.load_goals().await?;
                console
                    .update_goals(
                        &steps.unwrap_or_else(|| current.steps.to_string()),
                        &water.unwrap_or_else(|| current.water.to_string()),
                        &sleep.unwrap_or_else(|| current.sleep.to_string()),
                    )
                    .await?
            };
            print!("{}", render_goals(&goals));
        }
    }
    Ok(())
}

async fn execute_staff<S: PageStorage>(command: StaffCommand, state: &AppState<S>) -> Result<()> {
    let dashboard = &state.dashboard;
    match command {
        StaffCommand::Queue { json } => {
            let snapshot = dashboard.refresh().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot.queue)?);
            } else {
                print!("{}", render_queue(&snapshot.queue));
            }
        }
        StaffCommand::Alerts => {
            let snapshot = dashboard.refresh().await;
            println!("{}", render_sos(&snapshot));
        }
        StaffCommand::Resolve { id } => {
            if dashboard.resolve_request(id).await? {
                println!("Resolved request {id}.");
            } else {
                println!("Request {id} was already resolved.");
            }
            print!("{}", render_queue(&dashboard.latest().queue));
        }
        StaffCommand::ResolveSos => {
            dashboard.resolve_sos().await?;
            println!("SOS alert resolved.");
        }
        StaffCommand::Watch => watch(state).await?,
        StaffCommand::Admit(args) => {
            let patient = state.patients.admit(args.into()).await?;
            println!(
                "Patient {} ({}) admitted successfully!",
                patient.name, patient.id
            );
        }
        StaffCommand::Patients => {
            print!("{}", render_patients(&state.patients.list().await?));
        }
        StaffCommand::Census => {
            print!("{}", render_census(&state.patients.census().await?));
        }
        StaffCommand::Cylinders { quantity } => {
            let request = state.supplies.request_cylinders(&quantity).await?;
            println!(
                "Request for {} oxygen cylinders submitted by Staff ID {}.",
                request.quantity, request.requested_by
            );
        }
        StaffCommand::Badge { id: None } => {
            println!("{}", state.supplies.current_admin_id().await?);
        }
        StaffCommand::Badge { id: Some(id) } => {
            state.supplies.set_admin_id(&id).await?;
            println!("Staff ID set to {}", state.supplies.current_admin_id().await?);
        }
        StaffCommand::StaffCounts { set, count } => {
            if let (Some(staff_type), Some(count)) = (set, count) {
                let staff_type: StaffType = staff_type.parse()?;
                state.staffing.set_count(staff_type, count).await?;
            }
            let counts = state.staffing.counts().await?;
            println!(
                "doctors: {}\nnurses: {}\nadmins: {}",
                counts.doctors, counts.nurses, counts.admins
            );
        }
        StaffCommand::Config {
            poll_interval_ms,
            default_patient_name,
        } => {
            if let Some(ms) = poll_interval_ms {
                state.settings.update_poll_interval(ms)?;
            }
            if let Some(name) = default_patient_name {
                state.settings.update_default_patient_name(&name)?;
            }
            println!("{}", serde_json::to_string_pretty(&state.settings.settings())?);
        }
    }
    Ok(())
}

/// Live dashboard. Typed lines act as the resolve buttons:
/// `resolve <id>`, `sos` to clear the alert, `quit` to leave.
async fn watch<S: PageStorage>(state: &AppState<S>) -> Result<()> {
    let dashboard = &state.dashboard;
    let mut snapshots = dashboard.subscribe();
    dashboard.start().await?;

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut shown: Option<DashboardSnapshot> = None;
    let mut input_open = true;

    let outcome: Result<()> = loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if shown.as_ref().map_or(true, |prev| !prev.same_content(&snapshot)) {
                    print!("{}", render_snapshot(&snapshot));
                    shown = Some(snapshot);
                }
            }
            line = input.next_line(), if input_open => {
                match line.context("failed to read dashboard input")? {
                    None => input_open = false,
                    Some(line) => match handle_watch_input(line.trim(), state).await {
                        Ok(true) => break Ok(()),
                        Ok(false) => {}
                        Err(err) => eprintln!("{err:#}"),
                    },
                }
            }
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
    };

    dashboard.stop().await?;
    outcome
}

/// Returns true when the user asked to leave.
async fn handle_watch_input<S: PageStorage>(line: &str, state: &AppState<S>) -> Result<bool> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (None, _) => Ok(false),
        (Some("quit" | "q" | "exit"), _) => Ok(true),
        (Some("sos"), None) => {
            state.dashboard.resolve_sos().await?;
            Ok(false)
        }
        (Some("resolve" | "r"), Some(id)) => {
            let id: i64 = id
                .parse()
                .with_context(|| format!("'{id}' is not a request id"))?;
            if !state.dashboard.resolve_request(id).await? {
                println!("Request {id} was already resolved.");
            }
            Ok(false)
        }
        _ => bail!("commands: resolve <id> | sos | quit"),
    }
}

fn render_sos(snapshot: &DashboardSnapshot) -> String {
    match &snapshot.sos {
        Some(alert) => format!(
            "EMERGENCY: SOS from Patient {}! ({})",
            alert.patient_name,
            alert.local_time().as_deref().unwrap_or("time unknown")
        ),
        None => "No critical alerts.".to_string(),
    }
}

fn render_entry(entry: &QueueEntry) -> String {
    let request = &entry.request;
    let time = request
        .created_at_time()
        .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".into());
    let marker = match entry.tier() {
        PriorityTier::High => "!!",
        PriorityTier::Medium => "! ",
        PriorityTier::Low => "  ",
    };
    format!(
        "{marker} {:<4} {} ({}) - {} (Time: {}) [id {}]",
        entry.label(),
        request.patient_name,
        request.criticality,
        request.reason,
        time,
        request.id
    )
}

pub fn render_queue(queue: &QueueView) -> String {
    match queue {
        QueueView::Clear => format!("{}\n", QueueView::CLEAR_MESSAGE),
        QueueView::Entries(entries) => entries
            .iter()
            .map(|entry| format!("{}\n", render_entry(entry)))
            .collect(),
    }
}

pub fn render_snapshot(snapshot: &DashboardSnapshot) -> String {
    format!(
        "== Dashboard {} ==\n{}\n-- Waiting queue --\n{}",
        snapshot.refreshed_at.with_timezone(&Local).format("%H:%M:%S"),
        render_sos(snapshot),
        render_queue(&snapshot.queue)
    )
}

fn render_patients(patients: &[Patient]) -> String {
    let mut out = format!(
        "{:<8} {:<14} {:>4} {:<8} {:<10} {:<9} {}\n",
        "ID", "Name", "Age", "Room", "Condition", "Severity", "Last update"
    );
    for patient in patients {
        out.push_str(&format!(
            "{:<8} {:<14} {:>4} {:<8} {:<10} {:<9} {}\n",
            patient.id,
            patient.name,
            patient.age,
            patient.room,
            patient.condition,
            patient.severity().label(),
            patient.last_update
        ));
    }
    out
}

fn render_census(census: &Census) -> String {
    let mut out = format!(
        "Total patients: {}\nCritical: {}\nStable: {}\n",
        census.total, census.critical, census.stable
    );
    if census.highlights.is_empty() {
        out.push_str("No patient data available.\n");
    }
    for patient in &census.highlights {
        out.push_str(&format!(
            "Patient {} - {}: {}\n",
            patient.name, patient.room, patient.condition
        ));
    }
    out
}

fn render_goals(goals: &Goals) -> String {
    let progress = goals.progress();
    format!(
        "Overall: {}%\nSteps: {} ({}%)\nWater: {} L ({}%)\nSleep: {} h ({}%)\n",
        progress.overall,
        goals.steps,
        progress.steps,
        goals.water,
        progress.water,
        goals.sleep,
        progress.sleep
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DoctorRequest, SosAlert};
    use crate::queue::order_requests;
    use chrono::{DateTime, Utc};

    fn snapshot(sos: Option<SosAlert>, requests: Vec<DoctorRequest>) -> DashboardSnapshot {
        DashboardSnapshot {
            sos,
            queue: QueueView::from_entries(order_requests(requests)),
            refreshed_at: Utc::now(),
        }
    }

    #[test]
    fn empty_queue_renders_placeholder() {
        let rendered = render_snapshot(&snapshot(None, Vec::new()));
        assert!(rendered.contains("No critical alerts."));
        assert!(rendered.ends_with("Queue is clear.\n"));
    }

    #[test]
    fn rows_show_position_and_removal_id() {
        let at = DateTime::<Utc>::from_timestamp_millis(100).unwrap();
        let rendered = render_queue(
            &snapshot(
                None,
                vec![
                    DoctorRequest::new(100, "Karan S.", "Refill", "low", at),
                    DoctorRequest::new(50, "Ria V.", "Chest pain", "high", at),
                ],
            )
            .queue,
        );
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("!! #1"));
        assert!(lines[1].starts_with("   #2"));
        assert!(lines[0].contains("Ria V. (HIGH) - Chest pain"));
        assert!(lines[0].ends_with("[id 50]"));
        assert!(lines[1].ends_with("[id 100]"));
    }

    #[test]
    fn sos_banner_names_patient() {
        let rendered = render_sos(&snapshot(Some(SosAlert::new("Karan S.", Utc::now())), Vec::new()));
        assert!(rendered.starts_with("EMERGENCY: SOS from Patient Karan S.!"));
    }

    #[test]
    fn parses_nested_subcommands() {
        let cli = Cli::try_parse_from([
            "careboard",
            "--ephemeral",
            "patient",
            "request",
            "--reason",
            "Fever",
            "--criticality",
            "high",
        ])
        .unwrap();
        assert!(cli.ephemeral);
        assert!(matches!(
            cli.command,
            Command::Patient(PatientCommand::Request { reason: Some(ref r), .. }) if r == "Fever"
        ));

        let cli = Cli::try_parse_from(["careboard", "staff", "resolve", "1700000000000"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Staff(StaffCommand::Resolve { id: 1_700_000_000_000 })
        ));
    }

    #[test]
    fn unreadable_sos_still_renders_a_banner() {
        let alert = SosAlert::from_unreadable("not a record");
        let rendered = render_sos(&snapshot(Some(alert), Vec::new()));
        assert_eq!(
            rendered,
            "EMERGENCY: SOS from Patient Unknown Patient! (time unknown)"
        );
    }

    #[test]
    fn patient_rows_show_severity() {
        let rendered = render_patients(&crate::ward::patients::initial_patients());
        let karan = rendered.lines().find(|line| line.starts_with("P1001")).unwrap();
        assert!(karan.contains("Critical   critical"));
        let sarah = rendered.lines().find(|line| line.starts_with("P1004")).unwrap();
        assert!(sarah.contains("Fair       fair"));
    }

    #[test]
    fn census_without_patients_says_so() {
        let rendered = render_census(&Census {
            total: 0,
            critical: 0,
            stable: 0,
            highlights: Vec::new(),
        });
        assert!(rendered.contains("No patient data available."));
    }
}
