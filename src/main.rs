use std::path::{Path, PathBuf};

use airas::allocation::MatchingSession;
use airas::api::{AllocationBackend, ApiClient};
use airas::config::{Config, ConfigOverrides};
use airas::dashboard::{
    assignment_detail, employee_dashboard, employee_projects, manager_dashboard,
    performance_report, resource_overview,
};
use airas::models::{
    NewProject, ProjectStatus, ProjectUpdate, Registration, Role, SkillRequirement, UserUpdate,
};
use airas::output::csv::{
    matches_to_csv, projects_to_csv, recommendations_to_csv, skill_status_to_csv, users_to_csv,
};
use airas::output::json::{render_json, render_json_with_banner};
use airas::output::table::{
    render_assignment_detail, render_employee_dashboard, render_manager_dashboard,
    render_matches_table, render_performance_report, render_project_detail,
    render_projects_table, render_proposals_table, render_recommendations_table,
    render_resource_overview, render_skill_status_table, render_skills_table,
    render_user_projects_table, render_users_table,
};
use airas::routes::{self, Access};
use airas::session::store::LocalStore;
use airas::session::Session;
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "airas", about = "AI resource allocation system client")]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long = "api-url")]
    api_url: Option<String>,
    #[arg(long = "session-db")]
    session_db: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    Logout,
    Whoami,
    Register {
        #[arg(long)]
        email: String,
        #[arg(long = "name")]
        full_name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        role: Option<Role>,
    },
    Route { path: String },
    #[command(subcommand)]
    Projects(ProjectCommands),
    #[command(subcommand)]
    Employees(EmployeeCommands),
    #[command(subcommand)]
    Skills(SkillCommands),
    Match { project: i64 },
    Recommend { project: i64 },
    Allocate {
        project: i64,
        /// EMPLOYEE_ID:NAME:SKILL:PERCENT
        #[arg(long = "assign")]
        assign: Vec<String>,
        /// Promote recommendation INDEX[:PERCENT] using its suggested skill.
        #[arg(long = "pick")]
        pick: Vec<String>,
        #[arg(long)]
        dry_run: bool,
    },
    RemoveAllocation { project: i64, employee: i64 },
    Dashboard,
    Resources,
    Me,
    MyProjects { id: Option<i64> },
    Performance,
    Profile {
        #[command(flatten)]
        update: ProfileArgs,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ProjectCommands {
    List,
    Show {
        id: i64,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(long, default_value = "planning")]
        status: ProjectStatus,
        #[arg(long, default_value_t = 3)]
        priority: u8,
        /// SKILL_ID:COUNT, repeatable.
        #[arg(long = "require")]
        require: Vec<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        status: Option<ProjectStatus>,
        #[arg(long)]
        priority: Option<u8>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum EmployeeCommands {
    List,
    Show {
        id: i64,
    },
    Update {
        id: i64,
        #[command(flatten)]
        update: ProfileArgs,
        #[arg(long)]
        role: Option<Role>,
        #[arg(long)]
        performance: Option<f64>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum SkillCommands {
    List,
    Add { name: String },
    Delete { id: i64 },
}

#[derive(Debug, clap::Args, Clone, Default)]
struct ProfileArgs {
    #[arg(long)]
    email: Option<String>,
    #[arg(long = "name")]
    full_name: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    department: Option<String>,
    #[arg(long)]
    position: Option<String>,
    #[arg(long)]
    availability: Option<f64>,
    /// Comma separated skill names; replaces the current list.
    #[arg(long)]
    skills: Option<String>,
}

impl From<ProfileArgs> for UserUpdate {
    fn from(value: ProfileArgs) -> Self {
        Self {
            email: value.email,
            full_name: value.full_name,
            password: value.password,
            department: value.department,
            position: value.position,
            availability_percentage: value.availability,
            skills: value.skills.map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            }),
            ..Self::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        base_url: cli.api_url.clone(),
        session_db_path: cli.session_db.clone(),
    });

    if let Commands::Config { init, show } = &cli.command {
        return handle_config_command(*init, *show, &config, &config_path);
    }

    let store = LocalStore::open(&config.resolved_session_path())?;
    let mut session = Session::hydrate(store)?;
    let client = ApiClient::new(&config.api)?.with_token(session.token().map(str::to_string));

    match cli.command {
        Commands::Login { username, password } => {
            let landing = session
                .login(&client, &username, &password)
                .await
                .context("login failed")?;
            println!("Signed in. Landing page: {landing}");
        }
        Commands::Logout => {
            session.logout()?;
            println!("Signed out.");
        }
        Commands::Whoami => match session.user() {
            Some(user) => println!("{}", render_json(user)?),
            None => println!("Not signed in."),
        },
        Commands::Register {
            email,
            full_name,
            password,
            role,
        } => {
            if role.is_some() || session.is_authenticated() {
                require(&session, "/register-employee")?;
            }
            let ack = client
                .register(&Registration {
                    email,
                    full_name,
                    password,
                    role,
                })
                .await?;
            println!(
                "{}",
                ack.detail
                    .unwrap_or_else(|| "Registration successful.".to_string())
            );
        }
        Commands::Route { path } => {
            let access = routes::authorize(&path, session.user())?;
            println!("{}", render_json(&access)?);
        }
        Commands::Projects(command) => {
            run_project_command(command, &client, &session, cli.output).await?
        }
        Commands::Employees(command) => {
            run_employee_command(command, &client, &session, cli.output).await?
        }
        Commands::Skills(command) => {
            require(&session, "/employees")?;
            match command {
                SkillCommands::List => {
                    let skills = client.list_skills().await?;
                    print_output(cli.output, &skills, || render_skills_table(&skills), None)?;
                }
                SkillCommands::Add { name } => {
                    let skill = client.create_skill(&name).await?;
                    println!("Created skill #{} {}", skill.id, skill.name);
                }
                SkillCommands::Delete { id } => {
                    client.delete_skill(id).await?;
                    println!("Deleted skill #{id}");
                }
            }
        }
        Commands::Match { project } => {
            require(&session, &format!("/employee-matching/{project}"))?;
            let mut matching = MatchingSession::new(client.clone(), config.allocation);
            matching.select_project(project).await?;
            let statuses = matching.skill_status();
            match cli.output {
                OutputFormat::Table => {
                    println!("{}", render_skill_status_table(&statuses));
                    println!("{}", render_matches_table(matching.matches()));
                }
                OutputFormat::Json => println!(
                    "{}",
                    render_json(&serde_json::json!({
                        "skills": statuses,
                        "matches": matching.matches(),
                    }))?
                ),
                OutputFormat::Csv => {
                    println!("{}", skill_status_to_csv(&statuses)?);
                    println!("{}", matches_to_csv(matching.matches())?);
                }
            }
        }
        Commands::Recommend { project } => {
            require(&session, &format!("/employee-matching/{project}"))?;
            let mut matching = MatchingSession::new(client.clone(), config.allocation);
            matching.select_project(project).await?;
            matching.fetch_recommendations().await?;
            let items = matching.recommendations();
            print_output(
                cli.output,
                items,
                || render_recommendations_table(items),
                Some(recommendations_to_csv(items)?),
            )?;
        }
        Commands::Allocate {
            project,
            assign,
            pick,
            dry_run,
        } => {
            require(&session, &format!("/employee-matching/{project}"))?;
            let mut matching = MatchingSession::new(client.clone(), config.allocation);
            matching.select_project(project).await?;

            if !pick.is_empty() {
                matching.fetch_recommendations().await?;
                for raw in &pick {
                    let (index, percentage) = parse_pick(raw)?;
                    if let Some(percentage) = percentage {
                        matching.set_recommendation_percentage(index, percentage)?;
                    }
                    let outcome = matching.promote_recommendation(index)?;
                    eprintln!("{}", outcome.notice());
                }
            }
            for raw in &assign {
                let (employee_id, name, skill, percentage) = parse_assignment(raw)?;
                let outcome = matching.propose(employee_id, &name, &skill, percentage)?;
                eprintln!("{}", outcome.notice());
            }

            if dry_run {
                let proposals = matching.proposals();
                print_output(
                    cli.output,
                    proposals,
                    || render_proposals_table(proposals),
                    None,
                )?;
                return Ok(());
            }
            let submitted = matching.submit().await?;
            info!("submitted {submitted} allocations to project {project}");
            warn_if_stale(&matching);
            let statuses = matching.skill_status();
            match cli.output {
                OutputFormat::Json => {
                    println!("{}", render_json_with_banner(&statuses, matching.banner())?)
                }
                OutputFormat::Csv => println!("{}", skill_status_to_csv(&statuses)?),
                OutputFormat::Table => {
                    if let Some(message) = &matching.banner().success {
                        println!("{message}");
                    }
                    println!("{}", render_skill_status_table(&statuses));
                }
            }
        }
        Commands::RemoveAllocation { project, employee } => {
            require(&session, &format!("/employee-matching/{project}"))?;
            let mut matching = MatchingSession::new(client.clone(), config.allocation);
            matching.select_project(project).await?;
            matching.remove_allocation(employee).await?;
            if let Some(message) = &matching.banner().success {
                println!("{message}");
            }
            warn_if_stale(&matching);
        }
        Commands::Dashboard => {
            require(&session, routes::MANAGER_HOME)?;
            let (projects, users) = tokio::try_join!(client.list_projects(), client.list_users())?;
            let dashboard = manager_dashboard(&projects, &users);
            print_output(
                cli.output,
                &dashboard,
                || render_manager_dashboard(&dashboard),
                None,
            )?;
        }
        Commands::Resources => {
            require(&session, "/resource-optimization")?;
            let (projects, users) = tokio::try_join!(client.list_projects(), client.list_users())?;
            let rows = resource_overview(&projects, &users);
            print_output(cli.output, &rows, || render_resource_overview(&rows), None)?;
        }
        Commands::Me => {
            require(&session, routes::EMPLOYEE_HOME)?;
            let user = client.current_user().await?;
            let dashboard = employee_dashboard(&user);
            print_output(
                cli.output,
                &dashboard,
                || render_employee_dashboard(&dashboard),
                None,
            )?;
        }
        Commands::MyProjects { id: None } => {
            require(&session, "/employee-projects")?;
            let user = client.current_user().await?;
            let projects = employee_projects(&user);
            print_output(
                cli.output,
                &projects,
                || render_user_projects_table(&projects),
                None,
            )?;
        }
        Commands::MyProjects { id: Some(id) } => {
            require(&session, &format!("/employee-projects/{id}"))?;
            let employee_id = session
                .user()
                .map(|u| u.id)
                .ok_or_else(|| anyhow!("not signed in"))?;
            let project = client.get_project(id).await?;
            let today = chrono::Local::now().date_naive();
            let detail = assignment_detail(project, employee_id, today);
            print_output(cli.output, &detail, || render_assignment_detail(&detail), None)?;
        }
        Commands::Performance => {
            require(&session, "/employee-performance")?;
            let user = client.current_user().await?;
            let report = performance_report(&user);
            print_output(cli.output, &report, || render_performance_report(&report), None)?;
        }
        Commands::Profile { update } => {
            require(&session, "/employee-profile")?;
            let update = UserUpdate::from(update);
            if update.is_empty() {
                bail!("nothing to update; pass at least one field");
            }
            let user = client.update_current_user(&update).await?;
            println!("{}", render_json(&user)?);
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "airas=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_config_command(
    init: bool,
    show: bool,
    config: &Config,
    config_path: &Path,
) -> Result<()> {
    if init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if show || !init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn warn_if_stale<B: AllocationBackend>(matching: &MatchingSession<B>) {
    if matching.matches_stale() {
        let reason = matching.banner().error.as_deref().unwrap_or("refresh failed");
        eprintln!("warning: allocated counts below may be out of date ({reason})");
    }
}

fn require(session: &Session, path: &str) -> Result<()> {
    match routes::authorize(path, session.user())? {
        Access::Allow => Ok(()),
        Access::Redirect(routes::LOGIN) => {
            Err(anyhow!("not signed in; run `airas login` first"))
        }
        Access::Redirect(target) => {
            let role = session
                .role()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            warn!("{path} denied for role {role}, redirected to {target}");
            Err(anyhow!("role {role} is not authorized to access {path}"))
        }
    }
}

async fn run_project_command(
    command: ProjectCommands,
    client: &ApiClient,
    session: &Session,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ProjectCommands::List => {
            require(session, "/view-projects")?;
            let projects = client.list_projects().await?;
            print_output(
                format,
                &projects,
                || render_projects_table(&projects),
                Some(projects_to_csv(&projects)?),
            )?;
        }
        ProjectCommands::Show { id } => {
            require(session, &format!("/update-project/{id}"))?;
            let project = client.get_project(id).await?;
            print_output(format, &project, || render_project_detail(&project), None)?;
        }
        ProjectCommands::Create {
            name,
            description,
            start,
            end,
            status,
            priority,
            require: requirements,
        } => {
            require(session, "/create-project")?;
            if end < start {
                bail!("end date {end} is before start date {start}");
            }
            let manager_id = session
                .user()
                .map(|u| u.id)
                .ok_or_else(|| anyhow!("not signed in"))?;
            let skill_requirements = requirements
                .iter()
                .map(|raw| parse_requirement(raw))
                .collect::<Result<Vec<_>>>()?;
            let project = client
                .create_project(&NewProject {
                    name,
                    description,
                    start_date: start,
                    end_date: end,
                    status,
                    priority,
                    manager_id,
                    skill_requirements,
                })
                .await?;
            println!("Created project #{} {}", project.id, project.name);
        }
        ProjectCommands::Update {
            id,
            name,
            description,
            start,
            end,
            status,
            priority,
        } => {
            require(session, &format!("/update-project/{id}"))?;
            let update = ProjectUpdate {
                name,
                description,
                start_date: start,
                end_date: end,
                priority,
                status,
                ..ProjectUpdate::default()
            };
            if update.is_empty() {
                bail!("nothing to update; pass at least one field");
            }
            let project = client.update_project(id, &update).await?;
            println!("Updated project #{} {}", project.id, project.name);
        }
        ProjectCommands::Delete { id } => {
            require(session, "/view-projects")?;
            client.delete_project(id).await?;
            println!("Deleted project #{id}");
        }
    }
    Ok(())
}

async fn run_employee_command(
    command: EmployeeCommands,
    client: &ApiClient,
    session: &Session,
    format: OutputFormat,
) -> Result<()> {
    match command {
        EmployeeCommands::List => {
            require(session, "/employees")?;
            let users = client.list_users().await?;
            print_output(
                format,
                &users,
                || render_users_table(&users),
                Some(users_to_csv(&users)?),
            )?;
        }
        EmployeeCommands::Show { id } => {
            require(session, &format!("/employees/{id}"))?;
            let user = client.get_user(id).await?;
            let users = [user];
            print_output(
                format,
                &users[0],
                || render_users_table(&users),
                Some(users_to_csv(&users)?),
            )?;
        }
        EmployeeCommands::Update {
            id,
            update,
            role,
            performance,
        } => {
            require(session, &format!("/update-employee/{id}"))?;
            let update = UserUpdate {
                role,
                average_performance: performance,
                ..UserUpdate::from(update)
            };
            if update.is_empty() {
                bail!("nothing to update; pass at least one field");
            }
            let user = client.update_user(id, &update).await?;
            println!("Updated employee #{} {}", user.id, user.full_name);
        }
        EmployeeCommands::Delete { id } => {
            require(session, "/employees")?;
            client.delete_user(id).await?;
            println!("Deleted employee #{id}");
        }
    }
    Ok(())
}

fn print_output<T, F>(format: OutputFormat, value: &T, table: F, csv: Option<String>) -> Result<()>
where
    T: serde::Serialize + ?Sized,
    F: FnOnce() -> String,
{
    match format {
        OutputFormat::Table => println!("{}", table()),
        OutputFormat::Json => println!("{}", render_json(value)?),
        OutputFormat::Csv => match csv {
            Some(csv) => print!("{csv}"),
            None => {
                warn!("CSV output not available for this screen, using JSON");
                println!("{}", render_json(value)?);
            }
        },
    }
    Ok(())
}

fn parse_requirement(raw: &str) -> Result<SkillRequirement> {
    let (skill, count) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("requirement must be SKILL_ID:COUNT, got {raw}"))?;
    let requirement = SkillRequirement {
        skill_id: skill.trim().parse::<i64>().context("invalid skill id")?,
        employees_requested: count.trim().parse::<u32>().context("invalid employee count")?,
    };
    if requirement.employees_requested == 0 {
        bail!("requirement for skill {} must request at least one employee", requirement.skill_id);
    }
    Ok(requirement)
}

fn parse_assignment(raw: &str) -> Result<(i64, String, String, f64)> {
    let malformed = || anyhow!("assignment must be EMPLOYEE_ID:NAME:SKILL:PERCENT, got {raw}");
    let (head, percentage) = raw.rsplit_once(':').ok_or_else(malformed)?;
    let (id, rest) = head.split_once(':').ok_or_else(malformed)?;
    let (name, skill) = rest.split_once(':').ok_or_else(malformed)?;
    Ok((
        id.trim().parse::<i64>().context("invalid employee id")?,
        name.trim().to_string(),
        skill.trim().to_string(),
        percentage
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .context("invalid allocation percentage")?,
    ))
}

fn parse_pick(raw: &str) -> Result<(usize, Option<f64>)> {
    let (index, percentage) = match raw.split_once(':') {
        Some((index, percentage)) => (index, Some(percentage)),
        None => (raw, None),
    };
    let index = index.trim().parse::<usize>().context("invalid recommendation index")?;
    let percentage = percentage
        .map(|p| p.trim().trim_end_matches('%').parse::<f64>())
        .transpose()
        .context("invalid allocation percentage")?;
    Ok((index, percentage))
}
